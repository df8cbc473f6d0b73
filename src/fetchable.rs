//! Loading lifecycle tracker for asynchronously sourced values.
//!
//! A failed refresh never throws away data that is already on screen: once a
//! [`Fetchable`] holds a value (local, partial or complete), an error is only
//! recorded next to it.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing loaded and nothing failed yet.
    #[default]
    Idle,
    /// Populated from local sources only (e.g. workflow files on disk).
    Local,
    /// Populated from a fast, incomplete first-page fetch.
    Partial,
    /// Populated from a complete fetch.
    Ready,
    /// Failed before any data was ever held.
    Error,
}

impl LoadState {
    pub fn has_data(self) -> bool {
        matches!(self, Self::Local | Self::Partial | Self::Ready)
    }
}

#[derive(Debug, Clone)]
pub struct Fetchable<T> {
    value: T,
    state: LoadState,
    fetching: bool,
    error: Option<String>,
    fetched_at: Option<Instant>,
}

impl<T: Default> Default for Fetchable<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            state: LoadState::Idle,
            fetching: false,
            error: None,
            fetched_at: None,
        }
    }
}

impl<T> Fetchable<T> {
    pub fn mark_fetching(&mut self) {
        self.fetching = true;
    }

    pub fn set_local(&mut self, value: T) {
        self.store(value, LoadState::Local);
    }

    pub fn set_partial(&mut self, value: T) {
        self.store(value, LoadState::Partial);
    }

    pub fn set_data(&mut self, value: T) {
        self.store(value, LoadState::Ready);
    }

    fn store(&mut self, value: T, state: LoadState) {
        self.value = value;
        self.state = state;
        self.fetching = false;
        self.error = None;
        self.fetched_at = Some(Instant::now());
    }

    /// Records a failure. State only moves to [`LoadState::Error`] when no data is held.
    pub fn set_error(&mut self, err: impl Into<String>) {
        self.error = Some(err.into());
        self.fetching = false;
        if !self.state.has_data() {
            self.state = LoadState::Error;
        }
    }

    pub fn has_data(&self) -> bool {
        self.state.has_data()
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn fetched_at(&self) -> Option<Instant> {
        self.fetched_at
    }

    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: Default> Fetchable<T> {
    /// Drops the held value and returns to [`LoadState::Idle`].
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

//! Background refresh timer with exponential backoff.
//!
//! The delay is controlled externally via a `watch::Receiver<u64>`: the main loop
//! writes a new delay whenever the failure count changes, and the timer restarts
//! its sleep with the new value. On every expiry it sends `AppEvent::RefreshDue`;
//! the fetch itself goes through the request ledger like any other load.

use crate::events::AppEvent;
use tokio::sync::{mpsc, watch};
use tokio::time;

/// Upper bound for the delay between automatic refreshes after repeated failures.
pub const MAX_BACKOFF_SECS: u64 = 300;

/// Compute backoff delay: `min(base_interval * 2^failures, MAX_BACKOFF_SECS)`.
pub fn backoff_delay(base_interval: u64, failures: u32) -> u64 {
    let multiplier = 1u64.checked_shl(failures).unwrap_or(u64::MAX);
    base_interval
        .saturating_mul(multiplier)
        .clamp(1, MAX_BACKOFF_SECS)
}

pub struct RefreshTimer {
    tx: mpsc::UnboundedSender<AppEvent>,
    delay_rx: watch::Receiver<u64>,
}

impl RefreshTimer {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>, delay_rx: watch::Receiver<u64>) -> Self {
        Self { tx, delay_rx }
    }

    /// Runs until the event channel or the delay channel closes.
    pub async fn run(mut self) {
        loop {
            let delay = (*self.delay_rx.borrow_and_update()).max(1);
            tokio::select! {
                () = time::sleep(time::Duration::from_secs(delay)) => {
                    if self.tx.send(AppEvent::RefreshDue).is_err() {
                        tracing::warn!("refresh timer: channel closed");
                        return;
                    }
                }
                changed = self.delay_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    tracing::debug!(delay = *self.delay_rx.borrow(), "refresh delay changed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_zero_failures_returns_base() {
        assert_eq!(backoff_delay(2, 0), 2);
    }

    #[test]
    fn backoff_one_failure_doubles() {
        assert_eq!(backoff_delay(2, 1), 4);
    }

    #[test]
    fn backoff_capped_at_max() {
        assert_eq!(backoff_delay(2, 10), MAX_BACKOFF_SECS);
    }

    #[test]
    fn backoff_large_failure_count_saturates() {
        assert_eq!(backoff_delay(2, 100), MAX_BACKOFF_SECS);
    }

    #[test]
    fn backoff_base_zero_floors_to_one() {
        assert_eq!(backoff_delay(0, 5), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_refresh_due() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_delay_tx, delay_rx) = watch::channel(2);
        tokio::spawn(RefreshTimer::new(tx, delay_rx).run());

        assert_eq!(rx.recv().await, Some(AppEvent::RefreshDue));
        assert_eq!(rx.recv().await, Some(AppEvent::RefreshDue));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_stops_when_delay_sender_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (delay_tx, delay_rx) = watch::channel(60);
        let handle = tokio::spawn(RefreshTimer::new(tx, delay_rx).run());
        drop(delay_tx);
        handle.await.unwrap();
        assert_eq!(rx.recv().await, None);
    }
}

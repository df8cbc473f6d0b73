//! Key bindings: a declarative table from logical actions to key chords.
//!
//! Controllers test bindings in a fixed order (`if keys.up.matches(&key) ...`),
//! so the table stays the single place where chords are defined.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

const fn key(c: char) -> Chord {
    Chord {
        code: KeyCode::Char(c),
        modifiers: KeyModifiers::NONE,
    }
}

const fn ctrl(c: char) -> Chord {
    Chord {
        code: KeyCode::Char(c),
        modifiers: KeyModifiers::CONTROL,
    }
}

const fn named(code: KeyCode) -> Chord {
    Chord {
        code,
        modifiers: KeyModifiers::NONE,
    }
}

impl Chord {
    fn matches(&self, event: &KeyEvent) -> bool {
        // Terminals disagree on whether 'G' carries SHIFT; the char already encodes it.
        let modifiers = if matches!(event.code, KeyCode::Char(_)) {
            event.modifiers.difference(KeyModifiers::SHIFT)
        } else {
            event.modifiers
        };
        self.code == event.code && self.modifiers == modifiers
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Binding {
    chords: &'static [Chord],
    /// Key label shown in the help bar.
    pub keys: &'static str,
    pub help: &'static str,
}

impl Binding {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.chords.iter().any(|c| c.matches(event))
    }

    pub fn chords(&self) -> &'static [Chord] {
        self.chords
    }
}

#[derive(Debug, Clone)]
pub struct KeyMap {
    pub up: Binding,
    pub down: Binding,
    pub enter: Binding,
    pub rerun: Binding,
    pub cancel: Binding,
    pub dispatch: Binding,
    pub right: Binding,
    pub left: Binding,
    pub back: Binding,
    pub open: Binding,
    pub refresh: Binding,
    pub quit: Binding,
    pub page_up: Binding,
    pub page_down: Binding,
    pub half_page_up: Binding,
    pub half_page_down: Binding,
    pub top: Binding,
    pub bottom: Binding,
    pub search: Binding,
    pub search_next: Binding,
    pub search_prev: Binding,
}

impl KeyMap {
    pub const DEFAULT: Self = Self {
        up: Binding { chords: &[named(KeyCode::Up), key('k')], keys: "↑/k", help: "up" },
        down: Binding { chords: &[named(KeyCode::Down), key('j')], keys: "↓/j", help: "down" },
        enter: Binding { chords: &[named(KeyCode::Enter)], keys: "↵", help: "select" },
        rerun: Binding { chords: &[key('r')], keys: "r", help: "rerun" },
        cancel: Binding { chords: &[key('c')], keys: "c", help: "cancel" },
        dispatch: Binding { chords: &[key('d')], keys: "d", help: "dispatch" },
        right: Binding { chords: &[key('l'), named(KeyCode::Right)], keys: "→/l", help: "logs" },
        left: Binding { chords: &[key('h'), named(KeyCode::Left)], keys: "←/h", help: "back" },
        back: Binding { chords: &[named(KeyCode::Esc)], keys: "esc", help: "back" },
        open: Binding { chords: &[key('o')], keys: "o", help: "open" },
        refresh: Binding { chords: &[key('R')], keys: "R", help: "refresh" },
        quit: Binding { chords: &[key('q'), ctrl('c')], keys: "q", help: "quit" },
        page_up: Binding { chords: &[named(KeyCode::PageUp), ctrl('b')], keys: "pgup", help: "page up" },
        page_down: Binding { chords: &[named(KeyCode::PageDown), ctrl('f')], keys: "pgdn", help: "page down" },
        half_page_up: Binding { chords: &[ctrl('u')], keys: "ctrl+u", help: "half page up" },
        half_page_down: Binding { chords: &[ctrl('d')], keys: "ctrl+d", help: "half page down" },
        top: Binding { chords: &[key('g'), named(KeyCode::Home)], keys: "g", help: "top" },
        bottom: Binding { chords: &[key('G'), named(KeyCode::End)], keys: "G", help: "bottom" },
        search: Binding { chords: &[key('/')], keys: "/", help: "search" },
        search_next: Binding { chords: &[key('n')], keys: "n", help: "next match" },
        search_prev: Binding { chords: &[key('p')], keys: "p", help: "prev match" },
    };
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Key repeat and release events are ignored everywhere.
pub fn is_press(event: &KeyEvent) -> bool {
    event.kind == KeyEventKind::Press
}

/// Ctrl+C quits from every screen and mode, including text input.
pub fn is_interrupt(event: &KeyEvent) -> bool {
    event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL)
}

/// The printable character of a key press, if it is plain text input.
pub fn typed_char(event: &KeyEvent) -> Option<char> {
    match event.code {
        KeyCode::Char(c)
            if !event
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

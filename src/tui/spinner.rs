const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Spinner glyph for the given UI tick.
pub fn frame(tick: usize) -> char {
    FRAMES[tick % FRAMES.len()]
}

/// `"<spinner> <label>"`, used while data is in flight.
pub fn label(tick: usize, text: &str) -> String {
    format!("{} {text}", frame(tick))
}

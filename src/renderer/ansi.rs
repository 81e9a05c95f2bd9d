//! ANSI escape sequences for terminal control.
//!
//! The subset the diff renderer and terminal setup need:
//! - Cursor positioning and visibility
//! - Screen clearing and the alternate screen
//! - True-color foreground/background
//! - Text modes (bold, italic, underline, double underline, overline, strikethrough)

use std::io::Write;

use crate::types::{Color, TextMode};

// =============================================================================
// Constants
// =============================================================================

/// Control Sequence Introducer.
pub const CSI: &str = "\x1b[";

/// Style reset sequence.
pub const RESET: &str = "\x1b[0m";

/// Full-screen clear sequence.
pub const CLEAR: &str = "\x1b[2J";

// =============================================================================
// Cursor
// =============================================================================

/// Move cursor to absolute position (0-indexed in, 1-indexed on the wire).
///
/// Uses the `f` (HVP) form: `ESC[row;colf`.
#[inline]
pub fn cursor_to<W: Write>(w: &mut W, x: i32, y: i32) -> std::io::Result<()> {
    write!(w, "\x1b[{};{}f", y + 1, x + 1)
}

/// Hide cursor.
#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25l")
}

/// Show cursor.
#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25h")
}

// =============================================================================
// Screen
// =============================================================================

/// Clear the entire screen.
#[inline]
pub fn clear_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(CLEAR.as_bytes())
}

/// Enter alternate screen buffer.
#[inline]
pub fn enter_alt_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?1049h")
}

/// Exit alternate screen buffer.
#[inline]
pub fn exit_alt_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?1049l")
}

// =============================================================================
// Colors and Modes
// =============================================================================

/// Reset all styles.
#[inline]
pub fn reset<W: Write>(w: &mut W) -> std::io::Result<()> {
    w.write_all(RESET.as_bytes())
}

/// Set foreground color. `Empty` resets to the terminal default.
#[inline]
pub fn fg<W: Write>(w: &mut W, color: Color) -> std::io::Result<()> {
    match color {
        Color::Empty => write!(w, "\x1b[39m"),
        Color::Rgb { r, g, b } => write!(w, "\x1b[38;2;{};{};{}m", r, g, b),
    }
}

/// Set background color. `Empty` resets to the terminal default.
#[inline]
pub fn bg<W: Write>(w: &mut W, color: Color) -> std::io::Result<()> {
    match color {
        Color::Empty => write!(w, "\x1b[49m"),
        Color::Rgb { r, g, b } => write!(w, "\x1b[48;2;{};{};{}m", r, g, b),
    }
}

/// Set the text mode as one combined SGR sequence.
///
/// Always starts with `0` so the previous streak's modes never leak:
/// `ESC[0m` for the default mode, `ESC[0;1;4m` for bold + underline.
pub fn text_mode<W: Write>(w: &mut W, mode: TextMode) -> std::io::Result<()> {
    write!(w, "\x1b[0")?;
    for (flag, code) in TextMode::SGR_CODES {
        if mode.contains(flag) {
            write!(w, ";{}", code)?;
        }
    }
    write!(w, "m")
}

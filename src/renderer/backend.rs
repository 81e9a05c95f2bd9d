//! Output backends.
//!
//! The diff renderer decides *what* changed; a backend decides *how* to put
//! it on the terminal. Two backends exist:
//!
//! - [`AnsiBackend`] writes escape sequences through memoized caches.
//! - [`NativeBackend`] issues crossterm commands, which fall back to the
//!   console API on Windows consoles without virtual-terminal processing.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{self, Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use serde::{Deserialize, Serialize};

use super::ansi;
use super::cache::SequenceCache;
use super::output::OutputBuffer;
use crate::types::{Color, TextMode, Vector};

// =============================================================================
// Display mode
// =============================================================================

/// Which backend to render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Probe the console and prefer ANSI.
    #[default]
    Auto,
    Ansi,
    Native,
}

/// Resolve `Auto` to a concrete mode.
///
/// On Windows the console is probed for virtual-terminal support (crossterm
/// tries to enable it); legacy consoles get the native backend. Everywhere
/// else terminals speak ANSI.
pub fn select_display_mode(requested: DisplayMode) -> DisplayMode {
    match requested {
        DisplayMode::Auto => probe_console(),
        mode => mode,
    }
}

#[cfg(windows)]
fn probe_console() -> DisplayMode {
    if crossterm::ansi_support::supports_ansi() {
        DisplayMode::Ansi
    } else {
        DisplayMode::Native
    }
}

#[cfg(not(windows))]
fn probe_console() -> DisplayMode {
    DisplayMode::Ansi
}

/// Build the backend for a resolved mode. `Auto` is resolved first.
pub fn create_backend<W>(mode: DisplayMode, writer: W, chunk_size: usize) -> Box<dyn Backend>
where
    W: Write + Send + 'static,
{
    match select_display_mode(mode) {
        DisplayMode::Native => Box::new(NativeBackend::new(writer)),
        _ => Box::new(AnsiBackend::new(writer, chunk_size)),
    }
}

// =============================================================================
// Backend trait
// =============================================================================

/// Visual properties shared by every cell of a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreakStyle {
    /// Cells being blanked: plain reset, then spaces.
    Blank,
    Styled { fg: Color, bg: Color, mode: TextMode },
}

/// A terminal output target.
pub trait Backend: Send {
    /// The concrete mode this backend implements.
    fn mode(&self) -> DisplayMode;

    /// Queue a full-screen clear.
    fn clear_screen(&mut self) -> io::Result<()>;

    /// Queue one streak. `move_cursor` is false when the streak continues
    /// right where the previous one ended.
    fn write_streak(&mut self, at: Vector, move_cursor: bool, style: StreakStyle, symbols: &str) -> io::Result<()>;

    /// Finish the frame with a style reset and push everything out.
    fn end_frame(&mut self) -> io::Result<()>;

    /// Reset the terminal style immediately.
    fn reset_style(&mut self) -> io::Result<()>;
}

// =============================================================================
// AnsiBackend
// =============================================================================

/// Escape-sequence backend with per-value caches.
pub struct AnsiBackend<W> {
    writer: W,
    out: OutputBuffer,
    coords: SequenceCache<Vector>,
    fg: SequenceCache<Color>,
    bg: SequenceCache<Color>,
    modes: SequenceCache<TextMode>,
}

impl<W: Write + Send> AnsiBackend<W> {
    pub fn new(writer: W, chunk_size: usize) -> Self {
        Self {
            writer,
            out: OutputBuffer::with_chunk_size(chunk_size),
            coords: SequenceCache::new(|w: &mut Vec<u8>, at: &Vector| ansi::cursor_to(w, at.x, at.y)),
            fg: SequenceCache::new(|w: &mut Vec<u8>, color: &Color| ansi::fg(w, *color)),
            bg: SequenceCache::new(|w: &mut Vec<u8>, color: &Color| ansi::bg(w, *color)),
            modes: SequenceCache::new(|w: &mut Vec<u8>, mode: &TextMode| ansi::text_mode(w, *mode)),
        }
    }
}

impl<W: Write + Send> Backend for AnsiBackend<W> {
    fn mode(&self) -> DisplayMode {
        DisplayMode::Ansi
    }

    fn clear_screen(&mut self) -> io::Result<()> {
        ansi::clear_screen(&mut self.out)
    }

    fn write_streak(&mut self, at: Vector, move_cursor: bool, style: StreakStyle, symbols: &str) -> io::Result<()> {
        if move_cursor {
            self.coords.write_to(&mut self.out, at)?;
        }
        match style {
            StreakStyle::Blank => ansi::reset(&mut self.out)?,
            StreakStyle::Styled { fg, bg, mode } => {
                self.modes.write_to(&mut self.out, mode)?;
                self.fg.write_to(&mut self.out, fg)?;
                self.bg.write_to(&mut self.out, bg)?;
            }
        }
        self.out.write_str(symbols);
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        ansi::reset(&mut self.out)?;
        self.out.flush_to(&mut self.writer)
    }

    fn reset_style(&mut self) -> io::Result<()> {
        ansi::reset(&mut self.writer)?;
        self.writer.flush()
    }
}

// =============================================================================
// NativeBackend
// =============================================================================

/// Backend driven by crossterm commands.
pub struct NativeBackend<W> {
    writer: W,
}

impl<W: Write + Send> NativeBackend<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

fn native_color(color: Color) -> style::Color {
    match color {
        Color::Empty => style::Color::Reset,
        Color::Rgb { r, g, b } => style::Color::Rgb { r, g, b },
    }
}

const NATIVE_ATTRIBUTES: [(TextMode, Attribute); 6] = [
    (TextMode::BOLD, Attribute::Bold),
    (TextMode::ITALIC, Attribute::Italic),
    (TextMode::UNDERLINE, Attribute::Underlined),
    (TextMode::DOUBLE_UNDERLINE, Attribute::DoubleUnderlined),
    (TextMode::OVERLINE, Attribute::OverLined),
    (TextMode::STRIKETHROUGH, Attribute::CrossedOut),
];

impl<W: Write + Send> Backend for NativeBackend<W> {
    fn mode(&self) -> DisplayMode {
        DisplayMode::Native
    }

    fn clear_screen(&mut self) -> io::Result<()> {
        queue!(self.writer, crossterm::terminal::Clear(crossterm::terminal::ClearType::All))
    }

    fn write_streak(&mut self, at: Vector, move_cursor: bool, style: StreakStyle, symbols: &str) -> io::Result<()> {
        if move_cursor {
            queue!(self.writer, MoveTo(at.x as u16, at.y as u16))?;
        }
        queue!(self.writer, SetAttribute(Attribute::Reset))?;
        if let StreakStyle::Styled { fg, bg, mode } = style {
            for (flag, attribute) in NATIVE_ATTRIBUTES {
                if mode.contains(flag) {
                    queue!(self.writer, SetAttribute(attribute))?;
                }
            }
            queue!(
                self.writer,
                SetForegroundColor(native_color(fg)),
                SetBackgroundColor(native_color(bg))
            )?;
        }
        queue!(self.writer, Print(symbols))
    }

    fn end_frame(&mut self) -> io::Result<()> {
        queue!(self.writer, SetAttribute(Attribute::Reset))?;
        self.writer.flush()
    }

    fn reset_style(&mut self) -> io::Result<()> {
        queue!(self.writer, SetAttribute(Attribute::Reset))?;
        self.writer.flush()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::output::CaptureWriter;

    #[test]
    fn test_explicit_modes_are_kept() {
        assert_eq!(select_display_mode(DisplayMode::Native), DisplayMode::Native);
        assert_eq!(select_display_mode(DisplayMode::Ansi), DisplayMode::Ansi);
        assert_ne!(select_display_mode(DisplayMode::Auto), DisplayMode::Auto);
    }

    #[test]
    fn test_ansi_streak_order() {
        let capture = CaptureWriter::new();
        let mut backend = AnsiBackend::new(capture.clone(), 1000);
        let style = StreakStyle::Styled {
            fg: Color::rgb(1, 2, 3),
            bg: Color::Empty,
            mode: TextMode::BOLD,
        };
        backend.write_streak(Vector::new(2, 1), true, style, "ab").unwrap();
        backend.write_streak(Vector::new(4, 1), false, StreakStyle::Blank, " ").unwrap();
        assert_eq!(capture.take(), "", "nothing leaves before end_frame");

        backend.end_frame().unwrap();
        assert_eq!(
            capture.take(),
            "\x1b[2;3f\x1b[0;1m\x1b[38;2;1;2;3m\x1b[49mab\x1b[0m \x1b[0m"
        );
    }

    #[test]
    fn test_native_backend_emits_commands() {
        let capture = CaptureWriter::new();
        let mut backend = NativeBackend::new(capture.clone());
        let style = StreakStyle::Styled {
            fg: Color::WHITE,
            bg: Color::BLACK,
            mode: TextMode::DEFAULT,
        };
        backend.write_streak(Vector::new(0, 0), true, style, "x").unwrap();
        backend.end_frame().unwrap();
        let out = capture.take();
        assert!(out.contains('x'));
        assert_eq!(backend.mode(), DisplayMode::Native);
    }
}

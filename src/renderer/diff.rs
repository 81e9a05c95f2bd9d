//! Differential renderer.
//!
//! The DiffRenderer compares the current grid to the grid emitted by the
//! previous flush and outputs only the cells that changed.
//!
//! # Algorithm
//!
//! 1. Fast path: if both grids are equal and no clear was requested, return
//!    without producing any output.
//! 2. Scan left to right, top to bottom. Consecutive changed cells on one row
//!    that share `(fg, bg, mode)` form a *streak*.
//! 3. Each streak is written as: cursor position (only when it does not
//!    continue the previous streak), mode, fg, bg, then the symbols.
//!    Cleared cells form blank streaks (reset + spaces) and become Empty.
//! 4. Copy current into last and end the frame with a style reset.

use std::io;

use super::backend::{Backend, DisplayMode, StreakStyle};
use super::buffer::ScreenBuffer;
use crate::types::{Pixel, Vector};

/// Differential renderer owning the screen buffer and the output backend.
pub struct DiffRenderer {
    buffer: ScreenBuffer,
    backend: Box<dyn Backend>,
    clear_requested: bool,
    streak: StreakBuilder,
}

impl DiffRenderer {
    /// Create a renderer for a screen of `size`.
    ///
    /// The first flush clears the screen.
    pub fn new(size: Vector, backend: Box<dyn Backend>) -> Self {
        Self {
            buffer: ScreenBuffer::new(size),
            backend,
            clear_requested: true,
            streak: StreakBuilder::default(),
        }
    }

    pub fn buffer(&self) -> &ScreenBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ScreenBuffer {
        &mut self.buffer
    }

    pub fn mode(&self) -> DisplayMode {
        self.backend.mode()
    }

    /// Request a full-screen clear and full redraw on the next flush.
    pub fn clear(&mut self) {
        self.clear_requested = true;
    }

    /// Reallocate both grids and force a full redraw.
    pub fn resize(&mut self, size: Vector) {
        self.buffer.resize(size);
        self.clear_requested = true;
    }

    /// Reset the terminal style immediately.
    pub fn reset_style(&mut self) -> io::Result<()> {
        self.backend.reset_style()
    }

    /// Best-effort terminal restore: reset style and clear the screen.
    pub fn restore(&mut self) -> io::Result<()> {
        self.backend.reset_style()?;
        self.backend.clear_screen()?;
        self.backend.end_frame()
    }

    /// Emit everything that changed since the last flush.
    ///
    /// Returns true when output was produced.
    pub fn flush(&mut self) -> io::Result<bool> {
        let full = self.clear_requested;
        if !full && self.buffer.is_unchanged() {
            return Ok(false);
        }
        self.clear_requested = false;

        let Self {
            buffer, backend, streak, ..
        } = self;
        let backend = backend.as_mut();
        streak.reset();

        if full {
            backend.clear_screen()?;
            streak.emitted = true;
        }

        let width = buffer.width().max(1) as usize;
        let (current, last) = buffer.grids_mut();

        for (i, pixel) in current.iter_mut().enumerate() {
            let at = Vector::new((i % width) as i32, (i / width) as i32);
            if at.x == 0 {
                streak.close(backend)?;
            }

            let cell = match *pixel {
                Pixel::Empty => None,
                Pixel::Cleared => {
                    // After a full clear, or on a cell that was already blank,
                    // there is nothing to erase.
                    let erase = !full && !last[i].is_empty();
                    *pixel = Pixel::Empty;
                    erase.then_some((StreakStyle::Blank, ' '))
                }
                Pixel::Drawn(glyph) => (full || *pixel != last[i]).then_some((
                    StreakStyle::Styled {
                        fg: glyph.fg,
                        bg: glyph.bg,
                        mode: glyph.mode,
                    },
                    glyph.symbol,
                )),
            };

            match cell {
                Some((style, symbol)) => streak.push(backend, at, style, symbol)?,
                None => streak.close(backend)?,
            }
        }
        streak.close(backend)?;
        last.copy_from_slice(current);

        if !streak.emitted {
            return Ok(false);
        }
        tracing::trace!(full, "frame flushed");
        backend.end_frame()?;
        Ok(true)
    }
}

// =============================================================================
// StreakBuilder
// =============================================================================

/// Accumulates one streak and tracks where the previous one ended.
#[derive(Debug, Default)]
struct StreakBuilder {
    start: Vector,
    style: Option<StreakStyle>,
    symbols: String,
    len: i32,
    /// Cell right after the previously written streak.
    cursor: Option<Vector>,
    emitted: bool,
}

impl StreakBuilder {
    fn reset(&mut self) {
        self.style = None;
        self.symbols.clear();
        self.len = 0;
        self.cursor = None;
        self.emitted = false;
    }

    fn push(&mut self, backend: &mut dyn Backend, at: Vector, style: StreakStyle, symbol: char) -> io::Result<()> {
        if self.style != Some(style) {
            self.close(backend)?;
            self.start = at;
            self.style = Some(style);
        }
        self.symbols.push(symbol);
        self.len += 1;
        Ok(())
    }

    fn close(&mut self, backend: &mut dyn Backend) -> io::Result<()> {
        let Some(style) = self.style.take() else {
            return Ok(());
        };
        let move_cursor = self.cursor != Some(self.start);
        backend.write_streak(self.start, move_cursor, style, &self.symbols)?;
        self.cursor = Some(self.start + Vector::new(self.len, 0));
        self.symbols.clear();
        self.len = 0;
        self.emitted = true;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

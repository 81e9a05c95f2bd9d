//! ScreenBuffer and drawing primitives.
//!
//! The ScreenBuffer holds two grids of Pixels of identical dimensions:
//! `current`, which paint callbacks draw into, and `last`, the grid that was
//! emitted by the previous flush. The diff renderer compares the two.
//!
//! # Design Decisions
//!
//! - **Flat storage**: `Vec<Pixel>` with row-major indexing.
//! - **Clipping**: every primitive clips silently to the screen. Out of range
//!   geometry is a no-op, never an error.
//! - **Empty colors**: `Color::Empty` keeps whatever color the cell already has.

use crate::types::{Alignment, BorderStyle, Color, Pixel, PixelBuffer, TextMode, Vector};

// =============================================================================
// ScreenBuffer
// =============================================================================

/// The double-buffered virtual screen.
///
/// Uses flat storage with row-major indexing: `index = y * width + x`
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenBuffer {
    width: i32,
    height: i32,
    current: Vec<Pixel>,
    last: Vec<Pixel>,
}

impl ScreenBuffer {
    /// Create a new buffer of empty cells.
    pub fn new(size: Vector) -> Self {
        let width = size.x.max(0);
        let height = size.y.max(0);
        let len = (width * height) as usize;
        Self {
            width,
            height,
            current: vec![Pixel::Empty; len],
            last: vec![Pixel::Empty; len],
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> Vector {
        Vector::new(self.width, self.height)
    }

    /// Reallocate both grids, discarding all content and diff state.
    pub fn resize(&mut self, size: Vector) {
        *self = Self::new(size);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    /// The pixel at `(x, y)` in the current grid.
    pub fn get(&self, x: i32, y: i32) -> Option<Pixel> {
        self.index(x, y).map(|i| self.current[i])
    }

    /// The pixel at `(x, y)` as of the last flush.
    pub fn last(&self, x: i32, y: i32) -> Option<Pixel> {
        self.index(x, y).map(|i| self.last[i])
    }

    /// True when nothing was drawn since the last flush.
    pub fn is_unchanged(&self) -> bool {
        self.current == self.last
    }

    /// Both grids, for the flush pass.
    pub(crate) fn grids_mut(&mut self) -> (&mut [Pixel], &mut [Pixel]) {
        (&mut self.current, &mut self.last)
    }

    /// Write one in-bounds cell, keeping previous colors for `Empty`.
    #[inline]
    fn put(&mut self, i: usize, symbol: char, fg: Color, bg: Color, mode: TextMode) {
        let (old_fg, old_bg) = self.current[i].colors();
        self.current[i] = Pixel::glyph(symbol, fg.or(old_fg), bg.or(old_bg), mode);
    }

    // -------------------------------------------------------------------------
    // Clipping
    // -------------------------------------------------------------------------

    /// Clip a rectangle to the screen. Returns `(start, end)` with `end` exclusive.
    fn clip_area(&self, pos: Vector, size: Vector) -> Option<(Vector, Vector)> {
        if pos.x >= self.width || pos.y >= self.height || size.is_degenerate() {
            return None;
        }
        let start = pos.max(Vector::ZERO);
        let end = (pos + size).max(Vector::ZERO).min(self.size());
        (start.x < end.x && start.y < end.y).then_some((start, end))
    }

    /// Clip a line walking `direction` from `pos`. Returns the first on-screen
    /// cell and the number of steps that stay on screen.
    fn clip_line(&self, pos: Vector, direction: Vector, length: i32) -> Option<(Vector, i32)> {
        if length <= 0 || direction == Vector::ZERO || self.width == 0 || self.height == 0 {
            return None;
        }

        // Steps skipped before the line enters the screen.
        let skip = Self::steps_to_enter(pos.x, direction.x, self.width)?.max(Self::steps_to_enter(
            pos.y,
            direction.y,
            self.height,
        )?);
        if skip >= length {
            return None;
        }
        let start = pos + direction * skip;
        self.index(start.x, start.y)?;

        let mut steps = length - skip;
        for (at, step, extent) in [(start.x, direction.x, self.width), (start.y, direction.y, self.height)] {
            match step.signum() {
                1 => steps = steps.min(extent - at),
                -1 => steps = steps.min(at + 1),
                _ => {}
            }
        }
        (steps > 0).then_some((start, steps))
    }

    /// Steps along one axis until `at` lands inside `0..extent`. `None` when
    /// it never does.
    fn steps_to_enter(at: i32, step: i32, extent: i32) -> Option<i32> {
        match step.signum() {
            _ if (0..extent).contains(&at) => Some(0),
            1 if at < 0 => Some((-at + step - 1) / step),
            -1 if at >= extent => Some((at - extent + 1 + (-step) - 1) / (-step)),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Drawing primitives
    // -------------------------------------------------------------------------

    /// Draw a single symbol in the default text mode.
    pub fn draw(&mut self, x: i32, y: i32, symbol: char, fg: Color, bg: Color) {
        if let Some(i) = self.index(x, y) {
            self.put(i, symbol, fg, bg, TextMode::DEFAULT);
        }
    }

    /// Fill a rectangle with `symbol` on a `color` background.
    ///
    /// An `Empty` color draws nothing.
    pub fn draw_rect(&mut self, pos: Vector, size: Vector, color: Color, symbol: char) {
        if color.is_empty() {
            return;
        }
        let Some((start, end)) = self.clip_area(pos, size) else {
            return;
        };
        for y in start.y..end.y {
            for x in start.x..end.x {
                let i = (y * self.width + x) as usize;
                self.current[i] = Pixel::glyph(symbol, Color::Empty, color, TextMode::DEFAULT);
            }
        }
    }

    /// Draw `length` symbols starting at `pos`, stepping by `direction`.
    pub fn draw_line(&mut self, pos: Vector, direction: Vector, length: i32, fg: Color, bg: Color, symbol: char) {
        let Some((mut at, steps)) = self.clip_line(pos, direction, length) else {
            return;
        };
        for _ in 0..steps {
            if let Some(i) = self.index(at.x, at.y) {
                self.put(i, symbol, fg, bg, TextMode::DEFAULT);
            }
            at += direction;
        }
    }

    /// Print text on one row, anchored at `x` by `alignment`.
    ///
    /// Left starts at `x`, Right ends at `x`, Center is centred on `x`.
    pub fn print(&mut self, x: i32, y: i32, text: &str, fg: Color, bg: Color, alignment: Alignment, mode: TextMode) {
        if y < 0 || y >= self.height {
            return;
        }
        let len = text.chars().count() as i32;
        let start = match alignment {
            Alignment::Left => x,
            Alignment::Right => x - len,
            Alignment::Center => x - len / 2,
        };
        if start >= self.width {
            return;
        }
        for (offset, symbol) in text.chars().enumerate() {
            let cx = start + offset as i32;
            if cx >= self.width {
                break;
            }
            if let Some(i) = self.index(cx, y) {
                self.put(i, symbol, fg, bg, mode);
            }
        }
    }

    /// Draw a box border. Corners whose edge falls off screen are omitted.
    pub fn draw_border(&mut self, pos: Vector, size: Vector, color: Color, style: BorderStyle) {
        if color.is_empty() {
            return;
        }
        let Some((start, end)) = self.clip_area(pos, size) else {
            return;
        };
        let clipped = end - start;
        let fits_horizontally = size.x == clipped.x;
        let fits_vertically = size.y == clipped.y;
        let (h, v, tl, tr, bl, br) = style.chars();

        let stroke = |buf: &mut Self, x: i32, y: i32, symbol: char| {
            if let Some(i) = buf.index(x, y) {
                buf.put(i, symbol, color, Color::Empty, TextMode::DEFAULT);
            }
        };

        for x in start.x + 1..end.x - 1 {
            stroke(self, x, start.y, h);
            stroke(self, x, end.y - 1, h);
        }
        for y in start.y + 1..end.y - 1 {
            stroke(self, start.x, y, v);
            stroke(self, end.x - 1, y, v);
        }

        stroke(self, start.x, start.y, tl);
        if fits_horizontally {
            stroke(self, end.x - 1, start.y, tr);
        }
        if fits_vertically {
            stroke(self, start.x, end.y - 1, bl);
        }
        if fits_horizontally && fits_vertically {
            stroke(self, end.x - 1, end.y - 1, br);
        }
    }

    /// Mark a single cell to be blanked on the next flush.
    pub fn clear_at(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.current[i] = Pixel::Cleared;
        }
    }

    /// Mark a rectangle to be blanked on the next flush.
    pub fn clear_rect(&mut self, pos: Vector, size: Vector) {
        let Some((start, end)) = self.clip_area(pos, size) else {
            return;
        };
        for y in start.y..end.y {
            let row = (y * self.width) as usize;
            self.current[row + start.x as usize..row + end.x as usize].fill(Pixel::Cleared);
        }
    }

    /// Blit a pixel block with its top-left corner at `pos`.
    ///
    /// `Empty` cells of the block are transparent and leave the screen as is.
    pub fn draw_buffer(&mut self, pos: Vector, buffer: &PixelBuffer) {
        let Some((start, end)) = self.clip_area(pos, buffer.size()) else {
            return;
        };
        for y in start.y..end.y {
            for x in start.x..end.x {
                if let Some(pixel) = buffer.get(x - pos.x, y - pos.y).filter(|p| !p.is_empty()) {
                    let i = (y * self.width + x) as usize;
                    self.current[i] = *pixel;
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn symbol_at(buf: &ScreenBuffer, x: i32, y: i32) -> Option<char> {
        match buf.get(x, y)? {
            Pixel::Drawn(glyph) => Some(glyph.symbol),
            _ => None,
        }
    }

    fn row(buf: &ScreenBuffer, y: i32) -> String {
        (0..buf.width()).map(|x| symbol_at(buf, x, y).unwrap_or('.')).collect()
    }

    #[test]
    fn test_draw_out_of_bounds_is_noop() {
        let mut buf = ScreenBuffer::new(Vector::new(4, 3));
        let before = buf.clone();
        buf.draw(-1, -1, 'x', Color::RED, Color::BLACK);
        buf.draw(4, 3, 'x', Color::RED, Color::BLACK);
        buf.draw(4, 0, 'x', Color::RED, Color::BLACK);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_draw_keeps_colors_on_empty() {
        let mut buf = ScreenBuffer::new(Vector::new(2, 1));
        buf.draw(0, 0, 'a', Color::RED, Color::BLUE);
        buf.draw(0, 0, 'b', Color::Empty, Color::GREEN);
        assert_eq!(
            buf.get(0, 0),
            Some(Pixel::glyph('b', Color::RED, Color::GREEN, TextMode::DEFAULT))
        );
    }

    #[test]
    fn test_draw_rect_clips() {
        let mut buf = ScreenBuffer::new(Vector::new(4, 2));
        buf.draw_rect(Vector::new(-1, -1), Vector::new(3, 2), Color::BLUE, '#');
        assert_eq!(row(&buf, 0), "##..");
        assert_eq!(row(&buf, 1), "....");

        buf.draw_rect(Vector::new(0, 1), Vector::new(4, 1), Color::Empty, '#');
        assert_eq!(row(&buf, 1), "....");
    }

    #[test]
    fn test_draw_line_horizontal_clipped() {
        let mut buf = ScreenBuffer::new(Vector::new(5, 1));
        buf.draw_line(Vector::new(-2, 0), Vector::RIGHT, 10, Color::WHITE, Color::Empty, '-');
        assert_eq!(row(&buf, 0), "-----");

        let mut buf = ScreenBuffer::new(Vector::new(5, 1));
        buf.draw_line(Vector::new(-2, 0), Vector::RIGHT, 4, Color::WHITE, Color::Empty, '-');
        assert_eq!(row(&buf, 0), "--...");
    }

    #[test]
    fn test_draw_line_reaches_last_row_and_column() {
        let mut buf = ScreenBuffer::new(Vector::new(5, 3));
        buf.draw_line(Vector::new(4, 0), Vector::DOWN, 3, Color::WHITE, Color::Empty, '|');
        assert_eq!(row(&buf, 0), "....|");
        assert_eq!(row(&buf, 1), "....|");
        assert_eq!(row(&buf, 2), "....|");

        buf.draw_line(Vector::new(4, 2), Vector::LEFT, 5, Color::WHITE, Color::Empty, '-');
        assert_eq!(row(&buf, 2), "-----");
    }

    #[test]
    fn test_draw_line_diagonal() {
        let mut buf = ScreenBuffer::new(Vector::new(4, 4));
        buf.draw_line(Vector::new(0, 0), Vector::new(1, 1), 3, Color::WHITE, Color::Empty, '\\');
        assert_eq!(symbol_at(&buf, 0, 0), Some('\\'));
        assert_eq!(symbol_at(&buf, 1, 1), Some('\\'));
        assert_eq!(symbol_at(&buf, 2, 2), Some('\\'));
        assert_eq!(symbol_at(&buf, 3, 3), None);
    }

    #[test]
    fn test_draw_line_entirely_off_screen() {
        let mut buf = ScreenBuffer::new(Vector::new(3, 3));
        let before = buf.clone();
        buf.draw_line(Vector::new(-1, 1), Vector::LEFT, 5, Color::WHITE, Color::Empty, '-');
        buf.draw_line(Vector::new(1, 3), Vector::DOWN, 5, Color::WHITE, Color::Empty, '|');
        buf.draw_line(Vector::new(1, 1), Vector::ZERO, 5, Color::WHITE, Color::Empty, '|');
        assert_eq!(buf, before);
    }

    #[test]
    fn test_print_alignment() {
        let mut buf = ScreenBuffer::new(Vector::new(9, 3));
        buf.print(0, 0, "abc", Color::WHITE, Color::Empty, Alignment::Left, TextMode::DEFAULT);
        buf.print(9, 1, "abc", Color::WHITE, Color::Empty, Alignment::Right, TextMode::DEFAULT);
        buf.print(4, 2, "abc", Color::WHITE, Color::Empty, Alignment::Center, TextMode::BOLD);
        assert_eq!(row(&buf, 0), "abc......");
        assert_eq!(row(&buf, 1), "......abc");
        assert_eq!(row(&buf, 2), "...abc...");
        assert!(matches!(buf.get(3, 2), Some(Pixel::Drawn(g)) if g.mode == TextMode::BOLD));
    }

    #[test]
    fn test_print_clips_both_edges() {
        let mut buf = ScreenBuffer::new(Vector::new(4, 1));
        buf.print(-2, 0, "abcdefgh", Color::WHITE, Color::Empty, Alignment::Left, TextMode::DEFAULT);
        assert_eq!(row(&buf, 0), "cdef");
    }

    #[test]
    fn test_border_full_and_clipped() {
        let mut buf = ScreenBuffer::new(Vector::new(6, 4));
        buf.draw_border(Vector::new(0, 0), Vector::new(4, 3), Color::WHITE, BorderStyle::Single);
        assert_eq!(row(&buf, 0), "┌──┐..");
        assert_eq!(row(&buf, 1), "│..│..");
        assert_eq!(row(&buf, 2), "└──┘..");

        let mut buf = ScreenBuffer::new(Vector::new(3, 3));
        buf.draw_border(Vector::new(0, 0), Vector::new(5, 5), Color::WHITE, BorderStyle::Single);
        // Right and bottom edges do not fit: no corners there.
        assert_eq!(symbol_at(&buf, 0, 0), Some('┌'));
        assert_eq!(symbol_at(&buf, 2, 0), None);
        assert_eq!(symbol_at(&buf, 0, 2), None);
        assert_eq!(symbol_at(&buf, 2, 2), None);
    }

    #[test]
    fn test_clear_rect_marks_cleared() {
        let mut buf = ScreenBuffer::new(Vector::new(3, 2));
        buf.draw_rect(Vector::ZERO, Vector::new(3, 2), Color::BLUE, ' ');
        buf.clear_rect(Vector::new(1, 0), Vector::new(5, 1));
        assert!(!buf.get(0, 0).unwrap().is_cleared());
        assert!(buf.get(1, 0).unwrap().is_cleared());
        assert!(buf.get(2, 0).unwrap().is_cleared());
        assert!(!buf.get(1, 1).unwrap().is_cleared());

        buf.clear_at(0, 1);
        buf.clear_at(9, 9);
        assert!(buf.get(0, 1).unwrap().is_cleared());
    }

    #[test]
    fn test_draw_buffer_negative_origin() {
        let mut block = PixelBuffer::new(3, 1);
        *block.get_mut(0, 0).unwrap() = Pixel::glyph('a', Color::WHITE, Color::Empty, TextMode::DEFAULT);
        *block.get_mut(1, 0).unwrap() = Pixel::glyph('b', Color::WHITE, Color::Empty, TextMode::DEFAULT);
        *block.get_mut(2, 0).unwrap() = Pixel::glyph('c', Color::WHITE, Color::Empty, TextMode::DEFAULT);

        let mut buf = ScreenBuffer::new(Vector::new(4, 1));
        buf.draw_buffer(Vector::new(-1, 0), &block);
        assert_eq!(row(&buf, 0), "bc..");
    }

    #[test]
    fn test_draw_buffer_skips_empty_cells() {
        let mut block = PixelBuffer::new(3, 1);
        *block.get_mut(2, 0).unwrap() = Pixel::Cleared;

        let mut buf = ScreenBuffer::new(Vector::new(3, 1));
        buf.print(0, 0, "xyz", Color::WHITE, Color::Empty, Alignment::Left, TextMode::DEFAULT);
        buf.draw_buffer(Vector::ZERO, &block);
        assert_eq!(row(&buf, 0), "xy.");
        assert!(buf.get(2, 0).unwrap().is_cleared());
    }

    #[test]
    fn test_resize_discards_both_grids() {
        let mut buf = ScreenBuffer::new(Vector::new(2, 2));
        buf.draw(0, 0, 'x', Color::RED, Color::Empty);
        buf.resize(Vector::new(3, 1));
        assert_eq!(buf.size(), Vector::new(3, 1));
        assert_eq!(buf.get(0, 0), Some(Pixel::Empty));
        assert_eq!(buf.last(0, 0), Some(Pixel::Empty));
        assert!(buf.is_unchanged());
    }
}

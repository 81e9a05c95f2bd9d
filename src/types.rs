//! Core types for gridterm.
//!
//! These types define the foundation that everything builds on: integer
//! geometry, colors, text modes and the pixel cell the renderer diffs.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

// =============================================================================
// Vector
// =============================================================================

/// Integer 2-D coordinate used for positions, sizes and directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

impl Vector {
    pub const ZERO: Self = Self::new(0, 0);
    pub const ONE: Self = Self::new(1, 1);
    pub const UP: Self = Self::new(0, -1);
    pub const DOWN: Self = Self::new(0, 1);
    pub const LEFT: Self = Self::new(-1, 0);
    pub const RIGHT: Self = Self::new(1, 0);

    /// Create a new vector.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// True when either component is zero or negative.
    #[inline]
    pub fn is_degenerate(self) -> bool {
        self.x <= 0 || self.y <= 0
    }
}

impl From<(i32, i32)> for Vector {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<(u16, u16)> for Vector {
    fn from((x, y): (u16, u16)) -> Self {
        Self::new(i32::from(x), i32::from(y))
    }
}

impl Add for Vector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<i32> for Vector {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<i32> for Vector {
    type Output = Self;
    fn div(self, rhs: i32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

// =============================================================================
// Color
// =============================================================================

/// A true-color value or the `Empty` sentinel.
///
/// `Empty` means "do not overwrite whatever color the cell already has".
/// Equality is structural, so colors can key the escape sequence caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Empty,
    Rgb {
        r: u8,
        g: u8,
        b: u8,
    },
}

impl Color {
    /// Create an RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb { r, g, b }
    }

    // Standard colors
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const GRAY: Self = Self::rgb(128, 128, 128);
    pub const DARK_GRAY: Self = Self::rgb(169, 169, 169);

    /// Check for the `Empty` sentinel.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// `self`, unless it is `Empty`, in which case `fallback`.
    #[inline]
    pub const fn or(self, fallback: Self) -> Self {
        match self {
            Self::Empty => fallback,
            color => color,
        }
    }

    /// Build from a packed `0xRRGGBB` integer.
    pub const fn from_rgb_int(rgb: u32) -> Self {
        Self::rgb(((rgb >> 16) & 0xff) as u8, ((rgb >> 8) & 0xff) as u8, (rgb & 0xff) as u8)
    }
}

// =============================================================================
// Text Mode (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// SGR text modes for a cell. Combine with bitwise OR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextMode: u8 {
        const DEFAULT = 0;
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const DOUBLE_UNDERLINE = 1 << 3;
        const OVERLINE = 1 << 4;
        const STRIKETHROUGH = 1 << 5;
    }
}

impl TextMode {
    /// SGR parameter for each individual mode, in emission order.
    pub const SGR_CODES: [(TextMode, u8); 6] = [
        (TextMode::BOLD, 1),
        (TextMode::ITALIC, 3),
        (TextMode::UNDERLINE, 4),
        (TextMode::DOUBLE_UNDERLINE, 21),
        (TextMode::OVERLINE, 53),
        (TextMode::STRIKETHROUGH, 9),
    ];
}

// =============================================================================
// Pixel - The atomic unit of terminal rendering
// =============================================================================

/// Visible content of a drawn cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Glyph {
    pub symbol: char,
    pub fg: Color,
    pub bg: Color,
    pub mode: TextMode,
}

/// One screen cell.
///
/// `Cleared` marks a cell to be blanked on the next flush; the flush turns it
/// into `Empty`, which is already blank and is never emitted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Pixel {
    #[default]
    Empty,
    Cleared,
    Drawn(Glyph),
}

impl Pixel {
    /// A drawn cell.
    pub const fn glyph(symbol: char, fg: Color, bg: Color, mode: TextMode) -> Self {
        Self::Drawn(Glyph { symbol, fg, bg, mode })
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[inline]
    pub const fn is_cleared(&self) -> bool {
        matches!(self, Self::Cleared)
    }

    /// Foreground and background currently held by the cell.
    #[inline]
    pub const fn colors(&self) -> (Color, Color) {
        match self {
            Self::Drawn(glyph) => (glyph.fg, glyph.bg),
            _ => (Color::Empty, Color::Empty),
        }
    }
}

// =============================================================================
// PixelBuffer
// =============================================================================

/// An owned rectangular block of pixels, blitted with `ScreenBuffer::draw_buffer`.
///
/// Row-major storage: `index = y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    size: Vector,
    data: Vec<Pixel>,
}

impl PixelBuffer {
    pub fn new(width: i32, height: i32) -> Self {
        let size = Vector::new(width.max(0), height.max(0));
        Self {
            size,
            data: vec![Pixel::Empty; (size.x * size.y) as usize],
        }
    }

    #[inline]
    pub fn size(&self) -> Vector {
        self.size
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.size.x && y < self.size.y).then(|| (y * self.size.x + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Pixel> {
        self.index(x, y).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Pixel> {
        self.index(x, y).map(|i| &mut self.data[i])
    }

    /// Reallocate at a new size, discarding content.
    pub fn resize(&mut self, size: Vector) {
        *self = Self::new(size.x, size.y);
    }

    /// Fill every cell with a blank symbol in the given colors.
    pub fn fill(&mut self, fg: Color, bg: Color) {
        for pixel in &mut self.data {
            *pixel = Pixel::glyph(' ', fg, bg, TextMode::DEFAULT);
        }
    }
}

// =============================================================================
// Alignment
// =============================================================================

/// Horizontal anchoring of printed text relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

// =============================================================================
// Border and grid line glyphs
// =============================================================================

/// Box-drawing style for `ScreenBuffer::draw_border`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Single,
    Double,
    Rounded,
    Bold,
}

impl BorderStyle {
    /// Returns (horizontal, vertical, top-left, top-right, bottom-left, bottom-right).
    pub const fn chars(&self) -> (char, char, char, char, char, char) {
        match self {
            Self::Single => ('─', '│', '┌', '┐', '└', '┘'),
            Self::Double => ('═', '║', '╔', '╗', '╚', '╝'),
            Self::Rounded => ('─', '│', '╭', '╮', '╰', '╯'),
            Self::Bold => ('━', '┃', '┏', '┓', '┗', '┛'),
        }
    }
}

/// Pieces a grid line is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineFragment {
    Horizontal,
    Vertical,
    Cross,
    /// `┤`: vertical with an arm to the left.
    TLeft,
    /// `├`: vertical with an arm to the right.
    TRight,
    /// `┴`: horizontal with an arm up.
    TUp,
    /// `┬`: horizontal with an arm down.
    TDown,
}

/// Line style for grid lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridLineStyle {
    #[default]
    Single,
    Double,
    Bold,
}

impl GridLineStyle {
    pub const fn symbol(&self, fragment: LineFragment) -> char {
        use LineFragment as F;
        match self {
            Self::Single => match fragment {
                F::Horizontal => '─',
                F::Vertical => '│',
                F::Cross => '┼',
                F::TLeft => '┤',
                F::TRight => '├',
                F::TUp => '┴',
                F::TDown => '┬',
            },
            Self::Double => match fragment {
                F::Horizontal => '═',
                F::Vertical => '║',
                F::Cross => '╬',
                F::TLeft => '╣',
                F::TRight => '╠',
                F::TUp => '╩',
                F::TDown => '╦',
            },
            Self::Bold => match fragment {
                F::Horizontal => '━',
                F::Vertical => '┃',
                F::Cross => '╋',
                F::TLeft => '┫',
                F::TRight => '┣',
                F::TUp => '┻',
                F::TDown => '┳',
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

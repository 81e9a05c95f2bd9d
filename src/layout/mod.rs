//! Grid layout engine.
//!
//! - [`track`]: columns and rows, offsets and water-filling
//! - [`grid`]: entries, validated placement, sizing and alignment
//! - [`lines`]: grid line segments and junction glyphs

pub mod grid;
pub mod lines;
pub mod track;

pub use grid::{EntryId, Grid, GridEntry, GridSizing, HorizontalAlignment, LayoutElement, VerticalAlignment};
pub use lines::{GridLines, LineSegment};
pub use track::{Track, TrackList};

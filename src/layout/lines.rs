//! Grid line geometry.
//!
//! Lines run through the padding cells between tracks. Each line is split
//! into per-track segments held in two masks; a spanning entry switches off
//! the segments inside its footprint. Runs of live segments become
//! [`LineSegment`]s, and the crossing points get a junction glyph picked from
//! the arms that are still present.

use super::track::TrackList;
use crate::renderer::ScreenBuffer;
use crate::types::{Color, GridLineStyle, LineFragment, Vector};

/// A straight run of line cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub position: Vector,
    /// `Vector::DOWN` or `Vector::RIGHT`.
    pub direction: Vector,
    pub length: i32,
}

/// Computed line geometry, relative to the grid's content origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLines {
    pub segments: Vec<LineSegment>,
    pub junctions: Vec<(Vector, LineFragment)>,
}

/// A spanning entry footprint: column, row, column span, row span.
pub type SpanArea = (usize, usize, usize, usize);

impl GridLines {
    pub fn compute(columns: &TrackList, rows: &TrackList, spans: &[SpanArea]) -> Self {
        let cols = columns.len();
        let rows_n = rows.len();
        if cols == 0 || rows_n == 0 {
            return Self::default();
        }

        // vertical[c][r]: line right of column c, alongside row r.
        let mut vertical = vec![vec![true; rows_n]; cols.saturating_sub(1)];
        // horizontal[c][r]: line below row r, alongside column c.
        let mut horizontal = vec![vec![true; rows_n.saturating_sub(1)]; cols];

        for &(column, row, column_span, row_span) in spans {
            for c in column..column + column_span.saturating_sub(1) {
                for r in row..row + row_span {
                    if let Some(cell) = vertical.get_mut(c).and_then(|v| v.get_mut(r)) {
                        *cell = false;
                    }
                }
            }
            for c in column..column + column_span {
                for r in row..row + row_span.saturating_sub(1) {
                    if let Some(cell) = horizontal.get_mut(c).and_then(|h| h.get_mut(r)) {
                        *cell = false;
                    }
                }
            }
        }

        let mut lines = Self::default();

        for (c, mask) in vertical.iter().enumerate() {
            let x = columns.end_offset(c);
            for (first, last) in runs(mask) {
                let y = rows.offset(first);
                lines.segments.push(LineSegment {
                    position: Vector::new(x, y),
                    direction: Vector::DOWN,
                    length: rows.end_offset(last) - y,
                });
            }
        }

        for r in 0..rows_n.saturating_sub(1) {
            let y = rows.end_offset(r);
            let mask: Vec<bool> = horizontal.iter().map(|h| h[r]).collect();
            for (first, last) in runs(&mask) {
                let x = columns.offset(first);
                lines.segments.push(LineSegment {
                    position: Vector::new(x, y),
                    direction: Vector::RIGHT,
                    length: columns.end_offset(last) - x,
                });
            }
        }

        for c in 0..cols.saturating_sub(1) {
            for r in 0..rows_n.saturating_sub(1) {
                let up = vertical[c][r];
                let down = vertical[c][r + 1];
                let left = horizontal[c][r];
                let right = horizontal[c + 1][r];
                if let Some(fragment) = junction(up, down, left, right) {
                    lines
                        .junctions
                        .push((Vector::new(columns.end_offset(c), rows.end_offset(r)), fragment));
                }
            }
        }

        lines
    }

    /// Draw the lines with their top-left content corner at `origin`.
    pub fn draw(&self, buffer: &mut ScreenBuffer, origin: Vector, style: GridLineStyle, color: Color) {
        for segment in &self.segments {
            let fragment = if segment.direction == Vector::DOWN {
                LineFragment::Vertical
            } else {
                LineFragment::Horizontal
            };
            buffer.draw_line(
                origin + segment.position,
                segment.direction,
                segment.length,
                color,
                Color::Empty,
                style.symbol(fragment),
            );
        }
        for &(position, fragment) in &self.junctions {
            let at = origin + position;
            buffer.draw(at.x, at.y, style.symbol(fragment), color, Color::Empty);
        }
    }
}

/// Inclusive index ranges of consecutive `true` values.
fn runs(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, &on) in mask.iter().enumerate() {
        match (on, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, mask.len() - 1));
    }
    out
}

/// Junction glyph for the arms present at a crossing point.
///
/// Straight-through crossings are already covered by the merged runs and
/// lone arms just end, so neither gets a glyph. Corners have no glyph of
/// their own and use the cross.
fn junction(up: bool, down: bool, left: bool, right: bool) -> Option<LineFragment> {
    match (up, down, left, right) {
        (true, true, true, true) => Some(LineFragment::Cross),
        (true, true, true, false) => Some(LineFragment::TLeft),
        (true, true, false, true) => Some(LineFragment::TRight),
        (true, false, true, true) => Some(LineFragment::TUp),
        (false, true, true, true) => Some(LineFragment::TDown),
        (true, true, false, false) | (false, false, true, true) => None,
        (u, d, l, r) if (u || d) && (l || r) => Some(LineFragment::Cross),
        _ => None,
    }
}

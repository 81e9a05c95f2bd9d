//! Grid container layout.
//!
//! Elements are placed at a column and row with a span. [`Grid::layout`]
//! sizes the tracks from what the elements require, then hands each element
//! its resolved position and size.
//!
//! # Sizing
//!
//! 1. Auto tracks take the largest requirement among entries spanning only
//!    that track. Fixed tracks keep their size.
//! 2. Spanning entries then water-fill their auto members toward their
//!    requirement, in placement order.
//! 3. In [`GridSizing::Fill`] the tracks are finally fitted to the size set
//!    with [`Grid::set_size`]; in [`GridSizing::Content`] the grid takes the
//!    size of its tracks.
//!
//! The grid holds its elements weakly. An entry whose element was dropped is
//! pruned on the next layout.

use std::sync::{Arc, Weak};

use slotmap::SlotMap;

use super::lines::{GridLines, SpanArea};
use super::track::{Track, TrackList};
use crate::error::LayoutError;
use crate::renderer::ScreenBuffer;
use crate::types::{Color, GridLineStyle, Vector};

slotmap::new_key_type! {
    /// Handle of a grid entry.
    pub struct EntryId;
}

/// What the grid needs from an element it places.
pub trait LayoutElement: Send + Sync {
    /// Size the element needs, without outer padding.
    fn required_size(&self) -> Vector;

    /// Receive the resolved geometry.
    fn apply_geometry(&self, position: Vector, size: Vector);

    /// Space kept free around the element on each side.
    fn outer_padding(&self) -> Vector {
        Vector::ZERO
    }

    /// Fill the whole span instead of keeping the required size.
    fn stretches(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridSizing {
    /// The grid shrinks or grows to its content.
    #[default]
    Content,
    /// Tracks are fitted to the size set on the grid.
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlignment {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// One placed element.
pub struct GridEntry {
    element: Weak<dyn LayoutElement>,
    pub column: usize,
    pub row: usize,
    pub column_span: usize,
    pub row_span: usize,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
}

impl GridEntry {
    pub fn element(&self) -> Option<Arc<dyn LayoutElement>> {
        self.element.upgrade()
    }

    pub fn is_multi_cell(&self) -> bool {
        self.column_span > 1 || self.row_span > 1
    }

    fn holds(&self, ptr: *const ()) -> bool {
        self.element.as_ptr() as *const () == ptr
    }
}

impl std::fmt::Debug for GridEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridEntry")
            .field("column", &self.column)
            .field("row", &self.row)
            .field("column_span", &self.column_span)
            .field("row_span", &self.row_span)
            .field("alive", &(self.element.strong_count() > 0))
            .finish()
    }
}

/// A grid container.
#[derive(Debug)]
pub struct Grid {
    origin: Vector,
    requested_size: Vector,
    size: Vector,
    inner_padding: Vector,
    sizing: GridSizing,
    columns: TrackList,
    rows: TrackList,
    entries: SlotMap<EntryId, GridEntry>,
    /// Placement order, used for span processing.
    order: Vec<EntryId>,
    lines: Option<GridLines>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Self {
            origin: Vector::ZERO,
            requested_size: Vector::ZERO,
            size: Vector::ZERO,
            inner_padding: Vector::ONE,
            sizing: GridSizing::Content,
            columns: TrackList::new(),
            rows: TrackList::new(),
            entries: SlotMap::with_key(),
            order: Vec::new(),
            lines: None,
        }
    }

    pub fn with_sizing(mut self, sizing: GridSizing) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn sizing(&self) -> GridSizing {
        self.sizing
    }

    /// Point element positions are computed from. Zero gives positions
    /// local to the grid.
    pub fn set_origin(&mut self, origin: Vector) {
        self.origin = origin;
    }

    pub fn origin(&self) -> Vector {
        self.origin
    }

    pub fn set_inner_padding(&mut self, padding: Vector) {
        self.inner_padding = padding;
        self.lines = None;
    }

    pub fn inner_padding(&self) -> Vector {
        self.inner_padding
    }

    /// Request an outer size. Only [`GridSizing::Fill`] grids follow it.
    pub fn set_size(&mut self, size: Vector) {
        self.requested_size = size;
    }

    /// Outer size after the last layout.
    pub fn size(&self) -> Vector {
        self.size
    }

    pub fn add_column(&mut self, track: Track) {
        self.columns.push(track);
        self.lines = None;
    }

    pub fn add_row(&mut self, track: Track) {
        self.rows.push(track);
        self.lines = None;
    }

    pub fn columns(&self) -> &TrackList {
        &self.columns
    }

    pub fn rows(&self) -> &TrackList {
        &self.rows
    }

    pub fn entry(&self, id: EntryId) -> Option<&GridEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &GridEntry)> {
        self.order.iter().filter_map(|&id| Some((id, self.entries.get(id)?)))
    }

    fn find<E: LayoutElement + 'static>(&self, element: &Arc<E>) -> Option<EntryId> {
        let ptr = Arc::as_ptr(element) as *const ();
        self.order
            .iter()
            .copied()
            .find(|&id| self.entries.get(id).is_some_and(|entry| entry.holds(ptr)))
    }

    fn insert<E: LayoutElement + 'static>(
        &mut self,
        element: &Arc<E>,
        entry: impl FnOnce(Weak<dyn LayoutElement>) -> GridEntry,
    ) -> EntryId {
        let element: Arc<dyn LayoutElement> = element.clone();
        let weak = Arc::downgrade(&element);
        let id = self.entries.insert(entry(weak));
        self.order.push(id);
        id
    }

    /// Place `element` at `column`, `row`. A new element gets a 1x1 span;
    /// a placed one keeps its span.
    pub fn set_column_and_row<E: LayoutElement + 'static>(
        &mut self,
        element: &Arc<E>,
        column: i32,
        row: i32,
    ) -> Result<EntryId, LayoutError> {
        let columns = self.columns.len();
        let rows = self.rows.len();
        let invalid_column = LayoutError::InvalidColumn { value: column, count: columns };
        let invalid_row = LayoutError::InvalidRow { value: row, count: rows };

        if column < 0 || column as usize >= columns {
            return Err(invalid_column);
        }
        if row < 0 || row as usize >= rows {
            return Err(invalid_row);
        }
        let (column, row) = (column as usize, row as usize);

        let id = match self.find(element) {
            Some(id) => {
                let entry = self.entries.get_mut(id).ok_or(LayoutError::UnknownEntry)?;
                if column + entry.column_span > columns {
                    return Err(invalid_column);
                }
                if row + entry.row_span > rows {
                    return Err(invalid_row);
                }
                entry.column = column;
                entry.row = row;
                id
            }
            None => self.insert(element, |element| GridEntry {
                element,
                column,
                row,
                column_span: 1,
                row_span: 1,
                horizontal: HorizontalAlignment::default(),
                vertical: VerticalAlignment::default(),
            }),
        };
        self.lines = None;
        Ok(id)
    }

    /// Set the span of `element`. A new element is placed at column 0, row 0.
    pub fn set_span<E: LayoutElement + 'static>(
        &mut self,
        element: &Arc<E>,
        column_span: i32,
        row_span: i32,
    ) -> Result<EntryId, LayoutError> {
        let columns = self.columns.len();
        let rows = self.rows.len();
        let invalid_column_span = LayoutError::InvalidColumnSpan {
            value: column_span,
            count: columns,
        };
        let invalid_row_span = LayoutError::InvalidRowSpan {
            value: row_span,
            count: rows,
        };

        if column_span < 1 || column_span as usize > columns {
            return Err(invalid_column_span);
        }
        if row_span < 1 || row_span as usize > rows {
            return Err(invalid_row_span);
        }
        let (column_span, row_span) = (column_span as usize, row_span as usize);

        let id = match self.find(element) {
            Some(id) => {
                let entry = self.entries.get_mut(id).ok_or(LayoutError::UnknownEntry)?;
                if entry.column + column_span > columns {
                    return Err(invalid_column_span);
                }
                if entry.row + row_span > rows {
                    return Err(invalid_row_span);
                }
                entry.column_span = column_span;
                entry.row_span = row_span;
                id
            }
            None => self.insert(element, |element| GridEntry {
                element,
                column: 0,
                row: 0,
                column_span,
                row_span,
                horizontal: HorizontalAlignment::default(),
                vertical: VerticalAlignment::default(),
            }),
        };
        self.lines = None;
        Ok(id)
    }

    pub fn set_alignment(
        &mut self,
        id: EntryId,
        horizontal: HorizontalAlignment,
        vertical: VerticalAlignment,
    ) -> Result<(), LayoutError> {
        let entry = self.entries.get_mut(id).ok_or(LayoutError::UnknownEntry)?;
        entry.horizontal = horizontal;
        entry.vertical = vertical;
        Ok(())
    }

    pub fn remove(&mut self, id: EntryId) -> Result<(), LayoutError> {
        self.entries.remove(id).ok_or(LayoutError::UnknownEntry)?;
        self.order.retain(|&other| other != id);
        self.lines = None;
        Ok(())
    }

    /// Drop entries whose element no longer exists.
    fn prune(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.element.strong_count() > 0);
        if self.entries.len() != before {
            let entries = &self.entries;
            self.order.retain(|&id| entries.contains_key(id));
            self.lines = None;
            tracing::debug!(pruned = before - self.entries.len(), "pruned dead grid entries");
        }
    }

    /// Size the tracks, position every element and return the outer size.
    pub fn layout(&mut self) -> Vector {
        self.prune();

        let live: Vec<(SpanArea, Vector, Arc<dyn LayoutElement>, HorizontalAlignment, VerticalAlignment)> = self
            .order
            .iter()
            .filter_map(|&id| {
                let entry = self.entries.get(id)?;
                let element = entry.element()?;
                let padded = element.required_size() + element.outer_padding() * 2;
                Some((
                    (entry.column, entry.row, entry.column_span, entry.row_span),
                    padded,
                    element,
                    entry.horizontal,
                    entry.vertical,
                ))
            })
            .collect();

        let column_needs: Vec<(usize, usize, i32)> = live.iter().map(|((c, _, cs, _), p, ..)| (*c, *cs, p.x)).collect();
        let row_needs: Vec<(usize, usize, i32)> = live.iter().map(|((_, r, _, rs), p, ..)| (*r, *rs, p.y)).collect();
        size_tracks(&mut self.columns, &column_needs);
        size_tracks(&mut self.rows, &row_needs);

        if self.sizing == GridSizing::Fill {
            let content = self.requested_size - self.inner_padding * 2;
            self.columns.fit_size(content.x);
            self.rows.fit_size(content.y);
        }

        self.size = Vector::new(self.columns.total_size(), self.rows.total_size()) + self.inner_padding * 2;

        let content_origin = self.origin + self.inner_padding;
        for ((column, row, column_span, row_span), padded, element, horizontal, vertical) in &live {
            let cell = content_origin + Vector::new(self.columns.offset(*column), self.rows.offset(*row));
            let span = Vector::new(
                self.columns.span_size(*column, *column_span),
                self.rows.span_size(*row, *row_span),
            );
            let padding = element.outer_padding();

            if element.stretches() {
                let size = (span - padding * 2).max(Vector::ZERO);
                element.apply_geometry(cell + padding, size);
                continue;
            }

            let free = (span - *padded).max(Vector::ZERO);
            let nudge = Vector::new(
                match horizontal {
                    HorizontalAlignment::Left => 0,
                    HorizontalAlignment::Middle => free.x / 2,
                    HorizontalAlignment::Right => free.x,
                },
                match vertical {
                    VerticalAlignment::Top => 0,
                    VerticalAlignment::Middle => free.y / 2,
                    VerticalAlignment::Bottom => free.y,
                },
            );
            element.apply_geometry(cell + nudge + padding, element.required_size());
        }

        self.lines = None;
        tracing::trace!(size = ?self.size, entries = live.len(), "grid layout");
        self.size
    }

    /// Line geometry, recomputed after structural changes.
    pub fn lines(&mut self) -> &GridLines {
        if self.lines.is_none() {
            let spans: Vec<SpanArea> = self
                .entries()
                .filter(|(_, entry)| entry.is_multi_cell() && entry.element.strong_count() > 0)
                .map(|(_, entry)| (entry.column, entry.row, entry.column_span, entry.row_span))
                .collect();
            self.lines = Some(GridLines::compute(&self.columns, &self.rows, &spans));
        }
        self.lines.get_or_insert_with(GridLines::default)
    }

    /// Draw the grid lines with the grid's top-left corner at `position`.
    pub fn draw_lines(&mut self, buffer: &mut ScreenBuffer, position: Vector, style: GridLineStyle, color: Color) {
        let origin = position + self.inner_padding;
        self.lines().draw(buffer, origin, style, color);
    }
}

/// Size one axis: single-track maxima first, then spans by water-filling.
fn size_tracks(tracks: &mut TrackList, needs: &[(usize, usize, i32)]) {
    for track in tracks.iter_mut().filter(|t| t.auto_size) {
        track.size = 0;
        track.min_size = 0;
    }

    for &(start, _, need) in needs.iter().filter(|(_, span, _)| *span == 1) {
        if let Some(track) = tracks.get_mut(start).filter(|t| t.auto_size) {
            track.size = track.size.max(need);
            track.min_size = track.size;
        }
    }

    for &(start, span, need) in needs.iter().filter(|(_, span, _)| *span > 1) {
        tracks.match_span(start, span, need);
        for index in start..start + span {
            if let Some(track) = tracks.get_mut(index) {
                track.min_size = track.size;
            }
        }
    }
}

//! Grid tracks (columns and rows) and water-filling.
//!
//! Tracks sit next to each other with one padding cell between neighbours.
//! Resizing moves one unit at a time: growth goes to the currently smallest
//! auto track, shrinking takes from the currently largest, so the tracks
//! stay as even as possible.

/// One column or row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    pub size: i32,
    /// Auto tracks are sized by content; fixed tracks keep `size`.
    pub auto_size: bool,
    /// Lower bound for water-filling. Set by layout from content.
    pub min_size: i32,
}

impl Track {
    /// A track of `size` cells. Size 0 means auto-sized.
    pub const fn new(size: i32) -> Self {
        Self {
            size,
            auto_size: size == 0,
            min_size: 0,
        }
    }

    pub const fn auto() -> Self {
        Self::new(0)
    }

    /// A fixed track. A fixed track of 0 cells stays empty.
    pub const fn fixed(size: i32) -> Self {
        Self {
            size,
            auto_size: false,
            min_size: 0,
        }
    }
}

/// An ordered list of tracks along one axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackList {
    tracks: Vec<Track>,
}

impl TrackList {
    /// Cells between two neighbouring tracks.
    pub const PADDING: i32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sizes(sizes: &[i32]) -> Self {
        Self {
            tracks: sizes.iter().map(|&size| Track::new(size)).collect(),
        }
    }

    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.iter_mut()
    }

    pub fn sizes(&self) -> Vec<i32> {
        self.tracks.iter().map(|t| t.size).collect()
    }

    fn size_of(&self, index: usize) -> i32 {
        self.tracks.get(index).map_or(0, |t| t.size)
    }

    /// Total padding: one cell between each pair of tracks.
    pub fn total_padding(&self) -> i32 {
        if self.tracks.len() >= 2 {
            (self.tracks.len() as i32 - 1) * Self::PADDING
        } else {
            0
        }
    }

    /// Start of track `index` relative to the first track.
    pub fn offset(&self, index: usize) -> i32 {
        self.tracks
            .iter()
            .take(index)
            .map(|t| t.size + Self::PADDING)
            .sum()
    }

    /// One past the last cell of track `index`: where the following padding cell sits.
    pub fn end_offset(&self, index: usize) -> i32 {
        self.offset(index) + self.size_of(index)
    }

    /// Length of `count` tracks from `start`, padding between them included.
    pub fn span_size(&self, start: usize, count: usize) -> i32 {
        let end = (start + count).min(self.tracks.len());
        if start >= end {
            return 0;
        }
        let sum: i32 = self.tracks[start..end].iter().map(|t| t.size).sum();
        sum + (end - start - 1) as i32 * Self::PADDING
    }

    /// All tracks plus padding.
    pub fn total_size(&self) -> i32 {
        self.span_size(0, self.tracks.len())
    }

    /// Grow or shrink the auto tracks so the list totals `target`.
    ///
    /// Stops early when every auto track is at its minimum. Returns the total
    /// reached.
    pub fn fit_size(&mut self, target: i32) -> i32 {
        let all: Vec<usize> = (0..self.tracks.len()).collect();
        let total = self.total_size();
        total + self.water_fill(&all, target - total)
    }

    /// Grow or shrink the auto tracks of a span so it covers `target`.
    ///
    /// Returns the span length reached.
    pub fn match_span(&mut self, start: usize, count: usize, target: i32) -> i32 {
        let end = (start + count).min(self.tracks.len());
        let members: Vec<usize> = (start..end).collect();
        let current = self.span_size(start, count);
        current + self.water_fill(&members, target - current)
    }

    /// Move `delta` units into (or out of) the auto tracks among `members`.
    fn water_fill(&mut self, members: &[usize], delta: i32) -> i32 {
        let auto: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&i| self.tracks[i].auto_size)
            .collect();
        if auto.is_empty() {
            return 0;
        }

        let mut moved = 0;
        if delta > 0 {
            while moved < delta {
                // Smallest wins; the last of equals takes the unit.
                let Some(&i) = auto.iter().rev().min_by_key(|&&i| self.tracks[i].size) else {
                    break;
                };
                self.tracks[i].size += 1;
                moved += 1;
            }
        } else {
            while moved > delta {
                // Largest above its minimum loses; the first of equals gives the unit.
                let Some(&i) = auto
                    .iter()
                    .filter(|&&i| self.tracks[i].size > self.tracks[i].min_size)
                    .rev()
                    .max_by_key(|&&i| self.tracks[i].size)
                else {
                    break;
                };
                self.tracks[i].size -= 1;
                moved -= 1;
            }
        }
        moved
    }
}

impl std::ops::Index<usize> for TrackList {
    type Output = Track;

    fn index(&self, index: usize) -> &Track {
        &self.tracks[index]
    }
}

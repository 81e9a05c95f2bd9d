//! Memoized escape sequences.
//!
//! The same colors, coordinates and modes recur frame after frame, so each
//! conversion is formatted once and looked up afterwards.

use std::hash::Hash;
use std::io::{self, Write};

use rustc_hash::FxHashMap;

/// A value -> escape bytes memo table.
pub struct SequenceCache<K> {
    entries: FxHashMap<K, Box<[u8]>>,
    encode: fn(&mut Vec<u8>, &K) -> io::Result<()>,
}

impl<K: Eq + Hash + Copy> SequenceCache<K> {
    pub fn new(encode: fn(&mut Vec<u8>, &K) -> io::Result<()>) -> Self {
        Self {
            entries: FxHashMap::default(),
            encode,
        }
    }

    /// Write the sequence for `key`, formatting it on first use.
    pub fn write_to<W: Write + ?Sized>(&mut self, w: &mut W, key: K) -> io::Result<()> {
        if let Some(bytes) = self.entries.get(&key) {
            return w.write_all(bytes);
        }
        let mut bytes = Vec::with_capacity(24);
        (self.encode)(&mut bytes, &key)?;
        w.write_all(&bytes)?;
        self.entries.insert(key, bytes.into_boxed_slice());
        Ok(())
    }
}

impl<K> std::fmt::Debug for SequenceCache<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceCache").field("entries", &self.entries.len()).finish()
    }
}

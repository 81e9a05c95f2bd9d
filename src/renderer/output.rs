//! Output buffering.
//!
//! A frame is accumulated in memory and written to the terminal in bounded
//! chunks, so a full redraw never becomes one unbounded write.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Default number of bytes per write.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

// =============================================================================
// OutputBuffer
// =============================================================================

/// A buffer that accumulates output for batch writing.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Vec<u8>,
    chunk_size: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    /// Create a new output buffer with the default chunk size.
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a buffer that flushes `chunk_size` bytes per write.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            data: Vec::with_capacity(16384),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Write a string.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
    }

    /// Flush buffer to a writer in `chunk_size` pieces, then flush the writer.
    ///
    /// The buffer is emptied even when the write fails part way.
    pub fn flush_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        let result = self
            .data
            .chunks(self.chunk_size)
            .try_for_each(|chunk| writer.write_all(chunk))
            .and_then(|()| writer.flush());
        self.data.clear();
        result
    }

    /// Flush buffer to stdout (blocking).
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        self.flush_to(&mut stdout)
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(()) // Buffering only - real flush via flush_to
    }
}

// =============================================================================
// CaptureWriter
// =============================================================================

/// A cloneable in-memory sink, for running the renderer without a terminal.
#[derive(Debug, Clone, Default)]
pub struct CaptureWriter {
    data: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything written so far.
    pub fn take(&self) -> String {
        String::from_utf8_lossy(&std::mem::take(&mut *self.data.lock())).into_owned()
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

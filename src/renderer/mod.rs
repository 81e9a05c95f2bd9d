//! Terminal renderer - the output layer.
//!
//! The renderer knows only about pixels. Paint callbacks draw into the
//! [`ScreenBuffer`]; [`DiffRenderer::flush`] turns the difference against the
//! previous frame into the smallest stream of terminal output it can.
//!
//! # Backends
//!
//! - **ANSI** ([`AnsiBackend`]): escape sequences with memoized conversions
//! - **Native** ([`NativeBackend`]): crossterm commands, console API on legacy
//!   Windows consoles

pub mod ansi;
pub mod backend;
pub mod buffer;
pub mod cache;
pub mod diff;
pub mod output;

// Re-exports for convenience
pub use backend::{create_backend, select_display_mode, AnsiBackend, Backend, DisplayMode, NativeBackend, StreakStyle};
pub use buffer::ScreenBuffer;
pub use cache::SequenceCache;
pub use diff::DiffRenderer;
pub use output::{CaptureWriter, OutputBuffer};

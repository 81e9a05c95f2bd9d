//! # gridterm
//!
//! Double-buffered terminal UI runtime.
//!
//! ## Architecture
//!
//! Widgets paint into a virtual [`ScreenBuffer`]; the [`DiffRenderer`]
//! compares it with the previous frame and writes only the changed cells,
//! grouped into streaks, through an ANSI or native [`Backend`]. A display
//! thread ticks at a fixed rate while an input thread turns terminal events
//! into typed mouse, keyboard and focus events for the controls under the
//! cursor.
//!
//! ```text
//! InputSource → InputLoop → Dispatcher → Control handlers
//!                                ↓
//!                  ControlRegistry / RenderRegistry
//!                                ↓
//! DisplayLoop → paint → ScreenBuffer → DiffRenderer → terminal
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Vector, Color, Pixel, text modes, border and line glyphs
//! - [`renderer`] - Screen buffer, diff flush, ANSI and native backends
//! - [`engine`] - Nodes, the Visual/Control traits, registries
//! - [`input`] - Input records, decoding, hit-testing, focus, bubbling
//! - [`layout`] - Grid layout with auto-sized tracks and grid lines
//! - [`pipeline`] - The [`Engine`], its loop threads and terminal setup
//! - [`config`], [`error`], [`logging`] - Ambient plumbing

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod layout;
pub mod logging;
pub mod pipeline;
pub mod renderer;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, LayoutError};

pub use engine::{Control, ControlState, NodeId, NodeView, PaintContext, Visual, ZIndexMode};

pub use input::{
    ChannelSource, CrosstermSource, FocusEventArgs, FocusEventType, InputRecord, InputSource, KeyCode, KeyModifiers,
    KeyRecord, KeyboardEventArgs, KeyboardEventType, MouseButtons, MouseEventArgs, MouseEventType, MouseRecord,
};

pub use layout::{Grid, GridSizing, HorizontalAlignment, LayoutElement, VerticalAlignment};

pub use pipeline::{Engine, TerminalSetup};

pub use renderer::{AnsiBackend, Backend, CaptureWriter, DiffRenderer, DisplayMode, NativeBackend, ScreenBuffer};

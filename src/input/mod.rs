//! Input layer - records, decoding and dispatch.
//!
//! - [`events`]: raw [`InputRecord`]s and the typed events controls receive
//! - [`reader`]: blocking [`InputSource`]s and the crossterm decoder
//! - [`dispatch`]: hit-testing, focus and bubbling

pub mod dispatch;
pub mod events;
pub mod reader;

pub use dispatch::{bubble_chain, Delivery, Dispatcher};
pub use events::{
    FocusEventArgs, FocusEventType, InputRecord, KeyCode, KeyModifiers, KeyRecord, KeyboardEventArgs,
    KeyboardEventType, MouseButtons, MouseEventArgs, MouseEventType, MouseFlags, MouseRecord, ScrollDirection,
};
pub use reader::{ChannelSource, CrosstermSource, InputSource, RecordDecoder};

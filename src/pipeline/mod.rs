//! Runtime pipeline
//!
//! Connects the registries to the terminal with two threads.
//!
//! ```text
//! InputSource → InputLoop → Engine::dispatch → Control handlers
//!                                 │
//!                         registries (locked)
//!                                 │
//! DisplayLoop → Engine::tick → paint → DiffRenderer::flush → terminal
//! ```
//!
//! The display loop ticks at the configured refresh rate and never waits on
//! input. The input loop blocks on its source and never waits on paint.
//! Either loop failing stops both and restores the terminal.

mod display;
mod input_loop;
pub mod setup;
pub mod terminal;

pub use setup::{CancelHandler, Engine};
pub use terminal::TerminalSetup;

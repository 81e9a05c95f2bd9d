//! Input loop thread.
//!
//! Blocks on the input source and dispatches each record. Handlers run on
//! this thread. A read error or a panicking handler fails the engine; a
//! closed source just ends the loop.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use super::setup::Engine;
use crate::error::EngineError;
use crate::input::InputSource;

pub(crate) struct InputLoop;

impl InputLoop {
    pub(crate) fn spawn(engine: Engine, source: Box<dyn InputSource>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("gridterm-input".into())
            .spawn(move || Self::run(engine, source))
    }

    fn run(engine: Engine, mut source: Box<dyn InputSource>) {
        tracing::info!("input loop started");

        while engine.input_active() {
            let record = match source.read() {
                Ok(record) => record,
                Err(_) if !engine.input_active() => break,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::info!(reason = %e, "input source closed");
                    engine.input_finished();
                    break;
                }
                Err(e) => {
                    engine.fail(EngineError::Io(e));
                    break;
                }
            };

            // Stopped while blocked in the read.
            if !engine.input_active() {
                break;
            }

            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| engine.dispatch(record))) {
                engine.fail(EngineError::from_panic(payload));
                break;
            }
        }

        tracing::info!("input loop stopped");
    }
}

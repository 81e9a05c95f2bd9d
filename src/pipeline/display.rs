//! Display loop thread.
//!
//! Ticks the engine at the configured refresh rate. A tick that fails or
//! panics takes the engine down through [`Engine::fail`].

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::setup::Engine;
use crate::error::EngineError;

pub(crate) struct DisplayLoop;

impl DisplayLoop {
    pub(crate) fn spawn(engine: Engine) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("gridterm-display".into())
            .spawn(move || Self::run(engine))
    }

    fn run(engine: Engine) {
        let frame_time = engine.config().frame_time();
        tracing::info!(?frame_time, "display loop started");

        while engine.display_active() {
            let started = Instant::now();

            match panic::catch_unwind(AssertUnwindSafe(|| engine.tick())) {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    engine.fail(EngineError::Io(e));
                    break;
                }
                Err(payload) => {
                    engine.fail(EngineError::from_panic(payload));
                    break;
                }
            }

            if let Some(remaining) = frame_time.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        tracing::info!(frames = engine.frame(), "display loop stopped");
    }
}

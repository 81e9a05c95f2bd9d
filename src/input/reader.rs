//! Input sources.
//!
//! The input loop blocks on [`InputSource::read`], one record at a time.
//! [`CrosstermSource`] reads the real console; [`ChannelSource`] feeds
//! records from another thread (tests, scripted input).

use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self as ct, Event, KeyEventKind, MouseEventKind};

use super::events::{InputRecord, KeyRecord, MouseButtons, MouseFlags, MouseRecord, ScrollDirection};
use crate::types::Vector;

/// A blocking source of input records.
pub trait InputSource: Send {
    /// Block until the next record is available.
    fn read(&mut self) -> io::Result<InputRecord>;
}

// =============================================================================
// RecordDecoder
// =============================================================================

/// Turns crossterm events into input records.
///
/// Terminals report button transitions, not button state, so the decoder
/// tracks which buttons are held. It also flags a second left press on the
/// same cell within the double-click interval.
#[derive(Debug)]
pub struct RecordDecoder {
    buttons: MouseButtons,
    double_click: Duration,
    last_left_press: Option<(Vector, Instant)>,
}

impl RecordDecoder {
    pub fn new(double_click: Duration) -> Self {
        Self {
            buttons: MouseButtons::empty(),
            double_click,
            last_left_press: None,
        }
    }

    /// Decode one event. Events without a record (focus, paste) yield `None`.
    pub fn decode(&mut self, event: Event) -> Option<InputRecord> {
        self.decode_at(event, Instant::now())
    }

    /// Decode one event as if it arrived at `now`.
    pub fn decode_at(&mut self, event: Event, now: Instant) -> Option<InputRecord> {
        match event {
            Event::Key(key) => Some(InputRecord::Key(KeyRecord {
                code: key.code,
                modifiers: key.modifiers,
                pressed: key.kind != KeyEventKind::Release,
            })),
            Event::Mouse(mouse) => Some(InputRecord::Mouse(self.decode_mouse(mouse, now))),
            Event::Resize(columns, rows) => Some(InputRecord::Resize(Vector::from((columns, rows)))),
            _ => None,
        }
    }

    fn decode_mouse(&mut self, mouse: ct::MouseEvent, now: Instant) -> MouseRecord {
        let position = Vector::from((mouse.column, mouse.row));
        let mut flags = MouseFlags::empty();
        let mut scroll = ScrollDirection::None;

        match mouse.kind {
            MouseEventKind::Down(button) => {
                let button = map_button(button);
                self.buttons.insert(button);
                if button == MouseButtons::LEFT {
                    match self.last_left_press {
                        Some((at, when)) if at == position && now.duration_since(when) <= self.double_click => {
                            flags.insert(MouseFlags::DOUBLE_CLICKED);
                            self.last_left_press = None;
                        }
                        _ => self.last_left_press = Some((position, now)),
                    }
                }
            }
            MouseEventKind::Up(button) => self.buttons.remove(map_button(button)),
            MouseEventKind::Drag(button) => {
                self.buttons.insert(map_button(button));
                flags.insert(MouseFlags::MOVED);
            }
            MouseEventKind::Moved => flags.insert(MouseFlags::MOVED),
            MouseEventKind::ScrollUp => {
                flags.insert(MouseFlags::WHEELED);
                scroll = ScrollDirection::Up;
            }
            MouseEventKind::ScrollDown => {
                flags.insert(MouseFlags::WHEELED);
                scroll = ScrollDirection::Down;
            }
            MouseEventKind::ScrollLeft => {
                flags.insert(MouseFlags::HORIZONTAL_WHEELED);
                scroll = ScrollDirection::Left;
            }
            MouseEventKind::ScrollRight => {
                flags.insert(MouseFlags::HORIZONTAL_WHEELED);
                scroll = ScrollDirection::Right;
            }
        }

        MouseRecord {
            position,
            buttons: self.buttons,
            flags,
            scroll,
            modifiers: mouse.modifiers,
        }
    }
}

fn map_button(button: ct::MouseButton) -> MouseButtons {
    match button {
        ct::MouseButton::Left => MouseButtons::LEFT,
        ct::MouseButton::Right => MouseButtons::RIGHT,
        ct::MouseButton::Middle => MouseButtons::MIDDLE,
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Reads the real console through crossterm.
pub struct CrosstermSource {
    decoder: RecordDecoder,
}

impl CrosstermSource {
    pub fn new(double_click: Duration) -> Self {
        Self {
            decoder: RecordDecoder::new(double_click),
        }
    }
}

impl InputSource for CrosstermSource {
    fn read(&mut self) -> io::Result<InputRecord> {
        loop {
            if let Some(record) = self.decoder.decode(ct::read()?) {
                return Ok(record);
            }
        }
    }
}

/// Records pushed through a channel. Reading fails once every sender is gone.
pub struct ChannelSource {
    rx: Receiver<InputRecord>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<InputRecord>) -> Self {
        Self { rx }
    }
}

impl InputSource for ChannelSource {
    fn read(&mut self) -> io::Result<InputRecord> {
        self.rx
            .recv()
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "input channel closed"))
    }
}

//! Input records and typed UI events.
//!
//! An [`InputRecord`] is one raw item read from the console: a mouse report,
//! a key press or release, or a window resize. The dispatcher turns records
//! into typed events ([`MouseEventType`], [`KeyboardEventType`],
//! [`FocusEventType`]) delivered to controls with mutable args.

pub use crossterm::event::{KeyCode, KeyModifiers};

use crate::engine::NodeId;
use crate::types::Vector;

// =============================================================================
// Raw records
// =============================================================================

bitflags::bitflags! {
    /// Mouse buttons held during a record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
    }
}

bitflags::bitflags! {
    /// What kind of mouse record this is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseFlags: u8 {
        const MOVED = 1 << 0;
        const DOUBLE_CLICKED = 1 << 1;
        const WHEELED = 1 << 2;
        const HORIZONTAL_WHEELED = 1 << 3;
    }
}

/// Wheel direction of a scroll record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollDirection {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

/// One mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseRecord {
    pub position: Vector,
    pub buttons: MouseButtons,
    pub flags: MouseFlags,
    pub scroll: ScrollDirection,
    pub modifiers: KeyModifiers,
}

impl Default for MouseRecord {
    fn default() -> Self {
        Self {
            position: Vector::ZERO,
            buttons: MouseButtons::empty(),
            flags: MouseFlags::empty(),
            scroll: ScrollDirection::None,
            modifiers: KeyModifiers::NONE,
        }
    }
}

impl MouseRecord {
    /// A plain move to `position` with `buttons` held.
    pub fn at(position: Vector, buttons: MouseButtons) -> Self {
        Self {
            position,
            buttons,
            ..Self::default()
        }
    }
}

/// One key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRecord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub pressed: bool,
}

impl KeyRecord {
    pub fn press(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self {
            code,
            modifiers,
            pressed: true,
        }
    }

    pub fn release(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self {
            code,
            modifiers,
            pressed: false,
        }
    }

    /// Ctrl+C pressed.
    pub fn is_ctrl_c(&self) -> bool {
        self.pressed
            && self.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(self.code, KeyCode::Char('c') | KeyCode::Char('C'))
    }
}

/// A raw console input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRecord {
    Mouse(MouseRecord),
    Key(KeyRecord),
    /// The window was resized to this many columns and rows.
    Resize(Vector),
}

// =============================================================================
// Typed events
// =============================================================================

/// Mouse events delivered to controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventType {
    Enter,
    Exit,
    Move,
    LeftDown,
    LeftUp,
    RightDown,
    RightUp,
    MiddleDown,
    MiddleUp,
    Scroll,
    DoubleClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardEventType {
    KeyDown,
    KeyUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusEventType {
    GotFocus,
    LostFocus,
}

/// Args of a mouse event.
///
/// `original_source` is the control the event was dispatched to; `source`
/// is the control that passed it on while bubbling. Setting `handled` stops
/// the bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEventArgs {
    pub position: Vector,
    pub buttons: MouseButtons,
    pub scroll: ScrollDirection,
    pub modifiers: KeyModifiers,
    pub source: NodeId,
    pub original_source: NodeId,
    pub handled: bool,
}

impl MouseEventArgs {
    pub fn new(target: NodeId, record: &MouseRecord) -> Self {
        Self {
            position: record.position,
            buttons: record.buttons,
            scroll: record.scroll,
            modifiers: record.modifiers,
            source: target,
            original_source: target,
            handled: false,
        }
    }
}

/// Args of a keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEventArgs {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub pressed: bool,
    pub source: NodeId,
    pub handled: bool,
}

impl KeyboardEventArgs {
    pub fn new(target: NodeId, record: &KeyRecord) -> Self {
        Self {
            code: record.code,
            modifiers: record.modifiers,
            pressed: record.pressed,
            source: target,
            handled: false,
        }
    }
}

/// Args of a focus event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEventArgs {
    pub original_source: NodeId,
    pub handled: bool,
}

impl FocusEventArgs {
    pub fn new(target: NodeId) -> Self {
        Self {
            original_source: target,
            handled: false,
        }
    }
}

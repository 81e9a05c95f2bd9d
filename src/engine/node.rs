//! Renderable nodes and the collaborator traits widgets implement.
//!
//! A node is the engine's record of one visual element: local position,
//! size, z-index, a non-owning parent link and a visibility flag. The widget
//! itself only supplies behaviour through [`Visual`] (painting) and
//! [`Control`] (input).

use std::sync::Arc;

use crate::input::events::{
    FocusEventArgs, FocusEventType, KeyboardEventArgs, KeyboardEventType, MouseEventArgs, MouseEventType,
};
use crate::renderer::ScreenBuffer;
use crate::types::Vector;

slotmap::new_key_type! {
    /// Stable handle of a registered node.
    pub struct NodeId;
}

// =============================================================================
// Z-Index
// =============================================================================

/// How a node's z-index follows its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZIndexMode {
    SameAsParent,
    #[default]
    OneHigher,
    TwoHigher,
    /// Use the node's own value regardless of the parent.
    Manual,
}

impl ZIndexMode {
    /// Offset over the parent's z-index, `None` for `Manual`.
    pub const fn offset(self) -> Option<i32> {
        match self {
            Self::SameAsParent => Some(0),
            Self::OneHigher => Some(1),
            Self::TwoHigher => Some(2),
            Self::Manual => None,
        }
    }
}

// =============================================================================
// NodeState
// =============================================================================

/// Per-node geometry and hierarchy data held by the render registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    /// Position relative to the parent (absolute for roots).
    pub position: Vector,
    pub size: Vector,
    /// Own z-index. Used when the mode is `Manual` or there is no parent.
    pub z_index: i32,
    pub z_mode: ZIndexMode,
    pub parent: Option<NodeId>,
    pub visible: bool,
    /// Registration sequence; breaks z-index ties.
    pub(crate) seq: u64,
}

impl NodeState {
    pub fn new(position: Vector, size: Vector) -> Self {
        Self {
            position,
            size,
            z_index: 0,
            z_mode: ZIndexMode::default(),
            parent: None,
            visible: true,
            seq: 0,
        }
    }
}

/// Resolved, read-only snapshot of a node handed to widget code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeView {
    pub id: NodeId,
    /// Global (screen) position.
    pub position: Vector,
    pub size: Vector,
    pub z_index: i32,
}

impl NodeView {
    /// True when `point` lies within the node's rectangle.
    pub fn contains(&self, point: Vector) -> bool {
        point.x >= self.position.x
            && point.x < self.position.x + self.size.x
            && point.y >= self.position.y
            && point.y < self.position.y + self.size.y
    }
}

// =============================================================================
// Collaborator traits
// =============================================================================

/// What a paint callback gets: the node, the screen, and the frame counter.
pub struct PaintContext<'a> {
    pub node: NodeView,
    pub buffer: &'a mut ScreenBuffer,
    /// Display ticks since the engine started. Drives blinking and animation.
    pub frame: u64,
}

/// Anything that paints itself into the screen buffer.
///
/// Paint runs on the display thread with the render registry locked; it
/// must only draw.
pub trait Visual: Send + Sync {
    fn paint(&self, ctx: &mut PaintContext<'_>);

    /// Blank the area this node last covered.
    fn clear_footprint(&self, node: &NodeView, buffer: &mut ScreenBuffer) {
        buffer.clear_rect(node.position, node.size);
    }
}

/// A visual that also takes part in input dispatch.
///
/// Handlers run on the input thread after all registry locks are released,
/// so they may freely call back into the engine.
pub trait Control: Visual {
    fn hit_test(&self, node: &NodeView, point: Vector) -> bool {
        node.contains(point)
    }

    fn on_mouse_event(&self, _kind: MouseEventType, _args: &mut MouseEventArgs) {}

    fn on_keyboard_event(&self, _kind: KeyboardEventType, _args: &mut KeyboardEventArgs) {}

    fn on_focus_event(&self, _kind: FocusEventType, _args: &mut FocusEventArgs) {}
}

/// The paint side of a registered node.
#[derive(Clone)]
pub enum Painter {
    Visual(Arc<dyn Visual>),
    Control(Arc<dyn Control>),
}

impl Painter {
    pub fn paint(&self, ctx: &mut PaintContext<'_>) {
        match self {
            Self::Visual(visual) => visual.paint(ctx),
            Self::Control(control) => control.paint(ctx),
        }
    }

    pub fn clear_footprint(&self, node: &NodeView, buffer: &mut ScreenBuffer) {
        match self {
            Self::Visual(visual) => visual.clear_footprint(node, buffer),
            Self::Control(control) => control.clear_footprint(node, buffer),
        }
    }
}

impl std::fmt::Debug for Painter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Visual(_) => f.write_str("Painter::Visual"),
            Self::Control(_) => f.write_str("Painter::Control"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    #[test]
    fn test_contains_is_half_open() {
        let view = NodeView {
            id: NodeId::from(KeyData::from_ffi(1)),
            position: Vector::new(2, 1),
            size: Vector::new(3, 2),
            z_index: 0,
        };
        assert!(view.contains(Vector::new(2, 1)));
        assert!(view.contains(Vector::new(4, 2)));
        assert!(!view.contains(Vector::new(5, 1)));
        assert!(!view.contains(Vector::new(2, 3)));
        assert!(!view.contains(Vector::new(1, 1)));
    }

    #[test]
    fn test_z_mode_offsets() {
        assert_eq!(ZIndexMode::default(), ZIndexMode::OneHigher);
        assert_eq!(ZIndexMode::SameAsParent.offset(), Some(0));
        assert_eq!(ZIndexMode::TwoHigher.offset(), Some(2));
        assert_eq!(ZIndexMode::Manual.offset(), None);
    }
}

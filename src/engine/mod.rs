//! Engine data model - nodes and the registries that own them.
//!
//! Widgets are not stored by the engine. A node is a [`NodeState`] record
//! in a slotmap arena, keyed by a stable [`NodeId`], plus a shared handle to
//! the widget's behaviour ([`Visual`] or [`Control`]).
//!
//! ```text
//! RenderRegistry   NodeId -> NodeState + Painter   (paint order, footprints)
//! ControlRegistry  [NodeId + Arc<dyn Control> + ControlState]   (input side)
//! ```
//!
//! Parent links are plain ids. A dangling parent is treated as no parent.

mod node;
mod registry;

pub use node::*;
pub use registry::*;

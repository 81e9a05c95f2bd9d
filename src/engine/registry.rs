//! Node registries.
//!
//! Two collections, each guarded by its own reader-writer lock in the
//! [`Engine`](crate::pipeline::Engine):
//!
//! - [`RenderRegistry`]: the single lifetime owner of every active node.
//!   Resolves global positions and z-indices through the parent chain, keeps
//!   the paint order, and remembers footprints that must be blanked on the
//!   next tick (removed, moved, resized or hidden nodes).
//! - [`ControlRegistry`]: the controls in registration order, with their
//!   input state (mouse-over, focus, focusable, hit-test visibility).

use std::sync::Arc;

use slotmap::SlotMap;

use super::node::{Control, NodeId, NodeState, NodeView, PaintContext, Painter};
use crate::renderer::ScreenBuffer;
use crate::types::Vector;

/// Guard against parent cycles when walking up the hierarchy.
const MAX_DEPTH: usize = 256;

// =============================================================================
// RenderRegistry
// =============================================================================

#[derive(Debug)]
struct RenderEntry {
    state: NodeState,
    painter: Painter,
}

/// Every registered node plus the cached paint order.
#[derive(Debug, Default)]
pub struct RenderRegistry {
    nodes: SlotMap<NodeId, RenderEntry>,
    order: Vec<NodeId>,
    order_dirty: bool,
    pending_clears: Vec<(NodeView, Painter)>,
    next_seq: u64,
}

impl RenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Register a node. It is painted from the next tick on.
    pub fn insert(&mut self, mut state: NodeState, painter: Painter) -> NodeId {
        state.seq = self.next_seq;
        self.next_seq += 1;
        self.order_dirty = true;
        self.nodes.insert(RenderEntry { state, painter })
    }

    /// Unregister a node, scheduling its visible area (and that of its
    /// descendants) to be cleared.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        self.schedule_clears(&self.footprints(id));
        self.nodes.remove(id);
        self.order_dirty = true;
        true
    }

    pub fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.nodes.get(id).map(|entry| &entry.state)
    }

    /// Mutate a node's state.
    ///
    /// Any node in the subtree whose on-screen rectangle changes, or that
    /// becomes hidden, gets its old footprint cleared on the next tick.
    /// Returns false for unknown ids or a change that would make a node its
    /// own ancestor (the change is discarded).
    pub fn update(&mut self, id: NodeId, f: impl FnOnce(&mut NodeState)) -> bool {
        let Some(entry) = self.nodes.get(id) else {
            return false;
        };
        let before_state = entry.state.clone();
        let before = self.footprints(id);

        let mut after_state = before_state.clone();
        f(&mut after_state);
        after_state.seq = before_state.seq;

        if let Some(parent) = after_state.parent {
            if after_state.parent != before_state.parent && self.subtree(id).contains(&parent) {
                tracing::warn!(?id, "rejected parent change that would create a cycle");
                return false;
            }
        }

        if let Some(entry) = self.nodes.get_mut(id) {
            entry.state = after_state.clone();
        }

        if before_state.z_index != after_state.z_index
            || before_state.z_mode != after_state.z_mode
            || before_state.parent != after_state.parent
        {
            self.order_dirty = true;
        }

        let stale: Vec<(NodeView, Painter)> = before
            .into_iter()
            .filter(|(old, _)| match self.visible_view(old.id) {
                Some(new) => new.position != old.position || new.size != old.size,
                None => true,
            })
            .collect();
        self.schedule_clears(&stale);
        true
    }

    /// Global position: local position plus every ancestor's.
    pub fn global_position(&self, id: NodeId) -> Option<Vector> {
        let mut position = self.state(id)?.position;
        for ancestor in self.ancestors(id) {
            if let Some(state) = self.state(ancestor) {
                position += state.position;
            }
        }
        Some(position)
    }

    /// Resolved z-index, following the parent according to the z mode.
    pub fn z_index(&self, id: NodeId) -> Option<i32> {
        let mut chain = Vec::new();
        let mut current = id;
        loop {
            let state = self.state(current)?;
            match (state.z_mode.offset(), state.parent.filter(|p| self.contains(*p))) {
                (Some(offset), Some(parent)) if chain.len() < MAX_DEPTH => {
                    chain.push(offset);
                    current = parent;
                }
                _ => return Some(state.z_index + chain.iter().sum::<i32>()),
            }
        }
    }

    /// Visible when the node and all of its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.state(id).is_some_and(|s| s.visible)
            && self.ancestors(id).all(|a| self.state(a).is_some_and(|s| s.visible))
    }

    /// Resolved snapshot of a node.
    pub fn view(&self, id: NodeId) -> Option<NodeView> {
        Some(NodeView {
            id,
            position: self.global_position(id)?,
            size: self.state(id)?.size,
            z_index: self.z_index(id)?,
        })
    }

    /// Snapshot of a node that is currently visible.
    pub fn visible_view(&self, id: NodeId) -> Option<NodeView> {
        if self.is_visible(id) { self.view(id) } else { None }
    }

    /// Live ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.state(id).and_then(|s| s.parent);
        std::iter::from_fn(move || {
            let current = next.filter(|p| self.contains(*p))?;
            next = self.state(current).and_then(|s| s.parent);
            Some(current)
        })
        .take(MAX_DEPTH)
    }

    /// Direct children in registration order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children: Vec<_> = self
            .nodes
            .iter()
            .filter(|(_, entry)| entry.state.parent == Some(id))
            .map(|(child, entry)| (entry.state.seq, child))
            .collect();
        children.sort_unstable();
        children.into_iter().map(|(_, child)| child).collect()
    }

    /// The node followed by all of its descendants.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() && out.len() <= self.nodes.len() {
            out.extend(self.children(out[i]));
            i += 1;
        }
        out
    }

    /// Visible views of a subtree, with their painters.
    fn footprints(&self, id: NodeId) -> Vec<(NodeView, Painter)> {
        self.subtree(id)
            .into_iter()
            .filter_map(|node| Some((self.visible_view(node)?, self.nodes.get(node)?.painter.clone())))
            .collect()
    }

    fn schedule_clears(&mut self, footprints: &[(NodeView, Painter)]) {
        self.pending_clears.extend(footprints.iter().cloned());
    }

    /// Node ids in paint order: ascending z-index, registration order for ties.
    pub fn paint_order(&mut self) -> &[NodeId] {
        if self.order_dirty {
            let mut keyed: Vec<(i32, u64, NodeId)> = self
                .nodes
                .iter()
                .map(|(id, entry)| (self.z_index(id).unwrap_or(entry.state.z_index), entry.state.seq, id))
                .collect();
            keyed.sort_unstable();
            self.order = keyed.into_iter().map(|(_, _, id)| id).collect();
            self.order_dirty = false;
        }
        &self.order
    }

    /// Clear stale footprints, then paint every visible node in order.
    ///
    /// Returns the number of nodes painted.
    pub fn paint_all(&mut self, buffer: &mut ScreenBuffer, frame: u64) -> usize {
        for (view, painter) in self.pending_clears.drain(..) {
            painter.clear_footprint(&view, buffer);
        }
        self.paint_order();

        let mut painted = 0;
        for &id in &self.order {
            let Some(view) = self.visible_view(id) else {
                continue;
            };
            let mut ctx = PaintContext {
                node: view,
                buffer: &mut *buffer,
                frame,
            };
            self.nodes[id].painter.paint(&mut ctx);
            painted += 1;
        }
        painted
    }
}

// =============================================================================
// ControlRegistry
// =============================================================================

/// Input-side flags of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub mouse_over: bool,
    pub focused: bool,
    pub focusable: bool,
    pub hit_test_visible: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            mouse_over: false,
            focused: false,
            focusable: true,
            hit_test_visible: true,
        }
    }
}

/// A registered control.
#[derive(Clone)]
pub struct ControlEntry {
    pub id: NodeId,
    pub control: Arc<dyn Control>,
    pub state: ControlState,
}

/// Controls in registration order.
#[derive(Default)]
pub struct ControlRegistry {
    entries: Vec<ControlEntry>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: NodeId, control: Arc<dyn Control>) {
        self.entries.push(ControlEntry {
            id,
            control,
            state: ControlState::default(),
        });
    }

    /// Remove a control, returning its entry.
    pub fn unregister(&mut self, id: NodeId) -> Option<ControlEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: NodeId) -> Option<&ControlEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ControlEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[ControlEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [ControlEntry] {
        &mut self.entries
    }

    /// The focused control, if any.
    pub fn focused(&self) -> Option<NodeId> {
        self.entries.iter().find(|entry| entry.state.focused).map(|entry| entry.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

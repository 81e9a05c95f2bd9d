//! Input dispatch: hit-testing, focus bookkeeping, bubbling and key routing.
//!
//! Routing happens in two phases. [`Dispatcher::route_mouse`] and
//! [`Dispatcher::route_key`] run under the registry locks: they pick the
//! target, update control state and return a list of [`Delivery`] values.
//! The caller then drops the locks and runs [`Delivery::deliver`], so
//! handlers are free to call back into the engine.

use std::sync::Arc;

use super::events::{
    FocusEventArgs, FocusEventType, KeyRecord, KeyboardEventArgs, KeyboardEventType, MouseButtons, MouseEventArgs,
    MouseEventType, MouseFlags, MouseRecord, ScrollDirection,
};
use crate::engine::{Control, ControlRegistry, NodeId, RenderRegistry};
use crate::types::Vector;

/// A control along a bubble chain.
pub type ChainLink = (NodeId, Arc<dyn Control>);

/// One event ready to be handed to user code.
pub enum Delivery {
    /// A mouse event, delivered to `chain[0]` and bubbled up the rest until handled.
    Mouse {
        kind: MouseEventType,
        chain: Vec<ChainLink>,
        args: MouseEventArgs,
    },
    Focus {
        kind: FocusEventType,
        target: NodeId,
        control: Arc<dyn Control>,
    },
    Keyboard {
        kind: KeyboardEventType,
        control: Arc<dyn Control>,
        args: KeyboardEventArgs,
    },
    /// Ctrl+C was pressed.
    Cancel,
}

impl Delivery {
    /// Invoke the handlers. `Cancel` is left to the caller.
    pub fn deliver(self) {
        match self {
            Self::Mouse { kind, chain, mut args } => {
                let mut forwarder = None;
                for (id, control) in chain {
                    if let Some(from) = forwarder {
                        args.source = from;
                    }
                    control.on_mouse_event(kind, &mut args);
                    if args.handled {
                        break;
                    }
                    forwarder = Some(id);
                }
            }
            Self::Focus { kind, target, control } => {
                control.on_focus_event(kind, &mut FocusEventArgs::new(target));
            }
            Self::Keyboard { kind, control, mut args } => control.on_keyboard_event(kind, &mut args),
            Self::Cancel => {}
        }
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mouse { kind, chain, .. } => f
                .debug_struct("Mouse")
                .field("kind", kind)
                .field("chain", &chain.iter().map(|(id, _)| *id).collect::<Vec<_>>())
                .finish(),
            Self::Focus { kind, target, .. } => {
                f.debug_struct("Focus").field("kind", kind).field("target", target).finish()
            }
            Self::Keyboard { kind, args, .. } => f
                .debug_struct("Keyboard")
                .field("kind", kind)
                .field("target", &args.source)
                .finish(),
            Self::Cancel => f.write_str("Cancel"),
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Per-engine dispatch state.
#[derive(Debug, Default)]
pub struct Dispatcher {
    last_buttons: MouseButtons,
    treat_ctrl_c_as_input: bool,
}

impl Dispatcher {
    pub fn new(treat_ctrl_c_as_input: bool) -> Self {
        Self {
            last_buttons: MouseButtons::empty(),
            treat_ctrl_c_as_input,
        }
    }

    /// Buttons held at the previous mouse record.
    pub fn last_buttons(&self) -> MouseButtons {
        self.last_buttons
    }

    /// The control under `point`: the first registered among those with the
    /// highest z-index.
    pub fn hit_test(controls: &ControlRegistry, render: &RenderRegistry, point: Vector) -> Option<NodeId> {
        let mut hit: Option<(NodeId, i32)> = None;
        for entry in controls.entries() {
            if !entry.state.hit_test_visible {
                continue;
            }
            let Some(view) = render.visible_view(entry.id) else {
                continue;
            };
            if !entry.control.hit_test(&view, point) {
                continue;
            }
            if hit.is_none_or(|(_, z)| view.z_index > z) {
                hit = Some((entry.id, view.z_index));
            }
        }
        hit.map(|(id, _)| id)
    }

    /// Route one mouse record.
    pub fn route_mouse(
        &mut self,
        record: &MouseRecord,
        controls: &mut ControlRegistry,
        render: &RenderRegistry,
    ) -> Vec<Delivery> {
        let hit = Self::hit_test(controls, render, record.position);
        let last = self.last_buttons;
        let left_pressed = last.is_empty() && record.buttons.contains(MouseButtons::LEFT);
        self.last_buttons = record.buttons;

        let mut out = Vec::new();

        let missed: Vec<NodeId> = controls
            .entries()
            .iter()
            .map(|entry| entry.id)
            .filter(|id| Some(*id) != hit)
            .collect();
        for id in missed {
            let Some(entry) = controls.get_mut(id) else {
                continue;
            };
            let control = entry.control.clone();
            if entry.state.mouse_over {
                entry.state.mouse_over = false;
                out.push(mouse_delivery(MouseEventType::Exit, id, record, controls, render));
            }
            let Some(entry) = controls.get_mut(id) else {
                continue;
            };
            if entry.state.focused && left_pressed {
                entry.state.focused = false;
                out.push(Delivery::Focus {
                    kind: FocusEventType::LostFocus,
                    target: id,
                    control,
                });
            }
        }

        let Some(target) = hit else {
            tracing::trace!(position = ?record.position, "mouse record hit nothing");
            return out;
        };

        let mut kinds = Vec::with_capacity(4);
        if record.flags.contains(MouseFlags::DOUBLE_CLICKED) {
            kinds.push(MouseEventType::DoubleClick);
        }
        if record.scroll != ScrollDirection::None {
            kinds.push(MouseEventType::Scroll);
        }

        if last.is_empty() {
            if record.buttons.contains(MouseButtons::LEFT) {
                kinds.push(MouseEventType::LeftDown);
            }
            if record.buttons.contains(MouseButtons::RIGHT) {
                kinds.push(MouseEventType::RightDown);
            }
            if record.buttons.contains(MouseButtons::MIDDLE) {
                kinds.push(MouseEventType::MiddleDown);
            }
        } else {
            for (button, kind) in [
                (MouseButtons::LEFT, MouseEventType::LeftUp),
                (MouseButtons::RIGHT, MouseEventType::RightUp),
                (MouseButtons::MIDDLE, MouseEventType::MiddleUp),
            ] {
                if last.contains(button) && !record.buttons.contains(button) {
                    kinds.push(kind);
                }
            }
        }

        for kind in kinds {
            out.push(mouse_delivery(kind, target, record, controls, render));
            if kind != MouseEventType::LeftDown {
                continue;
            }
            if let Some(entry) = controls.get_mut(target) {
                if entry.state.focusable && !entry.state.focused {
                    entry.state.focused = true;
                    out.push(Delivery::Focus {
                        kind: FocusEventType::GotFocus,
                        target,
                        control: entry.control.clone(),
                    });
                }
            }
        }

        let entering = match controls.get_mut(target) {
            Some(entry) if !entry.state.mouse_over => {
                entry.state.mouse_over = true;
                true
            }
            _ => false,
        };
        if entering {
            out.push(mouse_delivery(MouseEventType::Enter, target, record, controls, render));
        }

        out.push(mouse_delivery(MouseEventType::Move, target, record, controls, render));
        out
    }

    /// Route one key record to the focused control.
    pub fn route_key(&self, record: &KeyRecord, controls: &ControlRegistry) -> Vec<Delivery> {
        if record.is_ctrl_c() && !self.treat_ctrl_c_as_input {
            return vec![Delivery::Cancel];
        }

        let Some(entry) = controls.entries().iter().find(|entry| entry.state.focused) else {
            return Vec::new();
        };
        let kind = if record.pressed {
            KeyboardEventType::KeyDown
        } else {
            KeyboardEventType::KeyUp
        };
        vec![Delivery::Keyboard {
            kind,
            control: entry.control.clone(),
            args: KeyboardEventArgs::new(entry.id, record),
        }]
    }
}

/// The target followed by its control ancestors, stopping at the first
/// ancestor that is not a control.
pub fn bubble_chain(target: NodeId, controls: &ControlRegistry, render: &RenderRegistry) -> Vec<ChainLink> {
    let mut chain = Vec::new();
    if let Some(entry) = controls.get(target) {
        chain.push((target, entry.control.clone()));
    }
    for ancestor in render.ancestors(target) {
        let Some(entry) = controls.get(ancestor) else {
            break;
        };
        chain.push((ancestor, entry.control.clone()));
    }
    chain
}

fn mouse_delivery(
    kind: MouseEventType,
    target: NodeId,
    record: &MouseRecord,
    controls: &ControlRegistry,
    render: &RenderRegistry,
) -> Delivery {
    Delivery::Mouse {
        kind,
        chain: bubble_chain(target, controls, render),
        args: MouseEventArgs::new(target, record),
    }
}

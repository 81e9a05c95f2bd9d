//! The engine: the runtime context shared by both loops.
//!
//! ```text
//!                  ┌──────────── Engine (Arc<Shared>) ─────────────┐
//! input thread ──► │ controls: RwLock<ControlRegistry>             │
//!   dispatch()     │ render:   RwLock<RenderRegistry>              │ ◄── display thread
//!                  │ renderer: Mutex<DiffRenderer>                 │       tick()
//!                  └───────────────────────────────────────────────┘
//! ```
//!
//! Locks are always taken in the order controls, render, renderer. Event
//! handlers run after every lock is released, so they may add, move or
//! remove nodes. Paint callbacks run with the render registry and the
//! renderer locked and must only draw.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use super::display::DisplayLoop;
use super::input_loop::InputLoop;
use super::terminal::TerminalSetup;
use crate::config::EngineConfig;
use crate::engine::{
    Control, ControlRegistry, ControlState, NodeId, NodeState, Painter, RenderRegistry, Visual, ZIndexMode,
};
use crate::error::EngineError;
use crate::input::{Delivery, Dispatcher, FocusEventType, InputRecord, InputSource};
use crate::renderer::{create_backend, select_display_mode, Backend, DiffRenderer, DisplayMode, ScreenBuffer};
use crate::types::Vector;

/// Called when Ctrl+C is pressed.
pub type CancelHandler = Arc<dyn Fn() + Send + Sync>;

struct Shared {
    config: EngineConfig,
    controls: RwLock<ControlRegistry>,
    render: RwLock<RenderRegistry>,
    renderer: Mutex<DiffRenderer>,
    dispatcher: Mutex<Dispatcher>,
    pending_resize: Mutex<Option<Vector>>,
    cancel_handlers: RwLock<Vec<CancelHandler>>,
    display_running: AtomicBool,
    input_running: AtomicBool,
    failed: AtomicBool,
    failure: Mutex<Option<String>>,
    frame: AtomicU64,
    terminal: Mutex<Option<TerminalSetup>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to a running (or ready) engine. Cheap to clone.
#[derive(Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    /// Create an engine drawing a screen of `size` into `backend`.
    pub fn new(config: EngineConfig, size: Vector, backend: Box<dyn Backend>) -> Result<Self, EngineError> {
        config.validate()?;
        let dispatcher = Dispatcher::new(config.treat_ctrl_c_as_input);
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                controls: RwLock::new(ControlRegistry::new()),
                render: RwLock::new(RenderRegistry::new()),
                renderer: Mutex::new(DiffRenderer::new(size, backend)),
                dispatcher: Mutex::new(dispatcher),
                pending_resize: Mutex::new(None),
                cancel_handlers: RwLock::new(Vec::new()),
                display_running: AtomicBool::new(false),
                input_running: AtomicBool::new(false),
                failed: AtomicBool::new(false),
                failure: Mutex::new(None),
                frame: AtomicU64::new(0),
                terminal: Mutex::new(None),
                threads: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Create an engine on the real terminal: picks the backend, enters
    /// fullscreen and sizes the screen from the terminal.
    pub fn with_terminal(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let mode = select_display_mode(config.display_mode);
        tracing::info!(requested = ?config.display_mode, selected = ?mode, "display backend selected");

        let mut terminal = TerminalSetup::new(mode);
        terminal.enter_fullscreen()?;
        let size = TerminalSetup::size()?;
        let backend = create_backend(mode, io::stdout(), config.output_chunk_size);

        let engine = Self::new(config, size, backend)?;
        *engine.shared.terminal.lock() = Some(terminal);
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.shared.renderer.lock().mode()
    }

    /// Screen size as currently allocated.
    pub fn screen_size(&self) -> Vector {
        self.shared.renderer.lock().buffer().size()
    }

    /// Display ticks run so far.
    pub fn frame(&self) -> u64 {
        self.shared.frame.load(Ordering::SeqCst)
    }

    /// Inspect the screen buffer. Do not call from a paint callback.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&ScreenBuffer) -> R) -> R {
        f(self.shared.renderer.lock().buffer())
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Register a paint-only node.
    pub fn add_visual<V: Visual + 'static>(&self, visual: Arc<V>, position: Vector, size: Vector) -> NodeId {
        let id = self
            .shared
            .render
            .write()
            .insert(NodeState::new(position, size), Painter::Visual(visual));
        tracing::debug!(?id, "visual registered");
        id
    }

    /// Register a node that also takes input.
    pub fn add_control<C: Control + 'static>(&self, control: Arc<C>, position: Vector, size: Vector) -> NodeId {
        let mut controls = self.shared.controls.write();
        let mut render = self.shared.render.write();
        let control: Arc<dyn Control> = control;
        let id = render.insert(NodeState::new(position, size), Painter::Control(control.clone()));
        controls.register(id, control);
        tracing::debug!(?id, "control registered");
        id
    }

    /// Unregister a node. Its screen area is cleared on the next tick.
    pub fn remove(&self, id: NodeId) -> bool {
        let mut controls = self.shared.controls.write();
        let mut render = self.shared.render.write();
        controls.unregister(id);
        let removed = render.remove(id);
        if removed {
            tracing::debug!(?id, "node removed");
        }
        removed
    }

    fn update(&self, id: NodeId, f: impl FnOnce(&mut NodeState)) -> bool {
        self.shared.render.write().update(id, f)
    }

    fn read_state<R>(&self, id: NodeId, f: impl FnOnce(&NodeState) -> R) -> Option<R> {
        self.shared.render.read().state(id).map(f)
    }

    pub fn set_position(&self, id: NodeId, position: Vector) -> bool {
        self.update(id, |s| s.position = position)
    }

    /// Position relative to the parent.
    pub fn position(&self, id: NodeId) -> Option<Vector> {
        self.read_state(id, |s| s.position)
    }

    pub fn global_position(&self, id: NodeId) -> Option<Vector> {
        self.shared.render.read().global_position(id)
    }

    pub fn set_size(&self, id: NodeId, size: Vector) -> bool {
        self.update(id, |s| s.size = size)
    }

    pub fn size(&self, id: NodeId) -> Option<Vector> {
        self.read_state(id, |s| s.size)
    }

    /// Attach to `parent`, or detach with `None`. Refused when it would
    /// create a cycle.
    pub fn set_parent(&self, id: NodeId, parent: Option<NodeId>) -> bool {
        self.update(id, |s| s.parent = parent)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.read_state(id, |s| s.parent).flatten()
    }

    /// Set the node's own z-index. Only used as-is in `Manual` mode or
    /// without a parent.
    pub fn set_z_index(&self, id: NodeId, z_index: i32) -> bool {
        self.update(id, |s| s.z_index = z_index)
    }

    pub fn set_z_mode(&self, id: NodeId, mode: ZIndexMode) -> bool {
        self.update(id, |s| s.z_mode = mode)
    }

    /// Resolved z-index.
    pub fn z_index(&self, id: NodeId) -> Option<i32> {
        self.shared.render.read().z_index(id)
    }

    pub fn set_visible(&self, id: NodeId, visible: bool) -> bool {
        self.update(id, |s| s.visible = visible)
    }

    /// Visible when the node and every ancestor are.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.shared.render.read().is_visible(id)
    }

    // =========================================================================
    // Controls and focus
    // =========================================================================

    pub fn control_state(&self, id: NodeId) -> Option<ControlState> {
        self.shared.controls.read().get(id).map(|entry| entry.state)
    }

    pub fn set_hit_test_visible(&self, id: NodeId, visible: bool) -> bool {
        match self.shared.controls.write().get_mut(id) {
            Some(entry) => {
                entry.state.hit_test_visible = visible;
                true
            }
            None => false,
        }
    }

    /// A control that stops being focusable loses focus.
    pub fn set_focusable(&self, id: NodeId, focusable: bool) -> bool {
        let delivery = {
            let mut controls = self.shared.controls.write();
            let Some(entry) = controls.get_mut(id) else {
                return false;
            };
            entry.state.focusable = focusable;
            if !focusable && entry.state.focused {
                entry.state.focused = false;
                Some(focus_delivery(FocusEventType::LostFocus, id, entry.control.clone()))
            } else {
                None
            }
        };
        if let Some(delivery) = delivery {
            delivery.deliver();
        }
        true
    }

    /// Give focus to a focusable control, taking it from the current holder.
    pub fn focus(&self, id: NodeId) -> bool {
        let deliveries = {
            let mut controls = self.shared.controls.write();
            match controls.get(id) {
                Some(entry) if entry.state.focusable => {}
                _ => return false,
            }
            if controls.focused() == Some(id) {
                return true;
            }

            let mut deliveries = Vec::with_capacity(2);
            if let Some(previous) = controls.focused() {
                if let Some(entry) = controls.get_mut(previous) {
                    entry.state.focused = false;
                    deliveries.push(focus_delivery(FocusEventType::LostFocus, previous, entry.control.clone()));
                }
            }
            if let Some(entry) = controls.get_mut(id) {
                entry.state.focused = true;
                deliveries.push(focus_delivery(FocusEventType::GotFocus, id, entry.control.clone()));
            }
            deliveries
        };
        for delivery in deliveries {
            delivery.deliver();
        }
        true
    }

    /// Drop focus. Returns the control that held it.
    pub fn blur(&self) -> Option<NodeId> {
        let (id, delivery) = {
            let mut controls = self.shared.controls.write();
            let id = controls.focused()?;
            let entry = controls.get_mut(id)?;
            entry.state.focused = false;
            (id, focus_delivery(FocusEventType::LostFocus, id, entry.control.clone()))
        };
        delivery.deliver();
        Some(id)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.shared.controls.read().focused()
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Register a Ctrl+C handler.
    pub fn on_cancel(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.shared.cancel_handlers.write().push(Arc::new(handler));
    }

    fn raise_cancel(&self) {
        let handlers: Vec<CancelHandler> = self.shared.cancel_handlers.read().clone();
        tracing::info!(handlers = handlers.len(), "cancel requested");
        for handler in handlers {
            handler();
        }
    }

    /// Route one input record. Handlers run on the calling thread.
    pub fn dispatch(&self, record: InputRecord) {
        let deliveries = match record {
            InputRecord::Mouse(mouse) => {
                let mut controls = self.shared.controls.write();
                let render = self.shared.render.read();
                self.shared.dispatcher.lock().route_mouse(&mouse, &mut controls, &render)
            }
            InputRecord::Key(key) => {
                let controls = self.shared.controls.read();
                self.shared.dispatcher.lock().route_key(&key, &controls)
            }
            InputRecord::Resize(size) => {
                self.notify_resize(size);
                return;
            }
        };

        tracing::trace!(?record, deliveries = deliveries.len(), "input record routed");
        for delivery in deliveries {
            match delivery {
                Delivery::Cancel => self.raise_cancel(),
                other => other.deliver(),
            }
        }
    }

    // =========================================================================
    // Display
    // =========================================================================

    /// Resize the screen on the next tick.
    pub fn notify_resize(&self, size: Vector) {
        let previous = self.shared.pending_resize.lock().replace(size);
        if previous.is_some() {
            tracing::debug!(?size, "resize superseded an unapplied one");
        }
    }

    /// One display tick: apply a pending resize, paint every visible node
    /// and flush. Returns whether anything was written.
    pub fn tick(&self) -> io::Result<bool> {
        let frame = self.shared.frame.fetch_add(1, Ordering::SeqCst) + 1;
        let mut render = self.shared.render.write();
        let mut renderer = self.shared.renderer.lock();

        if let Some(size) = self.shared.pending_resize.lock().take() {
            if size != renderer.buffer().size() {
                tracing::info!(?size, "screen resized");
                renderer.resize(size);
            }
        }

        let painted = render.paint_all(renderer.buffer_mut(), frame);
        let wrote = renderer.flush()?;
        tracing::trace!(frame, painted, wrote, "tick");
        Ok(wrote)
    }

    /// Request a full clear and redraw on the next tick.
    pub fn clear(&self) {
        self.shared.renderer.lock().clear();
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the display loop thread.
    pub fn start_display(&self) -> Result<(), EngineError> {
        if self.shared.display_running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning("display"));
        }
        match DisplayLoop::spawn(self.clone()) {
            Ok(handle) => {
                self.shared.threads.lock().push(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.display_running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Start the input loop thread reading from `source`.
    pub fn start_input<S: InputSource + 'static>(&self, source: S) -> Result<(), EngineError> {
        if self.shared.input_running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning("input"));
        }
        match InputLoop::spawn(self.clone(), Box::new(source)) {
            Ok(handle) => {
                self.shared.threads.lock().push(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.input_running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    pub(crate) fn display_active(&self) -> bool {
        self.shared.display_running.load(Ordering::SeqCst)
    }

    pub(crate) fn input_active(&self) -> bool {
        self.shared.input_running.load(Ordering::SeqCst)
    }

    pub(crate) fn input_finished(&self) {
        self.shared.input_running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.display_active() || self.input_active()
    }

    /// Ask both loops to stop. Each sees the flag at the top of its next
    /// iteration; a blocked input read is not interrupted.
    pub fn stop(&self) {
        let was_display = self.shared.display_running.swap(false, Ordering::SeqCst);
        let was_input = self.shared.input_running.swap(false, Ordering::SeqCst);
        if was_display || was_input {
            tracing::info!(was_display, was_input, "engine stopping");
        }
    }

    /// Wait for the loop threads to finish, skipping the calling thread.
    ///
    /// The input thread may stay blocked in a read until the process exits;
    /// pass a `timeout` to bound the wait for it.
    pub fn join(&self, timeout: Option<Duration>) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.shared.threads.lock());
        let current = thread::current().id();
        let deadline = timeout.map(|t| std::time::Instant::now() + t);

        let mut unfinished = Vec::new();
        for handle in handles {
            if handle.thread().id() == current {
                unfinished.push(handle);
                continue;
            }
            loop {
                if handle.is_finished() {
                    let _ = handle.join();
                    break;
                }
                if deadline.is_some_and(|d| std::time::Instant::now() >= d) {
                    unfinished.push(handle);
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
        }
        self.shared.threads.lock().extend(unfinished);
    }

    /// Stop, reset the screen and hand the terminal back.
    pub fn shutdown(&self) -> io::Result<()> {
        self.stop();
        self.join(Some(Duration::from_millis(250)));
        self.shared.renderer.lock().restore()?;
        if let Some(mut terminal) = self.shared.terminal.lock().take() {
            terminal.exit_fullscreen()?;
        }
        Ok(())
    }

    /// Fatal failure path: stop both loops, restore the terminal as far as
    /// possible, report, and exit the process when configured to.
    pub fn fail(&self, error: EngineError) {
        if self.shared.failed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop();
        tracing::error!(%error, "engine failed");

        if let Some(mut renderer) = self.shared.renderer.try_lock_for(Duration::from_millis(200)) {
            if let Err(e) = renderer.restore() {
                tracing::warn!(error = %e, "could not reset the screen");
            }
        }
        if let Some(mut terminal) = self.shared.terminal.lock().take() {
            if let Err(e) = terminal.exit_fullscreen() {
                tracing::warn!(error = %e, "could not restore the terminal");
            }
        }

        let message = error.to_string();
        eprintln!("gridterm: {message}");
        *self.shared.failure.lock() = Some(message);

        if self.shared.config.exit_on_failure {
            std::process::exit(1);
        }
    }

    pub fn is_failed(&self) -> bool {
        self.shared.failed.load(Ordering::SeqCst)
    }

    /// Message of the failure that stopped the engine, if any.
    pub fn failure(&self) -> Option<String> {
        self.shared.failure.lock().clone()
    }
}

fn focus_delivery(kind: FocusEventType, target: NodeId, control: Arc<dyn Control>) -> Delivery {
    Delivery::Focus { kind, target, control }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PaintContext;
    use crate::input::{FocusEventArgs, KeyCode, KeyModifiers, KeyRecord, MouseButtons, MouseRecord};
    use crate::renderer::{AnsiBackend, CaptureWriter};
    use crate::types::{Color, Pixel};
    use pretty_assertions::assert_eq;

    fn test_config() -> EngineConfig {
        EngineConfig {
            exit_on_failure: false,
            ..EngineConfig::default()
        }
    }

    fn engine(w: i32, h: i32) -> (Engine, CaptureWriter) {
        let sink = CaptureWriter::new();
        let backend = Box::new(AnsiBackend::new(sink.clone(), 1000));
        let engine = Engine::new(test_config(), Vector::new(w, h), backend).unwrap();
        (engine, sink)
    }

    struct Fill(char);

    impl Visual for Fill {
        fn paint(&self, ctx: &mut PaintContext<'_>) {
            ctx.buffer.draw_rect(ctx.node.position, ctx.node.size, Color::RED, self.0);
        }
    }

    #[derive(Default)]
    struct FocusLog(Mutex<Vec<FocusEventType>>);

    impl Visual for FocusLog {
        fn paint(&self, _ctx: &mut PaintContext<'_>) {}
    }

    impl Control for FocusLog {
        fn on_focus_event(&self, kind: FocusEventType, _args: &mut FocusEventArgs) {
            self.0.lock().push(kind);
        }
    }

    fn symbol_at(engine: &Engine, x: i32, y: i32) -> Option<char> {
        engine.with_buffer(|b| match b.get(x, y) {
            Some(Pixel::Drawn(glyph)) => Some(glyph.symbol),
            _ => None,
        })
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            refresh_rate: 0,
            ..test_config()
        };
        let backend = Box::new(AnsiBackend::new(CaptureWriter::new(), 1000));
        assert!(matches!(
            Engine::new(config, Vector::new(1, 1), backend),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_tick_paints_and_is_idempotent() {
        let (engine, sink) = engine(4, 2);
        engine.add_visual(Arc::new(Fill('#')), Vector::new(1, 0), Vector::new(2, 1));

        assert!(engine.tick().unwrap());
        assert_eq!(symbol_at(&engine, 1, 0), Some('#'));
        assert!(sink.take().contains("##"));

        assert!(!engine.tick().unwrap());
        assert_eq!(sink.take(), "");
        assert_eq!(engine.frame(), 2);
    }

    #[test]
    fn test_move_clears_previous_area() {
        let (engine, _sink) = engine(4, 1);
        let id = engine.add_visual(Arc::new(Fill('#')), Vector::ZERO, Vector::new(1, 1));
        engine.tick().unwrap();

        assert!(engine.set_position(id, Vector::new(3, 0)));
        engine.tick().unwrap();
        assert_eq!(symbol_at(&engine, 0, 0), None);
        assert_eq!(symbol_at(&engine, 3, 0), Some('#'));
    }

    #[test]
    fn test_resize_applies_on_tick() {
        let (engine, _sink) = engine(4, 2);
        engine.dispatch(InputRecord::Resize(Vector::new(10, 5)));
        assert_eq!(engine.screen_size(), Vector::new(4, 2));
        engine.tick().unwrap();
        assert_eq!(engine.screen_size(), Vector::new(10, 5));
    }

    #[test]
    fn test_node_api_roundtrip() {
        let (engine, _sink) = engine(10, 10);
        let parent = engine.add_visual(Arc::new(Fill('p')), Vector::new(2, 2), Vector::new(5, 5));
        let child = engine.add_visual(Arc::new(Fill('c')), Vector::new(1, 1), Vector::new(1, 1));
        assert!(engine.set_parent(child, Some(parent)));
        assert_eq!(engine.parent(child), Some(parent));
        assert_eq!(engine.global_position(child), Some(Vector::new(3, 3)));
        assert_eq!(engine.position(child), Some(Vector::new(1, 1)));

        engine.set_z_index(parent, 3);
        assert_eq!(engine.z_index(child), Some(4));
        engine.set_z_mode(child, ZIndexMode::Manual);
        engine.set_z_index(child, 0);
        assert_eq!(engine.z_index(child), Some(0));

        engine.set_visible(parent, false);
        assert!(!engine.is_visible(child));
        assert!(!engine.set_parent(parent, Some(child)));

        assert!(engine.remove(child));
        assert!(!engine.remove(child));
        assert_eq!(engine.size(child), None);
    }

    #[test]
    fn test_programmatic_focus_is_exclusive() {
        let (engine, _sink) = engine(10, 1);
        let a_log = Arc::new(FocusLog::default());
        let b_log = Arc::new(FocusLog::default());
        let a = engine.add_control(a_log.clone(), Vector::ZERO, Vector::new(2, 1));
        let b = engine.add_control(b_log.clone(), Vector::new(3, 0), Vector::new(2, 1));

        assert!(engine.focus(a));
        assert!(engine.focus(b));
        assert_eq!(engine.focused(), Some(b));
        assert!(!engine.control_state(a).unwrap().focused);
        assert_eq!(*a_log.0.lock(), vec![FocusEventType::GotFocus, FocusEventType::LostFocus]);

        assert_eq!(engine.blur(), Some(b));
        assert_eq!(engine.focused(), None);
        assert_eq!(*b_log.0.lock(), vec![FocusEventType::GotFocus, FocusEventType::LostFocus]);
    }

    #[test]
    fn test_unfocusable_drops_focus() {
        let (engine, _sink) = engine(10, 1);
        let log = Arc::new(FocusLog::default());
        let id = engine.add_control(log.clone(), Vector::ZERO, Vector::new(2, 1));

        engine.dispatch(InputRecord::Mouse(MouseRecord::at(Vector::ZERO, MouseButtons::LEFT)));
        assert_eq!(engine.focused(), Some(id));

        assert!(engine.set_focusable(id, false));
        assert_eq!(engine.focused(), None);
        assert!(!engine.focus(id));
        assert_eq!(*log.0.lock(), vec![FocusEventType::GotFocus, FocusEventType::LostFocus]);
    }

    #[test]
    fn test_ctrl_c_raises_cancel() {
        let (engine, _sink) = engine(1, 1);
        let hits = Arc::new(AtomicU64::new(0));
        let counter = hits.clone();
        engine.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        engine.dispatch(InputRecord::Key(KeyRecord::press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        engine.dispatch(InputRecord::Key(KeyRecord::press(KeyCode::Char('x'), KeyModifiers::NONE)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_call_back_into_engine() {
        struct Remover {
            engine: Mutex<Option<Engine>>,
            victim: Mutex<Option<NodeId>>,
        }
        impl Visual for Remover {
            fn paint(&self, _ctx: &mut PaintContext<'_>) {}
        }
        impl Control for Remover {
            fn on_focus_event(&self, _kind: FocusEventType, _args: &mut FocusEventArgs) {
                let engine = self.engine.lock().clone();
                if let (Some(engine), Some(victim)) = (engine, *self.victim.lock()) {
                    engine.remove(victim);
                }
            }
        }

        let (engine, _sink) = engine(10, 1);
        let victim = engine.add_visual(Arc::new(Fill('v')), Vector::new(5, 0), Vector::ONE);
        let remover = Arc::new(Remover {
            engine: Mutex::new(Some(engine.clone())),
            victim: Mutex::new(Some(victim)),
        });
        let id = engine.add_control(remover.clone(), Vector::ZERO, Vector::ONE);
        assert!(engine.focus(id));
        assert_eq!(engine.size(victim), None);
        // Break the engine <-> control cycle.
        remover.engine.lock().take();
    }

    #[test]
    fn test_fail_records_message_without_exit() {
        let (engine, sink) = engine(2, 1);
        engine.fail(EngineError::Panicked("handler panicked: boom".into()));
        assert!(engine.is_failed());
        assert_eq!(engine.failure().as_deref(), Some("handler panicked: boom"));
        assert!(sink.take().contains("\x1b[0m"));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (engine, _sink) = engine(1, 1);
        engine.start_display().unwrap();
        assert!(matches!(engine.start_display(), Err(EngineError::AlreadyRunning("display"))));
        engine.stop();
        engine.join(Some(Duration::from_secs(2)));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_stop_clears_both_loops() {
        let (engine, _sink) = engine(2, 1);
        let (tx, rx) = std::sync::mpsc::channel();
        engine.start_display().unwrap();
        engine.start_input(crate::input::ChannelSource::new(rx)).unwrap();
        assert!(engine.is_running());

        engine.stop();
        assert!(!engine.is_running());
        drop(tx);
        engine.join(Some(Duration::from_secs(2)));
        assert!(!engine.is_failed());
    }
}

//! The two-thread model against in-memory sinks.
//!
//! - Display loop ticking into a capture writer
//! - Input loop fed through a channel
//! - Failure and cancel paths
//!
//! No real terminal is touched.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use gridterm::{
    AnsiBackend, CaptureWriter, ChannelSource, Color, Control, Engine, EngineConfig, InputRecord, KeyCode,
    KeyModifiers, KeyRecord, KeyboardEventArgs, KeyboardEventType, MouseButtons, MouseEventArgs, MouseEventType,
    MouseRecord, PaintContext, Pixel, Vector, Visual,
};

// =============================================================================
// Helpers
// =============================================================================

fn config() -> EngineConfig {
    EngineConfig {
        refresh_rate: 100,
        exit_on_failure: false,
        ..EngineConfig::default()
    }
}

fn engine(size: Vector) -> (Engine, CaptureWriter) {
    let sink = CaptureWriter::new();
    let backend = Box::new(AnsiBackend::new(sink.clone(), 1000));
    let engine = Engine::new(config(), size, backend).unwrap();
    (engine, sink)
}

fn input(engine: &Engine) -> Sender<InputRecord> {
    let (tx, rx) = mpsc::channel();
    engine.start_input(ChannelSource::new(rx)).unwrap();
    tx
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn symbol_at(engine: &Engine, x: i32, y: i32) -> Option<char> {
    engine.with_buffer(|buffer| match buffer.get(x, y) {
        Some(Pixel::Drawn(glyph)) => Some(glyph.symbol),
        _ => None,
    })
}

fn click(x: i32, y: i32) -> [InputRecord; 2] {
    [
        InputRecord::Mouse(MouseRecord::at(Vector::new(x, y), MouseButtons::LEFT)),
        InputRecord::Mouse(MouseRecord::at(Vector::new(x, y), MouseButtons::empty())),
    ]
}

/// Paints a counter and records what it receives.
#[derive(Default)]
struct Counter {
    clicks: AtomicU32,
    keys: Mutex<Vec<KeyCode>>,
    panic_on_click: bool,
}

impl Visual for Counter {
    fn paint(&self, ctx: &mut PaintContext<'_>) {
        let digit = char::from_digit(self.clicks.load(Ordering::SeqCst) % 10, 10).unwrap_or('?');
        ctx.buffer
            .draw(ctx.node.position.x, ctx.node.position.y, digit, Color::WHITE, Color::BLUE);
    }
}

impl Control for Counter {
    fn on_mouse_event(&self, kind: MouseEventType, args: &mut MouseEventArgs) {
        if kind == MouseEventType::LeftDown {
            if self.panic_on_click {
                panic!("counter exploded");
            }
            self.clicks.fetch_add(1, Ordering::SeqCst);
            args.handled = true;
        }
    }

    fn on_keyboard_event(&self, kind: KeyboardEventType, args: &mut KeyboardEventArgs) {
        if kind == KeyboardEventType::KeyDown {
            self.keys.lock().push(args.code);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_display_loop_renders_without_input() {
    let (engine, sink) = engine(Vector::new(8, 2));
    let counter = Arc::new(Counter::default());
    engine.add_control(counter, Vector::new(2, 1), Vector::ONE);

    engine.start_display().unwrap();
    assert!(wait_until(|| symbol_at(&engine, 2, 1) == Some('0')));
    assert!(engine.frame() >= 1);
    assert!(wait_until(|| sink.take().contains("\x1b[48;2;0;0;255m0")));

    engine.stop();
    engine.join(Some(Duration::from_secs(2)));
    assert!(!engine.is_running());
    assert!(!engine.is_failed());
}

#[test]
fn test_clicks_reach_control_and_repaint() {
    let (engine, sink) = engine(Vector::new(8, 2));
    let counter = Arc::new(Counter::default());
    let id = engine.add_control(counter.clone(), Vector::new(2, 1), Vector::ONE);

    engine.start_display().unwrap();
    let tx = input(&engine);
    for record in click(2, 1).into_iter().chain(click(2, 1)) {
        tx.send(record).unwrap();
    }

    assert!(wait_until(|| counter.clicks.load(Ordering::SeqCst) == 2));
    assert_eq!(engine.focused(), Some(id));

    assert!(wait_until(|| symbol_at(&engine, 2, 1) == Some('2')));
    let _ = sink.take();

    engine.stop();
    drop(tx);
    engine.join(Some(Duration::from_secs(2)));
    assert!(!engine.is_running());
}

#[test]
fn test_keys_go_to_focused_control() {
    let (engine, _sink) = engine(Vector::new(8, 2));
    let counter = Arc::new(Counter::default());
    let id = engine.add_control(counter.clone(), Vector::ZERO, Vector::ONE);
    assert!(engine.focus(id));

    let tx = input(&engine);
    tx.send(InputRecord::Key(KeyRecord::press(KeyCode::Char('a'), KeyModifiers::NONE)))
        .unwrap();
    tx.send(InputRecord::Key(KeyRecord::release(KeyCode::Char('a'), KeyModifiers::NONE)))
        .unwrap();
    tx.send(InputRecord::Key(KeyRecord::press(KeyCode::Enter, KeyModifiers::NONE)))
        .unwrap();

    assert!(wait_until(|| counter.keys.lock().len() == 2));
    assert_eq!(*counter.keys.lock(), vec![KeyCode::Char('a'), KeyCode::Enter]);
    drop(tx);
    engine.join(Some(Duration::from_secs(2)));
}

#[test]
fn test_closed_source_ends_input_loop() {
    let (engine, _sink) = engine(Vector::new(4, 1));
    let tx = input(&engine);
    assert!(engine.is_running());

    drop(tx);
    assert!(wait_until(|| !engine.is_running()));
    engine.join(Some(Duration::from_secs(2)));
    assert!(!engine.is_failed());
}

#[test]
fn test_ctrl_c_runs_cancel_handler() {
    let (engine, _sink) = engine(Vector::new(4, 1));
    let counter = Arc::new(Counter::default());
    let id = engine.add_control(counter.clone(), Vector::ZERO, Vector::ONE);
    engine.focus(id);

    let stopper = engine.clone();
    engine.on_cancel(move || stopper.stop());
    engine.start_display().unwrap();
    let tx = input(&engine);

    tx.send(InputRecord::Key(KeyRecord::press(KeyCode::Char('c'), KeyModifiers::CONTROL)))
        .unwrap();

    assert!(wait_until(|| !engine.is_running()));
    assert!(counter.keys.lock().is_empty());
    drop(tx);
    engine.join(Some(Duration::from_secs(2)));
    assert!(!engine.is_failed());
}

#[test]
fn test_resize_record_reaches_display_loop() {
    let (engine, _sink) = engine(Vector::new(4, 1));
    engine.start_display().unwrap();
    let tx = input(&engine);

    tx.send(InputRecord::Resize(Vector::new(30, 10))).unwrap();
    assert!(wait_until(|| engine.screen_size() == Vector::new(30, 10)));

    engine.stop();
    drop(tx);
    engine.join(Some(Duration::from_secs(2)));
}

#[test]
fn test_panicking_handler_fails_engine() {
    let (engine, sink) = engine(Vector::new(4, 1));
    let counter = Arc::new(Counter {
        panic_on_click: true,
        ..Counter::default()
    });
    engine.add_control(counter, Vector::ZERO, Vector::ONE);

    engine.start_display().unwrap();
    let tx = input(&engine);
    tx.send(click(0, 0)[0]).unwrap();

    assert!(wait_until(|| engine.is_failed()));
    assert!(wait_until(|| !engine.is_running()));
    let failure = engine.failure().unwrap_or_default();
    assert!(failure.contains("counter exploded"), "failure was {failure:?}");

    engine.join(Some(Duration::from_secs(2)));
    // The failure path resets the style on the way out.
    let output = sink.take();
    assert!(output.contains("\x1b[0m"));
}

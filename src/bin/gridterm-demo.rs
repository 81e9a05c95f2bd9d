//! gridterm demo
//!
//! Three clickable tiles laid out on a grid with lines between the cells.
//! Click a tile or focus it and press Enter to bump its counter. Ctrl+C quits.
//!
//! Usage: `gridterm-demo [config.toml]`. Logs go to `$TMPDIR/gridterm/logs`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use gridterm::input::CrosstermSource;
use gridterm::layout::Track;
use gridterm::{
    logging, Alignment, BorderStyle, Color, Control, Engine, EngineConfig, FocusEventArgs, FocusEventType, Grid,
    GridLineStyle, KeyCode, KeyboardEventArgs, KeyboardEventType, LayoutElement, MouseEventArgs, MouseEventType,
    PaintContext, TextMode, Vector, Visual,
};

// =============================================================================
// Tile
// =============================================================================

struct Tile {
    label: String,
    clicks: AtomicU32,
    hovered: AtomicBool,
    focused: AtomicBool,
    geometry: Mutex<(Vector, Vector)>,
}

impl Tile {
    fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            clicks: AtomicU32::new(0),
            hovered: AtomicBool::new(false),
            focused: AtomicBool::new(false),
            geometry: Mutex::new((Vector::ZERO, Vector::ZERO)),
        })
    }

    fn geometry(&self) -> (Vector, Vector) {
        *self.geometry.lock()
    }
}

impl Visual for Tile {
    fn paint(&self, ctx: &mut PaintContext<'_>) {
        let (pos, size) = (ctx.node.position, ctx.node.size);
        let color = if self.focused.load(Ordering::Relaxed) {
            Color::YELLOW
        } else if self.hovered.load(Ordering::Relaxed) {
            Color::CYAN
        } else {
            Color::GRAY
        };
        let style = if self.focused.load(Ordering::Relaxed) {
            BorderStyle::Double
        } else {
            BorderStyle::Rounded
        };
        ctx.buffer.draw_rect(pos, size, Color::rgb(24, 24, 32), ' ');
        ctx.buffer.draw_border(pos, size, color, style);

        let text = format!("{} {}", self.label, self.clicks.load(Ordering::Relaxed));
        ctx.buffer.print(
            pos.x + size.x / 2,
            pos.y + size.y / 2,
            &text,
            Color::WHITE,
            Color::Empty,
            Alignment::Center,
            TextMode::BOLD,
        );
    }
}

impl Control for Tile {
    fn on_mouse_event(&self, kind: MouseEventType, args: &mut MouseEventArgs) {
        match kind {
            MouseEventType::Enter => self.hovered.store(true, Ordering::Relaxed),
            MouseEventType::Exit => self.hovered.store(false, Ordering::Relaxed),
            MouseEventType::LeftDown => {
                self.clicks.fetch_add(1, Ordering::Relaxed);
            }
            MouseEventType::DoubleClick => {
                self.clicks.store(0, Ordering::Relaxed);
            }
            _ => return,
        }
        args.handled = true;
    }

    fn on_keyboard_event(&self, kind: KeyboardEventType, args: &mut KeyboardEventArgs) {
        if kind == KeyboardEventType::KeyDown && matches!(args.code, KeyCode::Enter | KeyCode::Char(' ')) {
            self.clicks.fetch_add(1, Ordering::Relaxed);
            args.handled = true;
        }
    }

    fn on_focus_event(&self, kind: FocusEventType, _args: &mut FocusEventArgs) {
        self.focused.store(kind == FocusEventType::GotFocus, Ordering::Relaxed);
    }
}

impl LayoutElement for Tile {
    fn required_size(&self) -> Vector {
        Vector::new(self.label.chars().count() as i32 + 8, 5)
    }

    fn apply_geometry(&self, position: Vector, size: Vector) {
        *self.geometry.lock() = (position, size);
    }

    fn outer_padding(&self) -> Vector {
        Vector::new(1, 0)
    }

    fn stretches(&self) -> bool {
        true
    }
}

// =============================================================================
// Frame
// =============================================================================

/// Border and grid lines around the tiles.
struct Frame {
    grid: Mutex<Grid>,
}

impl Visual for Frame {
    fn paint(&self, ctx: &mut PaintContext<'_>) {
        let (pos, size) = (ctx.node.position, ctx.node.size);
        ctx.buffer.draw_border(pos, size, Color::DARK_GRAY, BorderStyle::Single);
        self.grid
            .lock()
            .draw_lines(ctx.buffer, pos, GridLineStyle::Single, Color::DARK_GRAY);
    }
}

fn main() {
    let _log_guard = logging::init(logging::default_log_dir());

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("gridterm-demo: {path}: {e}");
                std::process::exit(2);
            }
        },
        None => EngineConfig::default(),
    };

    let engine = match Engine::with_terminal(config.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("gridterm-demo: {e}");
            std::process::exit(1);
        }
    };

    let tiles = [Tile::new("alpha"), Tile::new("beta"), Tile::new("wide gamma")];

    let mut grid = Grid::new();
    grid.add_column(Track::auto());
    grid.add_column(Track::auto());
    grid.add_row(Track::auto());
    grid.add_row(Track::auto());
    let placed = grid
        .set_column_and_row(&tiles[0], 0, 0)
        .and_then(|_| grid.set_column_and_row(&tiles[1], 1, 0))
        .and_then(|_| grid.set_column_and_row(&tiles[2], 0, 1))
        .and_then(|_| grid.set_span(&tiles[2], 2, 1));
    if let Err(e) = placed {
        let _ = engine.shutdown();
        eprintln!("gridterm-demo: {e}");
        std::process::exit(1);
    }
    let grid_size = grid.layout();

    let frame = Arc::new(Frame { grid: Mutex::new(grid) });
    let frame_id = engine.add_visual(frame.clone(), Vector::new(2, 1), grid_size);
    for tile in &tiles {
        let (position, size) = tile.geometry();
        let id = engine.add_control(tile.clone(), position, size);
        engine.set_parent(id, Some(frame_id));
    }

    let on_cancel = engine.clone();
    engine.on_cancel(move || on_cancel.stop());

    let started = engine
        .start_display()
        .and_then(|_| engine.start_input(CrosstermSource::new(config.double_click_interval())));
    if let Err(e) = started {
        engine.fail(e);
    }

    while engine.is_running() {
        thread::sleep(Duration::from_millis(50));
    }

    if let Err(e) = engine.shutdown() {
        eprintln!("gridterm-demo: failed to restore the terminal: {e}");
    }
    if let Some(failure) = engine.failure() {
        tracing::error!(%failure, "demo ended with a failure");
        std::process::exit(1);
    }
}

//! Grid layout driving real engine nodes.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use gridterm::layout::Track;
use gridterm::{
    AnsiBackend, CaptureWriter, Color, Control, Engine, EngineConfig, Grid, GridLineStyle, GridSizing, InputRecord,
    LayoutElement, MouseButtons, MouseEventArgs, MouseEventType, MouseRecord, PaintContext, Pixel, Vector, Visual,
};

fn engine(size: Vector) -> Engine {
    let config = EngineConfig {
        exit_on_failure: false,
        ..EngineConfig::default()
    };
    let backend = Box::new(AnsiBackend::new(CaptureWriter::new(), 1000));
    Engine::new(config, size, backend).unwrap()
}

fn symbol_at(engine: &Engine, x: i32, y: i32) -> Option<char> {
    engine.with_buffer(|buffer| match buffer.get(x, y) {
        Some(Pixel::Drawn(glyph)) => Some(glyph.symbol),
        _ => None,
    })
}

/// A fixed-size control that remembers its geometry and clicks.
struct Cell {
    need: Vector,
    geometry: Mutex<(Vector, Vector)>,
    events: Mutex<Vec<MouseEventType>>,
}

impl Cell {
    fn new(w: i32, h: i32) -> Arc<Self> {
        Arc::new(Self {
            need: Vector::new(w, h),
            geometry: Mutex::new((Vector::ZERO, Vector::ZERO)),
            events: Mutex::new(Vec::new()),
        })
    }

    fn register(self: &Arc<Self>, engine: &Engine) {
        let (position, size) = *self.geometry.lock();
        engine.add_control(self.clone(), position, size);
    }
}

impl Visual for Cell {
    fn paint(&self, _ctx: &mut PaintContext<'_>) {}
}

impl Control for Cell {
    fn on_mouse_event(&self, kind: MouseEventType, _args: &mut MouseEventArgs) {
        self.events.lock().push(kind);
    }
}

impl LayoutElement for Cell {
    fn required_size(&self) -> Vector {
        self.need
    }

    fn apply_geometry(&self, position: Vector, size: Vector) {
        *self.geometry.lock() = (position, size);
    }
}

/// Paints a grid's lines at the node position.
struct Lines(Mutex<Grid>);

impl Visual for Lines {
    fn paint(&self, ctx: &mut PaintContext<'_>) {
        self.0
            .lock()
            .draw_lines(ctx.buffer, ctx.node.position, GridLineStyle::Single, Color::WHITE);
    }
}

fn two_by_two() -> Grid {
    let mut grid = Grid::new();
    grid.add_column(Track::auto());
    grid.add_column(Track::auto());
    grid.add_row(Track::auto());
    grid.add_row(Track::auto());
    grid
}

#[test]
fn test_laid_out_controls_receive_clicks() {
    let engine = engine(Vector::new(20, 5));
    let left = Cell::new(4, 1);
    let right = Cell::new(4, 1);

    let mut grid = Grid::new();
    grid.add_column(Track::auto());
    grid.add_column(Track::auto());
    grid.add_row(Track::auto());
    grid.set_column_and_row(&left, 0, 0).unwrap();
    grid.set_column_and_row(&right, 1, 0).unwrap();
    assert_eq!(grid.layout(), Vector::new(11, 3));

    left.register(&engine);
    right.register(&engine);
    assert_eq!(*right.geometry.lock(), (Vector::new(6, 1), Vector::new(4, 1)));

    engine.dispatch(InputRecord::Mouse(MouseRecord::at(Vector::new(7, 1), MouseButtons::LEFT)));
    assert!(left.events.lock().is_empty());
    assert_eq!(
        *right.events.lock(),
        vec![MouseEventType::LeftDown, MouseEventType::Enter, MouseEventType::Move]
    );

    // The padding cell between the tracks belongs to nobody.
    engine.dispatch(InputRecord::Mouse(MouseRecord::at(Vector::new(5, 1), MouseButtons::empty())));
    assert_eq!(right.events.lock().last(), Some(&MouseEventType::Exit));
    assert!(left.events.lock().is_empty());
}

#[test]
fn test_grid_lines_paint_through_engine() {
    let engine = engine(Vector::new(10, 6));
    let cells = [Cell::new(3, 1), Cell::new(3, 1), Cell::new(3, 1), Cell::new(3, 1)];

    let mut grid = two_by_two();
    for (i, cell) in cells.iter().enumerate() {
        grid.set_column_and_row(cell, (i % 2) as i32, (i / 2) as i32).unwrap();
    }
    let size = grid.layout();
    engine.add_visual(Arc::new(Lines(Mutex::new(grid))), Vector::ZERO, size);
    engine.tick().unwrap();

    assert_eq!(symbol_at(&engine, 4, 1), Some('│'));
    assert_eq!(symbol_at(&engine, 1, 2), Some('─'));
    assert_eq!(symbol_at(&engine, 4, 2), Some('┼'));
    assert_eq!(symbol_at(&engine, 4, 3), Some('│'));
    assert_eq!(symbol_at(&engine, 2, 1), None);
}

#[test]
fn test_spanning_entry_cuts_the_line_below() {
    let engine = engine(Vector::new(10, 6));
    let (a, b, wide) = (Cell::new(3, 1), Cell::new(3, 1), Cell::new(3, 1));

    let mut grid = two_by_two();
    grid.set_column_and_row(&a, 0, 0).unwrap();
    grid.set_column_and_row(&b, 1, 0).unwrap();
    grid.set_column_and_row(&wide, 0, 1).unwrap();
    grid.set_span(&wide, 2, 1).unwrap();
    let size = grid.layout();
    engine.add_visual(Arc::new(Lines(Mutex::new(grid))), Vector::ZERO, size);
    engine.tick().unwrap();

    assert_eq!(symbol_at(&engine, 4, 1), Some('│'));
    assert_eq!(symbol_at(&engine, 4, 2), Some('┴'));
    assert_eq!(symbol_at(&engine, 4, 3), None);
    assert_eq!(*wide.geometry.lock(), (Vector::new(3, 3), Vector::new(3, 1)));
}

#[test]
fn test_fill_grid_follows_requested_size() {
    let mut grid = Grid::new().with_sizing(GridSizing::Fill);
    grid.add_column(Track::auto());
    grid.add_column(Track::new(5));
    grid.add_column(Track::auto());
    grid.add_row(Track::auto());

    grid.set_size(Vector::new(24, 3));
    assert_eq!(grid.layout(), Vector::new(24, 3));
    assert_eq!(grid.columns().sizes(), vec![7, 5, 8]);

    grid.set_size(Vector::new(23, 3));
    grid.layout();
    assert_eq!(grid.columns().sizes(), vec![7, 5, 7]);
}

//! Terminal setup and teardown.
//!
//! Handles raw mode, the alternate screen, cursor visibility and mouse
//! capture. ANSI terminals get escape sequences written through the
//! [`OutputBuffer`]; legacy consoles get the equivalent crossterm commands,
//! which fall back to the console API.

use std::io::{self, IsTerminal};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};

use crate::renderer::{ansi, DisplayMode, OutputBuffer};
use crate::types::Vector;

/// Terminal setup/teardown handle. Restores the terminal when dropped.
pub struct TerminalSetup {
    mode: DisplayMode,
    is_fullscreen: bool,
    is_raw: bool,
    mouse_enabled: bool,
}

impl TerminalSetup {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            is_fullscreen: false,
            is_raw: false,
            mouse_enabled: false,
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    /// Current terminal size in columns and rows.
    pub fn size() -> io::Result<Vector> {
        let (columns, rows) = crossterm::terminal::size()?;
        Ok(Vector::from((columns, rows)))
    }

    /// Enter fullscreen: raw mode, alternate screen, hidden cursor, mouse capture.
    pub fn enter_fullscreen(&mut self) -> io::Result<()> {
        self.enable_raw_mode()?;

        let mut stdout = io::stdout();
        match self.mode {
            DisplayMode::Native => {
                crossterm::execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
            }
            _ => {
                let mut out = OutputBuffer::new();
                ansi::enter_alt_screen(&mut out)?;
                ansi::cursor_hide(&mut out)?;
                ansi::clear_screen(&mut out)?;
                out.flush_stdout()?;
            }
        }
        self.is_fullscreen = true;

        // Mouse input and window events; on Windows this also turns quick-edit off.
        crossterm::execute!(stdout, EnableMouseCapture)?;
        self.mouse_enabled = true;

        tracing::info!(mode = ?self.mode, raw = self.is_raw, "terminal entered fullscreen");
        Ok(())
    }

    /// Undo everything `enter_fullscreen` did.
    pub fn exit_fullscreen(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();

        if self.mouse_enabled {
            crossterm::execute!(stdout, DisableMouseCapture)?;
            self.mouse_enabled = false;
        }

        if self.is_fullscreen {
            match self.mode {
                DisplayMode::Native => {
                    crossterm::execute!(stdout, Clear(ClearType::All), Show, LeaveAlternateScreen)?;
                }
                _ => {
                    let mut out = OutputBuffer::new();
                    ansi::reset(&mut out)?;
                    ansi::clear_screen(&mut out)?;
                    ansi::cursor_show(&mut out)?;
                    ansi::exit_alt_screen(&mut out)?;
                    out.flush_stdout()?;
                }
            }
            self.is_fullscreen = false;
        }

        self.disable_raw_mode()?;
        tracing::info!("terminal restored");
        Ok(())
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        // Piped stdin (tests, recordings): render anyway, without keyboard input.
        if !io::stdin().is_terminal() {
            tracing::warn!("stdin is not a terminal, raw mode skipped");
            return Ok(());
        }
        crossterm::terminal::enable_raw_mode()?;
        self.is_raw = true;
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if self.is_raw {
            crossterm::terminal::disable_raw_mode()?;
            self.is_raw = false;
        }
        Ok(())
    }
}

impl Drop for TerminalSetup {
    fn drop(&mut self) {
        if self.is_fullscreen || self.is_raw || self.mouse_enabled {
            let _ = self.exit_fullscreen();
        }
    }
}

// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Sets up the crossterm backend, and gives the terminal back when the UI is done.

use std::io::{self, Stdout};

use log::warn;
use ratatui_core::terminal::Terminal;
use ratatui_crossterm::{
    CrosstermBackend,
    crossterm::{
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
};

/// The terminal the UI draws to.
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Raw mode and the alternate screen, left again when dropped.
struct ScreenMode;

impl ScreenMode {
    /// Switches the terminal to raw mode and the alternate screen.
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mode = Self; // from here on, an early return restores raw mode
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(mode)
    }
}

impl Drop for ScreenMode {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Could not disable raw mode: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
            warn!("Could not leave the alternate screen: {e}");
        }
    }
}

/// Owns the [`Tui`] while the UI runs, and restores the terminal when dropped.
///
/// Restoring on drop means that the terminal is also usable again after an error or a panic unwinds through `main`,
/// or when setting up the terminal fails halfway.
pub struct TerminalGuard {
    /// The terminal in raw mode and on the alternate screen.
    terminal: Tui,

    /// Dropped after `terminal`.
    _mode: ScreenMode,
}

impl TerminalGuard {
    /// Switches the terminal to raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the terminal does not support either.
    pub fn new() -> io::Result<Self> {
        let mode = ScreenMode::enter()?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

        let mut guard = Self {
            terminal,
            _mode: mode,
        };
        guard.terminal.clear()?;
        guard.terminal.hide_cursor()?;
        Ok(guard)
    }

    /// Returns a mutable reference to the inner [`Tui`].
    pub const fn terminal_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

#[cfg(test)]
mod tests {
    use std::io::IsTerminal;

    use ratatui_crossterm::crossterm::terminal::is_raw_mode_enabled;

    use super::*;

    #[test]
    fn test_screen_mode_restores_on_drop() {
        // raw mode needs a terminal
        if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
            return;
        }

        let Ok(mode) = ScreenMode::enter() else {
            return;
        };
        assert!(is_raw_mode_enabled().expect("raw mode can be queried"));

        drop(mode);
        assert!(!is_raw_mode_enabled().expect("raw mode can be queried"));
    }
}

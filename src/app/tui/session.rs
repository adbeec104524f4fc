use std::io;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

/// Raw mode plus alternate screen for the lifetime of the browser. The
/// terminal is restored on drop even when the session ends with an error.
pub(super) struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    pub(super) fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)
            .context("failed to enter alternate screen")?;
        Ok(Self { active: true })
    }

    /// Hands the terminal back in cooked mode on the normal screen.
    pub(super) fn suspend(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode().context("failed to disable raw mode")?;
        execute!(io::stdout(), Show, LeaveAlternateScreen)
            .context("failed to leave alternate screen")?;
        Ok(())
    }

    pub(super) fn resume(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        execute!(io::stdout(), EnterAlternateScreen, Hide)
            .context("failed to re-enter alternate screen")?;
        enable_raw_mode().context("failed to re-enable raw mode")?;
        self.active = true;
        Ok(())
    }

    pub(super) fn leave(&mut self) -> Result<()> {
        self.suspend()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        }
    }
}

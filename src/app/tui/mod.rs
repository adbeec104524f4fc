mod render;
mod session;

use std::io::{self, Stdout, Write};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::navigator::{KeySource, Menu, Screen};

use self::render::draw_menu;
use self::session::TerminalSession;

/// Full-screen console on the controlling terminal.
pub(crate) struct TerminalConsole {
    session: TerminalSession,
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalConsole {
    pub(crate) fn open() -> Result<Self> {
        let session = TerminalSession::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
            .context("failed to initialize terminal backend")?;
        terminal.clear()?;
        Ok(Self { session, terminal })
    }

    pub(crate) fn close(mut self) -> Result<()> {
        self.terminal.show_cursor()?;
        self.session.leave()
    }
}

impl Screen for TerminalConsole {
    fn show(&mut self, menu: &Menu<'_>) -> Result<()> {
        self.terminal.draw(|frame| draw_menu(frame, menu))?;
        Ok(())
    }

    /// Back to the normal screen in cooked mode so a typed line reaches
    /// standard input with echo and a real line ending.
    fn suspend(&mut self) -> Result<()> {
        self.session.suspend()?;
        let mut stdout = io::stdout();
        write!(stdout, "Next word: ")?;
        stdout.flush()?;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.session.resume()?;
        self.terminal.clear()?;
        Ok(())
    }
}

impl KeySource for TerminalConsole {
    fn read_key(&mut self) -> Result<char> {
        loop {
            let Event::Key(key) = event::read().context("failed to read terminal event")? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(ch) = key_char(key) {
                return Ok(ch);
            }
        }
    }
}

/// Maps terminal keys onto the characters the navigator understands.
/// Ctrl-C becomes `'\x03'`; every other control chord is dropped.
fn key_char(key: KeyEvent) -> Option<char> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some('\x03'),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(ch) => Some(ch),
        KeyCode::Enter => Some('\n'),
        KeyCode::Esc => Some('\x1b'),
        KeyCode::Backspace => Some('\x08'),
        KeyCode::Delete => Some('\x7f'),
        _ => None,
    }
}

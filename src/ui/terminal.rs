// Crossterm-backed screen: alternate screen + raw mode for the life of the dashboard
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ui::surface::{Panel, Screen};

const INPUT_POLL: Duration = Duration::from_millis(100);

/// Operator commands delivered to the dashboard loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Quit,
}

pub struct TerminalScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalScreen {
    /// Take over the terminal. It is handed back when the screen is dropped.
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            restore_terminal();
            return Err(e);
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Screen for TerminalScreen {
    fn commit(&mut self, panels: &[&Panel]) -> io::Result<()> {
        self.terminal.draw(|frame| {
            for panel in panels {
                frame.render_widget(*panel, panel.area());
            }
        })?;
        Ok(())
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Best effort: leave raw mode and the alternate screen, show the cursor.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Restore the terminal before the default hook prints, so panics stay readable.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        default_hook(info);
    }));
}

fn key_to_control(code: KeyCode, modifiers: KeyModifiers) -> Option<Control> {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Control::Quit),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Control::Quit),
        _ => None,
    }
}

/// Poll the keyboard on a blocking thread and forward commands until the receiver goes away.
pub fn spawn_input_reader(tx: mpsc::Sender<Control>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    warn!(error = %e, "Keyboard polling failed, input disabled");
                    return;
                }
            }
            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "Keyboard read failed, input disabled");
                    return;
                }
            };
            if let Some(control) = key_to_control(key.code, key.modifiers) {
                debug!(?control, "Operator command");
                if tx.blocking_send(control).is_err() {
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        assert_eq!(key_to_control(KeyCode::Char('q'), KeyModifiers::NONE), Some(Control::Quit));
        assert_eq!(key_to_control(KeyCode::Esc, KeyModifiers::NONE), Some(Control::Quit));
        assert_eq!(key_to_control(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(Control::Quit));
        assert_eq!(key_to_control(KeyCode::Char('c'), KeyModifiers::NONE), None);
        assert_eq!(key_to_control(KeyCode::Up, KeyModifiers::NONE), None);
    }
}

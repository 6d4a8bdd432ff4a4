use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info};

use super::app::App;

type Backend = CrosstermBackend<Stdout>;

/// Take over the terminal, run the draw/input loop until the user quits and
/// hand the terminal back, also when the loop fails.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout)).context("failed to create terminal backend")?;

    info!("songbook window opened");
    let result = event_loop(&mut terminal, app);
    let restored = cleanup_terminal(&mut terminal);
    info!("songbook window closed");

    result.and(restored)
}

fn event_loop(terminal: &mut Terminal<Backend>, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if !event::poll(Duration::from_millis(250)).context("event polling failed")? {
            continue;
        }
        if let Event::Key(key_event) = event::read().context("failed to read event")? {
            if key_event.kind == KeyEventKind::Press && dispatch_key(app, key_event)? {
                return Ok(());
            }
        }
    }
}

/// Route one key press. Control chords go to their dedicated handlers; the
/// rest goes through the mode state machine. Returns `true` on quit.
fn dispatch_key(app: &mut App, key_event: KeyEvent) -> Result<bool> {
    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        match key_event.code {
            KeyCode::Char('e') => return app.handle_ctrl_e().map(|_| false),
            KeyCode::Char('l') => return app.handle_ctrl_l().map(|_| false),
            KeyCode::Char('n') => return app.handle_ctrl_n().map(|_| false),
            KeyCode::Char('c') => {
                debug!("ctrl-c pressed");
                return Ok(true);
            }
            _ => {}
        }
    }
    app.handle_key(key_event.code)
}

fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}

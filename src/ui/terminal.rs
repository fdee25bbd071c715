use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, error};

use super::app::App;

type Backend = CrosstermBackend<Stdout>;

/// Spin up the terminal backend, run the draw loop until the user quits, then
/// restore the terminal and save the library. The save happens even when the
/// loop or the terminal restore failed.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;

    let result = event_loop(&mut terminal, app);
    let restored = cleanup_terminal(&mut terminal);
    finish_session(app, result, restored)
}

/// Save the library whatever happened to the loop or the terminal, then
/// report the first failure. Later failures are logged.
fn finish_session(app: &mut App, result: Result<()>, restored: Result<()>) -> Result<()> {
    let saved = app.save();
    let mut failures = [result, restored, saved]
        .into_iter()
        .filter_map(Result::err);
    match failures.next() {
        None => Ok(()),
        Some(first) => {
            for later in failures {
                error!("terminal session also failed: {later:#}");
            }
            Err(first)
        }
    }
}

fn event_loop(terminal: &mut Terminal<Backend>, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if !event::poll(Duration::from_millis(250)).context("event polling failed")? {
            continue;
        }
        let Event::Key(key_event) = event::read().context("failed to read event")? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }

        if key_event.modifiers.contains(KeyModifiers::CONTROL) {
            match key_event.code {
                KeyCode::Char('c') => {
                    debug!("interrupted with ctrl+c");
                    return Ok(());
                }
                KeyCode::Char('s') => {
                    app.save_now();
                    continue;
                }
                _ => {}
            }
        }

        if app.handle_key(key_event.code) {
            return Ok(());
        }
    }
}

fn cleanup_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::library::Library;
    use crate::models::BookDraft;
    use crate::store::LibraryStore;
    use anyhow::anyhow;
    use tempfile::TempDir;

    #[test]
    fn failed_restore_still_saves_the_library() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("library.json");
        let store = LibraryStore::new(&path);
        let mut library = Library::with_books(Vec::new(), store, Rules::default());
        let draft = BookDraft {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            year: "1965".to_string(),
            ..BookDraft::default()
        };
        let _ = library.add(&draft).expect("valid book");
        std::fs::remove_file(&path).expect("remove saved file");
        let mut app = App::new(library, None);

        let outcome = finish_session(&mut app, Ok(()), Err(anyhow!("terminal gone")));

        let err = outcome.expect_err("restore failure is reported");
        assert_eq!(err.to_string(), "terminal gone");
        let (books, _) = LibraryStore::new(&path).load();
        assert_eq!(books.len(), 1);
    }
}

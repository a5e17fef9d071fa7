//! Terminal User Interface for StudyBuddy
//!
//! A sidebar to add and process PDFs, and a chat column to ask questions
//! about them. All session work runs on a worker thread so the interface
//! stays responsive while models load and answers are generated.

pub mod app;
pub mod events;
pub mod ui;
pub mod worker;

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::channel;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::config::Settings;
use crate::session::Notice;

pub use app::{App, Focus, TextInput};
pub use events::{Event, EventHandler};
pub use worker::{spawn_session_worker, SessionCommand, WorkerMessage};

/// Run the TUI application until the user quits
///
/// `files` are pre-loaded into the pending list.
pub fn run_tui(settings: Settings, api_key: Option<String>, files: Vec<PathBuf>) -> Result<()> {
    let (worker_tx, worker_rx) = channel::<WorkerMessage>();
    let commands = spawn_session_worker(settings.clone(), api_key, worker_tx);

    let mut app = App::new(files).with_index_label(settings.retrieval.index.to_string());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut events = EventHandler::default();
    let result = (|| -> Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, &mut app))?;

            match events.next()? {
                Some(Event::Key(key)) => {
                    if let Some(command) = app.handle_key(key.code, key.modifiers) {
                        tracing::debug!("Sending {:?}", command);
                        if commands.send(command).is_err() {
                            app.busy = None;
                            app.notice = Some(Notice::error("Session worker stopped"));
                        }
                    }
                }
                Some(Event::Tick) => app.on_tick(),
                Some(Event::Resize(..)) | None => {}
            }

            while let Ok(message) = worker_rx.try_recv() {
                app.handle_worker_message(message);
            }

            if app.should_quit {
                return Ok(());
            }
        }
    })();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

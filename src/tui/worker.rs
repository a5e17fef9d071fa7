//! Session worker thread
//!
//! The worker owns the [`Session`] and executes one command at a time. The
//! UI thread only ever sees snapshots.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use anyhow::Result;

use crate::config::Settings;
use crate::session::{Notice, Session, SessionBuilder, SessionSnapshot};

/// Requests from the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Process(Vec<PathBuf>),
    Ask(String),
    Clear,
}

/// Messages from the worker thread
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Long-running work started
    Loading(String),
    /// Session built and waiting for commands
    Ready(SessionSnapshot),
    /// A command finished
    Updated {
        snapshot: SessionSnapshot,
        notice: Option<Notice>,
    },
    /// The session could not be built
    Failed(String),
}

/// Build a session from settings on a background thread
pub fn spawn_session_worker(
    settings: Settings,
    api_key: Option<String>,
    tx: Sender<WorkerMessage>,
) -> Sender<SessionCommand> {
    spawn_worker_with(
        move || SessionBuilder::from_settings(&settings, api_key).build(),
        tx,
    )
}

/// Run `build` on a background thread and serve commands against its session
pub fn spawn_worker_with<F>(build: F, tx: Sender<WorkerMessage>) -> Sender<SessionCommand>
where
    F: FnOnce() -> Result<Session> + Send + 'static,
{
    let (command_tx, command_rx) = channel::<SessionCommand>();

    thread::spawn(move || {
        let _ = tx.send(WorkerMessage::Loading("Loading embedding model...".to_string()));

        match build() {
            Ok(session) => {
                let _ = tx.send(WorkerMessage::Ready(session.snapshot()));
                run_command_loop(session, command_rx, tx);
            }
            Err(e) => {
                tracing::error!("Failed to start session: {:#}", e);
                let _ = tx.send(WorkerMessage::Failed(format!("{:#}", e)));
            }
        }
    });

    command_tx
}

fn run_command_loop(
    mut session: Session,
    command_rx: Receiver<SessionCommand>,
    tx: Sender<WorkerMessage>,
) {
    while let Ok(command) = command_rx.recv() {
        let notice = execute(&mut session, command);
        let update = WorkerMessage::Updated {
            snapshot: session.snapshot(),
            notice,
        };

        if tx.send(update).is_err() {
            break;
        }
    }

    tracing::debug!("Session worker stopped");
}

/// Apply one command to the session, returning the banner to show
pub fn execute(session: &mut Session, command: SessionCommand) -> Option<Notice> {
    match command {
        SessionCommand::Process(paths) => match session.process_documents(&paths) {
            Ok(summary) => {
                let mut notice = Notice::success(summary.message());
                if !summary.skipped.is_empty() {
                    let names: Vec<&str> = summary.skipped.iter().map(|(n, _)| n.as_str()).collect();
                    notice.message = format!("{} Skipped: {}", notice.message, names.join(", "));
                }
                Some(notice)
            }
            Err(e) => Some(e.to_notice()),
        },
        SessionCommand::Ask(question) => session.ask(&question).err().map(|e| e.to_notice()),
        SessionCommand::Clear => {
            session.clear_chat();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::{ChatMessage, Generator, SamplingParams};
    use crate::session::{NoticeLevel, SessionStatus};
    use std::sync::Arc;
    use std::time::Duration;

    struct CannedGenerator;

    impl Generator for CannedGenerator {
        fn generate(&self, _messages: &[ChatMessage], _params: &SamplingParams) -> Result<String> {
            Ok("Mitochondria produce ATP.".to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }

        fn has_credentials(&self) -> bool {
            true
        }
    }

    fn offline_session() -> Result<Session> {
        let mut settings = Settings::default();
        settings.embedding.backend = "token".to_string();
        SessionBuilder::from_settings(&settings, None)
            .with_generator(Arc::new(CannedGenerator))
            .build()
    }

    fn recv(rx: &Receiver<WorkerMessage>) -> WorkerMessage {
        rx.recv_timeout(Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_worker_reports_ready_then_updates() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("cells.txt");
        std::fs::write(&notes, "Mitochondria are the powerhouse of the cell.").unwrap();

        let (tx, rx) = channel();
        let commands = spawn_worker_with(offline_session, tx);

        assert!(matches!(recv(&rx), WorkerMessage::Loading(_)));
        match recv(&rx) {
            WorkerMessage::Ready(snapshot) => {
                assert_eq!(snapshot.status, SessionStatus::WaitingForDocuments)
            }
            other => panic!("unexpected message: {:?}", other),
        }

        commands.send(SessionCommand::Process(vec![notes])).unwrap();
        match recv(&rx) {
            WorkerMessage::Updated { snapshot, notice } => {
                assert_eq!(snapshot.status, SessionStatus::Ready);
                assert_eq!(notice, Some(Notice::success("1 document(s) processed!")));
            }
            other => panic!("unexpected message: {:?}", other),
        }

        commands.send(SessionCommand::Ask("What do mitochondria do?".to_string())).unwrap();
        match recv(&rx) {
            WorkerMessage::Updated { snapshot, notice } => {
                assert!(notice.is_none());
                assert_eq!(snapshot.history.len(), 2);
                assert_eq!(snapshot.history[1], ChatMessage::assistant("Mitochondria produce ATP."));
            }
            other => panic!("unexpected message: {:?}", other),
        }

        commands.send(SessionCommand::Clear).unwrap();
        match recv(&rx) {
            WorkerMessage::Updated { snapshot, .. } => {
                assert!(snapshot.history.is_empty());
                assert_eq!(snapshot.status, SessionStatus::Ready);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_build_failure_is_reported() {
        let (tx, rx) = channel();
        let _commands = spawn_worker_with(|| anyhow::bail!("model not found"), tx);

        assert!(matches!(recv(&rx), WorkerMessage::Loading(_)));
        match recv(&rx) {
            WorkerMessage::Failed(message) => assert!(message.contains("model not found")),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_ask_without_documents_is_warning() {
        let mut session = offline_session().unwrap();
        let notice = execute(&mut session, SessionCommand::Ask("Why?".to_string())).unwrap();

        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.message, "Please upload and process documents first.");
        assert!(session.history().is_empty());
    }
}

//! TUI application state and key handling

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyModifiers};

use crate::data::display_name;
use crate::session::{Notice, SessionSnapshot, SessionStatus};

use super::worker::{SessionCommand, WorkerMessage};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const PROCESSING_MESSAGE: &str = "Extracting text & building index...";
pub const THINKING_MESSAGE: &str = "Thinking...";

/// Focusable widgets, in Tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    UploadPath,
    Files,
    Process,
    ClearChat,
    Question,
}

impl Focus {
    pub fn index(&self) -> usize {
        match self {
            Focus::UploadPath => 0,
            Focus::Files => 1,
            Focus::Process => 2,
            Focus::ClearChat => 3,
            Focus::Question => 4,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index % 5 {
            0 => Focus::UploadPath,
            1 => Focus::Files,
            2 => Focus::Process,
            3 => Focus::ClearChat,
            _ => Focus::Question,
        }
    }

    pub fn next(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn prev(&self) -> Self {
        Self::from_index(self.index() + 4)
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Focus::UploadPath | Focus::Question)
    }
}

/// Single-line text input with a character cursor
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Clear the input and return what it held
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    /// Apply an editing key; returns false if the key is not an editing key
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let at = self.byte_offset(self.cursor - 1);
                    self.value.remove(at);
                    self.cursor -= 1;
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.char_count() {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.char_count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.char_count(),
            _ => return false,
        }
        true
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}

/// Application state
pub struct App {
    pub focus: Focus,
    pub upload_input: TextInput,
    pub question_input: TextInput,
    /// Files added but not necessarily processed yet
    pub pending_files: Vec<PathBuf>,
    /// Highlighted entry of `pending_files` while the list has focus
    pub selected_file: usize,
    pub notice: Option<Notice>,
    /// Spinner message while the worker is busy
    pub busy: Option<String>,
    pub spinner_frame: usize,
    /// Latest session state; `None` until the worker is ready
    pub snapshot: Option<SessionSnapshot>,
    /// Lines scrolled up from the newest message
    pub chat_scroll: u16,
    /// Shown in the sidebar footer
    pub index_label: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(pending_files: Vec<PathBuf>) -> Self {
        Self {
            focus: Focus::UploadPath,
            upload_input: TextInput::new(),
            question_input: TextInput::new(),
            pending_files,
            selected_file: 0,
            notice: None,
            busy: None,
            spinner_frame: 0,
            snapshot: None,
            chat_scroll: 0,
            index_label: "Flat".to_string(),
            should_quit: false,
        }
    }

    pub fn with_index_label(mut self, label: impl Into<String>) -> Self {
        self.index_label = label.into();
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.snapshot
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(SessionStatus::WaitingForDocuments)
    }

    /// Whether the worker can take a command right now
    pub fn can_submit(&self) -> bool {
        self.busy.is_none() && self.snapshot.is_some()
    }

    pub fn can_process(&self) -> bool {
        self.can_submit() && !self.pending_files.is_empty()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    pub fn on_tick(&mut self) {
        if self.busy.is_some() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    /// Handle a key press, returning a command for the worker if one results
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Option<SessionCommand> {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match key {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return None;
            }
            KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(5);
                return None;
            }
            KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(5);
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::UploadPath => self.handle_upload_key(key),
            Focus::Files => self.handle_files_key(key),
            Focus::Question => self.handle_question_key(key),
            Focus::Process => self.handle_button_key(key, Self::process_command),
            Focus::ClearChat => self.handle_button_key(key, Self::clear_command),
        }
    }

    fn handle_upload_key(&mut self, key: KeyCode) -> Option<SessionCommand> {
        match key {
            KeyCode::Enter => self.add_upload_path(),
            KeyCode::Esc => self.focus = Focus::Process,
            _ => {
                self.upload_input.handle_key(key);
            }
        }
        None
    }

    fn handle_files_key(&mut self, key: KeyCode) -> Option<SessionCommand> {
        match key {
            KeyCode::Up => self.selected_file = self.selected_file.saturating_sub(1),
            KeyCode::Down => {
                if self.selected_file + 1 < self.pending_files.len() {
                    self.selected_file += 1;
                }
            }
            KeyCode::Delete | KeyCode::Backspace => self.remove_selected_file(),
            KeyCode::Esc => self.focus = Focus::Process,
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
        None
    }

    /// Drop the highlighted file; the next Process indexes only what remains
    pub fn remove_selected_file(&mut self) {
        if self.selected_file >= self.pending_files.len() {
            return;
        }
        let removed = self.pending_files.remove(self.selected_file);
        tracing::debug!("Removed {:?}", removed);
        self.selected_file = self.selected_file.min(self.pending_files.len().saturating_sub(1));
        self.notice = Some(Notice::warning(format!("Removed {}.", display_name(&removed))));
    }

    fn handle_question_key(&mut self, key: KeyCode) -> Option<SessionCommand> {
        match key {
            KeyCode::Enter => {
                if !self.can_submit() {
                    return None;
                }
                let question = self.question_input.take();
                self.busy = Some(THINKING_MESSAGE.to_string());
                self.notice = None;
                self.chat_scroll = 0;
                Some(SessionCommand::Ask(question))
            }
            KeyCode::Esc => {
                self.focus = Focus::ClearChat;
                None
            }
            _ => {
                self.question_input.handle_key(key);
                None
            }
        }
    }

    fn handle_button_key(
        &mut self,
        key: KeyCode,
        press: fn(&mut Self) -> Option<SessionCommand>,
    ) -> Option<SessionCommand> {
        match key {
            KeyCode::Enter | KeyCode::Char(' ') => press(self),
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            _ => None,
        }
    }

    fn process_command(&mut self) -> Option<SessionCommand> {
        if !self.can_process() {
            return None;
        }
        self.busy = Some(PROCESSING_MESSAGE.to_string());
        self.notice = None;
        Some(SessionCommand::Process(self.pending_files.clone()))
    }

    fn clear_command(&mut self) -> Option<SessionCommand> {
        if !self.can_submit() {
            return None;
        }
        self.chat_scroll = 0;
        Some(SessionCommand::Clear)
    }

    /// Validate the typed path and add it to the pending files
    pub fn add_upload_path(&mut self) {
        let raw = self.upload_input.value().trim().trim_matches(|c| c == '\'' || c == '"');
        if raw.is_empty() {
            return;
        }
        let path = PathBuf::from(raw);

        if !is_pdf(&path) {
            self.notice = Some(Notice::error(format!("Only PDF files are supported: {}", raw)));
            return;
        }
        if !path.is_file() {
            self.notice = Some(Notice::error(format!("File not found: {}", raw)));
            return;
        }
        if self.pending_files.contains(&path) {
            self.notice = Some(Notice::warning(format!("{} is already added.", display_name(&path))));
            self.upload_input.take();
            return;
        }

        tracing::debug!("Added {:?}", path);
        self.pending_files.push(path);
        self.upload_input.take();
        self.notice = None;
    }

    pub fn handle_worker_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Loading(text) => self.busy = Some(text),
            WorkerMessage::Ready(snapshot) => {
                self.busy = None;
                self.snapshot = Some(snapshot);
            }
            WorkerMessage::Updated { snapshot, notice } => {
                self.busy = None;
                self.snapshot = Some(snapshot);
                self.notice = notice;
                self.chat_scroll = 0;
            }
            WorkerMessage::Failed(error) => {
                self.busy = None;
                self.notice = Some(Notice::error(format!("Failed to start session: {}", error)));
            }
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

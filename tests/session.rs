//! End-to-end session behaviour with an offline embedder and a recording
//! generator in place of the hosted model.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use studybuddy::rag::{ChatMessage, Generator, Role, SamplingParams};
use studybuddy::session::{NoticeLevel, Session, SessionBuilder, SessionError, SessionStatus};
use studybuddy::Settings;

struct RecordingGenerator {
    calls: AtomicUsize,
    has_key: bool,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl RecordingGenerator {
    fn new(has_key: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            has_key,
            last_messages: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for RecordingGenerator {
    fn generate(&self, messages: &[ChatMessage], _params: &SamplingParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        Ok("Photosynthesis converts light into chemical energy.".to_string())
    }

    fn model_name(&self) -> &str {
        "recording"
    }

    fn has_credentials(&self) -> bool {
        self.has_key
    }
}

fn session_with(generator: Arc<RecordingGenerator>) -> Session {
    let mut settings = Settings::default();
    settings.embedding.backend = "token".to_string();

    SessionBuilder::from_settings(&settings, None)
        .with_generator(generator)
        .build()
        .unwrap()
}

fn write_notes(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[cfg(feature = "pdf")]
fn write_test_pdf(path: &Path, pages: &[&str]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = Vec::new();
        if !text.is_empty() {
            operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ];
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[cfg(feature = "pdf")]
#[test]
fn test_extractable_pdfs_build_an_index() {
    let dir = tempfile::tempdir().unwrap();
    let biology = dir.path().join("biology.pdf");
    let chemistry = dir.path().join("chemistry.pdf");
    write_test_pdf(&biology, &["Photosynthesis happens in chloroplasts", "Cells divide by mitosis"]);
    write_test_pdf(&chemistry, &["Water boils at 100 degrees Celsius"]);

    let mut session = session_with(RecordingGenerator::new(true));
    let summary = session.process_documents(&[biology, chemistry]).unwrap();

    assert_eq!(summary.message(), "2 document(s) processed!");
    assert!(summary.chunks >= 1);
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.document_names(), ["biology.pdf", "chemistry.pdf"]);
    assert!(!session.index().unwrap().is_empty());
}

#[cfg(feature = "pdf")]
#[test]
fn test_pdfs_without_text_build_no_index() {
    let dir = tempfile::tempdir().unwrap();
    let scanned = dir.path().join("scanned.pdf");
    write_test_pdf(&scanned, &["", ""]);

    let mut session = session_with(RecordingGenerator::new(true));
    let err = session.process_documents(&[scanned]).unwrap_err();

    assert!(matches!(err, SessionError::NoExtractableText));
    assert_eq!(err.severity(), NoticeLevel::Error);
    assert_eq!(err.to_string(), "Could not extract text from the uploaded PDFs.");
    assert!(session.index().is_none());
    assert_eq!(session.status(), SessionStatus::WaitingForDocuments);
}

#[test]
fn test_failed_processing_keeps_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    let notes = write_notes(dir.path(), "notes.txt", "Osmosis moves water across membranes.");
    let blank = write_notes(dir.path(), "blank.txt", "   \n\n  ");

    let mut session = session_with(RecordingGenerator::new(true));
    session.process_documents(&[notes]).unwrap();

    let err = session.process_documents(&[blank]).unwrap_err();

    assert!(matches!(err, SessionError::NoExtractableText));
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.document_names(), ["notes.txt"]);
}

#[test]
fn test_question_without_index_makes_no_request() {
    let generator = RecordingGenerator::new(true);
    let mut session = session_with(generator.clone());

    let err = session.ask("What is osmosis?").unwrap_err();

    assert!(matches!(err, SessionError::NoDocuments));
    assert_eq!(err.severity(), NoticeLevel::Warning);
    assert_eq!(err.to_string(), "Please upload and process documents first.");
    assert!(session.history().is_empty());
    assert_eq!(generator.calls(), 0);
}

#[test]
fn test_question_without_credential_makes_no_request() {
    let dir = tempfile::tempdir().unwrap();
    let notes = write_notes(dir.path(), "notes.txt", "Osmosis moves water across membranes.");

    let generator = RecordingGenerator::new(false);
    let mut session = session_with(generator.clone());
    session.process_documents(&[notes]).unwrap();

    let err = session.ask("What is osmosis?").unwrap_err();

    assert_eq!(err.to_string(), "GROQ_API_KEY not found. Please add it to your .env file.");
    assert_eq!(err.severity(), NoticeLevel::Error);
    assert!(session.history().is_empty());
    assert_eq!(generator.calls(), 0);
}

#[test]
fn test_credential_is_checked_before_index() {
    let generator = RecordingGenerator::new(false);
    let mut session = session_with(generator.clone());

    let err = session.ask("What is osmosis?").unwrap_err();

    assert!(matches!(err, SessionError::MissingCredential { .. }));
    assert_eq!(generator.calls(), 0);
}

#[test]
fn test_empty_question_is_rejected() {
    let generator = RecordingGenerator::new(true);
    let mut session = session_with(generator.clone());

    let err = session.ask("   ").unwrap_err();

    assert!(matches!(err, SessionError::EmptyQuestion));
    assert_eq!(generator.calls(), 0);
}

#[test]
fn test_answer_follows_question_in_history() {
    let dir = tempfile::tempdir().unwrap();
    let notes = write_notes(
        dir.path(),
        "biology.txt",
        "Photosynthesis converts light energy into chemical energy in chloroplasts.",
    );

    let generator = RecordingGenerator::new(true);
    let mut session = session_with(generator.clone());
    session.process_documents(&[notes]).unwrap();

    let answer = session.ask("  What does photosynthesis do?  ").unwrap().clone();

    assert_eq!(
        session.history(),
        [
            ChatMessage::user("What does photosynthesis do?"),
            answer.clone(),
        ]
    );
    assert_eq!(answer.role, Role::Assistant);
    assert_eq!(generator.calls(), 1);

    let sent = generator.last_messages.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].role, Role::System);
    assert!(sent[0].content.contains("chloroplasts"));
    assert_eq!(sent[1], ChatMessage::user("What does photosynthesis do?"));
}

#[test]
fn test_clear_chat_keeps_index() {
    let dir = tempfile::tempdir().unwrap();
    let notes = write_notes(dir.path(), "notes.txt", "Mitosis produces two identical cells.");

    let generator = RecordingGenerator::new(true);
    let mut session = session_with(generator.clone());
    session.process_documents(&[notes]).unwrap();
    session.ask("What does mitosis produce?").unwrap();

    session.clear_chat();

    assert!(session.history().is_empty());
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.document_names(), ["notes.txt"]);

    session.ask("And again?").unwrap();
    assert_eq!(session.history().len(), 2);
    assert_eq!(generator.calls(), 2);
}

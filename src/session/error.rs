//! Session failures and user-facing notices

use serde::{Deserialize, Serialize};

/// Failures of the session actions the user can trigger
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Please upload at least one PDF.")]
    NoFiles,

    #[error("Could not extract text from the uploaded PDFs.")]
    NoExtractableText,

    #[error("Failed to build the search index: {0:#}")]
    Indexing(anyhow::Error),

    #[error("Please enter a question.")]
    EmptyQuestion,

    #[error("{key} not found. Please add it to your .env file.")]
    MissingCredential { key: String },

    #[error("Please upload and process documents first.")]
    NoDocuments,
}

impl SessionError {
    /// How prominently the failure is shown
    pub fn severity(&self) -> NoticeLevel {
        match self {
            Self::NoFiles | Self::EmptyQuestion | Self::NoDocuments => NoticeLevel::Warning,
            Self::NoExtractableText | Self::Indexing(_) | Self::MissingCredential { .. } => {
                NoticeLevel::Error
            }
        }
    }

    /// Convert into a banner
    pub fn to_notice(&self) -> Notice {
        Notice::new(self.severity(), self.to_string())
    }
}

/// Banner level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Transient banner shown after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

impl From<&SessionError> for Notice {
    fn from(err: &SessionError) -> Self {
        err.to_notice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            SessionError::NoDocuments.to_string(),
            "Please upload and process documents first."
        );
        assert_eq!(
            SessionError::NoExtractableText.to_string(),
            "Could not extract text from the uploaded PDFs."
        );
        assert_eq!(
            SessionError::MissingCredential { key: "GROQ_API_KEY".to_string() }.to_string(),
            "GROQ_API_KEY not found. Please add it to your .env file."
        );
    }

    #[test]
    fn test_severity() {
        assert_eq!(SessionError::NoDocuments.severity(), NoticeLevel::Warning);
        assert_eq!(SessionError::NoExtractableText.severity(), NoticeLevel::Error);
        assert_eq!(
            SessionError::MissingCredential { key: "K".to_string() }.severity(),
            NoticeLevel::Error
        );
    }

    #[test]
    fn test_indexing_error_includes_cause() {
        let err = SessionError::Indexing(
            anyhow::anyhow!("model not found").context("Failed to embed chunks"),
        );
        let notice = Notice::from(&err);

        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("Failed to embed chunks: model not found"));
    }
}

//! Error type shared by extraction, the LLM client and the assistant operations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StudyError>;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error("GEMINI_API_KEY is not set; LLM features are disabled")]
    MissingApiKey,

    #[error("failed to extract text from PDF: {0}")]
    Extraction(String),

    #[error("the PDF contains no extractable text")]
    EmptyDocument,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("could not decode LLM response: {0}")]
    Decode(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("could not serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StudyError {
    /// Short text for the terminal, prefixed with what the user was doing.
    pub fn user_message(&self, context: &str) -> String {
        match self {
            StudyError::MissingApiKey => format!(
                "{}: no API key configured. Set GEMINI_API_KEY in the environment or in the config file.",
                context
            ),
            StudyError::Api { status, .. } if *status == 401 || *status == 403 => {
                format!("{}: the API key was rejected ({})", context, status)
            }
            StudyError::Api { status: 429, .. } => {
                format!("{}: quota exceeded, try again later", context)
            }
            other => format!("{}: {}", context, other),
        }
    }

    /// True for failures caused by the remote service rather than local input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            StudyError::Http(_) | StudyError::Api { .. } | StudyError::Decode(_) | StudyError::EmptyResponse
        )
    }
}

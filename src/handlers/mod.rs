//! Handlers: run one study action and print its result.
//!
//! Handlers return the action's error untouched; [`report`] is the only place
//! an error becomes terminal text.

pub mod chat;
pub mod interactive;
pub mod quiz;
pub mod summary;

use crate::assistant::Lecture;
use crate::cli::Action;
use crate::error::{Result, StudyError};
use crate::llm::TextGenerator;
use crate::printer::print_error;
use crate::prompt::QuizSource;

#[derive(Debug, Clone)]
pub struct Settings {
    pub markdown: bool,
    pub quiz_source: QuizSource,
    pub show_answers: bool,
    pub json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { markdown: true, quiz_source: QuizSource::Lecture, show_answers: true, json: false }
    }
}

/// Everything an action needs: the LLM capability, the lecture and output settings.
pub struct Session<'a, G> {
    pub generator: &'a G,
    pub lecture: &'a Lecture,
    pub settings: Settings,
}

/// Run `action` once. A chat action needs the question already in hand.
pub async fn run_action<G: TextGenerator>(
    session: &Session<'_, G>,
    action: Action,
    question: Option<&str>,
) -> Result<()> {
    match action {
        Action::Summary => summary::run(session).await,
        Action::GenerateMcqs => quiz::run(session).await,
        Action::Chatbot => chat::run(session, question.unwrap_or_default()).await,
    }
}

pub fn error_context(action: Action) -> &'static str {
    match action {
        Action::Summary => "Error summarizing text",
        Action::GenerateMcqs => "Error generating MCQs",
        Action::Chatbot => "Error answering question",
    }
}

pub fn report(action: Action, err: &StudyError) {
    if err.is_remote() {
        tracing::warn!(error = %err, action = action.label(), "LLM request failed");
    } else {
        tracing::debug!(error = ?err, action = action.label(), "action failed");
    }
    print_error(&err.user_message(error_context(action)));
}

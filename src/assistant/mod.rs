//! The study actions: summary, quiz generation and question answering.
//!
//! Every operation returns a [`Result`]; turning failures into terminal output
//! is left to the handlers.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, StudyError};
use crate::llm::TextGenerator;
use crate::prompt::{self, QuizSource};
use crate::quiz::{self, QuizParse};
use crate::utils::pdf::{self, PdfBackend, Progress};
use crate::utils::unicode::{clean_text, preview};

/// Cleaned text of one uploaded lecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lecture {
    text: String,
}

impl Lecture {
    /// Extract and clean the PDF at `path`.
    pub fn load<F>(path: &Path, backend: PdfBackend, on_progress: F) -> Result<Self>
    where
        F: FnMut(Progress),
    {
        let text = pdf::extract_pdf_text(path, backend, on_progress)?;
        Self::from_text(text)
    }

    /// Build a lecture from already extracted page texts.
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Result<Self> {
        Self::from_text(pdf::concat_pages(pages, |_| {}))
    }

    pub fn from_text(text: String) -> Result<Self> {
        let text = clean_text(&text).into_owned();
        if text.trim().is_empty() {
            return Err(StudyError::EmptyDocument);
        }
        info!(chars = text.chars().count(), start = %preview(text.trim_start(), 60), "lecture loaded");
        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

async fn ask<G: TextGenerator>(
    generator: &G,
    prompt: &str,
    on_chunk: Option<&mut dyn FnMut(&str)>,
) -> Result<String> {
    match on_chunk {
        Some(sink) => generator.generate_streaming(prompt, sink).await,
        None => generator.generate(prompt).await,
    }
}

/// Summarize the lecture. `on_chunk`, when given, receives text as it streams in.
pub async fn summarize<G: TextGenerator>(
    generator: &G,
    lecture: &Lecture,
    on_chunk: Option<&mut dyn FnMut(&str)>,
) -> Result<String> {
    let prompt = prompt::summary_prompt(lecture.text());
    ask(generator, &prompt, on_chunk).await
}

/// Generate the multiple-choice quiz. With [`QuizSource::Summary`] a summary is
/// produced first and the questions are built from it.
pub async fn generate_mcqs<G: TextGenerator>(
    generator: &G,
    lecture: &Lecture,
    source: QuizSource,
) -> Result<QuizParse> {
    let source_text = match source {
        QuizSource::Lecture => lecture.text().to_string(),
        QuizSource::Summary => summarize(generator, lecture, None).await?,
    };
    let prompt = prompt::mcq_prompt(&source_text, source);
    let response = generator.generate(&prompt).await?;

    let parsed = quiz::parse_mcqs(&response);
    for dropped in &parsed.incomplete {
        warn!(question = %dropped.question, reason = ?dropped.reason, "dropping incomplete question");
    }
    info!(questions = parsed.questions.len(), dropped = parsed.incomplete.len(), "quiz parsed");
    Ok(parsed)
}

/// Answer a free-form question about the lecture.
pub async fn answer_question<G: TextGenerator>(
    generator: &G,
    lecture: &Lecture,
    question: &str,
    on_chunk: Option<&mut dyn FnMut(&str)>,
) -> Result<String> {
    if question.trim().is_empty() {
        return Err(StudyError::EmptyQuestion);
    }
    let question = clean_text(question);
    let prompt = prompt::answer_prompt(lecture.text(), &question);
    ask(generator, &prompt, on_chunk).await
}

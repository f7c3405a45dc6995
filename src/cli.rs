use std::path::PathBuf;

use clap::{error::ErrorKind, ArgGroup, CommandFactory, Parser, ValueEnum};

use crate::prompt::QuizSource;
use crate::utils::pdf::PdfBackend;

/// What to do with the uploaded lecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Summarize the lecture.
    Summary,
    /// Generate multiple-choice questions.
    #[value(name = "mcq", alias = "generate-mcqs")]
    GenerateMcqs,
    /// Ask questions about the lecture.
    #[value(name = "chat", alias = "chatbot")]
    Chatbot,
}

impl Action {
    /// Map a menu key from the interactive selector. `None` means quit or unknown.
    pub fn from_menu_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "s" | "1" | "summary" => Some(Action::Summary),
            "m" | "2" | "mcq" | "mcqs" => Some(Action::GenerateMcqs),
            "c" | "3" | "chat" | "chatbot" => Some(Action::Chatbot),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Summary => "Summary",
            Action::GenerateMcqs => "Generate MCQs",
            Action::Chatbot => "Chatbot",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "edura", about = "Edura - A Study Assistant", version)]
#[command(group(ArgGroup::new("md_switch").args(["md", "no_md"]).multiple(false)))]
pub struct Cli {
    /// The PDF lecture to study.
    #[arg(value_name = "PDF")]
    pub pdf: PathBuf,

    /// Run one action and exit. Without it an interactive menu is shown.
    #[arg(short = 'a', long, value_enum)]
    pub action: Option<Action>,

    /// Question for `--action chat`. Prompted for when omitted.
    #[arg(long)]
    pub question: Option<String>,

    /// Large language model to use.
    #[arg(long)]
    pub model: Option<String>,

    /// Randomness of generated output.
    #[arg(long, default_value_t = 0.7, value_parser = clap::value_parser!(f32))]
    pub temperature: f32,

    /// Limits highest probable tokens (words).
    #[arg(long = "top-p", default_value_t = 1.0, value_parser = clap::value_parser!(f32))]
    pub top_p: f32,

    /// Upper bound on generated tokens per request.
    #[arg(long = "max-tokens")]
    pub max_tokens: Option<u32>,

    /// Prettify Markdown output (buffer then render at end).
    #[arg(long)]
    pub md: bool,
    /// Disable Markdown prettifying (print text as it arrives).
    #[arg(long = "no-md")]
    pub no_md: bool,

    /// Build the quiz from the lecture text or from a generated summary.
    #[arg(long = "quiz-source", value_enum)]
    pub quiz_source: Option<QuizSource>,

    /// Leave the correct answers out of the printed quiz.
    #[arg(long = "hide-answers")]
    pub hide_answers: bool,

    /// Print the quiz as JSON instead of text. Applies to MCQs only.
    #[arg(long)]
    pub json: bool,

    /// PDF text extractor (auto|pdftotext|native).
    #[arg(long = "pdf-backend")]
    pub pdf_backend: Option<PdfBackend>,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        let cli = <Self as Parser>::parse();
        if let Err(e) = cli.validate() {
            e.exit();
        }
        cli
    }

    /// Reject flag combinations clap cannot express on its own.
    pub fn validate(&self) -> Result<(), clap::Error> {
        match self.action {
            Some(action @ (Action::Summary | Action::Chatbot)) if self.json => Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                format!("--json only applies to the quiz (--action mcq), not to {}", action.label()),
            )),
            _ => Ok(()),
        }
    }
}

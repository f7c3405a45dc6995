use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use edura::cli::{Action, Cli};
use edura::config::Config;
use edura::handlers::{self, interactive, Session, Settings};
use edura::llm::{Backend, ChatOptions, DEFAULT_MODEL};
use edura::printer::{print_error, print_status};
use edura::prompt::QuizSource;
use edura::utils::{pdf::PdfBackend, read_input_line};
use edura::{Lecture, StudyError};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let cfg = Config::load();

    // Resolve model: CLI overrides config; fall back to DEFAULT_MODEL
    let opts = ChatOptions {
        model: args
            .model
            .clone()
            .or_else(|| cfg.get_nonempty("DEFAULT_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature: args.temperature,
        top_p: args.top_p,
        max_tokens: args
            .max_tokens
            .or_else(|| cfg.get_u64("MAX_TOKENS").and_then(|v| u32::try_from(v).ok())),
    };

    let backend = Backend::from_config(&cfg, opts).context("failed to set up the LLM client")?;
    if !backend.is_enabled() {
        print_error(&StudyError::MissingApiKey.user_message("Gemini API key not found"));
    }

    let pdf_backend = args
        .pdf_backend
        .unwrap_or_else(|| config_value(&cfg, "PDF_BACKEND", PdfBackend::Auto));

    let lecture = match load_lecture(&args, pdf_backend) {
        Ok(lecture) => lecture,
        Err(e) => {
            print_error(&e.user_message("Error extracting text from PDF"));
            return Ok(ExitCode::FAILURE);
        }
    };

    let markdown = if args.no_md {
        false
    } else if args.md {
        true
    } else {
        cfg.get_bool("PRETTIFY_MARKDOWN")
    };
    let settings = Settings {
        markdown,
        quiz_source: args
            .quiz_source
            .unwrap_or_else(|| config_value(&cfg, "QUIZ_SOURCE", QuizSource::Lecture)),
        show_answers: !args.hide_answers,
        json: args.json,
    };
    let session = Session { generator: &backend, lecture: &lecture, settings };

    let Some(action) = args.action else {
        interactive::run(&session, &mut io::stdin().lock()).await?;
        return Ok(ExitCode::SUCCESS);
    };

    let question = match (action, args.question.clone()) {
        (Action::Chatbot, None) => {
            print!("Ask a question based on the lecture: ");
            io::stdout().flush().ok();
            read_input_line(&mut io::stdin().lock())?
        }
        (_, q) => q,
    };

    match handlers::run_action(&session, action, question.as_deref()).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            handlers::report(action, &e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_lecture(args: &Cli, backend: PdfBackend) -> edura::Result<Lecture> {
    let show_progress = io::stderr().is_terminal();
    print_status("Extracting text from the PDF...");
    let lecture = Lecture::load(&args.pdf, backend, |p| {
        if show_progress {
            eprint!("\r  {}", p);
        }
    });
    if show_progress {
        eprintln!();
    }
    lecture
}

/// Parse a config value, warning and falling back to `default` when it is invalid.
fn config_value<T>(cfg: &Config, key: &str, default: T) -> T
where
    T: std::str::FromStr<Err = String>,
{
    match cfg.get(key).map(|v| v.parse::<T>()) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            warn!(key, error = %e, "ignoring invalid config value");
            default
        }
        None => default,
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("edura={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

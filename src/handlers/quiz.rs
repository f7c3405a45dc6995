//! Quiz handler: generates the MCQs and prints them as Markdown, plain text or JSON.

use super::Session;
use crate::assistant;
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::printer::{print_section, print_status, print_warning, TextPrinter};
use crate::quiz::{render_markdown, McqQuestion, QuizParse};

pub async fn run<G: TextGenerator>(session: &Session<'_, G>) -> Result<()> {
    print_status("Generating MCQs...");
    let parsed = assistant::generate_mcqs(session.generator, session.lecture, session.settings.quiz_source).await?;

    if session.settings.json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    print(&parsed, session.settings.markdown, session.settings.show_answers);
    Ok(())
}

fn print(parsed: &QuizParse, markdown: bool, show_answers: bool) {
    if parsed.questions.is_empty() {
        print_warning("The model's reply did not contain any complete questions.");
    } else if markdown {
        print_section("Knowledge Check (MCQs)", &render_markdown(&parsed.questions, show_answers), true);
    } else {
        TextPrinter { color: Some("cyan") }.print("Knowledge Check (MCQs)");
        println!("{}", render_plain(&parsed.questions, show_answers));
    }

    if !parsed.incomplete.is_empty() {
        print_warning(&format!(
            "{} question(s) had no correct answer and were left out.",
            parsed.incomplete.len()
        ));
    }
}

fn render_plain(questions: &[McqQuestion], show_answers: bool) -> String {
    let mut text = String::new();
    for q in questions {
        text.push_str(&q.question);
        text.push('\n');
        for option in &q.options {
            text.push_str("   ");
            text.push_str(option);
            text.push('\n');
        }
        if show_answers {
            text.push_str(&format!("   Correct Answer: {}\n", q.answer));
        }
        text.push('\n');
    }
    text
}

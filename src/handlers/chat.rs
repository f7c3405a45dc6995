//! Chatbot handler: answers one question about the lecture.

use std::io::{self, Write};

use super::Session;
use crate::assistant;
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::printer::{print_heading, print_section, print_status};

pub async fn run<G: TextGenerator>(session: &Session<'_, G>, question: &str) -> Result<()> {
    print_status("Generating answer...");
    if session.settings.markdown {
        let answer = assistant::answer_question(session.generator, session.lecture, question, None).await?;
        print_section("Chatbot Answer", &answer, true);
    } else {
        print_heading("Chatbot Answer");
        let mut out = io::stdout();
        let mut sink = |t: &str| {
            print!("{}", t);
            out.flush().ok();
        };
        assistant::answer_question(
            session.generator,
            session.lecture,
            question,
            Some(&mut sink as &mut dyn FnMut(&str)),
        )
        .await?;
        println!();
    }
    Ok(())
}

//! Interactive selector: the menu loop shown when no `--action` is given.

use std::io::{self, BufRead, Write};

use super::{chat, report, run_action, Session};
use crate::cli::Action;
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::printer::print_warning;
use crate::utils::read_input_line;

const MENU: &str = "What would you like to do? [S]ummary, [M]CQs, [C]hatbot, [Q]uit: ";
const CHAT_PROMPT: &str = "Ask a question based on the lecture (empty line to go back): ";

fn prompt(text: &str) {
    print!("{}", text);
    io::stdout().flush().ok();
}

/// Loop over the menu until quit or end of input. Action failures are
/// reported and the loop continues; only input errors end it early.
pub async fn run<G: TextGenerator, R: BufRead>(session: &Session<'_, G>, input: &mut R) -> Result<()> {
    loop {
        prompt(MENU);
        let Some(choice) = read_input_line(input)? else {
            println!();
            break;
        };
        let key = choice.trim();
        if key.is_empty() {
            continue;
        }
        if key.eq_ignore_ascii_case("q") || key.eq_ignore_ascii_case("quit") {
            break;
        }
        let Some(action) = Action::from_menu_key(key) else {
            print_warning(&format!("Unknown choice '{}'", key));
            continue;
        };

        match action {
            Action::Chatbot => chat_loop(session, input).await?,
            other => {
                if let Err(e) = run_action(session, other, None).await {
                    report(other, &e);
                }
            }
        }
    }
    Ok(())
}

async fn chat_loop<G: TextGenerator, R: BufRead>(session: &Session<'_, G>, input: &mut R) -> Result<()> {
    loop {
        prompt(CHAT_PROMPT);
        let Some(question) = read_input_line(input)? else {
            return Ok(());
        };
        if question.trim().is_empty() {
            return Ok(());
        }
        if let Err(e) = chat::run(session, &question).await {
            report(Action::Chatbot, &e);
        }
    }
}

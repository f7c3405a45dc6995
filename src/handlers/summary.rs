//! Summary handler: prints the lecture summary, buffered as Markdown or streamed.

use std::io::{self, Write};

use super::Session;
use crate::assistant;
use crate::error::Result;
use crate::llm::TextGenerator;
use crate::printer::{print_heading, print_section, print_status};

pub async fn run<G: TextGenerator>(session: &Session<'_, G>) -> Result<()> {
    print_status("Generating summary...");
    if session.settings.markdown {
        let summary = assistant::summarize(session.generator, session.lecture, None).await?;
        print_section("Lecture Summary", &summary, true);
    } else {
        print_heading("Lecture Summary");
        let mut out = io::stdout();
        let mut sink = |t: &str| {
            print!("{}", t);
            out.flush().ok();
        };
        assistant::summarize(session.generator, session.lecture, Some(&mut sink as &mut dyn FnMut(&str))).await?;
        println!();
    }
    Ok(())
}

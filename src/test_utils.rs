use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{Result, StudyError};
use crate::llm::TextGenerator;

/// Generator that replays canned responses and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: RefCell<VecDeque<Result<String>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn with(responses: Vec<Result<String>>) -> Self {
        Self { responses: RefCell::new(responses.into()), prompts: RefCell::default() }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(StudyError::EmptyResponse))
    }
}

pub const SAMPLE_QUIZ: &str = "1. **Question**: Which greeting?\n   A) Hello\n   B) Bye\n   C) Hi\n   D) Yo\n   Correct Answer: A) Hello\n\
                               2. **Question**: Which noun?\n   A) World\n   B) Run\n   C) Fast\n   D) Up\n";

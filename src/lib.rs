//! Edura: a study assistant for PDF lectures.
//!
//! Extracts a lecture's text, then summarizes it, builds a multiple-choice quiz
//! from it, or answers questions about it through an OpenAI-compatible LLM API.

pub mod assistant;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod printer;
pub mod prompt;
pub mod quiz;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use assistant::Lecture;
pub use error::{Result, StudyError};

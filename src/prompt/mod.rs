//! Prompt templates for the three study actions.

use std::str::FromStr;

/// Number of questions requested from the model; the quiz parser accepts stems numbered up to this.
pub const QUESTION_COUNT: u32 = 10;

/// What the multiple-choice questions are generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum QuizSource {
    /// The extracted lecture text.
    #[default]
    Lecture,
    /// A summary produced first by the summary prompt.
    Summary,
}

impl QuizSource {
    fn label(self) -> &'static str {
        match self {
            QuizSource::Lecture => "lecture",
            QuizSource::Summary => "lecture summary",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            QuizSource::Lecture => "Lecture",
            QuizSource::Summary => "Lecture Summary",
        }
    }
}

impl FromStr for QuizSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lecture" | "raw" | "text" => Ok(Self::Lecture),
            "summary" => Ok(Self::Summary),
            other => Err(format!("unknown quiz source '{}' (expected lecture or summary)", other)),
        }
    }
}

pub fn summary_prompt(lecture: &str) -> String {
    format!(
        "Summarize the following lecture in the given format without labeling each section:\n\
         - Start with an introductory sentence mentioning the author and the lecture's title.\n\
         - Follow with a brief description of the main points covered in the lecture.\n\
         - Then, list the supporting arguments that explain or support the author's main ideas.\n\
         - Conclude with a final thought or takeaway from the lecture.\n\
         - Lastly, include a list of key points, where each key point defines or explains an important word or concept from the lecture.\n\n\
         Lecture: {lecture}"
    )
}

pub fn mcq_prompt(source_text: &str, source: QuizSource) -> String {
    let label = source.label();
    let heading = source.heading();
    format!(
        "Create {QUESTION_COUNT} multiple-choice questions based on the following {label}. \
         Each question should have four answer options labeled A, B, C, D, with the correct answer listed at the end.\n\
         Format each question as follows:\n\
         1. **Question**: [question text]\n   \
         A) [Option A]\n   \
         B) [Option B]\n   \
         C) [Option C]\n   \
         D) [Option D]\n   \
         Correct Answer: [The correct answer]\n\n\
         {heading}:\n{source_text}\n\n\
         Here are the questions and answers:\n"
    )
}

pub fn answer_prompt(lecture: &str, question: &str) -> String {
    format!(
        "Based on the following lecture, answer the question:\n\n Lecture: {lecture}\n\nQuestion: {question}\n\nAnswer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_embeds_lecture_at_the_end() {
        let p = summary_prompt("Hello World");
        assert!(p.starts_with("Summarize the following lecture"));
        assert!(p.ends_with("\n\nLecture: Hello World"));
        assert!(p.contains("list of key points"));
    }

    #[test]
    fn mcq_wording_follows_the_source() {
        let p = mcq_prompt("raw text", QuizSource::Lecture);
        assert!(p.contains("based on the following lecture. "));
        assert!(p.contains("\nLecture:\nraw text\n"));
        assert!(!p.contains("Summary"));

        let p = mcq_prompt("short summary", QuizSource::Summary);
        assert!(p.contains("based on the following lecture summary. "));
        assert!(p.contains("\nLecture Summary:\nshort summary\n"));
    }

    #[test]
    fn mcq_prompt_spells_out_the_line_format() {
        let p = mcq_prompt("x", QuizSource::Lecture);
        assert!(p.starts_with("Create 10 multiple-choice questions"));
        assert!(p.contains("\n1. **Question**: [question text]\n   A) [Option A]\n"));
        assert!(p.contains("   D) [Option D]\n   Correct Answer: [The correct answer]\n"));
        assert!(p.ends_with("Here are the questions and answers:\n"));
    }

    #[test]
    fn answer_prompt_keeps_question_verbatim() {
        let p = answer_prompt("notes", "  What is *entropy*? ");
        assert!(p.contains(" Lecture: notes\n\n"));
        assert!(p.contains("Question:   What is *entropy*? \n\nAnswer:"));
    }

    #[test]
    fn quiz_source_parses() {
        assert_eq!("Summary".parse::<QuizSource>(), Ok(QuizSource::Summary));
        assert_eq!("raw".parse::<QuizSource>(), Ok(QuizSource::Lecture));
        assert!("slides".parse::<QuizSource>().is_err());
    }
}

//! Multiple-choice quiz records and the parser for the model's free-text quiz.
//!
//! The model is asked for a fixed line format (see [`crate::prompt::mcq_prompt`]):
//!
//! ```text
//! 1. **Question**: What is ...?
//!    A) ...
//!    B) ...
//!    C) ...
//!    D) ...
//!    Correct Answer: B) ...
//! ```
//!
//! Parsing is lenient: unknown lines are skipped, options are not validated,
//! and a question that never gets a non-empty answer is reported as
//! [`IncompleteQuestion`] rather than returned as a record.

use serde::Serialize;

use crate::prompt::QUESTION_COUNT;

const OPTION_PREFIXES: [&str; 4] = ["A)", "B)", "C)", "D)"];
const ANSWER_PREFIX: &str = "Correct Answer:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McqQuestion {
    /// The numbered stem line as the model wrote it.
    pub question: String,
    /// Option lines in the order they appeared, labels included.
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncompleteReason {
    /// No `Correct Answer:` line, or one with nothing after the prefix.
    MissingAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub reason: IncompleteReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuizParse {
    pub questions: Vec<McqQuestion>,
    pub incomplete: Vec<IncompleteQuestion>,
}

impl QuizParse {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[derive(Debug)]
struct Pending {
    question: String,
    options: Vec<String>,
    answer: Option<String>,
}

impl Pending {
    fn new(question: &str) -> Self {
        Self { question: question.to_string(), options: Vec::new(), answer: None }
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Collecting(Pending),
}

/// What a single trimmed line means to the parser.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Question,
    Option,
    Answer(&'a str),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    if is_question_stem(line) {
        Line::Question
    } else if OPTION_PREFIXES.iter().any(|p| line.starts_with(p)) {
        Line::Option
    } else if let Some(rest) = line.strip_prefix(ANSWER_PREFIX) {
        Line::Answer(rest.trim())
    } else {
        Line::Other
    }
}

/// `N.` at the start of the line with N in 1..=QUESTION_COUNT, written without
/// leading zeros.
fn is_question_stem(line: &str) -> bool {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || line.starts_with('0') || line.as_bytes().get(digits) != Some(&b'.') {
        return false;
    }
    line[..digits]
        .parse::<u32>()
        .map(|n| (1..=QUESTION_COUNT).contains(&n))
        .unwrap_or(false)
}

/// Split a raw model response into quiz records.
pub fn parse_mcqs(response: &str) -> QuizParse {
    let mut out = QuizParse::default();
    let mut state = State::Idle;

    for raw in response.lines() {
        let line = raw.trim();
        state = match (state, classify(line)) {
            (State::Idle, Line::Question) => State::Collecting(Pending::new(line)),
            (State::Collecting(pending), Line::Question) => {
                flush(pending, &mut out);
                State::Collecting(Pending::new(line))
            }
            (State::Collecting(mut pending), Line::Option) => {
                pending.options.push(line.to_string());
                State::Collecting(pending)
            }
            (State::Collecting(mut pending), Line::Answer(answer)) => {
                pending.answer = Some(answer.to_string());
                State::Collecting(pending)
            }
            (state, _) => state,
        };
    }

    if let State::Collecting(pending) = state {
        flush(pending, &mut out);
    }
    out
}

fn flush(pending: Pending, out: &mut QuizParse) {
    match pending.answer.filter(|a| !a.is_empty()) {
        Some(answer) => out.questions.push(McqQuestion {
            question: pending.question,
            options: pending.options,
            answer,
        }),
        None => out.incomplete.push(IncompleteQuestion {
            question: pending.question,
            options: pending.options,
            reason: IncompleteReason::MissingAnswer,
        }),
    }
}

/// Markdown for a list of questions. With `show_answers` false the answer
/// lines are left out so the quiz can be taken.
pub fn render_markdown(questions: &[McqQuestion], show_answers: bool) -> String {
    let mut md = String::new();
    for q in questions {
        md.push_str(&format!("**{}**\n\n", q.question));
        for option in &q.options {
            md.push_str(&format!("{}\n\n", option));
        }
        if show_answers {
            md.push_str(&format!("**Correct Answer**: {}\n\n", q.answer));
        }
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed(n: usize) -> String {
        let mut s = String::from("Here are the questions and answers:\n\n");
        for i in 1..=n {
            s.push_str(&format!("{}. **Question**: What is item {}?\n", i, i));
            for label in ['A', 'B', 'C', 'D'] {
                s.push_str(&format!("   {}) Option {}{}\n", label, label, i));
            }
            s.push_str(&format!("   Correct Answer: B) Option B{}\n\n", i));
        }
        s
    }

    #[test]
    fn ten_well_formed_questions() {
        let parsed = parse_mcqs(&well_formed(10));
        assert_eq!(parsed.questions.len(), 10);
        assert!(parsed.incomplete.is_empty());
        for (i, q) in parsed.questions.iter().enumerate() {
            let n = i + 1;
            assert_eq!(q.question, format!("{}. **Question**: What is item {}?", n, n));
            assert_eq!(
                q.options,
                vec![
                    format!("A) Option A{}", n),
                    format!("B) Option B{}", n),
                    format!("C) Option C{}", n),
                    format!("D) Option D{}", n),
                ]
            );
            assert_eq!(q.answer, format!("B) Option B{}", n));
        }
    }

    #[test]
    fn trailing_question_without_answer_is_reported_not_returned() {
        let mut text = well_formed(9);
        text.push_str("10. **Question**: Last one?\n   A) a\n   B) b\n   C) c\n   D) d\n");
        let parsed = parse_mcqs(&text);
        assert_eq!(parsed.questions.len(), 9);
        assert_eq!(parsed.incomplete.len(), 1);
        assert_eq!(parsed.incomplete[0].question, "10. **Question**: Last one?");
        assert_eq!(parsed.incomplete[0].options.len(), 4);
        assert_eq!(parsed.incomplete[0].reason, IncompleteReason::MissingAnswer);
    }

    #[test]
    fn no_numbered_lines_gives_nothing() {
        let parsed = parse_mcqs("A) stray\nCorrect Answer: A\nI cannot help with that.");
        assert!(parsed.is_empty());
        assert!(parsed.incomplete.is_empty());
        assert!(parse_mcqs("").is_empty());
    }

    #[test]
    fn empty_answer_counts_as_missing() {
        let parsed = parse_mcqs("1. Q?\nA) x\nCorrect Answer:\n2. R?\nA) y\nCorrect Answer: A) y");
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].question, "2. R?");
        assert_eq!(parsed.incomplete.len(), 1);
        assert_eq!(parsed.incomplete[0].question, "1. Q?");
    }

    #[test]
    fn options_kept_in_encounter_order_without_validation() {
        let parsed = parse_mcqs("3. Q?\nC) c\nA) a\nA) a\nnoise\nCorrect Answer: C");
        assert_eq!(parsed.questions[0].options, vec!["C) c", "A) a", "A) a"]);
    }

    #[test]
    fn later_answer_line_wins() {
        let parsed = parse_mcqs("1. Q?\nCorrect Answer: A\nCorrect Answer: D");
        assert_eq!(parsed.questions[0].answer, "D");
    }

    #[test]
    fn question_numbers_outside_range_are_ignored() {
        assert!(is_question_stem("1. x"));
        assert!(is_question_stem("10. x"));
        assert!(is_question_stem("1.5 is a number"));
        assert!(!is_question_stem("11. x"));
        assert!(!is_question_stem("0. x"));
        assert!(!is_question_stem("01. x"));
        assert!(!is_question_stem("010. x"));
        assert!(!is_question_stem("100. x"));
        assert!(!is_question_stem("1) x"));
        assert!(!is_question_stem("**1. x**"));
        assert!(!is_question_stem(""));

        let parsed = parse_mcqs("11. Not a question\nA) a\nCorrect Answer: A");
        assert!(parsed.is_empty());
    }

    #[test]
    fn classify_lines() {
        assert_eq!(classify("A) Paris"), Line::Option);
        assert_eq!(classify("E) Rome"), Line::Other);
        assert_eq!(classify("Correct Answer:   C) Berlin  "), Line::Answer("C) Berlin"));
        assert_eq!(classify("correct answer: C"), Line::Other);
    }

    #[test]
    fn render_with_and_without_answers() {
        let qs = vec![McqQuestion {
            question: "1. Capital of France?".into(),
            options: vec!["A) Paris".into(), "B) Lyon".into()],
            answer: "A) Paris".into(),
        }];
        assert_eq!(
            render_markdown(&qs, true),
            "**1. Capital of France?**\n\nA) Paris\n\nB) Lyon\n\n**Correct Answer**: A) Paris\n\n"
        );
        assert!(!render_markdown(&qs, false).contains("Correct Answer"));
    }
}

//! Text rendering for questions and checked outcomes.

mod entities;

pub use entities::decode_html_entities;

use crate::models::{DisplayConfig, Question};
use crate::session::{Mark, QuestionOutcome};
use std::borrow::Cow;

/// Renders session data as plain text lines.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    decode_entities: bool,
}

impl Renderer {
    pub fn new(decode_entities: bool) -> Self {
        Self { decode_entities }
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        Self::new(display.decode_html_entities)
    }

    /// Text as it should be shown.
    pub fn text<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        if self.decode_entities {
            decode_html_entities(raw)
        } else {
            Cow::Borrowed(raw)
        }
    }

    /// `3. What is 2+2?` (numbering starts at 1)
    pub fn question_title(&self, index: usize, question: &Question) -> String {
        format!("{}. {}", index + 1, self.text(&question.question))
    }

    /// Title plus one indented line per answer option.
    pub fn question_block(&self, index: usize, question: &Question) -> String {
        let mut block = self.question_title(index, question);
        if question.answers.is_empty() {
            block.push_str("\n   (no answers available for this question)");
        }
        for answer in &question.answers {
            block.push_str(&format!("\n   - {}", self.text(answer)));
        }
        block
    }

    /// `[✓] 1. What is 2+2? → 4`
    pub fn outcome_line(&self, index: usize, outcome: &QuestionOutcome<'_>) -> String {
        let title = self.question_title(index, outcome.question);
        match outcome.chosen {
            Some(chosen) => format!(
                "{} {} → {}",
                mark_symbol(outcome.mark()),
                title,
                self.text(chosen)
            ),
            None => format!("{} {} (unanswered)", mark_symbol(outcome.mark()), title),
        }
    }
}

pub fn mark_symbol(mark: Mark) -> &'static str {
    match mark {
        Mark::Correct => "[✓]",
        Mark::Incorrect => "[✗]",
        Mark::Unanswered => "[ ]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question::new(1, "Who&#039;s the &quot;Doctor&quot;?", &["Who", "What"])
    }

    #[test]
    fn test_question_block_decodes_entities() {
        let block = Renderer::new(true).question_block(0, &question());
        assert_eq!(block, "1. Who's the \"Doctor\"?\n   - Who\n   - What");
    }

    #[test]
    fn test_raw_rendering_when_disabled() {
        let title = Renderer::new(false).question_title(4, &question());
        assert_eq!(title, "5. Who&#039;s the &quot;Doctor&quot;?");
    }

    #[test]
    fn test_empty_answers_hint() {
        let q = Question::new(2, "Empty?", &[]);
        assert!(
            Renderer::new(true)
                .question_block(0, &q)
                .ends_with("(no answers available for this question)")
        );
    }

    #[test]
    fn test_outcome_lines() {
        let q = question();
        let renderer = Renderer::new(true);

        let correct = QuestionOutcome {
            question: &q,
            chosen: Some("Who"),
            correct: true,
        };
        assert_eq!(
            renderer.outcome_line(0, &correct),
            "[✓] 1. Who's the \"Doctor\"? → Who"
        );

        let skipped = QuestionOutcome {
            question: &q,
            chosen: None,
            correct: false,
        };
        assert_eq!(
            renderer.outcome_line(0, &skipped),
            "[ ] 1. Who's the \"Doctor\"? (unanswered)"
        );
    }
}

//! Question and result types for trivia-quiz.
//!
//! K_i: These types are the canonical form every accepted response layout
//! is normalized into (see `client::normalize`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Question identifier as the server sent it.
///
/// Servers are inconsistent about numeric vs string ids, so comparison goes
/// through [`QuestionId::key`], which renders both as text. The server's
/// representation is kept so it round-trips unchanged in the check request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(serde_json::Number),
    Text(String),
}

impl QuestionId {
    /// Text form used for matching: `1`, `1.0` and `"1"` share the key `"1"`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// True when both ids render to the same text.
    pub fn matches(&self, other: &QuestionId) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Number(n) => write_number(n, f),
            QuestionId::Text(s) => f.write_str(s),
        }
    }
}

/// Whole floats render without a fraction, so `1.0` reads as `1`.
fn write_number(n: &serde_json::Number, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match n.as_f64() {
        Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", x as i64),
        Some(x) if n.is_f64() => write!(f, "{x}"),
        _ => write!(f, "{n}"),
    }
}

impl From<i64> for QuestionId {
    fn from(n: i64) -> Self {
        QuestionId::Number(n.into())
    }
}

impl From<i32> for QuestionId {
    fn from(n: i32) -> Self {
        QuestionId::Number(n.into())
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        QuestionId::Text(s.to_string())
    }
}

/// A single trivia question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,

    /// Question text, raw as received (may contain HTML entities)
    pub question: String,

    /// Answer options in server order; may be empty
    pub answers: Vec<String>,
}

impl Question {
    pub fn new(id: impl Into<QuestionId>, question: impl Into<String>, answers: &[&str]) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn has_answer(&self, answer: &str) -> bool {
        self.answers.iter().any(|a| a == answer)
    }
}

/// One line of the check request: the chosen answer, or `null` if skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: QuestionId,
    pub answer: Option<String>,
}

/// Body of `POST {base}/checkanswers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswersRequest {
    pub answer_requests: Vec<AnswerRequest>,
}

/// Server verdict for one submitted answer.
///
/// Only a boolean comes back; the API never reveals the correct answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub question_id: QuestionId,
    pub correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_id_keys_match_across_representations() {
        let numeric = QuestionId::from(11);
        let text = QuestionId::from("11");
        assert_ne!(numeric, text);
        assert!(numeric.matches(&text));
        assert!(!numeric.matches(&QuestionId::from(12)));
    }

    #[test]
    fn test_question_id_deserializes_both_forms() {
        let ids: Vec<QuestionId> = serde_json::from_value(json!([7, "abc"])).unwrap();
        assert_eq!(ids, vec![QuestionId::Number(7.into()), QuestionId::Text("abc".into())]);
    }

    #[test]
    fn test_float_ids_match_integer_keys() {
        let ids: Vec<QuestionId> = serde_json::from_value(json!([1.0, 2.5, -3.0])).unwrap();
        assert_eq!(ids[0].key(), "1");
        assert!(ids[0].matches(&QuestionId::from(1)));
        assert!(ids[0].matches(&QuestionId::from("1")));
        assert_eq!(ids[1].key(), "2.5");
        assert_eq!(ids[2].key(), "-3");

        // Sent back exactly as received
        assert_eq!(serde_json::to_value(&ids[0]).unwrap(), json!(1.0));
    }

    #[test]
    fn test_check_request_wire_format() {
        let request = CheckAnswersRequest {
            answer_requests: vec![
                AnswerRequest {
                    question_id: 1.into(),
                    answer: Some("4".to_string()),
                },
                AnswerRequest {
                    question_id: "q2".into(),
                    answer: None,
                },
            ],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "answerRequests": [
                    { "questionId": 1, "answer": "4" },
                    { "questionId": "q2", "answer": null }
                ]
            })
        );
    }
}

//! Response shape normalization.
//!
//! Every accepted JSON layout for an endpoint is reduced to one canonical
//! form here, and nowhere else. Each endpoint has two decode rules:
//!
//! - `Bare`: the body is the JSON array itself
//! - `Wrapped`: the body is an object holding the array under a known key
//!
//! Anything else is a `Shape` error.

use crate::models::{Question, QuestionId, ResultEntry, Result, TriviaError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

pub const QUESTIONS_WRAPPER_KEY: &str = "questionResponse";
pub const RESULTS_WRAPPER_KEY: &str = "answerResponse";

/// Which decode rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Bare,
    Wrapped,
}

/// Question as it may appear on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: QuestionId,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answers: Option<Vec<String>>,
    #[serde(default)]
    answer_options: Option<Vec<String>>,
}

impl From<RawQuestion> for Question {
    fn from(raw: RawQuestion) -> Self {
        Question {
            id: raw.id,
            question: raw.question.unwrap_or_default(),
            // `answers` wins when both are present
            answers: raw.answers.or(raw.answer_options).unwrap_or_default(),
        }
    }
}

/// Result entry as it may appear on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResultEntry {
    #[serde(default)]
    question_id: Option<QuestionId>,
    #[serde(default)]
    id: Option<QuestionId>,
    #[serde(default)]
    result: Option<Verdict>,
    #[serde(default)]
    correct: Option<Verdict>,
}

/// Verdict flag. Servers that send `1`/`0` or a string are read by
/// truthiness: nonzero numbers and non-empty strings count as correct.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Verdict {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl Verdict {
    fn is_correct(&self) -> bool {
        match self {
            Verdict::Flag(flag) => *flag,
            Verdict::Number(n) => *n != 0.0 && !n.is_nan(),
            Verdict::Text(text) => !text.is_empty(),
        }
    }
}

impl RawResultEntry {
    fn into_entry(self, index: usize, endpoint: &str) -> Result<ResultEntry> {
        let question_id = self.question_id.or(self.id).ok_or_else(|| {
            TriviaError::shape(endpoint, format!("item {index}: missing `questionId`/`id`"))
        })?;
        Ok(ResultEntry {
            question_id,
            correct: self
                .result
                .or(self.correct)
                .is_some_and(|verdict| verdict.is_correct()),
        })
    }
}

/// Normalize a `/questions` body into questions, in server order.
pub fn normalize_questions(body: &str) -> Result<Vec<Question>> {
    const ENDPOINT: &str = "/questions";

    let value = parse_json(body, ENDPOINT)?;
    let (envelope, items) = unwrap_envelope(value, QUESTIONS_WRAPPER_KEY, ENDPOINT)?;
    let raw: Vec<RawQuestion> = decode_items(items, ENDPOINT)?;

    debug!(envelope = ?envelope, count = raw.len(), "Normalized questions");
    Ok(raw.into_iter().map(Question::from).collect())
}

/// Normalize a `/checkanswers` body into result entries, in server order.
///
/// `null` items are dropped: the server emits them for ids it does not know.
pub fn normalize_results(body: &str) -> Result<Vec<ResultEntry>> {
    const ENDPOINT: &str = "/checkanswers";

    let value = parse_json(body, ENDPOINT)?;
    let (envelope, items) = unwrap_envelope(value, RESULTS_WRAPPER_KEY, ENDPOINT)?;
    let raw: Vec<Option<RawResultEntry>> = decode_items(items, ENDPOINT)?;

    let skipped = raw.iter().filter(|r| r.is_none()).count();
    let entries = raw
        .into_iter()
        .enumerate()
        .filter_map(|(i, r)| r.map(|r| r.into_entry(i, ENDPOINT)))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        envelope = ?envelope,
        count = entries.len(),
        skipped_nulls = skipped,
        "Normalized results"
    );
    Ok(entries)
}

fn parse_json(body: &str, endpoint: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| TriviaError::shape(endpoint, format!("body is not valid JSON: {e}")))
}

/// Apply the two decode rules.
fn unwrap_envelope(value: Value, key: &str, endpoint: &str) -> Result<(Envelope, Vec<Value>)> {
    match value {
        Value::Array(items) => Ok((Envelope::Bare, items)),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => Ok((Envelope::Wrapped, items)),
            Some(other) => Err(TriviaError::shape(
                endpoint,
                format!("`{key}` is {}, expected an array", kind(&other)),
            )),
            None => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                Err(TriviaError::shape(
                    endpoint,
                    format!("object has no `{key}` array (keys: [{}])", keys.join(", ")),
                ))
            }
        },
        other => Err(TriviaError::shape(
            endpoint,
            format!(
                "expected an array or an object with `{key}`, got {}",
                kind(&other)
            ),
        )),
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>, endpoint: &str) -> Result<Vec<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| TriviaError::shape(endpoint, format!("item {i}: {e}")))
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

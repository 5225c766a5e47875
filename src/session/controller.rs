//! Quiz session controller.
//!
//! Epistemic foundation:
//! - K_i: Phases only move forward: Idle → Loaded → Checked, back to Idle on reset
//! - K_i: A failed operation never touches existing state
//! - B_i: The server's verdicts cover our questions (might not) → missing = incorrect
//! - The API only says whether a chosen answer was right, never which one is

use crate::client::TriviaClient;
use crate::models::{
    AnswerRequest, CheckAnswersRequest, Question, QuestionId, ResultEntry, Result, TriviaError,
};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// Where a session is in its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded
    #[default]
    Idle,
    /// Questions loaded, answers may change
    Loaded,
    /// Verdicts received; selections are frozen until reset
    Checked,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loaded => "loaded",
            Phase::Checked => "checked",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a `select_answer` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Choice stored; `all_answered` gates submission
    Recorded { all_answered: bool },
    /// Session already checked; nothing changed
    Locked,
    /// No loaded question has this id
    UnknownQuestion,
    /// The question has no such answer option
    UnknownAnswer,
}

/// `correct / total`, rendered as `"1 / 1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub correct: usize,
    pub total: usize,
}

impl ScoreSummary {
    /// Fraction correct (0.0 for an empty quiz).
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.correct, self.total)
    }
}

/// How a checked question is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// The chosen answer was accepted
    Correct,
    /// The chosen answer was rejected
    Incorrect,
    /// Nothing was chosen
    Unanswered,
}

/// Per-question view after checking, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome<'a> {
    pub question: &'a Question,
    pub chosen: Option<&'a str>,
    /// Server verdict for this question (false when none came back)
    pub correct: bool,
}

impl QuestionOutcome<'_> {
    pub fn mark(&self) -> Mark {
        match (self.chosen, self.correct) {
            (None, _) => Mark::Unanswered,
            (Some(_), true) => Mark::Correct,
            (Some(_), false) => Mark::Incorrect,
        }
    }
}

/// One quiz session: the loaded questions, the current choices, and the
/// verdicts once checked.
///
/// Operations take `&mut self`, so a session never has two requests in
/// flight. Concurrent quizzes each own their own session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizSession {
    phase: Phase,
    questions: Vec<Question>,
    /// Question id key → chosen answer text
    selections: HashMap<String, String>,
    all_answered: bool,
    results: Vec<ResultEntry>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Raw verdicts as returned by the server.
    pub fn results(&self) -> &[ResultEntry] {
        &self.results
    }

    pub fn is_checked(&self) -> bool {
        self.phase == Phase::Checked
    }

    /// True when every loaded question has a selection (and at least one
    /// question is loaded).
    pub fn all_answered(&self) -> bool {
        self.all_answered
    }

    /// Loaded with every question answered.
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Loaded && self.all_answered
    }

    /// Current choice for a question.
    pub fn selection(&self, id: &QuestionId) -> Option<&str> {
        self.selections.get(&id.key()).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.selections.contains_key(&q.id.key()))
            .count()
    }

    /// Fetch a fresh question set.
    ///
    /// On success the session is `Loaded` with no selections, whatever phase
    /// it was in. On failure nothing changes.
    pub async fn load_questions(&mut self, client: &TriviaClient) -> Result<usize> {
        let questions = client.fetch_questions().await?;
        Ok(self.install_questions(questions))
    }

    /// Replace the question set and start answering from scratch.
    pub fn install_questions(&mut self, questions: Vec<Question>) -> usize {
        let count = questions.len();
        *self = Self {
            phase: Phase::Loaded,
            questions,
            ..Self::default()
        };
        info!(count = count, "Session loaded");
        count
    }

    /// Record `answer` as the choice for question `id`.
    ///
    /// A later call for the same question overwrites the earlier one, and an
    /// empty `answer` clears it. After checking, calls are ignored.
    pub fn select_answer(&mut self, id: &QuestionId, answer: &str) -> SelectOutcome {
        if self.phase == Phase::Checked {
            debug!(question_id = %id, "Ignoring selection on checked session");
            return SelectOutcome::Locked;
        }

        let Some(question) = self.questions.iter().find(|q| q.id.matches(id)) else {
            return SelectOutcome::UnknownQuestion;
        };
        if answer.is_empty() {
            // An empty choice leaves the question unanswered
            self.selections.remove(&question.id.key());
        } else if !question.has_answer(answer) {
            return SelectOutcome::UnknownAnswer;
        } else {
            self.selections.insert(question.id.key(), answer.to_string());
        }
        self.all_answered = !self.questions.is_empty()
            && self
                .questions
                .iter()
                .all(|q| self.selections.contains_key(&q.id.key()));

        SelectOutcome::Recorded {
            all_answered: self.all_answered,
        }
    }

    /// Check request for the current choices: one entry per loaded question,
    /// in load order, `null` where unanswered.
    pub fn answer_payload(&self) -> CheckAnswersRequest {
        CheckAnswersRequest {
            answer_requests: self
                .questions
                .iter()
                .map(|q| AnswerRequest {
                    question_id: q.id.clone(),
                    answer: self.selections.get(&q.id.key()).cloned(),
                })
                .collect(),
        }
    }

    /// Submit the current choices and move to `Checked`.
    ///
    /// Partial submissions are allowed. On failure the session stays
    /// `Loaded` and the call may be repeated.
    pub async fn submit_answers(&mut self, client: &TriviaClient) -> Result<ScoreSummary> {
        if self.phase != Phase::Loaded {
            return Err(TriviaError::InvalidState {
                operation: "submit answers",
                phase: self.phase.as_str(),
            });
        }

        let payload = self.answer_payload();
        debug!(
            answered = self.answered_count(),
            total = self.questions.len(),
            "Submitting answers"
        );
        let results = client.check_answers(&payload).await?;
        Ok(self.install_results(results))
    }

    /// Store verdicts, freeze selections, and return the score.
    fn install_results(&mut self, results: Vec<ResultEntry>) -> ScoreSummary {
        self.results = results;
        self.phase = Phase::Checked;

        let score = self.tally();
        info!(correct = score.correct, total = score.total, "Answers checked");
        score
    }

    /// Score once checked; `None` before then.
    pub fn score_summary(&self) -> Option<ScoreSummary> {
        (self.phase == Phase::Checked).then(|| self.tally())
    }

    fn tally(&self) -> ScoreSummary {
        let verdicts = self.verdicts();
        let correct = self
            .questions
            .iter()
            .filter(|q| verdicts.get(&q.id.key()).copied().unwrap_or(false))
            .count();
        ScoreSummary {
            correct,
            total: self.questions.len(),
        }
    }

    /// Id key → verdict. A later entry for the same id wins.
    fn verdicts(&self) -> HashMap<String, bool> {
        self.results
            .iter()
            .map(|r| (r.question_id.key(), r.correct))
            .collect()
    }

    /// Per-question outcomes; empty until checked.
    pub fn outcomes(&self) -> Vec<QuestionOutcome<'_>> {
        if self.phase != Phase::Checked {
            return Vec::new();
        }
        let verdicts = self.verdicts();
        self.questions
            .iter()
            .map(|q| QuestionOutcome {
                question: q,
                chosen: self.selection(&q.id),
                correct: verdicts.get(&q.id.key()).copied().unwrap_or(false),
            })
            .collect()
    }

    /// Drop everything and return to `Idle`.
    pub fn reset(&mut self) {
        *self = Self::default();
        debug!("Session reset");
    }
}

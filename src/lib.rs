//! trivia-quiz - Trivia quiz client for a two-endpoint REST API.
//!
//! ## Architecture
//!
//! - **Client**: `GET {base}/questions` and `POST {base}/checkanswers`, with
//!   every accepted response layout normalized into one canonical form
//! - **Session**: owns the questions, the chosen answers and the verdicts;
//!   moves Idle → Loaded → Checked and back to Idle on reset
//! - **Display**: text decoding and outcome rendering for frontends
//!
//! ## Epistemic Design
//!
//! - K_i (Knowledge): Session phases and canonical types
//! - B_i (Beliefs): Every server response, wrapped in Result
//! - I^R (Resolvable): Base URL, timeout, display options from config
//! - I^B (Bounded): Network and rate-limit failures, surfaced, never retried

pub mod client;
pub mod display;
pub mod models;
pub mod session;

// Re-exports for convenience
pub use client::TriviaClient;
pub use models::{Config, Question, QuestionId, ResultEntry, Result, TriviaError};
pub use session::{Diagnostic, DiagnosticLog, Phase, QuizSession, ScoreSummary, SelectOutcome};

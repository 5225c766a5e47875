//! Core data models for trivia-quiz.
//!
//! Epistemic mapping:
//! - K_i (Knowledge): Canonical question/result types
//! - B_i (Beliefs): Server responses, wrapped in Result
//! - I^R (Resolvable): Config parameters
//! - I^B (Bounded): Error variants surfaced to the user, never retried

mod config;
mod error;
mod question;

pub use config::*;
pub use error::*;
pub use question::*;

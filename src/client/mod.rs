//! Trivia API client module.

pub mod normalize;
mod trivia_client;

pub use normalize::{Envelope, normalize_questions, normalize_results};
pub use trivia_client::*;

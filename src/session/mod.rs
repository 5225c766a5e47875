//! Quiz session state and failure reporting.

mod controller;
mod diagnostic;

pub use controller::*;
pub use diagnostic::*;

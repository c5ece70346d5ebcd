//! Attribute validation for records.
//!
//! # Responsibility
//! - Model validation rules as typed values attached to a model type.
//! - Evaluate a rule set against an attribute mapping and collect messages.
//! - Define the single error raised when a record fails validation.
//!
//! # Invariants
//! - Messages are reported in rule declaration order.
//! - An empty rule set never produces a failure.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod rule;
pub mod evaluator;

pub use rule::{Rule, RuleKind, RuleSet};
pub use evaluator::{validate_attributes, ValidationReport};

/// Raised when a record's attributes violate at least one rule.
///
/// `Display` joins every violation message with `,`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailed {
    model: &'static str,
    messages: Vec<String>,
}

impl ValidationFailed {
    pub fn new(model: &'static str, messages: Vec<String>) -> Self {
        Self { model, messages }
    }

    /// Model name of the record that failed.
    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages.join(","))
    }
}

impl Error for ValidationFailed {}

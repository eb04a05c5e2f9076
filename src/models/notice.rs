use serde::Serialize;
use std::fmt;

use crate::models::Variable;

/// Non-fatal condition met while preparing or analysing data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A week or partition with no value at all for `variable`; the result
    /// for that group stays absent.
    EmptyGroup { variable: Variable, group: String },

    /// A group left out of a statistical test for lack of values.
    InsufficientData {
        group: String,
        required: usize,
        found: usize,
    },

    /// A statistical test that could not be evaluated on otherwise valid
    /// groups, for example when every value is identical.
    TestSkipped { test: String, reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::EmptyGroup { variable, group } => {
                write!(f, "no {} values in {}", variable, group)
            }
            Notice::InsufficientData {
                group,
                required,
                found,
            } => write!(
                f,
                "{} excluded: {} values, at least {} required",
                group, found, required
            ),
            Notice::TestSkipped { test, reason } => write!(f, "{} not run: {}", test, reason),
        }
    }
}

//! Submission-time validation errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why one option blocks submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IssueReason {
    /// Required option has no value.
    Missing,
    /// Numeric option holds something that is not a number.
    NotANumber,
    /// Numeric value outside the option's range.
    OutOfRange { min: f64, max: f64 },
    /// Selected choice is no longer offered.
    UnknownChoice,
}

impl fmt::Display for IssueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueReason::Missing => f.write_str("is required"),
            IssueReason::NotANumber => f.write_str("must be a number"),
            IssueReason::OutOfRange { min, max } => write!(f, "must be between {} and {}", min, max),
            IssueReason::UnknownChoice => f.write_str("is not an available choice"),
        }
    }
}

/// One offending option, reported next to its control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionIssue {
    pub option_id: String,
    pub option_name: String,
    #[serde(flatten)]
    pub reason: IssueReason,
}

impl fmt::Display for OptionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.option_name, self.reason)
    }
}

/// Selection cannot be submitted. Never retried.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{} option(s) need attention: {}", .issues.len(), describe(.issues))]
pub struct ValidationError {
    pub issues: Vec<OptionIssue>,
}

fn describe(issues: &[OptionIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn for_option(&self, option_id: &str) -> Option<&OptionIssue> {
        self.issues.iter().find(|i| i.option_id == option_id)
    }
}

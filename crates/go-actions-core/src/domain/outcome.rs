//! Best-effort outcomes.
//!
//! Loading stored results and posting the PR comment must never fail the
//! surrounding workflow. Instead of catching and logging, those operations
//! return an [`Outcome`] that keeps the three cases apart.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The operation ran and produced a value.
    Completed(T),

    /// Nothing to do: the input or precondition was not there.
    Absent(String),

    /// The operation was attempted and failed; callers log and move on.
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Absent(reason) => Outcome::Absent(reason),
            Outcome::Failed(reason) => Outcome::Failed(reason),
        }
    }

    /// Turn a fallible result into an outcome, keeping the error text.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Completed(value),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let done: Outcome<u32> = Outcome::Completed(3);
        assert!(done.is_completed());
        assert_eq!(done.map(|v| v * 2).completed(), Some(6));

        let absent: Outcome<u32> = Outcome::Absent("no token".to_string());
        assert!(!absent.is_completed());
        assert!(!absent.is_failed());
        assert_eq!(absent.completed(), None);
    }

    #[test]
    fn test_from_result_keeps_error_text() {
        let failed: Outcome<()> = Outcome::from_result(Err::<(), _>("HTTP 502"));
        assert_eq!(failed, Outcome::Failed("HTTP 502".to_string()));
    }
}

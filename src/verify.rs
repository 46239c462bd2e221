//! Post-run verification: named boolean predicates over the final buffer
//! and the outcome log.
//!
//! Checks are read-only and evaluated independently. A panicking predicate
//! is caught and recorded as a failed check so reporting always sees a
//! complete result set, even when an individual predicate is buggy.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use xxhash_rust::xxh3::xxh3_64;

use crate::apply::{PatchOutcome, PatchStatus};
use crate::buffer::TextBuffer;

type Predicate = Arc<dyn Fn(&TextBuffer, &[PatchOutcome]) -> bool + Send + Sync>;

/// A named, read-only assertion about a finished run.
#[derive(Clone)]
pub struct VerificationCheck {
    name: String,
    predicate: Predicate,
}

impl VerificationCheck {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&TextBuffer, &[PatchOutcome]) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Passes when the final text contains `text`.
    pub fn contains(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(name, move |buffer, _| buffer.contains(&text))
    }

    /// Passes when the final text does not contain `text`.
    pub fn not_contains(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(name, move |buffer, _| !buffer.contains(&text))
    }

    /// Passes when `text` occurs exactly `count` times (non-overlapping).
    pub fn count_equals(name: impl Into<String>, text: impl Into<String>, count: usize) -> Self {
        let text = text.into();
        Self::new(name, move |buffer, _| buffer.count(&text) == count)
    }

    /// Passes when every outcome is applied or already applied — the run left
    /// nothing unmatched or failed.
    pub fn all_landed(name: impl Into<String>) -> Self {
        Self::new(name, |_, outcomes| {
            outcomes.iter().all(|o| {
                matches!(o.status, PatchStatus::Applied | PatchStatus::AlreadyApplied)
            })
        })
    }

    /// Passes when the xxh3 digest of the final text equals `expected`.
    pub fn xxh3(name: impl Into<String>, expected: u64) -> Self {
        Self::new(name, move |buffer, _| {
            xxh3_64(buffer.as_str().as_bytes()) == expected
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate, converting a panic into a failed result.
    pub fn evaluate(&self, buffer: &TextBuffer, outcomes: &[PatchOutcome]) -> CheckResult {
        let predicate = self.predicate.as_ref();
        match panic::catch_unwind(AssertUnwindSafe(|| predicate(buffer, outcomes))) {
            Ok(passed) => CheckResult {
                name: self.name.clone(),
                passed,
                error: None,
            },
            Err(payload) => CheckResult {
                name: self.name.clone(),
                passed: false,
                error: Some(panic_message(payload.as_ref())),
            },
        }
    }
}

impl fmt::Debug for VerificationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationCheck")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "predicate panicked".to_string()
    }
}

/// Result of one verification check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// Panic message when the predicate itself blew up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Evaluate every check against the final buffer and outcome log.
///
/// Always returns one result per check, in check order.
pub fn verify(
    buffer: &TextBuffer,
    outcomes: &[PatchOutcome],
    checks: &[VerificationCheck],
) -> Vec<CheckResult> {
    checks
        .iter()
        .map(|check| check.evaluate(buffer, outcomes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_outcomes() -> Vec<PatchOutcome> {
        Vec::new()
    }

    #[test]
    fn contains_and_not_contains() {
        let buf = TextBuffer::new("let x = 10;");
        let results = verify(
            &buf,
            &no_outcomes(),
            &[
                VerificationCheck::contains("has-let", "let x"),
                VerificationCheck::not_contains("no-const", "const x"),
                VerificationCheck::contains("missing", "var x"),
            ],
        );
        assert!(results[0].passed);
        assert!(results[1].passed);
        assert!(!results[2].passed);
    }

    #[test]
    fn count_equals_check() {
        let buf = TextBuffer::new("a b a b a");
        let check = VerificationCheck::count_equals("three-a", "a", 3);
        assert!(check.evaluate(&buf, &no_outcomes()).passed);
    }

    #[test]
    fn xxh3_check_matches_digest() {
        let buf = TextBuffer::new("stable output");
        let expected = xxh3_64(b"stable output");
        let check = VerificationCheck::xxh3("digest", expected);
        assert!(check.evaluate(&buf, &no_outcomes()).passed);
        let other = VerificationCheck::xxh3("digest", expected ^ 1);
        assert!(!other.evaluate(&buf, &no_outcomes()).passed);
    }

    #[test]
    fn panicking_predicate_is_recorded_not_propagated() {
        let buf = TextBuffer::new("text");
        let boom = VerificationCheck::new("boom", |_, _| panic!("predicate bug"));
        let after = VerificationCheck::contains("still-runs", "text");

        let results = verify(&buf, &no_outcomes(), &[boom, after]);
        assert_eq!(results.len(), 2);
        assert!(!results[0].passed);
        assert_eq!(results[0].error.as_deref(), Some("predicate bug"));
        assert!(results[1].passed);
    }

    #[test]
    fn all_landed_fails_on_not_found() {
        let buf = TextBuffer::new("text");
        let outcomes = vec![
            PatchOutcome {
                name: "a".to_string(),
                status: PatchStatus::Applied,
                occurrences: 1,
            },
            PatchOutcome {
                name: "b".to_string(),
                status: PatchStatus::NotFound,
                occurrences: 0,
            },
        ];
        let check = VerificationCheck::all_landed("all");
        assert!(!check.evaluate(&buf, &outcomes).passed);
    }
}

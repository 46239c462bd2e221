//! Run reports: pure aggregation of outcomes and verification results.

use std::fmt::Write as _;

use serde::Serialize;

use crate::apply::PatchOutcome;
use crate::verify::CheckResult;

/// Summary of one patch run. Derived once at the end; no I/O.
///
/// `applied_count + skipped_count == total_patches` always holds; skipped
/// covers already-applied, not-found, and failed outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub total_patches: usize,
    pub applied_count: usize,
    pub skipped_count: usize,
    pub verification: Vec<CheckResult>,
    /// Unicode scalar count delta between final and original text.
    pub char_delta: i64,
}

impl RunReport {
    /// True when every verification check passed. Exit status should reflect
    /// this, not the applied/skipped split — no-op skips on an up-to-date
    /// artifact are a success state.
    pub fn all_checks_passed(&self) -> bool {
        self.verification.iter().all(|c| c.passed)
    }

    pub fn checks_passed(&self) -> usize {
        self.verification.iter().filter(|c| c.passed).count()
    }

    pub fn checks_failed(&self) -> usize {
        self.verification.len() - self.checks_passed()
    }

    /// Plain-text rendering, suitable for console or log output.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "patches: {} applied, {} skipped ({} total)",
            self.applied_count, self.skipped_count, self.total_patches
        );
        let _ = writeln!(
            out,
            "verification: {} passed, {} failed",
            self.checks_passed(),
            self.checks_failed()
        );
        for check in &self.verification {
            let mark = if check.passed { "ok" } else { "FAIL" };
            match &check.error {
                Some(error) => {
                    let _ = writeln!(out, "  [{mark}] {} ({error})", check.name);
                }
                None => {
                    let _ = writeln!(out, "  [{mark}] {}", check.name);
                }
            }
        }
        let _ = writeln!(out, "char delta: {:+}", self.char_delta);
        out
    }
}

/// Aggregate outcomes and verification results into a report.
///
/// `before_chars`/`after_chars` are the caller's char counts of the original
/// and final buffers.
pub fn report(
    outcomes: &[PatchOutcome],
    verification: Vec<CheckResult>,
    before_chars: usize,
    after_chars: usize,
) -> RunReport {
    let applied_count = outcomes.iter().filter(|o| o.status.is_applied()).count();
    RunReport {
        total_patches: outcomes.len(),
        applied_count,
        skipped_count: outcomes.len() - applied_count,
        verification,
        char_delta: after_chars as i64 - before_chars as i64,
    }
}

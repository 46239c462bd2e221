//! Patch application: one spec against one buffer, producing an outcome.
//!
//! Application is a pure function: same buffer and spec, same result. The
//! idempotency mechanism is textual absence of the pre-image — a patch that
//! already landed no longer finds its before-text and is skipped, not failed.

use std::fmt;

use crate::buffer::TextBuffer;
use crate::locate;
use crate::spec::{PatchKind, PatchSpec};

/// Per-patch result status.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum PatchStatus {
    /// The edit landed in this run.
    Applied,
    /// The before-text is gone and the replacement is already present.
    AlreadyApplied,
    /// Neither the before-text nor the replacement is present.
    NotFound,
    /// The target shape is incompatible with the patch's assumptions
    /// (unbalanced delimiters, ambiguous marker at apply time).
    Failed { reason: String },
}

impl PatchStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, PatchStatus::Applied)
    }

    /// Every non-applied status counts as a skip for report arithmetic.
    pub fn is_skip(&self) -> bool {
        !self.is_applied()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PatchStatus::Failed { .. })
    }
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchStatus::Applied => write!(f, "applied"),
            PatchStatus::AlreadyApplied => write!(f, "skipped (already applied)"),
            PatchStatus::NotFound => write!(f, "skipped (anchor not found)"),
            PatchStatus::Failed { reason } => write!(f, "failed ({reason})"),
        }
    }
}

/// The per-patch result record that lets a caller audit a run without
/// re-reading the text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[must_use = "PatchOutcome should be checked for applied/skipped status"]
pub struct PatchOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: PatchStatus,
    pub occurrences: usize,
}

impl PatchOutcome {
    fn new(spec: &PatchSpec, status: PatchStatus, occurrences: usize) -> Self {
        Self {
            name: spec.name().to_string(),
            status,
            occurrences,
        }
    }
}

/// Apply one patch spec to a buffer.
///
/// Returns the new buffer and the outcome. On any skip or failure the
/// returned buffer is the input buffer, unchanged.
pub fn apply(buffer: &TextBuffer, spec: &PatchSpec) -> (TextBuffer, PatchOutcome) {
    match spec.kind() {
        PatchKind::Literal {
            match_text,
            replacement,
        } => match buffer.replace_first(match_text, replacement) {
            Some(patched) => (patched, PatchOutcome::new(spec, PatchStatus::Applied, 1)),
            None => (
                buffer.clone(),
                PatchOutcome::new(spec, skip_status(buffer, replacement), 0),
            ),
        },

        PatchKind::LiteralAll {
            match_text,
            replacement,
        } => {
            let (patched, count) = buffer.replace_all(match_text, replacement);
            if count > 0 {
                (patched, PatchOutcome::new(spec, PatchStatus::Applied, count))
            } else {
                (
                    buffer.clone(),
                    PatchOutcome::new(spec, skip_status(buffer, replacement), 0),
                )
            }
        }

        PatchKind::Structural {
            start_marker,
            open_delim,
            close_delim,
            trailing_chars,
            builder,
        } => {
            let build = builder.as_ref();
            let located = locate::find_structural_block(
                buffer,
                start_marker,
                *open_delim,
                *close_delim,
                trailing_chars.as_deref(),
            );
            match located {
                Ok(Some(span)) => {
                    let replacement = build();
                    if buffer.slice(span) == replacement {
                        (
                            buffer.clone(),
                            PatchOutcome::new(spec, PatchStatus::AlreadyApplied, 0),
                        )
                    } else {
                        (
                            buffer.splice(span, &replacement),
                            PatchOutcome::new(spec, PatchStatus::Applied, 1),
                        )
                    }
                }
                Ok(None) => (
                    buffer.clone(),
                    PatchOutcome::new(spec, skip_status(buffer, &build()), 0),
                ),
                Err(e) => (
                    buffer.clone(),
                    PatchOutcome::new(
                        spec,
                        PatchStatus::Failed {
                            reason: e.to_string(),
                        },
                        0,
                    ),
                ),
            }
        }
    }
}

/// Skip classification when the before-text is gone: presence of the
/// replacement is evidence of prior application.
fn skip_status(buffer: &TextBuffer, replacement: &str) -> PatchStatus {
    if !replacement.is_empty() && buffer.contains(replacement) {
        PatchStatus::AlreadyApplied
    } else {
        PatchStatus::NotFound
    }
}

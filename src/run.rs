//! Patch set runner: fold an ordered patch set over a buffer.

use thiserror::Error;

use crate::apply::{apply, PatchOutcome};
use crate::buffer::TextBuffer;
use crate::locate::{self, LocateError};
use crate::spec::{PatchKind, PatchSet};

/// Final buffer plus the complete outcome log, in spec order.
#[derive(Debug, Clone)]
#[must_use = "RunOutput carries the final buffer and the outcome log"]
pub struct RunOutput {
    pub buffer: TextBuffer,
    pub outcomes: Vec<PatchOutcome>,
}

impl RunOutput {
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_applied()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.applied_count()
    }
}

/// Errors that reject a run before any patch is applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("patch {name:?}: {source}")]
    AmbiguousMarker {
        name: String,
        #[source]
        source: LocateError,
    },
}

/// Apply every spec in order, threading the buffer from one application to
/// the next.
///
/// Pre-flight: a structural spec whose start marker is ambiguous in the
/// *initial* buffer rejects the whole run before any mutation — silently
/// picking one occurrence risks corrupting the wrong block. Zero occurrences
/// pass pre-flight, since an earlier patch may introduce the marker.
///
/// After pre-flight the run always completes: a not-found anchor or a
/// per-patch failure is recorded in the log and the fold continues, so the
/// caller can distinguish "fully migrated", "already up to date", and
/// "target shape changed unexpectedly" from the log alone.
pub fn run(initial: &TextBuffer, patch_set: &PatchSet) -> Result<RunOutput, RunError> {
    for spec in patch_set.iter() {
        if let PatchKind::Structural { start_marker, .. } = spec.kind() {
            if let Err(source) = locate::find_unique(initial, start_marker) {
                return Err(RunError::AmbiguousMarker {
                    name: spec.name().to_string(),
                    source,
                });
            }
        }
    }

    let mut buffer = initial.clone();
    let mut outcomes = Vec::with_capacity(patch_set.len());

    for spec in patch_set.iter() {
        let (next, outcome) = apply(&buffer, spec);
        buffer = next;
        outcomes.push(outcome);
    }

    Ok(RunOutput { buffer, outcomes })
}

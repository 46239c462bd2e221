//! Textpatch: an idempotent, re-runnable text patch engine.
//!
//! Takes a source-text blob and an ordered sequence of named edits, locates
//! each edit's anchor either by exact substring match or by structural
//! delimiter-depth matching, applies the edit exactly once, tolerates an edit
//! already having been applied, and finishes with a verification pass over
//! the result.
//!
//! # Architecture
//!
//! All edit operations compile down to a single primitive:
//! [`TextBuffer::splice`], a byte-span replacement on an immutable snapshot.
//! Intelligence lives in anchor acquisition ([`locate`]) and skip
//! classification ([`apply`]), not in the application logic.
//!
//! # Idempotency
//!
//! Textual absence of a patch's before-text is itself evidence of prior
//! application: a patch that already landed no longer finds its anchor and is
//! skipped, never failed. Re-running a patch set against already-patched text
//! changes nothing and reports every patch as skipped.
//!
//! # Example
//!
//! ```
//! use textpatch::{report, run, verify, PatchSet, PatchSpec, TextBuffer, VerificationCheck};
//!
//! let original = TextBuffer::new("const x = 1; const y = 2;");
//! let set = PatchSet::from_specs(vec![
//!     PatchSpec::literal("modernize-x", "const x = 1;", "let x = 10;").unwrap(),
//! ])
//! .unwrap();
//!
//! let out = run(&original, &set).unwrap();
//! assert_eq!(out.buffer.as_str(), "let x = 10; const y = 2;");
//!
//! let checks = [VerificationCheck::contains("x-is-let", "let x = 10;")];
//! let results = verify(&out.buffer, &out.outcomes, &checks);
//! let report = report(
//!     &out.outcomes,
//!     results,
//!     original.char_count(),
//!     out.buffer.char_count(),
//! );
//! assert!(report.all_checks_passed());
//! ```
//!
//! The engine performs no I/O: the caller owns reading the target artifact
//! and persisting the final buffer (the bundled CLI does both, with
//! transactional write-back).

pub mod apply;
pub mod buffer;
pub mod config;
pub mod locate;
pub mod report;
pub mod run;
pub mod spec;
pub mod verify;

// Re-exports
pub use apply::{apply, PatchOutcome, PatchStatus};
pub use buffer::TextBuffer;
pub use config::{load_from_path, load_from_str, ConfigError, PatchSetConfig};
pub use locate::{find_all_literal, find_literal, find_structural_block, LocateError, Span};
pub use report::{report, RunReport};
pub use run::{run, RunError, RunOutput};
pub use spec::{PatchKind, PatchSet, PatchSpec, ReplacementBuilder, SpecError};
pub use verify::{verify, CheckResult, VerificationCheck};

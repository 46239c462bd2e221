//! Patch specifications: named, declarative, independently-idempotent edits.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Pure producer of a structural patch's replacement text.
///
/// The payload is generated, not derived from the matched span, so it is
/// modeled as a closure of nothing. Shared so specs stay clonable.
pub type ReplacementBuilder = Arc<dyn Fn() -> String + Send + Sync>;

/// A single declarative text edit: a name, a way to locate its target, and
/// a replacement.
#[derive(Clone)]
pub struct PatchSpec {
    name: String,
    kind: PatchKind,
}

/// How a patch locates and rewrites its target.
#[derive(Clone)]
pub enum PatchKind {
    /// Replace the first occurrence of `match_text`.
    Literal {
        match_text: String,
        replacement: String,
    },
    /// Replace every non-overlapping occurrence of `match_text`.
    LiteralAll {
        match_text: String,
        replacement: String,
    },
    /// Replace the whole delimited block introduced by `start_marker`.
    Structural {
        start_marker: String,
        open_delim: char,
        close_delim: char,
        trailing_chars: Option<String>,
        builder: ReplacementBuilder,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("patch {name:?}: match_text must be non-empty")]
    EmptyMatchText { name: String },

    #[error("patch {name:?}: start_marker must be non-empty")]
    EmptyStartMarker { name: String },

    #[error("patch {name:?}: open and close delimiters must differ")]
    EqualDelimiters { name: String },

    #[error("duplicate patch name {name:?} in patch set")]
    DuplicateName { name: String },
}

impl PatchSpec {
    /// A literal patch replacing the first occurrence of `match_text`.
    pub fn literal(
        name: impl Into<String>,
        match_text: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, SpecError> {
        let name = name.into();
        let match_text = match_text.into();
        if match_text.is_empty() {
            return Err(SpecError::EmptyMatchText { name });
        }
        Ok(Self {
            name,
            kind: PatchKind::Literal {
                match_text,
                replacement: replacement.into(),
            },
        })
    }

    /// A literal patch replacing every occurrence of `match_text`.
    pub fn literal_all(
        name: impl Into<String>,
        match_text: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, SpecError> {
        let name = name.into();
        let match_text = match_text.into();
        if match_text.is_empty() {
            return Err(SpecError::EmptyMatchText { name });
        }
        Ok(Self {
            name,
            kind: PatchKind::LiteralAll {
                match_text,
                replacement: replacement.into(),
            },
        })
    }

    /// A structural patch replacing the delimited block at `start_marker`
    /// with the builder's output.
    pub fn structural(
        name: impl Into<String>,
        start_marker: impl Into<String>,
        open_delim: char,
        close_delim: char,
        builder: impl Fn() -> String + Send + Sync + 'static,
    ) -> Result<Self, SpecError> {
        let name = name.into();
        let start_marker = start_marker.into();
        if start_marker.is_empty() {
            return Err(SpecError::EmptyStartMarker { name });
        }
        if open_delim == close_delim {
            return Err(SpecError::EqualDelimiters { name });
        }
        Ok(Self {
            name,
            kind: PatchKind::Structural {
                start_marker,
                open_delim,
                close_delim,
                trailing_chars: None,
                builder: Arc::new(builder),
            },
        })
    }

    /// Also consume these characters when they immediately follow the
    /// matched close delimiter (e.g. the `;` after an expression body).
    /// No effect on literal kinds.
    pub fn with_trailing_chars(mut self, trailing: impl Into<String>) -> Self {
        if let PatchKind::Structural { trailing_chars, .. } = &mut self.kind {
            *trailing_chars = Some(trailing.into());
        }
        self
    }

    /// Human-readable identifier, unique within a patch set.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PatchKind {
        &self.kind
    }

    /// Kind label for listings and reports.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            PatchKind::Literal { .. } => "literal",
            PatchKind::LiteralAll { .. } => "literal-all",
            PatchKind::Structural { .. } => "structural",
        }
    }
}

impl fmt::Debug for PatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("PatchSpec");
        d.field("name", &self.name);
        match &self.kind {
            PatchKind::Literal {
                match_text,
                replacement,
            } => {
                d.field("kind", &"literal")
                    .field("match_text", match_text)
                    .field("replacement", replacement);
            }
            PatchKind::LiteralAll {
                match_text,
                replacement,
            } => {
                d.field("kind", &"literal-all")
                    .field("match_text", match_text)
                    .field("replacement", replacement);
            }
            PatchKind::Structural {
                start_marker,
                open_delim,
                close_delim,
                trailing_chars,
                ..
            } => {
                d.field("kind", &"structural")
                    .field("start_marker", start_marker)
                    .field("open_delim", open_delim)
                    .field("close_delim", close_delim)
                    .field("trailing_chars", trailing_chars);
            }
        }
        d.finish()
    }
}

/// An ordered sequence of patch specs, applied strictly in order.
///
/// Later specs may assume earlier ones already landed (e.g. a structural
/// replacement inserting a helper that a later literal patch references);
/// ordering them correctly is the caller's responsibility.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    specs: Vec<PatchSpec>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from specs, rejecting duplicate names.
    pub fn from_specs(specs: Vec<PatchSpec>) -> Result<Self, SpecError> {
        let mut set = Self::new();
        for spec in specs {
            set.push(spec)?;
        }
        Ok(set)
    }

    /// Append a spec, rejecting a name already present in the set.
    pub fn push(&mut self, spec: PatchSpec) -> Result<(), SpecError> {
        if self.specs.iter().any(|s| s.name == spec.name) {
            return Err(SpecError::DuplicateName { name: spec.name });
        }
        self.specs.push(spec);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatchSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_rejects_empty_match_text() {
        let err = PatchSpec::literal("p", "", "x").unwrap_err();
        assert_eq!(err, SpecError::EmptyMatchText { name: "p".to_string() });
    }

    #[test]
    fn structural_rejects_empty_marker() {
        let err = PatchSpec::structural("p", "", '{', '}', String::new).unwrap_err();
        assert_eq!(err, SpecError::EmptyStartMarker { name: "p".to_string() });
    }

    #[test]
    fn structural_rejects_equal_delimiters() {
        let err = PatchSpec::structural("p", "m", '|', '|', String::new).unwrap_err();
        assert_eq!(err, SpecError::EqualDelimiters { name: "p".to_string() });
    }

    #[test]
    fn patch_set_rejects_duplicate_names() {
        let a = PatchSpec::literal("same", "a", "b").unwrap();
        let b = PatchSpec::literal("same", "c", "d").unwrap();
        let err = PatchSet::from_specs(vec![a, b]).unwrap_err();
        assert_eq!(err, SpecError::DuplicateName { name: "same".to_string() });
    }

    #[test]
    fn trailing_chars_builder() {
        let spec = PatchSpec::structural("p", "m", '{', '}', || "x".to_string())
            .unwrap()
            .with_trailing_chars(";");
        match spec.kind() {
            PatchKind::Structural { trailing_chars, .. } => {
                assert_eq!(trailing_chars.as_deref(), Some(";"));
            }
            _ => unreachable!(),
        }
    }
}

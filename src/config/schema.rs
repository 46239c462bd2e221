use serde::Deserialize;
use std::fmt;

use crate::spec::{PatchSet, PatchSpec, SpecError};
use crate::verify::VerificationCheck;

/// A declarative patch set: metadata, ordered patches, verification checks.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchSetConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchEntry>,
    #[serde(default)]
    pub checks: Vec<CheckEntry>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchEntry {
    pub name: String,
    pub edit: EditDef,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EditDef {
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
    /// Replace the delimited block introduced by `start_marker`.
    Structural {
        start_marker: String,
        #[serde(default = "default_open_delim")]
        open_delim: char,
        #[serde(default = "default_close_delim")]
        close_delim: char,
        replacement: String,
        #[serde(default)]
        trailing_chars: Option<String>,
    },
}

fn default_open_delim() -> char {
    '{'
}

fn default_close_delim() -> char {
    '}'
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckEntry {
    pub name: String,
    pub predicate: PredicateDef,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PredicateDef {
    Contains { text: String },
    NotContains { text: String },
    CountEquals { text: String, count: usize },
    /// Every outcome applied or already applied.
    AllLanded,
    /// xxh3 digest of the final text, hex with optional `0x` prefix.
    Xxh3 { digest: String },
}

impl PatchSetConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        let mut seen = std::collections::HashSet::new();
        for patch in &self.patches {
            if patch.name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_name: None,
                    field: "name",
                });
            }
            if !seen.insert(patch.name.as_str()) {
                issues.push(ValidationIssue::InvalidCombo {
                    patch_name: Some(patch.name.clone()),
                    message: "duplicate patch name".to_string(),
                });
            }

            match &patch.edit {
                EditDef::Literal { match_text, .. } | EditDef::LiteralAll { match_text, .. } => {
                    if match_text.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_name: Some(patch.name.clone()),
                            field: "edit.match_text",
                        });
                    }
                }
                EditDef::Structural {
                    start_marker,
                    open_delim,
                    close_delim,
                    ..
                } => {
                    if start_marker.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_name: Some(patch.name.clone()),
                            field: "edit.start_marker",
                        });
                    }
                    if open_delim == close_delim {
                        issues.push(ValidationIssue::InvalidCombo {
                            patch_name: Some(patch.name.clone()),
                            message: "open_delim and close_delim must differ".to_string(),
                        });
                    }
                }
            }
        }

        for check in &self.checks {
            if check.name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_name: None,
                    field: "checks.name",
                });
            }
            match &check.predicate {
                PredicateDef::Contains { text }
                | PredicateDef::NotContains { text }
                | PredicateDef::CountEquals { text, .. } => {
                    if text.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            patch_name: Some(check.name.clone()),
                            field: "predicate.text",
                        });
                    }
                }
                PredicateDef::Xxh3 { digest } => {
                    if parse_digest(digest).is_err() {
                        issues.push(ValidationIssue::InvalidCombo {
                            patch_name: Some(check.name.clone()),
                            message: format!("invalid xxh3 digest: {digest:?}"),
                        });
                    }
                }
                PredicateDef::AllLanded => {}
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Convert into the engine's ordered patch set.
    pub fn to_patch_set(&self) -> Result<PatchSet, SpecError> {
        let mut set = PatchSet::new();
        for patch in &self.patches {
            let spec = match &patch.edit {
                EditDef::Literal {
                    match_text,
                    replacement,
                } => PatchSpec::literal(&patch.name, match_text, replacement)?,
                EditDef::LiteralAll {
                    match_text,
                    replacement,
                } => PatchSpec::literal_all(&patch.name, match_text, replacement)?,
                EditDef::Structural {
                    start_marker,
                    open_delim,
                    close_delim,
                    replacement,
                    trailing_chars,
                } => {
                    let payload = replacement.clone();
                    let mut spec = PatchSpec::structural(
                        &patch.name,
                        start_marker,
                        *open_delim,
                        *close_delim,
                        move || payload.clone(),
                    )?;
                    if let Some(trailing) = trailing_chars {
                        spec = spec.with_trailing_chars(trailing);
                    }
                    spec
                }
            };
            set.push(spec)?;
        }
        Ok(set)
    }

    /// Convert into the engine's verification checks.
    pub fn to_checks(&self) -> Result<Vec<VerificationCheck>, ValidationError> {
        let mut checks = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let built = match &check.predicate {
                PredicateDef::Contains { text } => VerificationCheck::contains(&check.name, text),
                PredicateDef::NotContains { text } => {
                    VerificationCheck::not_contains(&check.name, text)
                }
                PredicateDef::CountEquals { text, count } => {
                    VerificationCheck::count_equals(&check.name, text, *count)
                }
                PredicateDef::AllLanded => VerificationCheck::all_landed(&check.name),
                PredicateDef::Xxh3 { digest } => {
                    let expected = parse_digest(digest).map_err(|message| ValidationError {
                        issues: vec![ValidationIssue::InvalidCombo {
                            patch_name: Some(check.name.clone()),
                            message,
                        }],
                    })?;
                    VerificationCheck::xxh3(&check.name, expected)
                }
            };
            checks.push(built);
        }
        Ok(checks)
    }
}

fn parse_digest(digest: &str) -> Result<u64, String> {
    u64::from_str_radix(digest.trim_start_matches("0x"), 16)
        .map_err(|_| format!("invalid xxh3 digest: {digest:?}"))
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_name: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        patch_name: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch set contains no patches"),
            ValidationIssue::MissingField { patch_name, field } => match patch_name {
                Some(name) => write!(f, "patch '{name}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo {
                patch_name,
                message,
            } => match patch_name {
                Some(name) => write!(f, "patch '{name}' has invalid configuration: {message}"),
                None => write!(f, "invalid patch configuration: {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::PatchKind;

    fn literal_entry(name: &str, match_text: &str) -> PatchEntry {
        PatchEntry {
            name: name.to_string(),
            edit: EditDef::Literal {
                match_text: match_text.to_string(),
                replacement: "new".to_string(),
            },
        }
    }

    #[test]
    fn validate_rejects_empty_patch_list() {
        let config = PatchSetConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no patches"));
    }

    #[test]
    fn validate_rejects_blank_match_text() {
        let config = PatchSetConfig {
            patches: vec![literal_entry("p", "")],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("edit.match_text"));
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let config = PatchSetConfig {
            patches: vec![literal_entry("same", "a"), literal_entry("same", "b")],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate patch name"));
    }

    #[test]
    fn validate_rejects_bad_digest() {
        let config = PatchSetConfig {
            patches: vec![literal_entry("p", "a")],
            checks: vec![CheckEntry {
                name: "digest".to_string(),
                predicate: PredicateDef::Xxh3 {
                    digest: "not-hex".to_string(),
                },
            }],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid xxh3 digest"));
    }

    #[test]
    fn to_patch_set_preserves_order_and_kinds() {
        let config = PatchSetConfig {
            patches: vec![
                literal_entry("first", "a"),
                PatchEntry {
                    name: "second".to_string(),
                    edit: EditDef::Structural {
                        start_marker: "fn main() {".to_string(),
                        open_delim: '{',
                        close_delim: '}',
                        replacement: "fn main() {}".to_string(),
                        trailing_chars: None,
                    },
                },
            ],
            ..Default::default()
        };
        let set = config.to_patch_set().unwrap();
        let kinds: Vec<_> = set.iter().map(|s| s.kind_label()).collect();
        assert_eq!(kinds, vec!["literal", "structural"]);
        assert!(matches!(
            set.iter().nth(1).unwrap().kind(),
            PatchKind::Structural { .. }
        ));
    }

    #[test]
    fn digest_parse_accepts_0x_prefix() {
        assert_eq!(parse_digest("0xff"), Ok(255));
        assert_eq!(parse_digest("ff"), Ok(255));
        assert!(parse_digest("xyz").is_err());
    }
}

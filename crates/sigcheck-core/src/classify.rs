//! Conflict kinds and their severities.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::group::ConflictGroup;
use crate::model::{Decoration, MemberDeclaration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Same visibility and same decorations: a plain redeclaration.
    ExactDuplicate,
    /// Same decorations, different visibility.
    VisibilityConflict,
    /// Different decorations (visibility may or may not differ).
    DecorationConflict,
}

impl ConflictKind {
    pub fn severity(self) -> Severity {
        match self {
            ConflictKind::ExactDuplicate | ConflictKind::VisibilityConflict => Severity::Error,
            ConflictKind::DecorationConflict => Severity::Warning,
        }
    }

    /// Stable diagnostic code.
    pub fn code(self) -> &'static str {
        match self {
            ConflictKind::ExactDuplicate => "exact-duplicate",
            ConflictKind::VisibilityConflict => "visibility-conflict",
            ConflictKind::DecorationConflict => "decoration-conflict",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ConflictKind::ExactDuplicate => "is declared more than once",
            ConflictKind::VisibilityConflict => {
                "is declared more than once with different visibility"
            }
            ConflictKind::DecorationConflict => {
                "is declared more than once with different annotations"
            }
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub kind: ConflictKind,
    pub severity: Severity,
}

impl From<ConflictKind> for Classification {
    fn from(kind: ConflictKind) -> Self {
        Self {
            kind,
            severity: kind.severity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("conflict group for `{signature}` has {size} member(s), expected at least 2")]
    InvalidGroup { signature: String, size: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictClassifier {
    /// Decoration names (`Override`) left out when comparing decoration sets.
    ignored_decorations: BTreeSet<String>,
}

impl ConflictClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignored_decorations<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_decorations: names
                .into_iter()
                .map(|name| {
                    let name: String = name.into();
                    name.trim_start_matches('@').to_string()
                })
                .collect(),
        }
    }

    pub fn classify(&self, group: &ConflictGroup<'_>) -> Result<Classification, ClassifyError> {
        let (first, rest) = match group.members.as_slice() {
            [first, rest @ ..] if !rest.is_empty() => (*first, rest),
            _ => {
                return Err(ClassifyError::InvalidGroup {
                    signature: group.signature.to_string(),
                    size: group.members.len(),
                })
            }
        };

        let first_decorations = self.significant_decorations(first);
        let same_decorations = rest
            .iter()
            .all(|member| self.significant_decorations(member) == first_decorations);
        let same_visibility = rest
            .iter()
            .all(|member| member.visibility() == first.visibility());

        let kind = match (same_visibility, same_decorations) {
            (true, true) => ConflictKind::ExactDuplicate,
            (false, true) => ConflictKind::VisibilityConflict,
            (_, false) => ConflictKind::DecorationConflict,
        };
        Ok(kind.into())
    }

    fn significant_decorations<'m>(
        &self,
        member: &'m MemberDeclaration,
    ) -> BTreeSet<&'m Decoration> {
        member
            .decorations()
            .iter()
            .filter(|d| !self.ignored_decorations.contains(d.name()))
            .collect()
    }
}

//! Per-type conflict detection and aggregation of findings across types and files.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::classify::{ClassifyError, ConflictClassifier, ConflictKind, Severity};
use crate::group::ConflictGrouper;
use crate::model::{MemberDeclaration, SourceLocation, TypeDeclaration};
use crate::normalize::{
    CanonicalSignature, GenericMethodPolicy, NormalizeError, SignatureNormalizer,
};

/// A contract violation inside the detector. Never produced for well-formed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    #[error("in type `{type_name}`: {source}")]
    Normalize {
        type_name: String,
        #[source]
        source: NormalizeError,
    },
    #[error("in type `{type_name}`: {source}")]
    Classify {
        type_name: String,
        #[source]
        source: ClassifyError,
    },
}

/// A conflicting group of declarations with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub type_name: String,
    pub signature: CanonicalSignature,
    pub kind: ConflictKind,
    pub severity: Severity,
    /// The conflicting declarations, first-declared first. Always at least two.
    pub members: Vec<MemberDeclaration>,
}

impl Finding {
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Location of the first declaration.
    pub fn primary_location(&self) -> &SourceLocation {
        self.members[0].location()
    }

    pub fn locations(&self) -> impl Iterator<Item = &SourceLocation> + '_ {
        self.members.iter().map(MemberDeclaration::location)
    }

    pub fn message(&self) -> String {
        format!(
            "`{}` {} in `{}`",
            self.signature,
            self.kind.description(),
            self.type_name
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectOptions {
    pub generic_methods: GenericMethodPolicy,
    /// Decoration names ignored when classifying (e.g. `Override`).
    pub ignored_decorations: Vec<String>,
}

/// The types declared by one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub types: Vec<TypeDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFindings {
    pub path: PathBuf,
    pub findings: Vec<Finding>,
}

/// Runs grouping and classification over declared types.
///
/// The engine holds only configuration; every call is independent of the others.
#[derive(Debug, Clone, Default)]
pub struct DetectionEngine {
    grouper: ConflictGrouper,
    classifier: ConflictClassifier,
}

impl DetectionEngine {
    pub fn new(options: &DetectOptions) -> Self {
        Self {
            grouper: ConflictGrouper::new(SignatureNormalizer::new(options.generic_methods)),
            classifier: ConflictClassifier::with_ignored_decorations(
                options.ignored_decorations.iter().cloned(),
            ),
        }
    }

    /// Findings for one type, ordered by first declaration.
    pub fn detect_type(&self, ty: &TypeDeclaration) -> Result<Vec<Finding>, DetectError> {
        let groups = self
            .grouper
            .group(ty)
            .map_err(|source| DetectError::Normalize {
                type_name: ty.name().to_string(),
                source,
            })?;

        let mut findings = Vec::with_capacity(groups.len());
        for group in groups {
            let classification =
                self.classifier
                    .classify(&group)
                    .map_err(|source| DetectError::Classify {
                        type_name: ty.name().to_string(),
                        source,
                    })?;
            tracing::debug!(
                target: "sigcheck.engine",
                type_name = ty.name(),
                signature = %group.signature,
                kind = classification.kind.code(),
                members = group.members.len(),
                "conflicting declarations"
            );
            findings.push(Finding {
                type_name: ty.name().to_string(),
                signature: group.signature,
                kind: classification.kind,
                severity: classification.severity,
                members: group.members.into_iter().cloned().collect(),
            });
        }
        Ok(findings)
    }

    /// Findings for all `types`, in type order and then first-declaration order.
    pub fn detect(&self, types: &[TypeDeclaration]) -> Result<Vec<Finding>, DetectError> {
        let mut findings = Vec::new();
        for ty in types {
            findings.extend(self.detect_type(ty)?);
        }
        Ok(findings)
    }

    /// Like [`DetectionEngine::detect`], with one rayon task per type.
    ///
    /// The result is identical to the sequential call.
    pub fn detect_parallel(
        &self,
        types: &[TypeDeclaration],
    ) -> Result<Vec<Finding>, DetectError> {
        let mut per_type: Vec<(usize, Vec<Finding>)> = types
            .par_iter()
            .enumerate()
            .map(|(idx, ty)| self.detect_type(ty).map(|findings| (idx, findings)))
            .collect::<Result<_, _>>()?;
        per_type.sort_by_key(|(idx, _)| *idx);
        Ok(per_type
            .into_iter()
            .flat_map(|(_, findings)| findings)
            .collect())
    }

    /// Findings per source file, in unit order. Files without findings are kept with an
    /// empty list.
    pub fn detect_units(&self, units: &[SourceUnit]) -> Result<Vec<FileFindings>, DetectError> {
        units
            .iter()
            .map(|unit| {
                let findings = self.detect(&unit.types)?;
                tracing::debug!(
                    target: "sigcheck.engine",
                    path = %unit.path.display(),
                    types = unit.types.len(),
                    findings = findings.len(),
                    "checked source unit"
                );
                Ok(FileFindings {
                    path: unit.path.clone(),
                    findings,
                })
            })
            .collect()
    }
}

/// Detect conflicts with default options.
pub fn detect(types: &[TypeDeclaration]) -> Result<Vec<Finding>, DetectError> {
    DetectionEngine::default().detect(types)
}

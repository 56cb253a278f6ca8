//! Detection of conflicting member declarations.
//!
//! Two methods (or constructors) of the same type conflict when they have the same name and
//! the same parameter types after normalization, regardless of visibility, annotations or
//! body. The pipeline is:
//!
//! 1. [`SignatureNormalizer`] maps a [`MemberDeclaration`] to a [`CanonicalSignature`],
//! 2. [`ConflictGrouper`] buckets a type's members by signature and keeps buckets of two or more,
//! 3. [`ConflictClassifier`] assigns a [`ConflictKind`] and [`Severity`] to each group,
//! 4. [`DetectionEngine`] runs the above per type and returns ordered [`Finding`]s.
//!
//! This crate performs no I/O. Parsing source text lives in `sigcheck-java`.

mod classify;
mod engine;
mod group;
mod model;
mod normalize;

pub use classify::{Classification, ClassifyError, ConflictClassifier, ConflictKind, Severity};
pub use engine::{
    detect, DetectError, DetectOptions, DetectionEngine, FileFindings, Finding, SourceUnit,
};
pub use group::{ConflictGroup, ConflictGrouper};
pub use model::{
    Decoration, MemberBuilder, MemberDeclaration, MemberKind, ModelError, ParameterType,
    SourceLocation, Span, TypeDeclaration, Visibility,
};
pub use normalize::{
    CanonicalSignature, GenericMethodPolicy, NormalizeError, SignatureNormalizer, TypeArg, TypeKey,
};

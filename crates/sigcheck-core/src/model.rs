//! Declaration model consumed by the detector.
//!
//! Values are produced by a front end (see `sigcheck-java`) and validated when they are
//! constructed. Once built they are immutable; the detector only ever borrows them.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Malformed declaration input, rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("type declaration has an empty name")]
    EmptyTypeName,
    #[error("member name {0:?} is not a valid identifier")]
    InvalidMemberName(String),
    #[error("parameter {index} of `{member}` has an empty type")]
    EmptyParameterType { member: String, index: usize },
    #[error("decoration identifier is empty")]
    EmptyDecoration,
    #[error("constructor `{constructor}` does not match enclosing type `{type_name}`")]
    ConstructorNameMismatch {
        constructor: String,
        type_name: String,
    },
}

/// A byte-span into a source string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

/// Where a declaration came from.
///
/// The detector never looks inside; it is carried through to findings for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column (in bytes).
    pub column: u32,
    pub span: Span,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            file: None,
            line,
            column,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
    /// No access modifier (package-private).
    Package,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
            Visibility::Package => "package-private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    /// A constructor; its name is the simple name of the enclosing type.
    Constructor,
    Field,
}

impl MemberKind {
    /// Whether members of this kind take part in signature comparison.
    pub fn is_callable(self) -> bool {
        matches!(self, MemberKind::Method | MemberKind::Constructor)
    }
}

/// An opaque annotation-like marker attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Decoration(String);

impl Decoration {
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelError::EmptyDecoration);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier up to its argument list (`GetMapping("/x")` -> `GetMapping`).
    pub fn name(&self) -> &str {
        self.0.split('(').next().unwrap_or(&self.0).trim()
    }
}

impl fmt::Display for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A declared parameter type, as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParameterType {
    pub text: String,
    /// Declared with `...`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub variadic: bool,
}

impl ParameterType {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            variadic: false,
        }
    }

    pub fn variadic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            variadic: true,
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text.trim())?;
        if self.variadic {
            f.write_str("...")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDeclaration {
    kind: MemberKind,
    name: String,
    params: Vec<ParameterType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    type_params: Vec<String>,
    visibility: Visibility,
    decorations: BTreeSet<Decoration>,
    location: SourceLocation,
}

impl MemberDeclaration {
    pub fn method(name: impl Into<String>) -> MemberBuilder {
        MemberBuilder::new(MemberKind::Method, name.into())
    }

    pub fn constructor(type_name: impl Into<String>) -> MemberBuilder {
        MemberBuilder::new(MemberKind::Constructor, type_name.into())
    }

    pub fn field(name: impl Into<String>) -> MemberBuilder {
        MemberBuilder::new(MemberKind::Field, name.into())
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParameterType] {
        &self.params
    }

    /// Method type parameter names, in declaration order (`<K, V>` -> `["K", "V"]`).
    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn decorations(&self) -> &BTreeSet<Decoration> {
        &self.decorations
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }
}

#[derive(Debug, Clone)]
pub struct MemberBuilder {
    kind: MemberKind,
    name: String,
    params: Vec<ParameterType>,
    type_params: Vec<String>,
    visibility: Visibility,
    decorations: BTreeSet<Decoration>,
    location: SourceLocation,
}

impl MemberBuilder {
    fn new(kind: MemberKind, name: String) -> Self {
        Self {
            kind,
            name,
            params: Vec::new(),
            type_params: Vec::new(),
            visibility: Visibility::Package,
            decorations: BTreeSet::new(),
            location: SourceLocation::default(),
        }
    }

    pub fn param(mut self, param: ParameterType) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = ParameterType>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn decoration(mut self, decoration: Decoration) -> Self {
        self.decorations.insert(decoration);
        self
    }

    pub fn location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn build(self) -> Result<MemberDeclaration, ModelError> {
        if !is_java_identifier(&self.name) {
            return Err(ModelError::InvalidMemberName(self.name));
        }
        if let Some(index) = self.params.iter().position(|p| p.text.trim().is_empty()) {
            return Err(ModelError::EmptyParameterType {
                member: self.name,
                index,
            });
        }
        Ok(MemberDeclaration {
            kind: self.kind,
            name: self.name,
            params: self.params,
            type_params: self.type_params,
            visibility: self.visibility,
            decorations: self.decorations,
            location: self.location,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDeclaration {
    name: String,
    members: Vec<MemberDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<SourceLocation>,
}

impl TypeDeclaration {
    /// Build a type from its (possibly dotted, for nested types) name and members.
    pub fn new(
        name: impl Into<String>,
        members: impl IntoIterator<Item = MemberDeclaration>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyTypeName);
        }
        let members: Vec<_> = members.into_iter().collect();

        let simple = simple_type_name(&name);
        if let Some(ctor) = members
            .iter()
            .find(|m| m.kind == MemberKind::Constructor && m.name != simple)
        {
            return Err(ModelError::ConstructorNameMismatch {
                constructor: ctor.name.clone(),
                type_name: name,
            });
        }

        Ok(Self {
            name,
            members,
            location: None,
        })
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[MemberDeclaration] {
        &self.members
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

fn simple_type_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn is_java_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

//! Canonical method signatures.
//!
//! Parameter types are parsed into a structured [`TypeKey`] so that purely syntactic
//! variation (whitespace, package qualification, type annotations, `final`, varargs vs.
//! array spelling) does not affect identity.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::model::{MemberDeclaration, MemberKind, ParameterType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("`{name}` is a {kind:?}, only methods and constructors have signatures")]
    NotApplicable { name: String, kind: MemberKind },
}

/// How method type parameters (`<T> void f(T t)`) take part in signature identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericMethodPolicy {
    /// Type parameters are ignored; parameter types compare as written.
    #[default]
    Syntactic,
    /// Type variables are renamed by position and the type-parameter count is part of the
    /// signature, so `<T> f(T)` and `<U> f(U)` are the same method.
    ///
    /// Bounds are not part of the identity: `<T extends Number> f(T)` and
    /// `<T extends CharSequence> f(T)` collide even though their erasures differ.
    Positional,
}

/// Normalized form of a type as it appears in a parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    /// Unqualified base name (`String`, `int`, `Entry`).
    pub base: String,
    pub args: Vec<TypeArg>,
    /// Number of array dimensions, varargs included.
    pub dims: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeArg {
    Type(TypeKey),
    Wildcard,
    Extends(TypeKey),
    Super(TypeKey),
}

impl TypeKey {
    pub fn parse(text: &str) -> Self {
        let tokens = tokenize(text);
        let mut parser = TypeParser { tokens, pos: 0 };
        let mut key = parser.parse_type();
        if key.base.is_empty() {
            // Nothing recognizable; keep the compacted text so distinct inputs stay distinct.
            key.base = text.split_whitespace().collect();
        }
        key
    }

    pub fn from_parameter(param: &ParameterType) -> Self {
        let mut key = Self::parse(&param.text);
        if param.variadic {
            key.dims = key.dims.saturating_add(1);
        }
        key
    }

    fn rename_type_vars(&mut self, type_params: &[String]) {
        if self.args.is_empty() {
            if let Some(idx) = type_params.iter().position(|tp| *tp == self.base) {
                self.base = format!("#{idx}");
            }
        }
        for arg in &mut self.args {
            match arg {
                TypeArg::Type(key) | TypeArg::Extends(key) | TypeArg::Super(key) => {
                    key.rename_type_vars(type_params)
                }
                TypeArg::Wildcard => {}
            }
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                match arg {
                    TypeArg::Type(key) => write!(f, "{key}")?,
                    TypeArg::Wildcard => f.write_str("?")?,
                    TypeArg::Extends(key) => write!(f, "? extends {key}")?,
                    TypeArg::Super(key) => write!(f, "? super {key}")?,
                }
            }
            f.write_str(">")?;
        }
        for _ in 0..self.dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// The identity used to group declarations: name plus normalized parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalSignature {
    pub name: String,
    pub params: Vec<TypeKey>,
    /// Method type-parameter count; only set under [`GenericMethodPolicy::Positional`].
    pub type_param_arity: Option<usize>,
}

impl fmt::Display for CanonicalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(arity) = self.type_param_arity.filter(|n| *n > 0) {
            f.write_str("<")?;
            for idx in 0..arity {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "#{idx}")?;
            }
            f.write_str("> ")?;
        }
        write!(f, "{}(", self.name)?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

impl Serialize for CanonicalSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Maps member declarations to their [`CanonicalSignature`]. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignatureNormalizer {
    policy: GenericMethodPolicy,
}

impl SignatureNormalizer {
    pub fn new(policy: GenericMethodPolicy) -> Self {
        Self { policy }
    }

    pub fn normalize(
        &self,
        member: &MemberDeclaration,
    ) -> Result<CanonicalSignature, NormalizeError> {
        if !member.kind().is_callable() {
            return Err(NormalizeError::NotApplicable {
                name: member.name().to_string(),
                kind: member.kind(),
            });
        }

        let mut params: Vec<TypeKey> = member
            .params()
            .iter()
            .map(TypeKey::from_parameter)
            .collect();
        let type_param_arity = match self.policy {
            GenericMethodPolicy::Syntactic => None,
            GenericMethodPolicy::Positional => {
                let type_params = member.type_params();
                if !type_params.is_empty() {
                    for param in &mut params {
                        param.rename_type_vars(type_params);
                    }
                }
                Some(type_params.len())
            }
        };

        Ok(CanonicalSignature {
            name: member.name().to_string(),
            params,
            type_param_arity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Dot,
    Lt,
    Gt,
    Comma,
    Question,
    LBracket,
    RBracket,
    Ellipsis,
    Other,
}

fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            c if c.is_whitespace() => i += 1,
            '@' => i = skip_annotation(&chars, i + 1),
            '.' if chars[i..].starts_with(&['.', '.', '.']) => {
                out.push(Token::Ellipsis);
                i += 3;
            }
            '.' => {
                out.push(Token::Dot);
                i += 1;
            }
            '<' => {
                out.push(Token::Lt);
                i += 1;
            }
            '>' => {
                out.push(Token::Gt);
                i += 1;
            }
            ',' => {
                out.push(Token::Comma);
                i += 1;
            }
            '?' => {
                out.push(Token::Question);
                i += 1;
            }
            '[' => {
                out.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                out.push(Token::RBracket);
                i += 1;
            }
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                if ident != "final" {
                    out.push(Token::Ident(ident));
                }
            }
            _ => {
                out.push(Token::Other);
                i += 1;
            }
        }
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Skip an annotation body starting right after `@`: a (qualified) name and an optional
/// balanced argument list. Returns the index of the first char after it.
fn skip_annotation(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && (is_ident_char(chars[i]) || chars[i] == '.') {
        i += 1;
    }
    let mut j = i;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    if j < chars.len() && chars[j] == '(' {
        let mut depth = 0u32;
        let mut in_string = false;
        let mut escape = false;
        while j < chars.len() {
            let c = chars[j];
            j += 1;
            if in_string {
                if escape {
                    escape = false;
                } else if c == '\\' {
                    escape = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return j;
                    }
                }
                _ => {}
            }
        }
        return j;
    }
    i
}

struct TypeParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl TypeParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> TypeKey {
        let mut base = String::new();
        let mut args = Vec::new();

        // Qualified name; only the last segment (and its arguments) is kept.
        loop {
            match self.peek() {
                Some(Token::Ident(_)) => {
                    if let Some(Token::Ident(ident)) = self.bump() {
                        base = ident;
                    }
                }
                _ => break,
            }
            args = if self.eat(&Token::Lt) {
                self.parse_args()
            } else {
                Vec::new()
            };
            if !self.eat(&Token::Dot) {
                break;
            }
        }

        let mut dims = 0u8;
        loop {
            match self.peek() {
                Some(Token::LBracket) => {
                    self.pos += 1;
                    self.eat(&Token::RBracket);
                    dims = dims.saturating_add(1);
                }
                Some(Token::Ellipsis) => {
                    self.pos += 1;
                    dims = dims.saturating_add(1);
                }
                _ => break,
            }
        }

        TypeKey { base, args, dims }
    }

    fn parse_args(&mut self) -> Vec<TypeArg> {
        let mut args = Vec::new();
        loop {
            match self.peek() {
                None => break,
                Some(Token::Gt) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Comma) | Some(Token::Other) => {
                    self.pos += 1;
                }
                Some(Token::Question) => {
                    self.pos += 1;
                    let arg = match self.peek() {
                        Some(Token::Ident(kw)) if kw == "extends" => {
                            self.pos += 1;
                            TypeArg::Extends(self.parse_type())
                        }
                        Some(Token::Ident(kw)) if kw == "super" => {
                            self.pos += 1;
                            TypeArg::Super(self.parse_type())
                        }
                        _ => TypeArg::Wildcard,
                    };
                    args.push(arg);
                }
                Some(_) => {
                    let start = self.pos;
                    let key = self.parse_type();
                    if self.pos == start {
                        // Stray token (`]`, `...`); skip it to guarantee progress.
                        self.pos += 1;
                    } else {
                        args.push(TypeArg::Type(key));
                    }
                }
            }
        }
        args
    }
}

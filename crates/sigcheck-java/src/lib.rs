//! Java front end: turns source text into [`TypeDeclaration`]s for `sigcheck-core`.
//!
//! Parsing is best-effort. Files with syntax errors still yield whatever declarations
//! tree-sitter could recover; members that cannot be modeled are logged and skipped.

use std::cell::RefCell;
use std::path::Path;

use sigcheck_core::{SourceUnit, TypeDeclaration};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

mod decoration;
mod extract;

pub use decoration::decoration_id;

thread_local! {
    static JAVA_PARSER: RefCell<Result<Parser, String>> = RefCell::new({
        let mut parser = Parser::new();
        match parser.set_language(tree_sitter_java::language()) {
            Ok(()) => Ok(parser),
            Err(_) => Err("tree-sitter-java language load failed".to_string()),
        }
    });
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to parse Java source: {0}")]
    Parse(String),
}

/// Parse Java source text with `tree-sitter-java`.
pub fn parse_java(source: &str) -> Result<Tree, String> {
    JAVA_PARSER.with(|parser_cell| {
        let mut parser = parser_cell
            .try_borrow_mut()
            .map_err(|_| "tree-sitter parser is already in use".to_string())?;
        let parser = match parser.as_mut() {
            Ok(parser) => parser,
            Err(err) => return Err(err.clone()),
        };

        parser
            .parse(source, None)
            .ok_or_else(|| "tree-sitter failed to produce a syntax tree".to_string())
    })
}

/// All named types declared in `source`, nested and local types included, in source order.
///
/// Nested types are named by their enclosing types (`Outer.Inner`).
pub fn extract_types(source: &str) -> Result<Vec<TypeDeclaration>, ExtractError> {
    let tree = parse_java(source).map_err(ExtractError::Parse)?;
    if tree.root_node().has_error() {
        tracing::warn!(
            target: "sigcheck.java",
            "source contains syntax errors; declarations are best-effort"
        );
    }
    Ok(extract::types_in(tree.root_node(), source, None))
}

/// Like [`extract_types`], recording `path` in every location.
pub fn extract_unit(path: &Path, source: &str) -> Result<SourceUnit, ExtractError> {
    let tree = parse_java(source).map_err(ExtractError::Parse)?;
    if tree.root_node().has_error() {
        tracing::warn!(
            target: "sigcheck.java",
            path = %path.display(),
            "source contains syntax errors; declarations are best-effort"
        );
    }
    let types = extract::types_in(tree.root_node(), source, Some(path));
    tracing::debug!(
        target: "sigcheck.java",
        path = %path.display(),
        types = types.len(),
        "extracted declarations"
    );
    Ok(SourceUnit {
        path: path.to_path_buf(),
        types,
    })
}

/// Visit a node and all its descendants in pre-order.
pub(crate) fn visit_nodes<'a, F: FnMut(Node<'a>)>(node: Node<'a>, f: &mut F) {
    f(node);
    if node.child_count() == 0 {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_nodes(child, f);
    }
}

/// Find the first named child with the given kind.
pub(crate) fn find_named_child<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let result = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == kind);
    result
}

pub(crate) fn modifier_node(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("modifiers")
        .or_else(|| find_named_child(node, "modifiers"))
}

/// Return the byte slice for `node` within `source`.
pub(crate) fn node_text<'a>(source: &'a str, node: Node<'_>) -> &'a str {
    &source[node.byte_range()]
}

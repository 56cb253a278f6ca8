use std::path::Path;

use sigcheck_core::{
    MemberBuilder, MemberDeclaration, ModelError, ParameterType, SourceLocation, Span,
    TypeDeclaration, Visibility,
};
use tree_sitter::Node;

use crate::decoration::decorations_of;
use crate::{find_named_child, modifier_node, node_text, visit_nodes};

const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

fn is_type_declaration(node: Node<'_>) -> bool {
    TYPE_KINDS.contains(&node.kind())
}

struct Extractor<'a> {
    source: &'a str,
    path: Option<&'a Path>,
}

/// Types that fail model validation are logged and left out.
pub(crate) fn types_in(
    root: Node<'_>,
    source: &str,
    path: Option<&Path>,
) -> Vec<TypeDeclaration> {
    let mut type_nodes = Vec::new();
    visit_nodes(root, &mut |node| {
        if is_type_declaration(node) && node.child_by_field_name("name").is_some() {
            type_nodes.push(node);
        }
    });

    let extractor = Extractor { source, path };
    type_nodes
        .into_iter()
        .filter_map(|node| extractor.type_declaration(node))
        .collect()
}

impl<'a> Extractor<'a> {
    fn type_declaration(&self, node: Node<'_>) -> Option<TypeDeclaration> {
        let name = self.qualified_name(node);
        let mut members = Vec::new();
        for member in body_members(node) {
            self.member(node, &name, member, &mut members);
        }

        let location = node
            .child_by_field_name("name")
            .map(|name_node| self.location(name_node, node));
        let ty = match TypeDeclaration::new(name.clone(), members) {
            Ok(ty) => ty,
            Err(error) => {
                tracing::warn!(
                    target: "sigcheck.java",
                    type_name = %name,
                    %error,
                    "skipping malformed type declaration"
                );
                return None;
            }
        };
        Some(match location {
            Some(location) => ty.with_location(location),
            None => ty,
        })
    }

    /// `Outer.Inner` for a type nested (or declared locally) inside `Outer`.
    fn qualified_name(&self, node: Node<'_>) -> String {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            if is_type_declaration(n) {
                if let Some(name) = n.child_by_field_name("name") {
                    segments.push(node_text(self.source, name));
                }
            }
            current = n.parent();
        }
        segments.reverse();
        segments.join(".")
    }

    /// The `name` child of `node`, unless tree-sitter synthesized it while recovering.
    fn declared_name<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("name")
            .filter(|name| !name.is_missing() && !node_text(self.source, *name).is_empty())
    }

    fn keep(
        &self,
        type_name: &str,
        member: Result<MemberDeclaration, ModelError>,
        out: &mut Vec<MemberDeclaration>,
    ) {
        match member {
            Ok(member) => out.push(member),
            Err(error) => tracing::warn!(
                target: "sigcheck.java",
                type_name,
                %error,
                "skipping malformed member"
            ),
        }
    }

    fn member(
        &self,
        owner: Node<'_>,
        type_name: &str,
        node: Node<'_>,
        out: &mut Vec<MemberDeclaration>,
    ) {
        match node.kind() {
            "method_declaration" => {
                let Some(name) = self.declared_name(node) else {
                    return;
                };
                let builder = MemberDeclaration::method(node_text(self.source, name));
                self.keep(type_name, self.callable(owner, node, name, builder), out);
            }
            "constructor_declaration" => {
                let Some(name) = self.declared_name(node) else {
                    return;
                };
                let text = node_text(self.source, name);
                let builder = if Some(text) == self.simple_name(owner) {
                    MemberDeclaration::constructor(text)
                } else {
                    // Not a constructor of this type: a method missing its return type.
                    MemberDeclaration::method(text)
                };
                self.keep(type_name, self.callable(owner, node, name, builder), out);
            }
            "compact_constructor_declaration" => {
                let (Some(name), Some(owner_name)) =
                    (self.declared_name(node), self.simple_name(owner))
                else {
                    return;
                };
                let mut builder = MemberDeclaration::constructor(owner_name);
                if let Some(params) = owner.child_by_field_name("parameters") {
                    builder = builder.params(self.parameters(params));
                }
                let member = self.finish(owner, node, name, builder).build();
                self.keep(type_name, member, out);
            }
            "field_declaration" | "constant_declaration" => {
                let mut cursor = node.walk();
                for declarator in node.children_by_field_name("declarator", &mut cursor) {
                    let Some(name) = self.declared_name(declarator) else {
                        continue;
                    };
                    let builder = MemberDeclaration::field(node_text(self.source, name));
                    let member = self.finish(owner, node, name, builder).build();
                    self.keep(type_name, member, out);
                }
            }
            _ => {}
        }
    }

    fn callable(
        &self,
        owner: Node<'_>,
        node: Node<'_>,
        name: Node<'_>,
        mut builder: MemberBuilder,
    ) -> Result<MemberDeclaration, ModelError> {
        if let Some(params) = node.child_by_field_name("parameters") {
            builder = builder.params(self.parameters(params));
        }
        if let Some(type_params) = node
            .child_by_field_name("type_parameters")
            .or_else(|| find_named_child(node, "type_parameters"))
        {
            let mut cursor = type_params.walk();
            for param in type_params.named_children(&mut cursor) {
                if param.kind() != "type_parameter" {
                    continue;
                }
                let ident = find_named_child(param, "type_identifier")
                    .or_else(|| find_named_child(param, "identifier"));
                if let Some(ident) = ident {
                    builder = builder.type_param(node_text(self.source, ident));
                }
            }
        }
        self.finish(owner, node, name, builder).build()
    }

    /// Visibility, decorations and location shared by every member kind.
    fn finish(
        &self,
        owner: Node<'_>,
        node: Node<'_>,
        name: Node<'_>,
        mut builder: MemberBuilder,
    ) -> MemberBuilder {
        let mut explicit = None;
        if let Some(modifiers) = modifier_node(node) {
            explicit = visibility_modifier(modifiers);
            for decoration in decorations_of(modifiers, self.source) {
                builder = builder.decoration(decoration);
            }
        }
        let visibility = explicit.unwrap_or_else(|| implicit_visibility(owner, node));
        builder
            .visibility(visibility)
            .location(self.location(name, node))
    }

    fn parameters(&self, params: Node<'_>) -> Vec<ParameterType> {
        let mut out = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "formal_parameter" => {
                    let Some(ty) = param.child_by_field_name("type") else {
                        continue;
                    };
                    let mut text = node_text(self.source, ty).to_string();
                    // C-style `int xs[]`
                    if let Some(dims) = param
                        .child_by_field_name("dimensions")
                        .or_else(|| find_named_child(param, "dimensions"))
                    {
                        for _ in node_text(self.source, dims).matches('[') {
                            text.push_str("[]");
                        }
                    }
                    out.push(ParameterType::new(text));
                }
                "spread_parameter" => {
                    let mut inner = param.walk();
                    let ty = param.named_children(&mut inner).find(|child| {
                        !matches!(child.kind(), "modifiers" | "variable_declarator")
                            && !child.kind().ends_with("annotation")
                    });
                    if let Some(ty) = ty {
                        out.push(ParameterType::variadic(node_text(self.source, ty)));
                    }
                }
                // receiver parameters (`Foo this`) are not part of the signature
                _ => {}
            }
        }
        out
    }

    fn simple_name(&self, owner: Node<'_>) -> Option<&'a str> {
        owner
            .child_by_field_name("name")
            .map(|name| node_text(self.source, name))
    }

    fn location(&self, name: Node<'_>, decl: Node<'_>) -> SourceLocation {
        let start = name.start_position();
        let location = SourceLocation::new(start.row as u32 + 1, start.column as u32 + 1)
            .with_span(Span::new(decl.start_byte(), decl.end_byte()));
        match self.path {
            Some(path) => location.with_file(path),
            None => location,
        }
    }
}

/// Member declarations directly inside a type's body.
fn body_members(node: Node<'_>) -> Vec<Node<'_>> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() == "enum_body_declarations" {
            let mut inner = child.walk();
            out.extend(child.named_children(&mut inner));
        } else {
            out.push(child);
        }
    }
    out
}

fn visibility_modifier(modifiers: Node<'_>) -> Option<Visibility> {
    let mut cursor = modifiers.walk();
    let result = modifiers
        .children(&mut cursor)
        .find_map(|child| match child.kind() {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        });
    result
}

fn implicit_visibility(owner: Node<'_>, member: Node<'_>) -> Visibility {
    match (owner.kind(), member.kind()) {
        ("interface_declaration" | "annotation_type_declaration", _) => Visibility::Public,
        ("enum_declaration", "constructor_declaration") => Visibility::Private,
        _ => Visibility::Package,
    }
}

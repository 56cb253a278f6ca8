use sigcheck_core::Decoration;
use tree_sitter::Node;

use crate::node_text;

/// Identity of an annotation as written: the simple name followed by its argument list with
/// whitespace outside literals removed.
///
/// `@org.springframework.web.bind.annotation.GetMapping( "/hello" )` becomes
/// `GetMapping("/hello")`. Returns `None` for text that is not an annotation.
pub fn decoration_id(text: &str) -> Option<String> {
    let rest = text.trim().strip_prefix('@')?;
    let (name, args) = match rest.find('(') {
        Some(idx) => (&rest[..idx], Some(&rest[idx..])),
        None => (rest, None),
    };

    let name: String = name.split_whitespace().collect();
    let simple = name.rsplit('.').next().unwrap_or(&name);
    if simple.is_empty() {
        return None;
    }

    let mut id = simple.to_string();
    if let Some(args) = args {
        id.push_str(&compact_outside_literals(args));
    }
    Some(id)
}

/// Annotations attached through a `modifiers` node.
pub(crate) fn decorations_of(modifiers: Node<'_>, source: &str) -> Vec<Decoration> {
    let mut out = Vec::new();
    let mut cursor = modifiers.walk();
    for child in modifiers.named_children(&mut cursor) {
        if !child.kind().ends_with("annotation") {
            continue;
        }
        let Some(id) = decoration_id(node_text(source, child)) else {
            continue;
        };
        match Decoration::new(id) {
            Ok(decoration) => out.push(decoration),
            Err(err) => {
                tracing::debug!(target: "sigcheck.java", error = %err, "skipping annotation")
            }
        }
    }
    out
}

fn compact_outside_literals(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut in_char = false;
    let mut escape = false;

    for ch in input.chars() {
        if in_string || in_char {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if in_string && ch == '"' {
                in_string = false;
            } else if in_char && ch == '\'' {
                in_char = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '\'' => in_char = true,
            c if c.is_whitespace() => continue,
            _ => {}
        }
        out.push(ch);
    }
    out
}

use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;
use tree_sitter::{Node, Tree};

pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let result = node
        .children(&mut cursor)
        .find(|child| child.kind() == kind);
    result
}

pub fn has_child_kind(node: Node<'_>, kind: &str) -> bool {
    find_child_by_kind(node, kind).is_some()
}

/// All direct children, named and anonymous, in source order.
pub fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).collect();
    result
}

/// All named direct children in source order.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let result = node.named_children(&mut cursor).collect();
    result
}

/// Verbatim source text of a node.
///
/// Returns `None` when the node's byte range does not fall on character
/// boundaries of `source` (which means the tree was built from other text).
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    source.get(node.start_byte()..node.end_byte())
}

/// Like [`node_text`] but lossy: an unrecoverable span yields an empty string.
pub fn node_text_or_empty<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node_text(node, source).unwrap_or("")
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    static WS_RE: OnceLock<Regex> = OnceLock::new();
    let ws_re = WS_RE.get_or_init(|| Regex::new(r"\s+").unwrap());
    ws_re.replace_all(text.trim(), " ").into_owned()
}

/// Find the first descendant (pre-order, including `node`) of the given kind.
pub fn find_descendant_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    if node.kind() == kind {
        return Some(node);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_descendant_by_kind(child, kind) {
            return Some(found);
        }
    }

    None
}

/// Reject a tree that tree-sitter only produced by error recovery.
///
/// Markers placed against a recovered tree could land outside real blocks,
/// so the position of the first error is reported instead.
pub fn ensure_no_syntax_errors(tree: &Tree, filename: &str) -> Result<()> {
    if !tree.root_node().has_error() {
        return Ok(());
    }

    let (line, column) = first_error(tree.root_node())
        .map(|node| {
            let pos = node.start_position();
            (pos.row + 1, pos.column + 1)
        })
        .unwrap_or((1, 1));
    anyhow::bail!(
        "{}:{}:{}: syntax error, refusing to instrument",
        filename,
        line,
        column
    )
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }

    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  unsigned \n\t long  "), "unsigned long");
        assert_eq!(normalize_whitespace("int"), "int");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_find_child_and_text() {
        let source = "int add(int a, int b) { return a + b; }";
        let tree = parse(source);
        let function = tree.root_node().named_child(0).unwrap();
        assert_eq!(function.kind(), "function_definition");

        let body = find_child_by_kind(function, "compound_statement").unwrap();
        assert_eq!(node_text(body, source), Some("{ return a + b; }"));
        assert!(has_child_kind(function, "primitive_type"));
        assert!(!has_child_kind(function, "try_statement"));
    }

    #[test]
    fn test_find_descendant_by_kind() {
        let source = "void f() { if (x) { g(); } }";
        let tree = parse(source);
        let call = find_descendant_by_kind(tree.root_node(), "call_expression").unwrap();
        assert_eq!(node_text(call, source), Some("g()"));
        assert!(find_descendant_by_kind(tree.root_node(), "lambda_expression").is_none());
    }

    #[test]
    fn test_node_text_out_of_range() {
        let tree = parse("int x;");
        let root = tree.root_node();
        assert_eq!(node_text(root, "in"), None);
        assert_eq!(node_text_or_empty(root, "in"), "");
    }

    #[test]
    fn test_ensure_no_syntax_errors() {
        let tree = parse("int ok() { return 1; }");
        assert!(ensure_no_syntax_errors(&tree, "ok.cpp").is_ok());

        let tree = parse("int bad() {\n  return 1 +;\n}");
        let message = ensure_no_syntax_errors(&tree, "bad.cpp")
            .unwrap_err()
            .to_string();
        assert!(message.starts_with("bad.cpp:2:"), "got: {}", message);
    }
}

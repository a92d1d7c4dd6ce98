//! Source span representation

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// Contiguous region of the original source text
///
/// Offsets are byte offsets into the original buffer and are never adjusted
/// for pending insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Byte offset of the start of the span (inclusive)
    pub start: usize,
    /// Byte offset of the end of the span (exclusive)
    pub end: usize,
    /// Line number of the start (1-indexed)
    pub start_line: u32,
    /// Line number of the end (1-indexed)
    pub end_line: u32,
    /// Column number of the start (0-indexed, in bytes)
    pub start_col: u32,
}

impl SourceSpan {
    /// Create a new source span
    pub fn new(start: usize, end: usize, start_line: u32, end_line: u32, start_col: u32) -> Self {
        SourceSpan {
            start,
            end,
            start_line,
            end_line,
            start_col,
        }
    }

    /// Span covered by a tree-sitter node
    pub fn of_node(node: Node<'_>) -> Self {
        SourceSpan::new(
            node.start_byte(),
            node.end_byte(),
            node.start_position().row as u32 + 1, // tree-sitter uses 0-indexed rows
            node.end_position().row as u32 + 1,
            node.start_position().column as u32,
        )
    }

    /// Get the length of the span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span contains another span
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let span = SourceSpan::new(10, 20, 1, 3, 5);
        assert_eq!(span.start, 10);
        assert_eq!(span.end, 20);
        assert_eq!(span.start_line, 1);
        assert_eq!(span.end_line, 3);
        assert_eq!(span.start_col, 5);
    }

    #[test]
    fn test_len_and_empty() {
        let span = SourceSpan::new(10, 20, 1, 3, 5);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());

        let backwards = SourceSpan::new(20, 10, 1, 1, 5);
        assert_eq!(backwards.len(), 0);
        assert!(backwards.is_empty());
    }

    #[test]
    fn test_contains() {
        let outer = SourceSpan::new(10, 30, 1, 5, 5);
        let inner = SourceSpan::new(15, 25, 2, 4, 10);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_of_node() {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .unwrap();
        let source = "\nint f() { return 1; }\n";
        let tree = parser.parse(source, None).unwrap();
        let function = tree.root_node().named_child(0).unwrap();

        let span = SourceSpan::of_node(function);
        assert_eq!(span.start, 1);
        assert_eq!(span.end, source.len() - 1);
        assert_eq!(span.start_line, 2);
        assert_eq!(span.end_line, 2);
        assert_eq!(span.start_col, 0);
    }
}

//! C parser using tree-sitter

use crate::language::tree_sitter_utils::ensure_no_syntax_errors;
use anyhow::{Context, Result};
use tree_sitter::{Parser, Tree};

/// C parser using tree-sitter
///
/// C gets its own grammar: valid C may use C++ keywords such as `new` or
/// `class` as ordinary identifiers.
pub struct CParser;

impl CParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .context("Failed to set C language for parser")?;
        Ok(CParser)
    }

    /// Parse a whole translation unit, rejecting trees with error nodes
    pub fn parse(&self, source: &str, filename: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .context("Failed to set C language")?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse C file: {}", filename))?;

        ensure_no_syntax_errors(&tree, filename)?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_function() {
        let parser = CParser::new().unwrap();
        let tree = parser
            .parse("int add(int a, int b) { return a + b; }\n", "add.c")
            .unwrap();
        let root = tree.root_node();
        assert_eq!(root.kind(), "translation_unit");
        assert_eq!(root.named_child(0).unwrap().kind(), "function_definition");
    }

    #[test]
    fn test_cxx_keywords_are_identifiers() {
        let parser = CParser::new().unwrap();
        let source = "int scale(int new, int delete)\n{\n    int class = new * delete;\n    { class += 1; }\n    return class;\n}\n";
        let tree = parser.parse(source, "keywords.c").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parse_rejects_syntax_errors() {
        let parser = CParser::new().unwrap();
        let err = parser
            .parse("void f(void) {\n  int x = ;\n", "broken.c")
            .unwrap_err();
        assert!(err.to_string().starts_with("broken.c:"), "got: {}", err);
    }
}

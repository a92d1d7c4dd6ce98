//! C/C++ parser using tree-sitter

use crate::language::tree_sitter_utils::ensure_no_syntax_errors;
use anyhow::{Context, Result};
use tree_sitter::{Parser, Tree};

/// C/C++ parser using tree-sitter
pub struct CppParser;

impl CppParser {
    /// Create a new C/C++ parser
    pub fn new() -> Result<Self> {
        // Just validate that we can create a parser
        let mut parser = Parser::new();
        let language = tree_sitter_cpp::LANGUAGE;
        parser
            .set_language(&language.into())
            .context("Failed to set C++ language for parser")?;
        Ok(CppParser)
    }

    /// Parse a whole translation unit
    ///
    /// tree-sitter recovers from syntax errors, but a tree with error nodes
    /// cannot be trusted to place markers inside real blocks, so such files
    /// are rejected with the position of the first error.
    pub fn parse(&self, source: &str, filename: &str) -> Result<Tree> {
        // Need to make parser mutable, so we can't use &self directly
        // This is a limitation of tree-sitter's API
        let mut parser = Parser::new();
        let language = tree_sitter_cpp::LANGUAGE;
        parser
            .set_language(&language.into())
            .context("Failed to set C++ language")?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse C/C++ file: {}", filename))?;

        ensure_no_syntax_errors(&tree, filename)?;
        Ok(tree)
    }
}

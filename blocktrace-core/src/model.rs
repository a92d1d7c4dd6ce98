//! Program model of one translation unit
//!
//! A [`TranslationUnit`] owns the source text, its syntax tree and the
//! declaration index built from it. [`FunctionUnit`] and [`Block`] are
//! borrowed views into that tree and never outlive it.

use crate::language::cpp::names::{DeclIndex, FunctionSignature};
use crate::language::tree_sitter_utils::node_text;
use crate::language::{CParser, CppParser, Language, SourceSpan};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Tree};

/// A parsed source file
pub struct TranslationUnit {
    path: PathBuf,
    language: Language,
    source: String,
    tree: Tree,
    index: DeclIndex,
}

impl TranslationUnit {
    /// Parse `source` as the main file of a translation unit.
    ///
    /// Fails when the text does not parse cleanly.
    pub fn parse(path: &Path, source: String, language: Language) -> Result<Self> {
        let filename = path.display().to_string();
        let tree = match language {
            Language::C => CParser::new()?.parse(&source, &filename)?,
            Language::Cpp => CppParser::new()?.parse(&source, &filename)?,
        };
        let index = DeclIndex::build(tree.root_node(), &source);

        Ok(TranslationUnit {
            path: path.to_path_buf(),
            language,
            source,
            tree,
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn index(&self) -> &DeclIndex {
        &self.index
    }

    /// Verbatim text of a node, `None` if its span cannot be recovered
    pub fn text(&self, node: Node<'_>) -> Option<&str> {
        node_text(node, &self.source)
    }

    /// Function definitions with a body, in source order.
    ///
    /// Methods of local classes are listed on their own; defaulted and
    /// deleted functions and plain declarations are not listed at all.
    pub fn function_units(&self) -> Vec<FunctionUnit<'_>> {
        let mut units = Vec::new();
        let mut stack = vec![self.root()];

        while let Some(node) = stack.pop() {
            if node.kind() == "function_definition" {
                if let Some(unit) = FunctionUnit::from_definition(node) {
                    units.push(unit);
                }
            }

            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        units.sort_by_key(|unit| unit.definition.start_byte());
        units
    }
}

/// One function definition with a body
#[derive(Debug, Clone, Copy)]
pub struct FunctionUnit<'t> {
    pub definition: Node<'t>,
    /// `compound_statement`, or `try_statement` for a function-try-block
    pub body: Node<'t>,
}

impl<'t> FunctionUnit<'t> {
    pub fn from_definition(definition: Node<'t>) -> Option<Self> {
        let body = definition.child_by_field_name("body")?;
        match body.kind() {
            "compound_statement" | "try_statement" => Some(FunctionUnit { definition, body }),
            _ => None,
        }
    }

    pub fn span(&self) -> SourceSpan {
        SourceSpan::of_node(self.definition)
    }

    /// First line of the definition (1-indexed)
    pub fn line(&self) -> u32 {
        self.span().start_line
    }

    pub fn signature(&self, source: &str) -> Option<FunctionSignature> {
        FunctionSignature::of_definition(self.definition, source)
    }
}

/// A lexical block: one `compound_statement` node
#[derive(Debug, Clone, Copy)]
pub struct Block<'t> {
    pub node: Node<'t>,
}

impl<'t> Block<'t> {
    pub fn new(node: Node<'t>) -> Self {
        Block { node }
    }

    /// Identity of the block within its tree
    pub fn id(&self) -> usize {
        self.node.id()
    }

    pub fn span(&self) -> SourceSpan {
        SourceSpan::of_node(self.node)
    }

    /// Byte offset just past the opening brace
    pub fn after_open_brace(&self) -> usize {
        self.node.start_byte() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(source: &str) -> TranslationUnit {
        TranslationUnit::parse(Path::new("test.cpp"), source.to_string(), Language::Cpp)
            .expect("parse")
    }

    #[test]
    fn test_function_units_in_source_order() {
        let tu = unit(
            r#"
int first() { return 1; }
struct S {
    S() = default;
    void method() {}
    void declared();
};
void S::declared() {}
"#,
        );
        let units = tu.function_units();
        let names: Vec<String> = units
            .iter()
            .map(|u| u.signature(tu.source()).unwrap().qualified_name())
            .collect();
        assert_eq!(names, ["first", "S::method", "S::declared"]);
        assert_eq!(units[0].line(), 2);
    }

    #[test]
    fn test_local_class_methods_are_units() {
        let tu = unit("void outer() { struct L { int m() { return 0; } }; }");
        assert_eq!(tu.function_units().len(), 2);
    }

    #[test]
    fn test_declarations_only_yield_no_units() {
        let tu = unit("int add(int a, int b);\nextern int counter;\n");
        assert!(tu.function_units().is_empty());
    }

    #[test]
    fn test_block_offsets() {
        let source = "void f() { }";
        let tu = unit(source);
        let units = tu.function_units();
        let block = Block::new(units[0].body);
        assert_eq!(tu.text(block.node), Some("{ }"));
        assert_eq!(&source[..block.after_open_brace()], "void f() {");
    }
}

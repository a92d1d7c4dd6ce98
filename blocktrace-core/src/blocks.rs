//! Block enumeration
//!
//! Blocks of a function are found from several roots: the function body
//! and, independently, the body of every lambda inside it. Lambda blocks are
//! therefore reached more than once; the [`VisitedSet`] makes sure each one
//! is yielded exactly once.

use crate::model::{Block, FunctionUnit};
use std::collections::{HashSet, VecDeque};
use tree_sitter::Node;

/// Node ids of the blocks already yielded for one function
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<usize>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block; `false` if it had been recorded before.
    pub fn insert(&mut self, block: &Block<'_>) -> bool {
        self.seen.insert(block.id())
    }

    pub fn contains(&self, block: &Block<'_>) -> bool {
        self.seen.contains(&block.id())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Lazy pre-order sequence of the blocks of one function
pub struct Blocks<'t> {
    roots: VecDeque<Node<'t>>,
    stack: Vec<Node<'t>>,
    visited: VisitedSet,
}

/// Start enumerating the blocks of `unit`. The function body comes first.
pub fn enumerate<'t>(unit: &FunctionUnit<'t>) -> Blocks<'t> {
    let mut roots = VecDeque::new();
    roots.push_back(unit.body);
    collect_lambda_bodies(unit.body, &mut roots);

    Blocks {
        roots,
        stack: Vec::new(),
        visited: VisitedSet::new(),
    }
}

fn collect_lambda_bodies<'t>(node: Node<'t>, roots: &mut VecDeque<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "function_definition" {
            continue;
        }
        if child.kind() == "lambda_expression" {
            if let Some(body) = child.child_by_field_name("body") {
                roots.push_back(body);
            }
        }
        collect_lambda_bodies(child, roots);
    }
}

impl<'t> Blocks<'t> {
    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    fn push_children(&mut self, node: Node<'t>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node
            .children(&mut cursor)
            .filter(|child| child.kind() != "function_definition")
            .collect();
        self.stack.extend(children.into_iter().rev());
    }
}

impl<'t> Iterator for Blocks<'t> {
    type Item = Block<'t>;

    fn next(&mut self) -> Option<Block<'t>> {
        loop {
            let node = match self.stack.pop() {
                Some(node) => node,
                None => self.roots.pop_front()?,
            };

            if node.kind() == "compound_statement" {
                let block = Block::new(node);
                // a visited block's subtree has been walked already
                if !self.visited.insert(&block) {
                    continue;
                }
                self.push_children(node);
                return Some(block);
            }

            self.push_children(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::model::TranslationUnit;
    use std::path::Path;

    fn block_texts(source: &str, unit_index: usize) -> Vec<String> {
        let tu = TranslationUnit::parse(Path::new("t.cpp"), source.to_string(), Language::Cpp)
            .expect("parse");
        let units = tu.function_units();
        enumerate(&units[unit_index])
            .map(|block| tu.text(block.node).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_single_body() {
        assert_eq!(block_texts("int f() { return 1; }", 0), ["{ return 1; }"]);
    }

    #[test]
    fn test_nested_statements_in_preorder() {
        let src = r#"
void f(int n) {
    if (n) { a(); } else { b(); }
    for (;;) { while (n) { c(); } }
    switch (n) { case 1: { d(); } }
    try { e(); } catch (...) { g(); }
    { h(); }
}
"#;
        let blocks = block_texts(src, 0);
        assert_eq!(blocks.len(), 10);
        assert!(blocks[0].starts_with("{\n    if"));
        assert_eq!(
            &blocks[1..],
            [
                "{ a(); }",
                "{ b(); }",
                "{ while (n) { c(); } }",
                "{ c(); }",
                "{ case 1: { d(); } }",
                "{ d(); }",
                "{ e(); }",
                "{ g(); }",
                "{ h(); }",
            ]
        );
    }

    #[test]
    fn test_lambda_blocks_yielded_once() {
        let src = r#"
void f() {
    auto g = [](int x) { if (x) { return; } };
    auto h = [&]() { auto k = []() { }; };
}
"#;
        let blocks = block_texts(src, 0);
        assert_eq!(blocks.len(), 5);
        let mut unique = blocks.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), blocks.len());
    }

    #[test]
    fn test_local_class_method_not_entered() {
        let src = "void outer() { struct L { void m() { { } } }; { } }";
        assert_eq!(block_texts(src, 0), ["{ struct L { void m() { { } } }; { } }", "{ }"]);
        assert_eq!(block_texts(src, 1), ["{ { } }", "{ }"]);
    }

    #[test]
    fn test_visited_set_tracks_yielded_blocks() {
        let source = "void f() { { } }";
        let tu = TranslationUnit::parse(Path::new("t.cpp"), source.to_string(), Language::Cpp)
            .unwrap();
        let units = tu.function_units();
        let mut blocks = enumerate(&units[0]);
        assert!(blocks.visited().is_empty());
        let first = blocks.next().unwrap();
        assert!(blocks.visited().contains(&first));
        assert!(blocks.next().is_some());
        assert!(blocks.next().is_none());
        assert_eq!(blocks.visited().len(), 2);
    }

    #[test]
    fn test_function_try_block() {
        let src = "void f() try { a(); } catch (...) { b(); }";
        assert_eq!(block_texts(src, 0), ["{ a(); }", "{ b(); }"]);
    }
}

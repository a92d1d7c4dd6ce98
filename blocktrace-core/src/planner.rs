//! Marker construction and insertion planning
//!
//! A block is planned at most once per run, and a block that already holds
//! the exact marker text is left alone. Running the pass twice therefore
//! produces no new insertions the second time.

use crate::identifier::Identifier;
use crate::model::{Block, TranslationUnit};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// How the marker call is embedded in the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    /// `/*trace_marker("id", ID);*/`, inert until a later step enables it
    #[default]
    Comment,
    /// `trace_marker("id", ID);`
    Statement,
}

impl MarkerStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerStyle::Comment => "comment",
            MarkerStyle::Statement => "statement",
        }
    }
}

impl std::str::FromStr for MarkerStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "comment" => Ok(MarkerStyle::Comment),
            "statement" => Ok(MarkerStyle::Statement),
            other => anyhow::bail!("unknown marker style: {} (expected comment or statement)", other),
        }
    }
}

pub const DEFAULT_MARKER_FUNCTION: &str = "trace_marker";
pub const DEFAULT_RUN_ID: &str = "ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFormat {
    /// Name of the trace function
    pub function: String,
    /// Token emitted verbatim as the second argument
    pub run_id: String,
    pub style: MarkerStyle,
}

impl Default for MarkerFormat {
    fn default() -> Self {
        MarkerFormat {
            function: DEFAULT_MARKER_FUNCTION.to_string(),
            run_id: DEFAULT_RUN_ID.to_string(),
            style: MarkerStyle::Comment,
        }
    }
}

impl MarkerFormat {
    /// The exact text inserted after a block's `{`
    pub fn render(&self, identifier: &Identifier) -> String {
        let call = format!(
            "{}(\"{}\", {});",
            self.function,
            escape_identifier(identifier.as_str()),
            self.run_id
        );
        match self.style {
            MarkerStyle::Comment => format!("/*{}*/", call),
            MarkerStyle::Statement => call,
        }
    }
}

/// Escape an identifier for a C string literal that may sit inside a
/// block comment.
pub fn escape_identifier(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    let mut chars = identifier.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            // `*/` would end the surrounding comment; `\057` is `/`
            '*' if chars.peek() == Some(&'/') => {
                chars.next();
                out.push_str("*\\057");
            }
            other => out.push(other),
        }
    }
    out
}

/// Text to insert at an original byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInsertion {
    pub offset: usize,
    pub text: String,
}

/// Plan the marker for one block.
///
/// Returns `Ok(None)` when the block already contains the marker. Failing to
/// recover the block's text is an error for the whole file.
pub fn plan(
    block: &Block<'_>,
    identifier: &Identifier,
    format: &MarkerFormat,
    tu: &TranslationUnit,
) -> Result<Option<PendingInsertion>> {
    let span = block.span();
    let text = tu
        .text(block.node)
        .filter(|text| text.starts_with('{'))
        .with_context(|| {
            format!(
                "{}:{}: cannot recover block text",
                tu.path().display(),
                span.start_line
            )
        })?;

    let marker = format.render(identifier);
    if text.contains(&marker) {
        debug!(
            "{}:{}: marker already present for {}",
            tu.path().display(),
            span.start_line,
            identifier
        );
        return Ok(None);
    }

    Ok(Some(PendingInsertion {
        offset: block.after_open_brace(),
        text: marker,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::enumerate;
    use crate::language::Language;
    use std::path::Path;

    fn parse(source: &str) -> TranslationUnit {
        TranslationUnit::parse(Path::new("p.cpp"), source.to_string(), Language::Cpp).unwrap()
    }

    #[test]
    fn test_render_comment_and_statement() {
        let id = Identifier::new("add(int, int)");
        let mut format = MarkerFormat::default();
        assert_eq!(
            format.render(&id),
            "/*trace_marker(\"add(int, int)\", ID);*/"
        );

        format.style = MarkerStyle::Statement;
        format.function = "__cov_hit".to_string();
        format.run_id = "42".to_string();
        assert_eq!(format.render(&id), "__cov_hit(\"add(int, int)\", 42);");
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("plain"), "plain");
        assert_eq!(escape_identifier(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_identifier("x*/y"), "x*\\057y");
        assert_eq!(escape_identifier("operator*(int *)"), "operator*(int *)");
    }

    #[test]
    fn test_plan_inserts_after_open_brace() {
        let source = "int add(int a, int b) { return a + b; }";
        let tu = parse(source);
        let units = tu.function_units();
        let block = enumerate(&units[0]).next().unwrap();
        let id = Identifier::new("add(int, int)");

        let insertion = plan(&block, &id, &MarkerFormat::default(), &tu)
            .unwrap()
            .unwrap();
        assert_eq!(&source[..insertion.offset], "int add(int a, int b) {");
        assert_eq!(insertion.text, "/*trace_marker(\"add(int, int)\", ID);*/");
    }

    #[test]
    fn test_plan_skips_block_with_marker() {
        let source = "int add(int a, int b) {/*trace_marker(\"add(int, int)\", ID);*/ return a + b; }";
        let tu = parse(source);
        let units = tu.function_units();
        let block = enumerate(&units[0]).next().unwrap();
        let id = Identifier::new("add(int, int)");

        assert_eq!(plan(&block, &id, &MarkerFormat::default(), &tu).unwrap(), None);

        // a different identifier is not the same marker
        let other = Identifier::new("sub(int, int)");
        assert!(plan(&block, &other, &MarkerFormat::default(), &tu)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_outer_block_sees_nested_marker() {
        let source = "void f() { if (x) {/*trace_marker(\"f()\", ID);*/ } }";
        let tu = parse(source);
        let units = tu.function_units();
        let id = Identifier::new("f()");
        let planned: Vec<Option<PendingInsertion>> = enumerate(&units[0])
            .map(|block| plan(&block, &id, &MarkerFormat::default(), &tu).unwrap())
            .collect();
        // the check is textual over the whole block, nested blocks included
        assert_eq!(planned, [None, None]);
    }
}

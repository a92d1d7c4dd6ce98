//! Function identifiers
//!
//! An identifier names the function a marker belongs to. C++ functions that
//! need linkage disambiguation get their Itanium symbol; everything else,
//! and anything the mangler cannot handle exactly, gets its qualified name
//! followed by the parameter type list.

use crate::language::cpp::mangle::mangle;
use crate::language::cpp::names::FunctionSignature;
use crate::language::tree_sitter_utils::{node_text, normalize_whitespace};
use crate::model::{FunctionUnit, TranslationUnit};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Identifier(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which identifier scheme to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// Mangle when the readable name could be ambiguous
    #[default]
    Auto,
    /// Always use the readable name
    Qualified,
}

impl std::str::FromStr for NamingScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "auto" => Ok(NamingScheme::Auto),
            "qualified" => Ok(NamingScheme::Qualified),
            other => anyhow::bail!("unknown naming scheme: {} (expected auto or qualified)", other),
        }
    }
}

pub struct IdentifierResolver<'t> {
    tu: &'t TranslationUnit,
    scheme: NamingScheme,
}

impl<'t> IdentifierResolver<'t> {
    pub fn new(tu: &'t TranslationUnit, scheme: NamingScheme) -> Self {
        IdentifierResolver { tu, scheme }
    }

    /// Identifier of one function. Never fails; computed fresh on every call.
    pub fn resolve(&self, unit: &FunctionUnit<'_>) -> Identifier {
        let Some(sig) = unit.signature(self.tu.source()) else {
            let text = unit
                .definition
                .child_by_field_name("declarator")
                .and_then(|d| node_text(d, self.tu.source()))
                .map(normalize_whitespace)
                .unwrap_or_else(|| "(unnamed function)".to_string());
            debug!(
                "{}:{}: no recognizable declarator, using {}",
                self.tu.path().display(),
                unit.line(),
                text
            );
            return Identifier(text);
        };

        let readable = sig.display();
        if self.scheme == NamingScheme::Qualified || !self.needs_mangling(&sig) {
            return Identifier(readable);
        }

        match mangle(&sig, self.tu.index()) {
            Some(symbol) => Identifier(symbol),
            None => {
                debug!(
                    "{}:{}: cannot mangle {}, using readable name",
                    self.tu.path().display(),
                    unit.line(),
                    readable
                );
                Identifier(readable)
            }
        }
    }

    fn needs_mangling(&self, sig: &FunctionSignature) -> bool {
        if !self.tu.language().has_overloading() || sig.extern_c || sig.is_main() {
            return false;
        }
        sig.is_constructor()
            || sig.is_destructor()
            || sig.is_operator()
            || sig.templated
            || self.tu.index().is_overloaded(&sig.qualified_name())
    }
}

/// Identifier of one function with the default naming scheme.
pub fn resolve(unit: &FunctionUnit<'_>, tu: &TranslationUnit) -> Identifier {
    IdentifierResolver::new(tu, NamingScheme::Auto).resolve(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use std::path::Path;

    fn identifiers(source: &str, language: Language, scheme: NamingScheme) -> Vec<String> {
        let tu = TranslationUnit::parse(Path::new("t.cpp"), source.to_string(), language)
            .expect("parse");
        let resolver = IdentifierResolver::new(&tu, scheme);
        tu.function_units()
            .iter()
            .map(|unit| resolver.resolve(unit).to_string())
            .collect()
    }

    fn auto(source: &str) -> Vec<String> {
        identifiers(source, Language::Cpp, NamingScheme::Auto)
    }

    #[test]
    fn test_plain_function_is_readable() {
        assert_eq!(auto("int add(int a, int b) { return a + b; }"), ["add(int, int)"]);
        assert_eq!(
            auto("namespace ns { void run(const char *name) {} }"),
            ["ns::run(const char *)"]
        );
    }

    #[test]
    fn test_constructors_are_distinct() {
        let src = r#"
class Widget {
public:
    Widget() {}
    Widget(int size) {}
};
"#;
        let ids = auto(src);
        assert_eq!(ids, ["_ZN6WidgetC1Ev", "_ZN6WidgetC1Ei"]);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_overloads_are_mangled() {
        let src = "void put(int v) {}\nvoid put(double v) {}\nvoid other(int v) {}";
        assert_eq!(auto(src), ["_Z3puti", "_Z3putd", "other(int)"]);
    }

    #[test]
    fn test_overload_with_unmangleable_type_falls_back() {
        let src = "typedef long Id;\nvoid find(Id id) {}\nvoid find(const char *name) {}";
        assert_eq!(auto(src), ["find(Id)", "_Z4findPKc"]);
    }

    #[test]
    fn test_redeclaration_with_const_parameter_is_not_overloaded() {
        let src = "int f(int x);\nint f(const int x) { return x; }";
        assert_eq!(auto(src), ["f(const int)"]);
    }

    #[test]
    fn test_out_of_line_methods_of_header_class() {
        let src = r#"
#include "counter.h"
int Counter::get() const { return 0; }
int Counter::get(int scale) const { return scale; }
Counter Counter::operator-(int n) { return *this; }
"#;
        assert_eq!(
            auto(src),
            [
                "_ZNK7Counter3getEv",
                "_ZNK7Counter3getEi",
                "Counter::operator-(int)"
            ]
        );
    }

    #[test]
    fn test_templates_fall_back_to_readable_name() {
        let src = "template <typename T> T twice(T v) { return v + v; }";
        assert_eq!(auto(src), ["twice(T)"]);
    }

    #[test]
    fn test_main_and_extern_c_are_never_mangled() {
        let src = "int main(int argc, char **argv) { return 0; }\nextern \"C\" void put(int v) {}\nvoid put(double v) {}";
        let ids = auto(src);
        assert_eq!(ids[0], "main(int, char **)");
        assert_eq!(ids[1], "put(int)");
    }

    #[test]
    fn test_c_language_never_mangles() {
        let src = "struct point { int x; };\nstatic int scale(struct point *p) { return p->x; }";
        let ids = identifiers(src, Language::C, NamingScheme::Auto);
        assert_eq!(ids, ["scale(struct point *)"]);
    }

    #[test]
    fn test_qualified_scheme() {
        let src = "struct S { S() {} ~S() {} };";
        let ids = identifiers(src, Language::Cpp, NamingScheme::Qualified);
        assert_eq!(ids, ["S::S()", "S::~S()"]);
    }

    #[test]
    fn test_identifier_is_stable() {
        let src = "struct S { bool operator<(const S &o) const { return false; } };";
        assert_eq!(auto(src), auto(src));
        assert_eq!(auto(src), ["_ZNK1SltERKS_"]);
    }

    #[test]
    fn test_naming_scheme_from_str() {
        assert_eq!("auto".parse::<NamingScheme>().unwrap(), NamingScheme::Auto);
        assert_eq!(
            "qualified".parse::<NamingScheme>().unwrap(),
            NamingScheme::Qualified
        );
        assert!("mangled".parse::<NamingScheme>().is_err());
    }
}

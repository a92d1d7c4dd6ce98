//! C++ naming: scopes, declarator names, parameter spellings and types
//!
//! Everything here is syntactic. Name lookup is limited to what the
//! translation unit itself declares (see [`DeclIndex`]); anything that would
//! need real semantic analysis is reported as unknown so callers can fall
//! back to a purely textual name.

use crate::language::tree_sitter_utils::{
    children, find_child_by_kind, find_descendant_by_kind, named_children, node_text_or_empty,
    normalize_whitespace,
};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tree_sitter::Node;

/// Display name of an unnamed namespace, as compilers print it
pub const ANONYMOUS_NAMESPACE: &str = "(anonymous namespace)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Namespace,
    AnonymousNamespace,
    Class,
    /// Written as a qualifier on a declarator (`Foo::bar`); namespace or class
    Qualifier,
    /// Enclosing function or lambda of a local class
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeSegment {
    pub kind: ScopeKind,
    pub name: String,
}

impl ScopeSegment {
    fn new(kind: ScopeKind, name: impl Into<String>) -> Self {
        ScopeSegment {
            kind,
            name: name.into(),
        }
    }
}

/// Enclosing scopes of a declaration, outermost first
#[derive(Debug, Clone, Default)]
pub struct ScopeChain {
    pub segments: Vec<ScopeSegment>,
    pub templated: bool,
    pub extern_c: bool,
    pub local: bool,
    pub unnamed: bool,
}

/// Walk the parents of `node` and collect its enclosing scopes.
///
/// A friend function defined inside a class belongs to the enclosing
/// namespace, so the first class above a `friend_declaration` is skipped.
pub fn enclosing_scopes(node: Node<'_>, source: &str) -> ScopeChain {
    let mut chain = ScopeChain::default();
    // collected innermost first, reversed at the end
    let mut reversed: Vec<ScopeSegment> = Vec::new();
    let mut skip_class = false;
    let mut current = node;

    while let Some(parent) = current.parent() {
        match parent.kind() {
            "namespace_definition" => match parent.child_by_field_name("name") {
                Some(name) if name.kind() == "nested_namespace_specifier" => {
                    let mut parts: Vec<ScopeSegment> = named_children(name)
                        .into_iter()
                        .map(|part| {
                            ScopeSegment::new(
                                ScopeKind::Namespace,
                                node_text_or_empty(part, source),
                            )
                        })
                        .collect();
                    parts.reverse();
                    reversed.extend(parts);
                }
                Some(name) => reversed.push(ScopeSegment::new(
                    ScopeKind::Namespace,
                    node_text_or_empty(name, source),
                )),
                None => reversed.push(ScopeSegment::new(
                    ScopeKind::AnonymousNamespace,
                    ANONYMOUS_NAMESPACE,
                )),
            },
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                if skip_class {
                    skip_class = false;
                } else {
                    push_class_scope(parent, source, &mut chain, &mut reversed);
                }
            }
            "friend_declaration" => skip_class = true,
            "template_declaration" => chain.templated = true,
            "linkage_specification" => {
                let value = parent
                    .child_by_field_name("value")
                    .map(|v| node_text_or_empty(v, source))
                    .unwrap_or("");
                if value == "\"C\"" {
                    chain.extern_c = true;
                }
            }
            "function_definition" => {
                chain.local = true;
                let name = parent
                    .child_by_field_name("declarator")
                    .and_then(function_declarator)
                    .and_then(|decl| declared_name(decl, source))
                    .map(|name| name.display())
                    .unwrap_or_else(|| "(function)".to_string());
                reversed.push(ScopeSegment::new(ScopeKind::Function, name));
            }
            "lambda_expression" => {
                chain.local = true;
                reversed.push(ScopeSegment::new(ScopeKind::Function, "(lambda)"));
            }
            _ => {}
        }
        current = parent;
    }

    reversed.reverse();
    chain.segments = reversed;
    chain
}

fn push_class_scope(
    class: Node<'_>,
    source: &str,
    chain: &mut ScopeChain,
    reversed: &mut Vec<ScopeSegment>,
) {
    let Some(name) = class.child_by_field_name("name") else {
        chain.unnamed = true;
        reversed.push(ScopeSegment::new(ScopeKind::Class, "(anonymous)"));
        return;
    };

    match name.kind() {
        "qualified_identifier" => {
            let qualified = split_qualified(name, source);
            chain.templated |= qualified.templated;
            let mut parts = qualified.path;
            let last = parts.pop().unwrap_or_default();
            reversed.push(ScopeSegment::new(ScopeKind::Class, last));
            for part in parts.into_iter().rev() {
                reversed.push(ScopeSegment::new(ScopeKind::Qualifier, part));
            }
        }
        "template_type" => {
            chain.templated = true;
            reversed.push(ScopeSegment::new(
                ScopeKind::Class,
                normalize_whitespace(node_text_or_empty(name, source)),
            ));
        }
        _ => reversed.push(ScopeSegment::new(
            ScopeKind::Class,
            node_text_or_empty(name, source),
        )),
    }
}

struct QualifiedPath {
    global: bool,
    path: Vec<String>,
    templated: bool,
}

/// Split `a::b::C` into its segments.
fn split_qualified(node: Node<'_>, source: &str) -> QualifiedPath {
    let mut result = QualifiedPath {
        global: false,
        path: Vec::new(),
        templated: false,
    };
    let mut current = node;
    let mut first = true;

    loop {
        if current.kind() != "qualified_identifier" {
            if current.kind() == "template_type" || current.kind() == "template_function" {
                result.templated = true;
            }
            result
                .path
                .push(normalize_whitespace(node_text_or_empty(current, source)));
            break;
        }

        match current.child_by_field_name("scope") {
            Some(scope) => {
                if scope.kind() == "template_type" {
                    result.templated = true;
                }
                result
                    .path
                    .push(normalize_whitespace(node_text_or_empty(scope, source)));
            }
            None if first => result.global = true,
            None => {}
        }
        first = false;

        match current.child_by_field_name("name") {
            Some(name) => current = name,
            None => break,
        }
    }

    result
}

/// The name a function declarator introduces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionName {
    Plain(String),
    Destructor(String),
    /// Operator symbol without the `operator` keyword, e.g. `+=` or `new[]`
    Operator(String),
    /// Full normalized text, e.g. `operator bool`
    Conversion(String),
}

impl FunctionName {
    pub fn display(&self) -> String {
        match self {
            FunctionName::Plain(name) => name.clone(),
            FunctionName::Destructor(name) => format!("~{}", name),
            FunctionName::Operator(op) => {
                if op.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    format!("operator {}", op)
                } else {
                    format!("operator{}", op)
                }
            }
            FunctionName::Conversion(text) => text.clone(),
        }
    }
}

/// A possibly qualified declarator name such as `ns::Foo::~Foo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaratorName {
    pub qualifiers: Vec<String>,
    pub name: FunctionName,
    pub templated: bool,
    pub global: bool,
}

impl DeclaratorName {
    pub fn display(&self) -> String {
        let mut parts = self.qualifiers.clone();
        parts.push(self.name.display());
        parts.join("::")
    }
}

fn is_name_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "field_identifier"
            | "qualified_identifier"
            | "destructor_name"
            | "operator_name"
            | "operator_cast"
            | "template_function"
            | "template_method"
    )
}

/// Parse the name node of a function declarator.
pub fn declarator_name(node: Node<'_>, source: &str) -> Option<DeclaratorName> {
    match node.kind() {
        "identifier" | "field_identifier" => Some(DeclaratorName {
            qualifiers: Vec::new(),
            name: FunctionName::Plain(node_text_or_empty(node, source).to_string()),
            templated: false,
            global: false,
        }),
        "destructor_name" => {
            let class = find_child_by_kind(node, "identifier")
                .map(|id| node_text_or_empty(id, source).to_string())
                .unwrap_or_else(|| {
                    node_text_or_empty(node, source)
                        .trim_start_matches('~')
                        .trim()
                        .to_string()
                });
            Some(DeclaratorName {
                qualifiers: Vec::new(),
                name: FunctionName::Destructor(class),
                templated: false,
                global: false,
            })
        }
        "operator_name" => {
            let text = node_text_or_empty(node, source);
            let op: String = text
                .trim_start_matches("operator")
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            Some(DeclaratorName {
                qualifiers: Vec::new(),
                name: FunctionName::Operator(op),
                templated: false,
                global: false,
            })
        }
        "operator_cast" => {
            // `operator bool() const` is spelled without its parameter list
            let end = find_descendant_by_kind(node, "parameter_list")
                .map(|params| params.start_byte())
                .unwrap_or_else(|| node.end_byte());
            let text = source.get(node.start_byte()..end).unwrap_or("");
            Some(DeclaratorName {
                qualifiers: Vec::new(),
                name: FunctionName::Conversion(normalize_whitespace(text)),
                templated: false,
                global: false,
            })
        }
        "template_function" | "template_method" => {
            let inner = node.child_by_field_name("name")?;
            let mut name = declarator_name(inner, source)?;
            name.templated = true;
            Some(name)
        }
        "qualified_identifier" => {
            let mut qualifiers = Vec::new();
            let mut templated = false;
            let global = node.child_by_field_name("scope").is_none();
            let mut current = node;
            while current.kind() == "qualified_identifier" {
                if let Some(scope) = current.child_by_field_name("scope") {
                    match scope.kind() {
                        "namespace_identifier" | "type_identifier" => {
                            qualifiers.push(node_text_or_empty(scope, source).to_string())
                        }
                        "template_type" => {
                            templated = true;
                            qualifiers.push(normalize_whitespace(node_text_or_empty(
                                scope, source,
                            )));
                        }
                        _ => return None,
                    }
                }
                current = current.child_by_field_name("name")?;
            }
            let mut name = declarator_name(current, source)?;
            qualifiers.extend(name.qualifiers);
            name.qualifiers = qualifiers;
            name.templated |= templated;
            name.global = global;
            Some(name)
        }
        _ => None,
    }
}

fn inner_declarator(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("declarator")
        .or_else(|| named_children(node).into_iter().last())
}

/// Find the function declarator that names the function itself.
///
/// Descends through pointer, reference and parenthesized declarators (a
/// function returning a pointer) and through function declarators whose
/// own declarator is not a name (a function returning a function pointer).
///
/// Conversion operators have no `function_declarator`; for them the
/// `operator_cast` node (or the qualified name ending in one) is returned.
pub fn function_declarator(declarator: Node<'_>) -> Option<Node<'_>> {
    let mut current = declarator;
    loop {
        match current.kind() {
            "function_declarator" => {
                let inner = current.child_by_field_name("declarator")?;
                if is_name_kind(inner.kind()) {
                    return Some(current);
                }
                current = inner;
            }
            "operator_cast" => return Some(current),
            "qualified_identifier" => {
                let mut name = current;
                while name.kind() == "qualified_identifier" {
                    name = name.child_by_field_name("name")?;
                }
                return (name.kind() == "operator_cast").then_some(current);
            }
            "pointer_declarator"
            | "reference_declarator"
            | "parenthesized_declarator"
            | "attributed_declarator" => current = inner_declarator(current)?,
            _ => return None,
        }
    }
}

/// Node carrying the parameter list and method qualifiers of a function
/// declarator returned by [`function_declarator`].
fn signature_node(function_declarator: Node<'_>) -> Option<Node<'_>> {
    if function_declarator.kind() == "function_declarator" {
        return Some(function_declarator);
    }
    find_descendant_by_kind(function_declarator, "abstract_function_declarator")
}

/// Name introduced by a function declarator returned by [`function_declarator`].
pub fn declared_name(function_declarator: Node<'_>, source: &str) -> Option<DeclaratorName> {
    if function_declarator.kind() == "function_declarator" {
        declarator_name(function_declarator.child_by_field_name("declarator")?, source)
    } else {
        declarator_name(function_declarator, source)
    }
}

/// C++ type model used for mangling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CxxType {
    /// Builtin type with its Itanium code
    Builtin(&'static str),
    /// Class or enum type as written
    Named { global: bool, path: Vec<String> },
    Pointer(Box<CxxType>),
    LValueRef(Box<CxxType>),
    RValueRef(Box<CxxType>),
    Qualified {
        is_const: bool,
        is_volatile: bool,
        inner: Box<CxxType>,
    },
}

impl CxxType {
    /// Parameter types ignore top-level cv-qualifiers.
    pub fn strip_top_level_cv(self) -> CxxType {
        match self {
            CxxType::Qualified { inner, .. } => inner.strip_top_level_cv(),
            other => other,
        }
    }

    fn qualified(self, is_const: bool, is_volatile: bool) -> CxxType {
        if !is_const && !is_volatile {
            return self;
        }
        match self {
            CxxType::Qualified {
                is_const: c,
                is_volatile: v,
                inner,
            } => CxxType::Qualified {
                is_const: c || is_const,
                is_volatile: v || is_volatile,
                inner,
            },
            other => CxxType::Qualified {
                is_const,
                is_volatile,
                inner: Box::new(other),
            },
        }
    }
}

fn builtin_code(name: &str) -> Option<&'static str> {
    let code = match name {
        "void" => "v",
        "bool" | "_Bool" => "b",
        "char" => "c",
        "wchar_t" => "w",
        "char8_t" => "Du",
        "char16_t" => "Ds",
        "char32_t" => "Di",
        "short" => "s",
        "int" => "i",
        "long" => "l",
        "float" => "f",
        "double" => "d",
        "__int128" => "n",
        // LP64 spellings of the standard typedefs
        "int8_t" => "a",
        "uint8_t" => "h",
        "int16_t" => "s",
        "uint16_t" => "t",
        "int32_t" => "i",
        "uint32_t" => "j",
        "int64_t" | "ssize_t" | "ptrdiff_t" | "intptr_t" => "l",
        "uint64_t" | "size_t" | "uintptr_t" => "m",
        _ => return None,
    };
    Some(code)
}

fn sized_builtin(node: Node<'_>, source: &str) -> Option<&'static str> {
    let mut unsigned = false;
    let mut signed = false;
    let mut short = false;
    let mut longs = 0usize;
    for child in children(node) {
        match child.kind() {
            "unsigned" => unsigned = true,
            "signed" => signed = true,
            "short" => short = true,
            "long" => longs += 1,
            _ => {}
        }
    }
    let base = node
        .child_by_field_name("type")
        .map(|t| node_text_or_empty(t, source));

    let code = match (base, short, longs) {
        (Some("char"), false, 0) if unsigned => "h",
        (Some("char"), false, 0) if signed => "a",
        (Some("char"), false, 0) => "c",
        (Some("double"), false, 1) => "e",
        (None | Some("int"), true, 0) if unsigned => "t",
        (None | Some("int"), true, 0) => "s",
        (None | Some("int"), false, 0) if unsigned => "j",
        (None | Some("int"), false, 0) => "i",
        (None | Some("int"), false, 1) if unsigned => "m",
        (None | Some("int"), false, 1) => "l",
        (None | Some("int"), false, 2) if unsigned => "y",
        (None | Some("int"), false, 2) => "x",
        _ => return None,
    };
    Some(code)
}

fn named_type(node: Node<'_>, source: &str) -> Option<CxxType> {
    match node.kind() {
        "type_identifier" => Some(CxxType::Named {
            global: false,
            path: vec![node_text_or_empty(node, source).to_string()],
        }),
        "qualified_identifier" => {
            let qualified = split_qualified(node, source);
            if qualified.templated {
                return None;
            }
            Some(CxxType::Named {
                global: qualified.global,
                path: qualified.path,
            })
        }
        _ => None,
    }
}

fn base_type(node: Node<'_>, source: &str) -> Option<CxxType> {
    match node.kind() {
        "primitive_type" => builtin_code(node_text_or_empty(node, source)).map(CxxType::Builtin),
        "sized_type_specifier" => sized_builtin(node, source).map(CxxType::Builtin),
        "type_identifier" | "qualified_identifier" => named_type(node, source),
        "struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier" => {
            // elaborated type specifier; a definition in parameter position is not mangleable
            if node.child_by_field_name("body").is_some() {
                return None;
            }
            named_type(node.child_by_field_name("name")?, source)
        }
        _ => None,
    }
}

/// cv-qualifiers written directly on a declaration (before or after the type)
fn declaration_cv(node: Node<'_>, source: &str) -> (bool, bool) {
    let mut is_const = false;
    let mut is_volatile = false;
    for child in children(node) {
        if child.kind() == "type_qualifier" {
            match node_text_or_empty(child, source) {
                "const" => is_const = true,
                "volatile" => is_volatile = true,
                _ => {}
            }
        }
    }
    (is_const, is_volatile)
}

/// Type of a parameter declaration, or `None` if it cannot be modelled.
pub fn param_type(param: Node<'_>, source: &str) -> Option<CxxType> {
    let (is_const, is_volatile) = declaration_cv(param, source);
    let mut ty = base_type(param.child_by_field_name("type")?, source)?
        .qualified(is_const, is_volatile);

    let mut declarator = param.child_by_field_name("declarator");
    while let Some(node) = declarator {
        match node.kind() {
            "identifier" => break,
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let (c, v) = declaration_cv(node, source);
                ty = CxxType::Pointer(Box::new(ty)).qualified(c, v);
                declarator = node.child_by_field_name("declarator");
            }
            "reference_declarator" | "abstract_reference_declarator" => {
                let rvalue = children(node).iter().any(|c| c.kind() == "&&");
                ty = if rvalue {
                    CxxType::RValueRef(Box::new(ty))
                } else {
                    CxxType::LValueRef(Box::new(ty))
                };
                declarator = named_children(node).into_iter().last();
            }
            "array_declarator" | "abstract_array_declarator" => {
                // only the outermost array of a parameter decays to a pointer
                let inner = node.child_by_field_name("declarator");
                if inner.is_some_and(|n| n.kind() != "identifier") {
                    return None;
                }
                ty = CxxType::Pointer(Box::new(ty));
                declarator = None;
            }
            _ => return None,
        }
    }

    Some(ty)
}

fn is_placeholder(param: Node<'_>) -> bool {
    param
        .child_by_field_name("type")
        .is_some_and(|t| t.kind() == "placeholder_type_specifier" || t.kind() == "auto")
}

/// Clang-style spelling of a parameter's type: name and default removed.
pub fn param_spelling(param: Node<'_>, source: &str) -> String {
    let Some(type_node) = param.child_by_field_name("type") else {
        return fallback_spelling(param, source);
    };

    let mut base = String::new();
    let (is_const, is_volatile) = declaration_cv(param, source);
    if is_const {
        base.push_str("const ");
    }
    if is_volatile {
        base.push_str("volatile ");
    }
    base.push_str(&normalize_whitespace(node_text_or_empty(type_node, source)));

    match declarator_suffix(param.child_by_field_name("declarator"), source) {
        Some(suffix) if suffix.is_empty() => base,
        Some(suffix) => format!("{} {}", base, suffix),
        None => fallback_spelling(param, source),
    }
}

fn declarator_suffix(declarator: Option<Node<'_>>, source: &str) -> Option<String> {
    let mut pieces: Vec<String> = Vec::new();
    let mut current = declarator;

    while let Some(node) = current {
        match node.kind() {
            "identifier" => break,
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let mut piece = String::from("*");
                for child in children(node) {
                    if child.kind() == "type_qualifier" {
                        piece.push_str(node_text_or_empty(child, source));
                    }
                }
                pieces.push(piece);
                current = node.child_by_field_name("declarator");
            }
            "reference_declarator" | "abstract_reference_declarator" => {
                let rvalue = children(node).iter().any(|c| c.kind() == "&&");
                pieces.push(if rvalue { "&&" } else { "&" }.to_string());
                current = named_children(node).into_iter().last();
            }
            "array_declarator" | "abstract_array_declarator" => {
                let inner = node.child_by_field_name("declarator");
                if inner.is_some_and(|n| n.kind() != "identifier") {
                    return None;
                }
                pieces.push("*".to_string());
                current = None;
            }
            _ => return None,
        }
    }

    let mut suffix = String::new();
    for piece in pieces {
        if suffix.ends_with(|c: char| c.is_ascii_alphabetic()) {
            suffix.push(' ');
        }
        suffix.push_str(&piece);
    }
    Some(suffix)
}

/// Declarator name of a parameter, if it has one.
fn param_name(param: Node<'_>) -> Option<Node<'_>> {
    let mut current = param.child_by_field_name("declarator")?;
    loop {
        match current.kind() {
            "identifier" => return Some(current),
            "function_declarator"
            | "pointer_declarator"
            | "reference_declarator"
            | "parenthesized_declarator"
            | "array_declarator"
            | "attributed_declarator" => current = inner_declarator_for_name(current)?,
            _ => return None,
        }
    }
}

fn inner_declarator_for_name(node: Node<'_>) -> Option<Node<'_>> {
    if let Some(inner) = node.child_by_field_name("declarator") {
        return Some(inner);
    }
    named_children(node)
        .into_iter()
        .find(|child| child.kind() != "type_qualifier" && child.kind() != "parameter_list")
}

/// Spelling for declarators the structured path does not model
/// (function pointers, arrays of pointers to arrays, ...).
fn fallback_spelling(param: Node<'_>, source: &str) -> String {
    static OPEN_RE: OnceLock<Regex> = OnceLock::new();
    static CLOSE_RE: OnceLock<Regex> = OnceLock::new();
    let open_re = OPEN_RE.get_or_init(|| Regex::new(r"([(\[])\s+").unwrap());
    let close_re = CLOSE_RE.get_or_init(|| Regex::new(r"\s+([)\]])").unwrap());

    let start = param.start_byte();
    let end = param
        .child_by_field_name("default_value")
        .and_then(|_| find_child_by_kind(param, "="))
        .map(|eq| eq.start_byte())
        .unwrap_or_else(|| param.end_byte());

    let mut text = String::new();
    match param_name(param) {
        Some(name) if name.start_byte() >= start && name.end_byte() <= end => {
            text.push_str(source.get(start..name.start_byte()).unwrap_or(""));
            text.push(' ');
            text.push_str(source.get(name.end_byte()..end).unwrap_or(""));
        }
        _ => text.push_str(source.get(start..end).unwrap_or("")),
    }

    let text = normalize_whitespace(&text);
    let text = open_re.replace_all(&text, "$1");
    close_re.replace_all(&text, "$1").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub spelling: String,
    /// `None` when the type cannot be modelled for mangling
    pub ty: Option<CxxType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    pub params: Vec<Param>,
    /// C-style `...`
    pub variadic: bool,
    /// Template parameter pack or abbreviated template (`auto` parameter)
    pub generic: bool,
}

impl ParamList {
    /// `(int, const char *)`, with a trailing `...` for variadic functions
    pub fn spelling(&self) -> String {
        let mut parts: Vec<&str> = self.params.iter().map(|p| p.spelling.as_str()).collect();
        if self.variadic {
            parts.push("...");
        }
        format!("({})", parts.join(", "))
    }
}

/// Parameters of a function declarator.
pub fn parameters(function_declarator: Node<'_>, source: &str) -> ParamList {
    let mut list = ParamList::default();
    let Some(parameter_list) = function_declarator.child_by_field_name("parameters") else {
        return list;
    };

    for child in children(parameter_list) {
        match child.kind() {
            "parameter_declaration" | "optional_parameter_declaration" => {
                if is_placeholder(child) {
                    list.generic = true;
                }
                list.params.push(Param {
                    spelling: param_spelling(child, source),
                    ty: param_type(child, source),
                });
            }
            "variadic_parameter_declaration" => {
                list.generic = true;
                list.params.push(Param {
                    spelling: fallback_spelling(child, source),
                    ty: None,
                });
            }
            "variadic_parameter" | "..." => list.variadic = true,
            _ => {}
        }
    }

    // `f(void)` declares no parameters
    if list.params.len() == 1
        && list.params[0].spelling == "void"
        && list.params[0].ty == Some(CxxType::Builtin("v"))
    {
        list.params.clear();
    }

    list
}

/// cv- and ref-qualifiers of a member function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodQualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub ref_qualifier: Option<RefQualifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefQualifier {
    LValue,
    RValue,
}

fn method_qualifiers(function_declarator: Node<'_>, source: &str) -> MethodQualifiers {
    let mut quals = MethodQualifiers::default();
    for child in children(function_declarator) {
        match child.kind() {
            "type_qualifier" => match node_text_or_empty(child, source) {
                "const" => quals.is_const = true,
                "volatile" => quals.is_volatile = true,
                _ => {}
            },
            "ref_qualifier" => {
                quals.ref_qualifier = Some(if node_text_or_empty(child, source) == "&&" {
                    RefQualifier::RValue
                } else {
                    RefQualifier::LValue
                });
            }
            _ => {}
        }
    }
    quals
}

fn has_storage_class(declaration: Node<'_>, source: &str, class: &str) -> bool {
    children(declaration).iter().any(|child| {
        child.kind() == "storage_class_specifier" && node_text_or_empty(*child, source) == class
    })
}

/// Syntactic signature of a function declaration or definition
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// Enclosing scopes followed by the qualifiers written on the declarator
    pub scopes: Vec<ScopeSegment>,
    pub name: FunctionName,
    pub params: ParamList,
    pub method: MethodQualifiers,
    pub templated: bool,
    pub extern_c: bool,
    pub local: bool,
    pub unnamed_scope: bool,
    /// `static` on the declaration
    pub is_static: bool,
    /// Declared without a return type (constructors, destructors, conversions)
    pub has_return_type: bool,
}

impl FunctionSignature {
    /// Build the signature of `declaration` (a `function_definition`,
    /// `declaration` or `field_declaration`) whose function declarator is
    /// `function_declarator`.
    pub fn new(
        declaration: Node<'_>,
        function_declarator: Node<'_>,
        source: &str,
    ) -> Option<Self> {
        let name = declared_name(function_declarator, source)?;
        let signature = signature_node(function_declarator);
        let chain = enclosing_scopes(declaration, source);

        let mut scopes = if name.global {
            Vec::new()
        } else {
            chain.segments
        };
        scopes.extend(
            name.qualifiers
                .iter()
                .map(|q| ScopeSegment::new(ScopeKind::Qualifier, q.clone())),
        );

        let params = signature
            .map(|node| parameters(node, source))
            .unwrap_or_default();
        let templated = chain.templated || name.templated || params.generic;

        Some(FunctionSignature {
            scopes,
            name: name.name,
            params,
            method: signature
                .map(|node| method_qualifiers(node, source))
                .unwrap_or_default(),
            templated,
            extern_c: chain.extern_c,
            local: chain.local,
            unnamed_scope: chain.unnamed,
            is_static: has_storage_class(declaration, source, "static"),
            has_return_type: declaration.child_by_field_name("type").is_some(),
        })
    }

    /// Signature of a `function_definition` node.
    pub fn of_definition(definition: Node<'_>, source: &str) -> Option<Self> {
        let declarator = function_declarator(definition.child_by_field_name("declarator")?)?;
        Self::new(definition, declarator, source)
    }

    /// Scope names used for lookups and mangling
    pub fn scope_names(&self) -> Vec<String> {
        self.scopes.iter().map(|s| s.name.clone()).collect()
    }

    /// `ns::Class::method`
    pub fn qualified_name(&self) -> String {
        let mut parts = self.scope_names();
        parts.push(self.name.display());
        parts.join("::")
    }

    /// Distinguishes overloads: parameter types with top-level cv removed
    /// where they can be modelled, plus the method qualifiers.
    pub fn overload_key(&self) -> String {
        let types: Option<Vec<CxxType>> = self
            .params
            .params
            .iter()
            .map(|p| p.ty.clone().map(CxxType::strip_top_level_cv))
            .collect();
        let params = match types {
            Some(types) => format!("{:?}{}", types, if self.params.variadic { "..." } else { "" }),
            None => self.params.spelling(),
        };
        format!("{} {:?}", params, self.method)
    }

    /// `ns::Class::method(int, const char *)`
    pub fn display(&self) -> String {
        format!("{}{}", self.qualified_name(), self.params.spelling())
    }

    pub fn is_constructor(&self) -> bool {
        match (&self.name, self.scopes.last()) {
            (FunctionName::Plain(name), Some(scope)) => {
                !self.has_return_type
                    && matches!(scope.kind, ScopeKind::Class | ScopeKind::Qualifier)
                    && scope.name == *name
            }
            _ => false,
        }
    }

    pub fn is_destructor(&self) -> bool {
        matches!(self.name, FunctionName::Destructor(_))
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self.name,
            FunctionName::Operator(_) | FunctionName::Conversion(_)
        )
    }

    pub fn is_main(&self) -> bool {
        self.scopes.is_empty() && self.name == FunctionName::Plain("main".to_string())
    }
}

/// What a type name declared in the translation unit refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeEntry {
    Class,
    Enum,
    Alias,
    Template,
    Local,
}

/// Declarations of one translation unit, used for overload detection and
/// for resolving type names while mangling.
#[derive(Debug, Default)]
pub struct DeclIndex {
    types: HashMap<Vec<String>, TypeEntry>,
    namespaces: HashSet<Vec<String>>,
    /// Qualified name to the distinct signature keys declared under it
    functions: HashMap<String, HashSet<String>>,
}

impl DeclIndex {
    pub fn build(root: Node<'_>, source: &str) -> Self {
        let mut index = DeclIndex::default();
        index.visit(root, source);
        index
    }

    fn visit(&mut self, node: Node<'_>, source: &str) {
        match node.kind() {
            "namespace_definition" => self.record_namespace(node, source),
            "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier" => {
                self.record_type_specifier(node, source);
            }
            "type_definition" => {
                for declarator in children_by_field(node, "declarator") {
                    if let Some(name) = innermost_type_name(declarator) {
                        self.record_alias(node, node_text_or_empty(name, source), source);
                    }
                }
            }
            "alias_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.record_alias(node, node_text_or_empty(name, source), source);
                }
            }
            "function_definition" | "declaration" | "field_declaration" => {
                for declarator in children_by_field(node, "declarator") {
                    if let Some(function) = function_declarator(declarator) {
                        if let Some(sig) = FunctionSignature::new(node, function, source) {
                            if !sig.local {
                                self.functions
                                    .entry(sig.qualified_name())
                                    .or_default()
                                    .insert(sig.overload_key());
                            }
                        }
                    }
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, source);
        }
    }

    fn record_type_specifier(&mut self, node: Node<'_>, source: &str) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        if node.child_by_field_name("body").is_none() {
            // elaborated use in a parameter says nothing about where the type lives
            let in_parameter = node.parent().is_some_and(|p| {
                p.kind() == "parameter_declaration" || p.kind() == "optional_parameter_declaration"
            });
            if in_parameter {
                return;
            }
        }

        let chain = enclosing_scopes(node, source);
        let (mut path, templated) = match name.kind() {
            "type_identifier" => (
                chain.segments.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
                false,
            ),
            "qualified_identifier" => {
                let qualified = split_qualified(name, source);
                let mut path: Vec<String> = if qualified.global {
                    Vec::new()
                } else {
                    chain.segments.iter().map(|s| s.name.clone()).collect()
                };
                path.extend(qualified.path);
                self.insert_type(path, qualified_entry(&chain, node, qualified.templated));
                return;
            }
            _ => return,
        };
        path.push(node_text_or_empty(name, source).to_string());
        self.insert_type(path, qualified_entry(&chain, node, templated));
    }

    fn record_namespace(&mut self, node: Node<'_>, source: &str) {
        let mut path: Vec<String> = enclosing_scopes(node, source)
            .segments
            .into_iter()
            .map(|s| s.name)
            .collect();
        match node.child_by_field_name("name") {
            Some(name) if name.kind() == "nested_namespace_specifier" => {
                for part in named_children(name) {
                    path.push(node_text_or_empty(part, source).to_string());
                    self.namespaces.insert(path.clone());
                }
            }
            Some(name) => {
                path.push(node_text_or_empty(name, source).to_string());
                self.namespaces.insert(path);
            }
            None => {
                path.push(ANONYMOUS_NAMESPACE.to_string());
                self.namespaces.insert(path);
            }
        }
    }

    fn record_alias(&mut self, node: Node<'_>, name: &str, source: &str) {
        let chain = enclosing_scopes(node, source);
        let mut path: Vec<String> = chain.segments.iter().map(|s| s.name.clone()).collect();
        path.push(name.to_string());
        let entry = if chain.local {
            TypeEntry::Local
        } else {
            TypeEntry::Alias
        };
        self.insert_type(path, entry);
    }

    fn insert_type(&mut self, path: Vec<String>, entry: TypeEntry) {
        self.types.entry(path).or_insert(entry);
    }

    /// More than one distinct parameter list is declared under this name.
    pub fn is_overloaded(&self, qualified_name: &str) -> bool {
        self.functions
            .get(qualified_name)
            .is_some_and(|signatures| signatures.len() > 1)
    }

    /// Whether `path` names a class declared in this translation unit.
    pub fn is_class(&self, path: &[String]) -> bool {
        matches!(self.types.get(path), Some(TypeEntry::Class))
    }

    /// Whether `path` names a namespace opened in this translation unit.
    pub fn is_namespace(&self, path: &[String]) -> bool {
        self.namespaces.contains(path)
    }

    /// Resolve a type name as written inside `scopes`, innermost scope first.
    pub fn lookup_type(
        &self,
        scopes: &[String],
        global: bool,
        path: &[String],
    ) -> Option<(Vec<String>, TypeEntry)> {
        let depths: Vec<usize> = if global {
            vec![0]
        } else {
            (0..=scopes.len()).rev().collect()
        };
        for depth in depths {
            let mut candidate = scopes[..depth].to_vec();
            candidate.extend(path.iter().cloned());
            if let Some(entry) = self.types.get(&candidate) {
                return Some((candidate, *entry));
            }
        }
        None
    }
}

fn qualified_entry(chain: &ScopeChain, node: Node<'_>, templated: bool) -> TypeEntry {
    if chain.local {
        TypeEntry::Local
    } else if chain.templated || templated {
        TypeEntry::Template
    } else if node.kind() == "enum_specifier" {
        TypeEntry::Enum
    } else {
        TypeEntry::Class
    }
}

fn children_by_field<'a>(node: Node<'a>, field: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    let result = node.children_by_field_name(field, &mut cursor).collect();
    result
}

fn innermost_type_name(declarator: Node<'_>) -> Option<Node<'_>> {
    let mut current = declarator;
    loop {
        match current.kind() {
            "type_identifier" | "primitive_type" => return Some(current),
            _ => current = inner_declarator(current)?,
        }
    }
}

//! Itanium C++ ABI linkage names for the non-template subset
//!
//! Covers free functions, member functions, constructors (C1), destructors
//! (D1) and operators whose parameter types are builtins, classes or enums
//! declared in the same translation unit, and pointers, references and
//! cv-qualified versions of those. Anything outside that subset makes
//! [`mangle`] return `None`; callers then use the readable name instead.

use super::names::{
    CxxType, DeclIndex, FunctionName, FunctionSignature, MethodQualifiers, RefQualifier,
    ScopeKind, TypeEntry, ANONYMOUS_NAMESPACE,
};

/// Types after name lookup
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolved {
    Builtin(&'static str),
    Class(Vec<String>),
    Pointer(Box<Resolved>),
    LValueRef(Box<Resolved>),
    RValueRef(Box<Resolved>),
    Qualified {
        is_const: bool,
        is_volatile: bool,
        inner: Box<Resolved>,
    },
}

/// Mangle a function signature, or `None` if it is outside the supported subset.
pub fn mangle(sig: &FunctionSignature, index: &DeclIndex) -> Option<String> {
    if sig.templated || sig.local || sig.extern_c || sig.unnamed_scope {
        return None;
    }
    if sig
        .scopes
        .iter()
        .any(|s| s.kind == ScopeKind::Function || s.name.contains('<'))
    {
        return None;
    }
    if sig.scopes.first().is_some_and(|s| s.name == "std") {
        return None;
    }

    let mut mangler = Mangler {
        out: String::from("_Z"),
        substitutions: Vec::new(),
        index,
        scope: sig.scope_names(),
    };
    mangler.function_name(sig)?;
    mangler.bare_function_type(sig)?;
    Some(mangler.out)
}

struct Mangler<'a> {
    out: String,
    /// Canonical (uncompressed) manglings in substitution order
    substitutions: Vec<String>,
    index: &'a DeclIndex,
    scope: Vec<String>,
}

impl Mangler<'_> {
    /// `None` when the innermost scope is a qualifier naming something this
    /// translation unit does not declare and the signature alone cannot tell
    /// a class from a namespace.
    fn is_member(&self, sig: &FunctionSignature) -> Option<bool> {
        match sig.scopes.last() {
            Some(last) if last.kind == ScopeKind::Class => Some(true),
            Some(last) if last.kind == ScopeKind::Qualifier => {
                if self.index.is_class(&self.scope) {
                    Some(true)
                } else if self.index.is_namespace(&self.scope) {
                    Some(false)
                } else if sig.is_constructor()
                    || sig.is_destructor()
                    || sig.method != MethodQualifiers::default()
                {
                    // only members are named after their scope or carry cv/ref qualifiers
                    Some(true)
                } else {
                    None
                }
            }
            _ => Some(false),
        }
    }

    fn function_name(&mut self, sig: &FunctionSignature) -> Option<()> {
        let is_member = self.is_member(sig)?;
        let arity = sig.params.params.len() + usize::from(is_member && !sig.is_static);
        let unqualified = match &sig.name {
            FunctionName::Plain(_) if sig.is_constructor() => "C1".to_string(),
            FunctionName::Plain(name) => source_name(name),
            FunctionName::Destructor(_) => "D1".to_string(),
            FunctionName::Operator(op) => operator_code(op, arity)?.to_string(),
            FunctionName::Conversion(_) => return None,
        };
        let internal = if sig.is_static && !is_member { "L" } else { "" };

        if self.scope.is_empty() {
            self.out.push_str(internal);
            self.out.push_str(&unqualified);
            return Some(());
        }

        self.out.push('N');
        if is_member {
            if sig.method.is_volatile {
                self.out.push('V');
            }
            if sig.method.is_const {
                self.out.push('K');
            }
            match sig.method.ref_qualifier {
                Some(RefQualifier::LValue) => self.out.push('R'),
                Some(RefQualifier::RValue) => self.out.push('O'),
                None => {}
            }
        }
        let scope = self.scope.clone();
        for (depth, name) in scope.iter().enumerate() {
            self.out.push_str(&source_name(name));
            self.substitutions.push(class_canonical(&scope[..=depth]));
        }
        self.out.push_str(internal);
        self.out.push_str(&unqualified);
        self.out.push('E');
        Some(())
    }

    fn bare_function_type(&mut self, sig: &FunctionSignature) -> Option<()> {
        if sig.params.params.is_empty() && !sig.params.variadic {
            self.out.push('v');
            return Some(());
        }
        for param in &sig.params.params {
            let ty = param.ty.clone()?.strip_top_level_cv();
            let resolved = self.resolve(&ty)?;
            let (compressed, _) = self.mangle_type(&resolved);
            self.out.push_str(&compressed);
        }
        if sig.params.variadic {
            self.out.push('z');
        }
        Some(())
    }

    fn resolve(&self, ty: &CxxType) -> Option<Resolved> {
        let resolved = match ty {
            CxxType::Builtin(code) => Resolved::Builtin(*code),
            CxxType::Named { global, path } => {
                let (full, entry) = self.index.lookup_type(&self.scope, *global, path)?;
                if full.first().is_some_and(|s| s == "std") {
                    return None;
                }
                match entry {
                    TypeEntry::Class | TypeEntry::Enum => Resolved::Class(full),
                    TypeEntry::Alias | TypeEntry::Template | TypeEntry::Local => return None,
                }
            }
            CxxType::Pointer(inner) => Resolved::Pointer(Box::new(self.resolve(inner)?)),
            CxxType::LValueRef(inner) => Resolved::LValueRef(Box::new(self.resolve(inner)?)),
            CxxType::RValueRef(inner) => Resolved::RValueRef(Box::new(self.resolve(inner)?)),
            CxxType::Qualified {
                is_const,
                is_volatile,
                inner,
            } => Resolved::Qualified {
                is_const: *is_const,
                is_volatile: *is_volatile,
                inner: Box::new(self.resolve(inner)?),
            },
        };
        Some(resolved)
    }

    fn substitution(&self, canonical: &str) -> Option<String> {
        self.substitutions
            .iter()
            .position(|s| s == canonical)
            .map(seq_id)
    }

    /// Returns (compressed, canonical) and records new substitution candidates.
    fn mangle_type(&mut self, ty: &Resolved) -> (String, String) {
        match ty {
            Resolved::Builtin(code) => (code.to_string(), code.to_string()),
            Resolved::Class(path) => {
                let canonical = class_canonical(path);
                if let Some(sub) = self.substitution(&canonical) {
                    return (sub, canonical);
                }
                (self.class_name(path), canonical)
            }
            Resolved::Pointer(inner) => self.wrapped("P", inner),
            Resolved::LValueRef(inner) => self.wrapped("R", inner),
            Resolved::RValueRef(inner) => self.wrapped("O", inner),
            Resolved::Qualified {
                is_const,
                is_volatile,
                inner,
            } => {
                let mut cv = String::new();
                if *is_volatile {
                    cv.push('V');
                }
                if *is_const {
                    cv.push('K');
                }
                self.wrapped(&cv, inner)
            }
        }
    }

    fn wrapped(&mut self, prefix: &str, inner: &Resolved) -> (String, String) {
        let inner_canonical = canonical(inner);
        let canonical = format!("{}{}", prefix, inner_canonical);
        if let Some(sub) = self.substitution(&canonical) {
            return (sub, canonical);
        }
        let (inner_compressed, _) = self.mangle_type(inner);
        self.substitutions.push(canonical.clone());
        (format!("{}{}", prefix, inner_compressed), canonical)
    }

    /// Class name not yet substituted as a whole; reuses the longest known prefix.
    fn class_name(&mut self, path: &[String]) -> String {
        if path.len() == 1 {
            self.substitutions.push(class_canonical(path));
            return source_name(&path[0]);
        }

        let known = (1..path.len())
            .rev()
            .find(|len| self.substitution(&class_canonical(&path[..*len])).is_some())
            .unwrap_or(0);

        let mut out = String::from("N");
        if known > 0 {
            if let Some(sub) = self.substitution(&class_canonical(&path[..known])) {
                out.push_str(&sub);
            }
        }
        for depth in known..path.len() {
            out.push_str(&source_name(&path[depth]));
            self.substitutions.push(class_canonical(&path[..=depth]));
        }
        out.push('E');
        out
    }
}

fn canonical(ty: &Resolved) -> String {
    match ty {
        Resolved::Builtin(code) => code.to_string(),
        Resolved::Class(path) => class_canonical(path),
        Resolved::Pointer(inner) => format!("P{}", canonical(inner)),
        Resolved::LValueRef(inner) => format!("R{}", canonical(inner)),
        Resolved::RValueRef(inner) => format!("O{}", canonical(inner)),
        Resolved::Qualified {
            is_const,
            is_volatile,
            inner,
        } => format!(
            "{}{}{}",
            if *is_volatile { "V" } else { "" },
            if *is_const { "K" } else { "" },
            canonical(inner)
        ),
    }
}

fn class_canonical(path: &[String]) -> String {
    if path.len() == 1 {
        return source_name(&path[0]);
    }
    let mut out = String::from("N");
    for name in path {
        out.push_str(&source_name(name));
    }
    out.push('E');
    out
}

fn source_name(name: &str) -> String {
    if name == ANONYMOUS_NAMESPACE {
        return "12_GLOBAL__N_1".to_string();
    }
    format!("{}{}", name.len(), name)
}

/// `S_`, `S0_`, ..., `S9_`, `SA_`, ..., `SZ_`, `S10_`, ...
fn seq_id(index: usize) -> String {
    if index == 0 {
        return "S_".to_string();
    }
    let mut n = index - 1;
    let mut digits = Vec::new();
    loop {
        let digit = (n % 36) as u32;
        digits.push(std::char::from_digit(digit, 36).unwrap_or('0').to_ascii_uppercase());
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    format!("S{}_", digits.into_iter().collect::<String>())
}

/// Operator encoding; `arity` counts the implicit object parameter.
fn operator_code(op: &str, arity: usize) -> Option<&'static str> {
    let code = match (op, arity) {
        ("+", 1) => "ps",
        ("+", _) => "pl",
        ("-", 1) => "ng",
        ("-", _) => "mi",
        ("*", 1) => "de",
        ("*", _) => "ml",
        ("&", 1) => "ad",
        ("&", _) => "an",
        ("new", _) => "nw",
        ("new[]", _) => "na",
        ("delete", _) => "dl",
        ("delete[]", _) => "da",
        ("~", _) => "co",
        ("/", _) => "dv",
        ("%", _) => "rm",
        ("|", _) => "or",
        ("^", _) => "eo",
        ("=", _) => "aS",
        ("+=", _) => "pL",
        ("-=", _) => "mI",
        ("*=", _) => "mL",
        ("/=", _) => "dV",
        ("%=", _) => "rM",
        ("&=", _) => "aN",
        ("|=", _) => "oR",
        ("^=", _) => "eO",
        ("<<", _) => "ls",
        (">>", _) => "rs",
        ("<<=", _) => "lS",
        (">>=", _) => "rS",
        ("==", _) => "eq",
        ("!=", _) => "ne",
        ("<", _) => "lt",
        (">", _) => "gt",
        ("<=", _) => "le",
        (">=", _) => "ge",
        ("<=>", _) => "ss",
        ("!", _) => "nt",
        ("&&", _) => "aa",
        ("||", _) => "oo",
        ("++", _) => "pp",
        ("--", _) => "mm",
        (",", _) => "cm",
        ("->*", _) => "pm",
        ("->", _) => "pt",
        ("()", _) => "cl",
        ("[]", _) => "ix",
        _ => return None,
    };
    Some(code)
}

//! Language detection and the C/C++ program model
//!
//! Each language is parsed with its own tree-sitter grammar, and both
//! produce the same node kinds for everything the instrumenter reads. C has
//! no overloading, so C functions are never mangled.

pub mod c;
pub mod cpp;
pub mod span;
pub mod tree_sitter_utils;

use std::path::Path;

pub use c::CParser;
pub use cpp::CppParser;
pub use span::SourceSpan;

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// C (.c)
    C,
    /// C++ (.cc, .cpp, .cxx, .c++, .C and headers)
    Cpp,
}

impl Language {
    /// Detect language from file extension
    ///
    /// Returns `None` if the extension is not recognized. Headers are treated
    /// as C++ since a `.h` file is just as often compiled as either.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "c" => Some(Language::C),
            "cc" | "cpp" | "cxx" | "c++" | "C" | "cp" | "CPP" | "ino" => Some(Language::Cpp),
            "h" | "hh" | "hpp" | "hxx" | "h++" | "H" | "inl" | "ipp" | "tpp" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Detect language from a `-x <lang>` compiler flag value
    pub fn from_compiler_flag(value: &str) -> Option<Self> {
        match value {
            "c" | "c-header" | "cpp-output" => Some(Language::C),
            "c++" | "c++-header" | "c++-cpp-output" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// Get the canonical name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cpp => "C++",
        }
    }

    /// Whether functions in this language may need linkage mangling
    pub fn has_overloading(&self) -> bool {
        matches!(self, Language::Cpp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("c"), Some(Language::C));
        assert_eq!(Language::from_extension("cpp"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("cc"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("C"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("hpp"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("h"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("rs"), None);
        assert_eq!(Language::from_extension(""), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Language::from_path(Path::new("src/main.c")),
            Some(Language::C)
        );
        assert_eq!(
            Language::from_path(Path::new("lib/widget.cxx")),
            Some(Language::Cpp)
        );
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_from_compiler_flag() {
        assert_eq!(Language::from_compiler_flag("c"), Some(Language::C));
        assert_eq!(Language::from_compiler_flag("c++"), Some(Language::Cpp));
        assert_eq!(Language::from_compiler_flag("objective-c"), None);
    }

    #[test]
    fn test_name_and_overloading() {
        assert_eq!(Language::C.name(), "C");
        assert_eq!(Language::Cpp.name(), "C++");
        assert!(Language::Cpp.has_overloading());
        assert!(!Language::C.has_overloading());
    }
}

//! C/C++ parsing, naming and linkage mangling

pub mod mangle;
pub mod names;
pub mod parser;

pub use parser::CppParser;

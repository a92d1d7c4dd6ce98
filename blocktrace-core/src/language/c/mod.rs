//! C language support

pub mod parser;

pub use parser::CParser;

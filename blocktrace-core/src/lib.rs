//! blocktrace core library - block-entry trace markers for C and C++ sources

// Global invariants enforced in this crate:
// - Every block of every function definition gets at most one marker per run
// - Insertions are planned in original coordinates and never shift each other
// - A file is either fully rewritten or left untouched
// - Running the pass on its own output inserts nothing
// - Identical input yields byte-for-byte identical output

pub mod blocks;
pub mod compdb;
pub mod config;
pub mod identifier;
pub mod instrument;
pub mod language;
pub mod model;
pub mod planner;
pub mod report;
pub mod rewrite;

pub use compdb::{CompilationDatabase, CompileCommand};
pub use config::ResolvedConfig;
pub use identifier::{Identifier, IdentifierResolver, NamingScheme};
pub use instrument::{
    instrument_file, plan_source, run, FileOutcome, FileStatus, FileTask, InstrumentOptions,
};
pub use language::Language;
pub use model::{Block, FunctionUnit, TranslationUnit};
pub use planner::{MarkerFormat, MarkerStyle, PendingInsertion};
pub use report::{render_json, render_text, RunReport};
pub use rewrite::SourceBuffer;

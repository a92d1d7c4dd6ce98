//! Compilation databases
//!
//! Sources are only instrumented when the build knows how to compile them.
//! Commands come either from a `compile_commands.json` file or from a fixed
//! argument list given on the command line after `--`.

use crate::language::Language;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

pub const DATABASE_FILE_NAME: &str = "compile_commands.json";

#[derive(Debug, Deserialize)]
struct RawEntry {
    directory: PathBuf,
    file: PathBuf,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    arguments: Option<Vec<String>>,
    #[serde(default)]
    output: Option<PathBuf>,
}

/// How one source file is compiled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileCommand {
    pub directory: PathBuf,
    /// Absolute, lexically normalized path of the source
    pub file: PathBuf,
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    pub fn language(&self) -> Language {
        detect_language(&self.arguments, &self.file)
    }
}

#[derive(Debug, Clone)]
pub enum CompilationDatabase {
    /// Loaded from a `compile_commands.json`
    Json {
        path: PathBuf,
        commands: Vec<CompileCommand>,
    },
    /// Every source compiles with the same arguments
    Fixed {
        directory: PathBuf,
        arguments: Vec<String>,
    },
}

impl CompilationDatabase {
    /// Load `compile_commands.json` from a file path or a build directory.
    pub fn load(path: &Path) -> Result<Self> {
        let path = if path.is_dir() {
            path.join(DATABASE_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("failed to read compilation database: {}", path.display())
        })?;
        let raw: Vec<RawEntry> = serde_json::from_str(&content).with_context(|| {
            format!("failed to parse compilation database: {}", path.display())
        })?;

        let mut commands = Vec::with_capacity(raw.len());
        for (i, entry) in raw.into_iter().enumerate() {
            let arguments = match (entry.arguments, entry.command) {
                (Some(arguments), _) => arguments,
                (None, Some(command)) => split_command(&command).with_context(|| {
                    format!("entry {} in {}: bad command string", i, path.display())
                })?,
                (None, None) => anyhow::bail!(
                    "entry {} in {}: neither \"arguments\" nor \"command\" given",
                    i,
                    path.display()
                ),
            };
            let directory = normalize_path(&absolute(&entry.directory));
            let file = normalize_path(&directory.join(&entry.file));
            commands.push(CompileCommand {
                directory,
                file,
                arguments,
                output: entry.output,
            });
        }

        log::info!(
            "loaded {} compile commands from {}",
            commands.len(),
            path.display()
        );
        Ok(CompilationDatabase::Json { path, commands })
    }

    /// Search `start` and its parents for `compile_commands.json`.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = absolute(start);
        let first = if start.is_file() {
            start.parent().map(Path::to_path_buf).unwrap_or(start.clone())
        } else {
            start.clone()
        };

        for dir in first.ancestors() {
            let candidate = dir.join(DATABASE_FILE_NAME);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }

        anyhow::bail!(
            "could not find {} in {} or any parent directory (use -p or pass compiler arguments after --)",
            DATABASE_FILE_NAME,
            first.display()
        )
    }

    /// Database where every source compiles with `arguments`
    pub fn fixed(arguments: Vec<String>, directory: &Path) -> Self {
        CompilationDatabase::Fixed {
            directory: absolute(directory),
            arguments,
        }
    }

    /// Compile command for `source`, if the database has one.
    pub fn command_for(&self, source: &Path) -> Option<CompileCommand> {
        match self {
            CompilationDatabase::Json { commands, .. } => {
                let wanted = normalize_path(&absolute(source));
                commands.iter().find(|c| c.file == wanted).cloned()
            }
            CompilationDatabase::Fixed {
                directory,
                arguments,
            } => {
                let file = normalize_path(&directory.join(source));
                let mut args = arguments.clone();
                args.push(file.display().to_string());
                Some(CompileCommand {
                    directory: directory.clone(),
                    file,
                    arguments: args,
                    output: None,
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CompilationDatabase::Json { commands, .. } => commands.len(),
            CompilationDatabase::Fixed { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Language a command compiles `file` as: an explicit `-x` wins, then the
/// file extension. Unknown extensions are treated as C++.
pub fn detect_language(arguments: &[String], file: &Path) -> Language {
    let mut explicit = None;
    let mut args = arguments.iter();
    while let Some(arg) = args.next() {
        if arg == "-x" {
            if let Some(value) = args.next() {
                explicit = Language::from_compiler_flag(value).or(explicit);
            }
        } else if let Some(value) = arg.strip_prefix("-x") {
            explicit = Language::from_compiler_flag(value).or(explicit);
        }
    }

    explicit
        .or_else(|| Language::from_path(file))
        .unwrap_or(Language::Cpp)
}

/// Split a command line the way a POSIX shell would, without expansions.
pub fn split_command(command: &str) -> Result<Vec<String>> {
    shlex::split(command).ok_or_else(|| anyhow::anyhow!("unbalanced quotes in: {}", command))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Resolve `.` and `..` without touching the file system.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

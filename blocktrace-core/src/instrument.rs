//! Per-file instrumentation pipeline
//!
//! For each function definition in a file: resolve its identifier, enumerate
//! its blocks, plan a marker for each block. All planned insertions of a file
//! are committed together at the end. Files are independent and run in
//! parallel; results are returned sorted by path.

use crate::blocks;
use crate::compdb::CompileCommand;
use crate::identifier::{Identifier, IdentifierResolver, NamingScheme};
use crate::language::Language;
use crate::model::TranslationUnit;
use crate::planner::{self, MarkerFormat};
use crate::rewrite::SourceBuffer;
use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct InstrumentOptions {
    pub marker: MarkerFormat,
    pub naming: NamingScheme,
    /// Plan and report without writing files
    pub dry_run: bool,
    /// Worker threads (None: one per core)
    pub jobs: Option<usize>,
}

/// One source to process, with the command that compiles it if known
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
    pub command: Option<CompileCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Instrumented,
    Unchanged,
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Instrumented => "instrumented",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Failed => "failed",
        }
    }
}

/// What happened to one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub identifier: Identifier,
    pub line: u32,
    pub blocks: usize,
    pub insertions: usize,
}

/// What happened to one file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub status: FileStatus,
    pub functions: Vec<FunctionRecord>,
    pub blocks: usize,
    pub insertions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn failed(file: &Path, error: String) -> Self {
        FileOutcome {
            file: file.to_path_buf(),
            language: None,
            status: FileStatus::Failed,
            functions: Vec::new(),
            blocks: 0,
            insertions: 0,
            error: Some(error),
        }
    }
}

/// Plan every marker for `source` without touching the file system.
pub fn plan_source(
    path: &Path,
    source: String,
    language: Language,
    options: &InstrumentOptions,
) -> Result<(SourceBuffer, Vec<FunctionRecord>)> {
    let tu = TranslationUnit::parse(path, source, language)?;
    let resolver = IdentifierResolver::new(&tu, options.naming);
    let mut buffer = SourceBuffer::new(path, tu.source().to_string());
    let mut records = Vec::new();

    for unit in tu.function_units() {
        let identifier = resolver.resolve(&unit);
        let mut record = FunctionRecord {
            identifier,
            line: unit.line(),
            blocks: 0,
            insertions: 0,
        };

        for block in blocks::enumerate(&unit) {
            record.blocks += 1;
            if let Some(insertion) = planner::plan(&block, &record.identifier, &options.marker, &tu)?
            {
                buffer.insert(insertion)?;
                record.insertions += 1;
            }
        }

        records.push(record);
    }

    Ok((buffer, records))
}

/// Instrument one file in place (or only plan it on a dry run).
pub fn instrument_file(
    path: &Path,
    language: Language,
    options: &InstrumentOptions,
) -> Result<FileOutcome> {
    info!("instrumenting {} as {}", path.display(), language.name());

    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let source = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;

    let (mut buffer, functions) = plan_source(path, source, language, options)?;
    let insertions = buffer.insertions().len();
    let modified = if options.dry_run {
        buffer.is_modified()
    } else {
        buffer.commit()?
    };

    info!(
        "{}: {} functions, {} insertions",
        path.display(),
        functions.len(),
        insertions
    );

    Ok(FileOutcome {
        file: path.to_path_buf(),
        language: Some(language.name().to_string()),
        status: if modified {
            FileStatus::Instrumented
        } else {
            FileStatus::Unchanged
        },
        blocks: functions.iter().map(|f| f.blocks).sum(),
        insertions,
        functions,
        error: None,
    })
}

fn run_task(task: &FileTask, options: &InstrumentOptions) -> FileOutcome {
    let Some(command) = &task.command else {
        warn!("{}: compile command not found", task.path.display());
        return FileOutcome::failed(&task.path, "compile command not found".to_string());
    };

    match instrument_file(&task.path, command.language(), options) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("{}: {:#}", task.path.display(), err);
            let mut outcome = FileOutcome::failed(&task.path, format!("{:#}", err));
            outcome.language = Some(command.language().name().to_string());
            outcome
        }
    }
}

/// Process every task. A failing file never stops the others.
pub fn run(tasks: &[FileTask], options: &InstrumentOptions) -> Result<Vec<FileOutcome>> {
    let mut outcomes: Vec<FileOutcome> = match options.jobs {
        Some(1) => tasks.iter().map(|task| run_task(task, options)).collect(),
        jobs => {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(n) = jobs {
                builder = builder.num_threads(n);
            }
            let pool = builder
                .build()
                .context("failed to start worker threads")?;
            pool.install(|| {
                tasks
                    .par_iter()
                    .map(|task| run_task(task, options))
                    .collect()
            })
        }
    };

    outcomes.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(outcomes)
}

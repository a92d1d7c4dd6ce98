//! Source rewriting
//!
//! Insertions are addressed in coordinates of the original text, so planning
//! one insertion never shifts the offsets of another. The file on disk is
//! replaced in one step, and only when there is something to insert.

use crate::planner::PendingInsertion;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Original text of one file plus the insertions planned for it
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    path: PathBuf,
    original: String,
    insertions: Vec<PendingInsertion>,
}

impl SourceBuffer {
    pub fn new(path: &Path, original: String) -> Self {
        SourceBuffer {
            path: path.to_path_buf(),
            original,
            insertions: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn insertions(&self) -> &[PendingInsertion] {
        &self.insertions
    }

    /// Queue an insertion at an original byte offset.
    pub fn insert(&mut self, insertion: PendingInsertion) -> Result<()> {
        if !self.original.is_char_boundary(insertion.offset) {
            anyhow::bail!(
                "{}: insertion offset {} is outside the source text",
                self.path.display(),
                insertion.offset
            );
        }
        self.insertions.push(insertion);
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        !self.insertions.is_empty()
    }

    /// The rewritten text. Insertions at the same offset keep the order in
    /// which they were queued.
    pub fn render(&self) -> String {
        let mut ordered: Vec<&PendingInsertion> = self.insertions.iter().collect();
        ordered.sort_by_key(|insertion| insertion.offset);

        let extra: usize = ordered.iter().map(|i| i.text.len()).sum();
        let mut out = String::with_capacity(self.original.len() + extra);
        let mut cursor = 0;
        for insertion in ordered {
            out.push_str(&self.original[cursor..insertion.offset]);
            out.push_str(&insertion.text);
            cursor = insertion.offset;
        }
        out.push_str(&self.original[cursor..]);
        out
    }

    /// Write the rewritten text back to the file.
    ///
    /// Returns `false` without touching the file when nothing was queued.
    pub fn commit(&mut self) -> Result<bool> {
        if !self.is_modified() {
            return Ok(false);
        }

        let rendered = self.render();
        atomic_write(&self.path, &rendered)?;
        self.original = rendered;
        self.insertions.clear();
        Ok(true)
    }
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
///
/// The temp file is removed if any step fails, so the original file is
/// either fully replaced or untouched.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let temp_path = path.with_file_name(format!(
        ".{}.blocktrace.tmp",
        file_name.to_string_lossy()
    ));

    let result = write_and_rename(path, &temp_path, contents);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_and_rename(path: &Path, temp_path: &Path, contents: &str) -> Result<()> {
    let mut file = fs::File::create(temp_path)
        .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write to temp file: {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file: {}", temp_path.display()))?;
    drop(file);

    // keep the mode of the file being replaced
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp_path, metadata.permissions()).with_context(|| {
            format!("failed to set permissions on: {}", temp_path.display())
        })?;
    }

    fs::rename(temp_path, path)
        .with_context(|| format!("failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

//! Combine collector CSVs into one deduplicated master file.

use crate::csv_io::{read_headers, read_rows, write_rows};
use crate::schema::{QuestionRow, RawQuestion, SchemaError};
use ahash::AHashSet;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Required raw columns and the alternative names other exports use for them.
const RAW_REQUIRED: &[(&str, &[&str])] = &[("question_title", &["title"]), ("question_text", &["text"])];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub files: usize,
    pub rows: usize,
    pub duplicates: usize,
}

/// `*.csv` files directly under `dir`, sorted by path. Hidden files and
/// `exclude` (usually the merge output itself) are skipped.
pub fn discover_raw_files(dir: &Path, exclude: Option<&Path>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|x| x.eq_ignore_ascii_case("csv")))
        .filter(|p| !p.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('.')))
        .filter(|p| exclude.map_or(true, |x| p.file_name() != x.file_name() || p.parent() != x.parent()))
        .collect();
    files.sort();
    files
}

fn check_raw_columns(path: &Path) -> Result<()> {
    let headers = read_headers(path)?;
    for (col, aliases) in RAW_REQUIRED {
        let found = headers.iter().any(|h| {
            let h = h.trim();
            h == *col || aliases.contains(&h)
        });
        if !found {
            return Err(SchemaError::MissingColumn { column: (*col).to_string(), path: path.display().to_string() }.into());
        }
    }
    Ok(())
}

/// Normalize raw rows into master rows, dropping repeated question text
/// (first occurrence wins).
pub fn merge_rows(raw: impl IntoIterator<Item = RawQuestion>) -> (Vec<QuestionRow>, usize) {
    let mut seen: AHashSet<String> = AHashSet::new();
    let mut dupes = 0;
    let mut out = Vec::new();
    for r in raw {
        let q = QuestionRow::from(r);
        if seen.insert(q.question.clone()) {
            out.push(q);
        } else {
            dupes += 1;
        }
    }
    (out, dupes)
}

/// Merge every collector CSV of `input_dir` into `output`.
pub fn merge_dir(input_dir: &Path, output: &Path) -> Result<MergeStats> {
    let files = discover_raw_files(input_dir, Some(output));
    if files.is_empty() {
        warn!("no collector CSV files under {}", input_dir.display());
    }
    let mut raw: Vec<RawQuestion> = Vec::new();
    for f in &files {
        check_raw_columns(f)?;
        let mut rows: Vec<RawQuestion> = read_rows(f, &[])?;
        let stem = f.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        for r in rows.iter_mut().filter(|r| r.source.is_empty()) {
            r.source = stem.to_string();
        }
        info!(rows = rows.len(), "read {}", f.display());
        raw.extend(rows);
    }
    let total = raw.len();
    let (rows, duplicates) = merge_rows(raw);
    write_rows(output, &rows)?;
    info!(files = files.len(), rows = rows.len(), duplicates, "master file written to {}", output.display());
    Ok(MergeStats { files: files.len(), rows: total, duplicates })
}

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::Chunk;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

/// Discovers `*.pdf` files directly under `directory`, optionally filtered by
/// a filename regex, sorted by path for stable processing order.
pub fn find_pdf_files(directory: &Path, filter: Option<&Regex>) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("failed to read {}", directory.display()))?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", directory.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        if filter.map(|regex| regex.is_match(filename)).unwrap_or(true) {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    Ok(pdfs)
}

pub fn compile_filename_filter(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|pattern| {
            Regex::new(pattern)
                .with_context(|| format!("invalid filename filter pattern: {pattern}"))
        })
        .transpose()
}

#[derive(Deserialize)]
struct ChunkRecord {
    metadata: ChunkRecordMetadata,
}

#[derive(Deserialize)]
struct ChunkRecordMetadata {
    filename: String,
}

/// Filenames already represented in an existing output file. Best-effort: an
/// unreadable or malformed output degrades to the empty set, and a resumed
/// run reprocesses everything.
pub fn processed_filenames(output_path: &Path) -> HashSet<String> {
    if !output_path.exists() {
        return HashSet::new();
    }

    match scan_processed_filenames(output_path) {
        Ok(filenames) => filenames,
        Err(err) => {
            warn!(
                path = %output_path.display(),
                error = %err,
                "failed to scan existing output; reprocessing all files"
            );
            HashSet::new()
        }
    }
}

fn scan_processed_filenames(output_path: &Path) -> Result<HashSet<String>> {
    let file = File::open(output_path)
        .with_context(|| format!("failed to open {}", output_path.display()))?;
    let reader = BufReader::new(file);

    let mut filenames = HashSet::new();
    for line in reader.lines() {
        let line =
            line.with_context(|| format!("failed to read line in {}", output_path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: ChunkRecord = serde_json::from_str(&line)
            .with_context(|| format!("malformed chunk record in {}", output_path.display()))?;
        filenames.insert(record.metadata.filename);
    }

    Ok(filenames)
}

pub fn write_chunks_jsonl(path: &Path, chunks: &[Chunk], append: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(append)
        .write(true)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("failed to open output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for chunk in chunks {
        let line = serde_json::to_string(chunk)
            .with_context(|| format!("failed to serialize chunk for {}", path.display()))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .with_context(|| format!("failed to write chunk record: {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush output file: {}", path.display()))
}

/// At least one cased character and none of them lowercase. Used for heading
/// detection and name validation.
pub fn is_all_uppercase(text: &str) -> bool {
    let mut has_cased = false;
    for character in text.chars() {
        if character.is_lowercase() {
            return false;
        }
        if character.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

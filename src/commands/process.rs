use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, error, info};

use crate::chunk::chunks_with_metadata;
use crate::cli::ProcessArgs;
use crate::extract::{extract_pages, pdftotext_version};
use crate::metadata::extract_enhanced_case_info;
use crate::model::{CaseMetadata, Chunk, DocumentOutcome, RunSummary, ToolVersions};
use crate::patterns::CasePatterns;
use crate::sections::{clean_section_text, identify_sections};
use crate::util::{
    compile_filename_filter, ensure_directory, find_pdf_files, now_utc_string,
    processed_filenames, utc_compact_string, write_chunks_jsonl, write_json_pretty,
};

pub fn run(args: ProcessArgs) -> Result<()> {
    let patterns = CasePatterns::new()?;
    let pdftotext = pdftotext_version()
        .context("pdftotext is required to extract page text but was not found")?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    if let Some(file) = args.file.clone() {
        return process_single_file(&args, &file, &patterns);
    }

    process_directory(&args, &patterns, &pdftotext)
}

fn process_directory(args: &ProcessArgs, patterns: &CasePatterns, pdftotext: &str) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));
    let clock = Instant::now();

    let filename_filter = compile_filename_filter(args.pattern.as_deref())?;

    let already_processed = if args.resume {
        let processed = processed_filenames(&args.output);
        info!(
            count = processed.len(),
            "resuming; files already present in output will be skipped"
        );
        processed
    } else {
        HashSet::new()
    };

    let pdf_files = select_files(&args.directory, filename_filter.as_ref(), &already_processed)?;

    if pdf_files.is_empty() {
        info!("no new files to process");
        return Ok(());
    }

    info!(
        files = pdf_files.len(),
        workers = args.workers,
        run_id = %run_id,
        "processing PDF files"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers)
        .build()
        .context("failed to build worker pool")?;

    let outcomes: Vec<DocumentOutcome> = pool.install(|| {
        pdf_files
            .par_iter()
            .map(|path| process_document(path, patterns, args.max_chunk_size))
            .collect()
    });

    let mut error_log = ErrorLog::new(&args.output);
    let mut all_chunks = Vec::<Chunk>::new();
    let mut files_succeeded = 0usize;
    let mut files_failed = 0usize;

    for outcome in outcomes {
        match outcome {
            DocumentOutcome::Success {
                filename,
                chunks,
                metadata,
            } => {
                files_succeeded += 1;
                debug!(
                    filename = %filename,
                    claimant = %metadata.claimant_name,
                    docket = %metadata.docket_number,
                    chunks = chunks.len(),
                    "processed document"
                );
                all_chunks.extend(chunks);
            }
            DocumentOutcome::Failure {
                filename,
                error: message,
                details,
            } => {
                files_failed += 1;
                error!(filename = %filename, error = %message, "failed to process document");
                error_log.record(&filename, &details)?;
            }
        }
    }

    write_chunks_jsonl(&args.output, &all_chunks, args.resume)?;

    let duration_seconds = clock.elapsed().as_secs_f64();
    let summary = RunSummary {
        manifest_version: 1,
        run_id,
        started_at,
        finished_at: now_utc_string(),
        tool_versions: ToolVersions {
            pdftotext: pdftotext.to_string(),
        },
        source_directory: args.directory.display().to_string(),
        output_path: args.output.display().to_string(),
        workers: args.workers,
        resumed: args.resume,
        files_attempted: pdf_files.len(),
        files_succeeded,
        files_failed,
        chunks_written: all_chunks.len(),
        duration_seconds,
    };
    write_json_pretty(&summary_path_for(&args.output), &summary)?;

    info!(path = %args.output.display(), chunks = all_chunks.len(), "wrote chunk records");
    info!(
        attempted = pdf_files.len(),
        succeeded = files_succeeded,
        failed = files_failed,
        duration_seconds = duration_seconds,
        "processing complete"
    );

    Ok(())
}

fn process_single_file(args: &ProcessArgs, file: &Path, patterns: &CasePatterns) -> Result<()> {
    let pdf_path = if file.exists() {
        file.to_path_buf()
    } else {
        args.directory.join(file)
    };

    if !pdf_path.exists() {
        bail!("file does not exist: {}", pdf_path.display());
    }

    info!(path = %pdf_path.display(), "processing single file");

    match process_document(&pdf_path, patterns, args.max_chunk_size) {
        DocumentOutcome::Success {
            filename,
            chunks,
            metadata,
        } => {
            write_chunks_jsonl(&args.output, &chunks, false)?;
            info!(
                filename = %filename,
                claimant = %metadata.claimant_name,
                docket = %metadata.docket_number,
                chunks = chunks.len(),
                "wrote chunk records"
            );
        }
        DocumentOutcome::Failure {
            filename,
            error: message,
            details,
        } => {
            error!(filename = %filename, error = %message, "failed to process document");
            ErrorLog::new(&args.output).record(&filename, &details)?;
        }
    }

    Ok(())
}

/// Candidate documents for a batch: every matching PDF in the directory that
/// is not already represented in the output being resumed.
fn select_files(
    directory: &Path,
    filter: Option<&Regex>,
    already_processed: &HashSet<String>,
) -> Result<Vec<PathBuf>> {
    let mut pdf_files = find_pdf_files(directory, filter)?;
    pdf_files.retain(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|filename| !already_processed.contains(filename))
            .unwrap_or(false)
    });

    Ok(pdf_files)
}

/// Runs the full per-document pipeline, downgrading any error to a Failure
/// outcome so one bad file never aborts the batch.
fn process_document(
    pdf_path: &Path,
    patterns: &CasePatterns,
    max_chunk_size: usize,
) -> DocumentOutcome {
    let filename = pdf_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf_path.display().to_string());

    match extract_pages(pdf_path) {
        Ok(pages) => {
            debug!(filename = %filename, pages = pages.len(), "extracted page text");
            let (chunks, metadata) = chunk_document(&filename, &pages, patterns, max_chunk_size);
            DocumentOutcome::Success {
                filename,
                chunks,
                metadata,
            }
        }
        Err(err) => DocumentOutcome::Failure {
            filename,
            error: err.to_string(),
            details: format!("{err:?}"),
        },
    }
}

/// Pure pipeline core over already-extracted pages: metadata, sections,
/// degenerate-section filtering, cleaning, chunking.
fn chunk_document(
    filename: &str,
    pages: &[String],
    patterns: &CasePatterns,
    max_chunk_size: usize,
) -> (Vec<Chunk>, CaseMetadata) {
    let mut metadata = extract_enhanced_case_info(pages, patterns);
    metadata.filename = filename.to_string();

    let mut chunks = Vec::new();
    for section in identify_sections(pages, patterns) {
        // A span barely longer than its own heading has no body worth keeping.
        if section.text.trim().len() <= section.name.len() + 5 {
            continue;
        }

        let cleaned = clean_section_text(&section.text, patterns);
        chunks.extend(chunks_with_metadata(
            &section.name,
            &cleaned,
            &metadata,
            max_chunk_size,
            patterns,
        ));
    }

    (chunks, metadata)
}

/// Free-text side log for failed documents, opened lazily so a clean run
/// leaves no log file behind.
struct ErrorLog {
    path: PathBuf,
    file: Option<File>,
}

impl ErrorLog {
    fn new(output_path: &Path) -> Self {
        let mut path = output_path.as_os_str().to_owned();
        path.push(".log");
        Self {
            path: PathBuf::from(path),
            file: None,
        }
    }

    fn record(&mut self, filename: &str, details: &str) -> Result<()> {
        let file = match &mut self.file {
            Some(file) => file,
            None => {
                let opened = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .with_context(|| {
                        format!("failed to open error log: {}", self.path.display())
                    })?;
                self.file.insert(opened)
            }
        };

        writeln!(file, "\n--- Error processing {filename} ---")
            .and_then(|_| writeln!(file, "{details}"))
            .and_then(|_| writeln!(file, "-----------------------"))
            .with_context(|| format!("failed to write error log: {}", self.path.display()))
    }
}

fn summary_path_for(output_path: &Path) -> PathBuf {
    let mut path = output_path.as_os_str().to_owned();
    path.push(".summary.json");
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    use crate::model::UNKNOWN;

    fn patterns() -> CasePatterns {
        CasePatterns::new().expect("pattern tables compile")
    }

    #[test]
    fn two_section_document_produces_labeled_chunks() {
        let pages = vec![
            "DOCKET NO. 123,456\nJOHN DOE VS. ACME CORP\nappeal from the administrative law judge"
                .to_string(),
            "FINDINGS OF FACT\nThe claimant was injured while unloading freight.\nAWARD\nBenefits are granted as set out above."
                .to_string(),
        ];

        let (chunks, metadata) = chunk_document("case001.pdf", &pages, &patterns(), 800);

        assert_eq!(metadata.docket_number, "123,456");
        assert_eq!(metadata.claimant_name, "JOHN DOE");
        assert_eq!(metadata.filename, "case001.pdf");

        let sections: Vec<&str> = chunks
            .iter()
            .map(|chunk| chunk.metadata.section.as_str())
            .collect();
        assert!(sections.contains(&"FINDINGS OF FACT"));
        assert!(sections.contains(&"AWARD"));

        for chunk in &chunks {
            assert_eq!(chunk.metadata.filename, "case001.pdf");
            assert_eq!(chunk.metadata.docket_number, "123,456");
            assert!(chunk.text.contains("Claimant: JOHN DOE"));
        }
    }

    #[test]
    fn degenerate_section_is_skipped() {
        // ISSUES is immediately followed by the next heading, so its span is
        // just the heading itself.
        let pages = vec![
            "ISSUES\nAWARD\nBenefits are granted to the claimant for the injuries sustained."
                .to_string(),
        ];

        let (chunks, _) = chunk_document("case002.pdf", &pages, &patterns(), 800);

        assert!(!chunks.is_empty());
        assert!(
            chunks
                .iter()
                .all(|chunk| chunk.metadata.section != "ISSUES")
        );
        assert!(chunks.iter().any(|chunk| chunk.metadata.section == "AWARD"));
    }

    #[test]
    fn unresolved_metadata_falls_back_to_unknown() {
        let pages =
            vec!["ORDER\nThe award of the administrative law judge is affirmed.".to_string()];

        let (chunks, metadata) = chunk_document("case003.pdf", &pages, &patterns(), 800);

        assert_eq!(metadata.claimant_name, UNKNOWN);
        assert_eq!(metadata.docket_number, UNKNOWN);
        assert!(!chunks.is_empty());
        assert!(
            chunks
                .iter()
                .all(|chunk| chunk.metadata.respondent_name.is_none())
        );
    }

    #[test]
    fn resume_excludes_files_already_in_output() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = dir.path().join("pdfs");
        fs::create_dir(&source).expect("create source dir");
        fs::write(source.join("case001.pdf"), b"").expect("seed pdf");
        fs::write(source.join("case002.pdf"), b"").expect("seed pdf");

        let output = dir.path().join("chunks.jsonl");
        let metadata = CaseMetadata {
            claimant_name: "JOHN DOE".to_string(),
            docket_number: "123,456".to_string(),
            respondent_name: UNKNOWN.to_string(),
            filename: "case001.pdf".to_string(),
        };
        let previous = chunks_with_metadata(
            "AWARD",
            "Benefits are granted.",
            &metadata,
            800,
            &patterns(),
        );
        write_chunks_jsonl(&output, &previous, false).expect("write previous output");

        let already_processed = processed_filenames(&output);
        let remaining =
            select_files(&source, None, &already_processed).expect("select files");

        let names: Vec<_> = remaining
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect();
        assert_eq!(names, vec!["case002.pdf"]);
    }

    #[test]
    fn filename_filter_narrows_the_batch() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("case001.pdf"), b"").expect("seed pdf");
        fs::write(dir.path().join("other.pdf"), b"").expect("seed pdf");

        let filter = compile_filename_filter(Some("^case")).expect("compile filter");
        let selected =
            select_files(dir.path(), filter.as_ref(), &HashSet::new()).expect("select files");

        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn error_log_blocks_carry_filename_and_details() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output = dir.path().join("chunks.jsonl");

        let mut log = ErrorLog::new(&output);
        log.record("case001.pdf", "extraction failed: unreadable file")
            .expect("record error");
        log.record("case002.pdf", "no text layer").expect("record error");

        let written = fs::read_to_string(dir.path().join("chunks.jsonl.log"))
            .expect("read error log");
        assert!(written.contains("--- Error processing case001.pdf ---"));
        assert!(written.contains("extraction failed: unreadable file"));
        assert!(written.contains("--- Error processing case002.pdf ---"));
    }

    #[test]
    fn clean_run_leaves_no_error_log_behind() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output = dir.path().join("chunks.jsonl");

        let _log = ErrorLog::new(&output);
        assert!(!dir.path().join("chunks.jsonl.log").exists());
    }
}

use anyhow::Result;
use tracing::info;

use crate::cli::ListArgs;
use crate::util::{compile_filename_filter, find_pdf_files};

pub fn run(args: ListArgs) -> Result<()> {
    let filter = compile_filename_filter(args.pattern.as_deref())?;
    let pdf_files = find_pdf_files(&args.directory, filter.as_ref())?;

    if pdf_files.is_empty() {
        info!(
            directory = %args.directory.display(),
            pattern = args.pattern.as_deref().unwrap_or(""),
            "no PDF files found"
        );
        return Ok(());
    }

    info!(
        count = pdf_files.len(),
        directory = %args.directory.display(),
        "found PDF files"
    );

    for path in &pdf_files {
        if let Some(filename) = path.file_name().and_then(|name| name.to_str()) {
            println!("{filename}");
        }
    }

    Ok(())
}

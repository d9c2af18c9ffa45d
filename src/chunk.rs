use crate::model::{CaseMetadata, Chunk, ChunkMetadata, UNKNOWN};
use crate::patterns::CasePatterns;

/// Splits text into paragraph-respecting chunks of at most `max_tokens`
/// words. A paragraph is never split: one larger than the budget becomes its
/// own oversized chunk.
pub fn split_logical_chunks(
    text: &str,
    max_tokens: usize,
    patterns: &CasePatterns,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current_chunk: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for paragraph in patterns.paragraph_break.split(text) {
        let paragraph_size = paragraph.split_whitespace().count();

        if current_size + paragraph_size > max_tokens && !current_chunk.is_empty() {
            chunks.push(current_chunk.join("\n\n"));
            current_chunk = vec![paragraph];
            current_size = paragraph_size;
        } else {
            current_chunk.push(paragraph);
            current_size += paragraph_size;
        }
    }

    if !current_chunk.is_empty() {
        chunks.push(current_chunk.join("\n\n"));
    }

    chunks
}

/// Chunks a cleaned section and wraps every body with the case-context
/// header and per-chunk metadata. `respondent_name` is carried only when it
/// was actually resolved.
pub fn chunks_with_metadata(
    section_name: &str,
    section_text: &str,
    metadata: &CaseMetadata,
    max_tokens: usize,
    patterns: &CasePatterns,
) -> Vec<Chunk> {
    let bodies = split_logical_chunks(section_text, max_tokens, patterns);
    let chunk_count = bodies.len();

    bodies
        .into_iter()
        .enumerate()
        .map(|(chunk_index, body)| {
            let text = format!(
                "Case: {} | Claimant: {}\nSection: {}\n\n{}",
                metadata.docket_number, metadata.claimant_name, section_name, body
            );

            let respondent_name = (metadata.respondent_name != UNKNOWN)
                .then(|| metadata.respondent_name.clone());

            Chunk {
                text,
                metadata: ChunkMetadata {
                    docket_number: metadata.docket_number.clone(),
                    claimant_name: metadata.claimant_name.clone(),
                    section: section_name.to_string(),
                    chunk_index,
                    chunk_count,
                    filename: metadata.filename.clone(),
                    respondent_name,
                },
            }
        })
        .collect()
}

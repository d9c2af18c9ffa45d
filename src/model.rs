use serde::{Deserialize, Serialize};

/// Sentinel for metadata fields no pattern resolved.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub claimant_name: String,
    pub docket_number: String,
    pub respondent_name: String,
    pub filename: String,
}

impl CaseMetadata {
    pub fn unknown() -> Self {
        Self {
            claimant_name: UNKNOWN.to_string(),
            docket_number: UNKNOWN.to_string(),
            respondent_name: UNKNOWN.to_string(),
            filename: UNKNOWN.to_string(),
        }
    }
}

/// One output record: the context-prefixed chunk body plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub docket_number: String,
    pub claimant_name: String,
    pub section: String,
    pub chunk_index: usize,
    pub chunk_count: usize,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respondent_name: Option<String>,
}

/// Per-document outcome. Failures never abort the batch; they carry the
/// rendered error chain for the side log.
#[derive(Debug)]
pub enum DocumentOutcome {
    Success {
        filename: String,
        chunks: Vec<Chunk>,
        metadata: CaseMetadata,
    },
    Failure {
        filename: String,
        error: String,
        details: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub tool_versions: ToolVersions,
    pub source_directory: String,
    pub output_path: String,
    pub workers: usize,
    pub resumed: bool,
    pub files_attempted: usize,
    pub files_succeeded: usize,
    pub files_failed: usize,
    pub chunks_written: usize,
    pub duration_seconds: f64,
}

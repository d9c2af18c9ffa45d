use anyhow::{Context, Result};
use regex::Regex;

/// Upper bound on words per chunk; word count stands in for token count.
pub const MAX_CHUNK_SIZE: usize = 800;

pub const DEFAULT_WORKERS: usize = 4;

// Headings that open a section of an appeals board decision. Table order is
// the tie-break when two patterns match at the same offset.
pub const SECTION_PATTERNS: &[&str] = &[
    r"\bAPPEARANCES\b",
    r"\bRECORD AND STIPULATIONS\b",
    r"\bISSUES\b",
    r"\bFINDINGS OF FACT\b",
    r"\bPRINCIPLES OF LAW( AND ANALYSIS)?\b",
    r"\bANALYSIS\b",
    r"\bCONCLUSION(S)?\b",
    r"\bAWARD\b",
    r"\bORDER\b",
    r"\bDECISION\b",
];

// Candidate extractors per metadata field, tried in priority order. The first
// capture that passes validation wins; later patterns are not consulted.
pub const CLAIMANT_PATTERNS: &[&str] = &[
    r"([A-Z][A-Z\s\.]+)\s+\)\s*\n\s*Claimant",
    r"([A-Z][A-Z\s\.]+)\s+\d+\s+DOCKET\s+NO\.",
    r"([A-Z][A-Z\s\.]+)\s+vs\.\s+",
    r"([A-Z][A-Z\s\.]+)\s+VS\.\s+",
    r"BEFORE\s+THE\s+[A-Z\s]+\s+APPEALS\s+BOARD\s+([A-Z][A-Z\s\.]+)",
];

pub const DOCKET_PATTERNS: &[&str] = &[
    r"Docket\s+No\.\s+([\d,\.\-]+)",
    r"DOCKET\s+NO\.\s+([\d,\.\-]+)",
    r"(AP-\d+-\d+-\d+)",
    r"(CS-\d+-\d+-\d+)",
    r"(?:^|\s)([\d]{3},[\d]{3})(?:$|\s)",
];

pub const RESPONDENT_PATTERNS: &[&str] = &[
    r"VS\.\s*\)\s*\n\s*\)\s*\n\s*([A-Z][A-Z\s\.]+)",
    r"VS\.\s*\)\s*\n\s*([A-Z][A-Z\s\.]+)",
    r"vs\.\s+([A-Z][A-Z\s\.]+)",
    r"RESPONDENT:\s+([A-Z][A-Z\s\.]+)",
];

/// Compiled pattern tables plus the service regexes shared by the section
/// cleaner and the chunker.
pub struct CasePatterns {
    pub sections: Vec<Regex>,
    pub claimant: Vec<Regex>,
    pub docket: Vec<Regex>,
    pub respondent: Vec<Regex>,
    pub whitespace_run: Regex,
    pub split_hyphen: Regex,
    pub paragraph_break: Regex,
}

impl CasePatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            sections: compile_table(SECTION_PATTERNS, "section heading")?,
            claimant: compile_table(CLAIMANT_PATTERNS, "claimant")?,
            docket: compile_table(DOCKET_PATTERNS, "docket")?,
            respondent: compile_table(RESPONDENT_PATTERNS, "respondent")?,
            whitespace_run: Regex::new(r"\s+")
                .context("failed to compile whitespace run regex")?,
            split_hyphen: Regex::new(r"(\w)- (\w)")
                .context("failed to compile hyphenation repair regex")?,
            paragraph_break: Regex::new(r"\n\s*\n")
                .context("failed to compile paragraph break regex")?,
        })
    }
}

fn compile_table(patterns: &[&str], purpose: &str) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .with_context(|| format!("failed to compile {purpose} pattern: {pattern}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_tables_compile() {
        let patterns = CasePatterns::new().expect("pattern tables compile");
        assert_eq!(patterns.sections.len(), SECTION_PATTERNS.len());
        assert_eq!(patterns.claimant.len(), CLAIMANT_PATTERNS.len());
        assert_eq!(patterns.docket.len(), DOCKET_PATTERNS.len());
        assert_eq!(patterns.respondent.len(), RESPONDENT_PATTERNS.len());
    }

    #[test]
    fn docket_patterns_match_common_forms() {
        let patterns = CasePatterns::new().expect("pattern tables compile");

        let matched = patterns
            .docket
            .iter()
            .find_map(|pattern| pattern.captures("DOCKET NO. 123,456"))
            .and_then(|captures| captures.get(1))
            .map(|capture| capture.as_str());
        assert_eq!(matched, Some("123,456"));

        let matched = patterns
            .docket
            .iter()
            .find_map(|pattern| pattern.captures("case AP-00-0123-456 remanded"))
            .and_then(|captures| captures.get(1))
            .map(|capture| capture.as_str());
        assert_eq!(matched, Some("AP-00-0123-456"));
    }
}

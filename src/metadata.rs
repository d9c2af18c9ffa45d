use regex::Regex;

use crate::model::CaseMetadata;
use crate::patterns::CasePatterns;
use crate::util::is_all_uppercase;

/// Derives case metadata from document text. Every field defaults to the
/// `Unknown` sentinel; a pattern miss is not an error.
pub fn extract_case_info(text: &str, patterns: &CasePatterns) -> CaseMetadata {
    let mut info = CaseMetadata::unknown();

    if let Some(name) = first_validated_name(&patterns.claimant, text) {
        info.claimant_name = name;
    }

    if let Some(docket) = first_capture(&patterns.docket, text) {
        info.docket_number = docket;
    }

    if let Some(name) = first_validated_name(&patterns.respondent, text) {
        info.respondent_name = name;
    }

    info
}

/// Case metadata is front matter: restrict the scan to the first three pages
/// so quoted headings deeper in the decision cannot produce false matches.
pub fn extract_enhanced_case_info(pages: &[String], patterns: &CasePatterns) -> CaseMetadata {
    let front_matter = pages[..pages.len().min(3)].join("\n");
    extract_case_info(&front_matter, patterns)
}

fn first_capture(table: &[Regex], text: &str) -> Option<String> {
    table.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|capture| capture.as_str().trim().to_string())
    })
}

/// First capture that looks like a person or company name. Each pattern
/// contributes only its first match; a capture that fails validation falls
/// through to the next pattern in the table.
fn first_validated_name(table: &[Regex], text: &str) -> Option<String> {
    for pattern in table {
        let Some(captures) = pattern.captures(text) else {
            continue;
        };
        let Some(capture) = captures.get(1) else {
            continue;
        };

        let candidate = capture.as_str().trim();
        if is_plausible_name(candidate) {
            return Some(candidate.to_string());
        }
    }

    None
}

// Partial-word matches surface as single tokens or mixed case; a real party
// name in these decisions is multi-word and fully capitalized.
fn is_plausible_name(candidate: &str) -> bool {
    candidate.contains(' ') && is_all_uppercase(candidate)
}

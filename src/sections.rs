use crate::patterns::CasePatterns;
use crate::util::is_all_uppercase;

/// A labeled span of the concatenated document text. Spans are contiguous:
/// each section ends exactly where the next heading begins, and the last runs
/// to the end of the document.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub text: String,
    pub start_page: usize,
    pub start_offset: usize,
}

/// Partitions the document into heading-delimited sections. Text before the
/// first heading belongs to no section; zero heading matches yields an empty
/// result, which callers treat as "no extractable content" rather than an
/// error.
pub fn identify_sections(pages: &[String], patterns: &CasePatterns) -> Vec<Section> {
    let combined_text = pages.join("\n");

    let mut heading_matches = Vec::<(usize, String)>::new();
    for pattern in &patterns.sections {
        for found in pattern.find_iter(&combined_text) {
            heading_matches.push((found.start(), found.as_str().to_string()));
        }
    }

    // Stable sort: equal offsets keep pattern-table discovery order.
    heading_matches.sort_by_key(|(start_offset, _)| *start_offset);

    let mut sections = Vec::with_capacity(heading_matches.len());
    for (index, (start_offset, name)) in heading_matches.iter().enumerate() {
        let end_offset = heading_matches
            .get(index + 1)
            .map(|(next_offset, _)| *next_offset)
            .unwrap_or(combined_text.len());

        sections.push(Section {
            name: name.clone(),
            text: combined_text[*start_offset..end_offset].trim().to_string(),
            start_page: page_for_offset(pages, *start_offset),
            start_offset: *start_offset,
        });
    }

    sections
}

fn page_for_offset(pages: &[String], offset: usize) -> usize {
    let mut page_start = 0usize;
    for (index, page) in pages.iter().enumerate() {
        if offset >= page_start && offset < page_start + page.len() {
            return index;
        }
        page_start += page.len() + 1; // one joining newline per page
    }

    0
}

/// Normalizes a raw section span into prose for chunking: drop the heading
/// line, collapse whitespace runs, rejoin words hyphenated across line
/// breaks, trim. The hyphenation repair is a line-wrap heuristic and will
/// also join legitimately hyphenated compounds.
pub fn clean_section_text(section_text: &str, patterns: &CasePatterns) -> String {
    let mut text = section_text.to_string();

    let mut lines = section_text.split('\n');
    if let Some(first_line) = lines.next() {
        // The heading was matched verbatim and is redundant with the section
        // name field.
        if is_all_uppercase(first_line) {
            text = lines.collect::<Vec<&str>>().join("\n");
        }
    }

    let text = patterns.whitespace_run.replace_all(&text, " ");
    let text = patterns.split_hyphen.replace_all(&text, "${1}${2}");

    text.trim().to_string()
}

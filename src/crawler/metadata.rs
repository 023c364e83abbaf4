//! Page metadata extraction: title, heading counts, login-form detection

use crate::crawler::parser::DocumentTree;

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Structural metadata read from a parsed page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Trimmed text of the first `<title>`, or empty
    pub title: String,

    /// Number of `<h1>` through `<h6>` elements, indexed by level - 1
    pub heading_counts: [u32; 6],

    /// Whether a password input sits inside a form
    pub has_login_form: bool,
}

impl PageMetadata {
    /// Count of headings at `level` (1 through 6); 0 for any other level
    pub fn headings(&self, level: usize) -> u32 {
        level
            .checked_sub(1)
            .and_then(|index| self.heading_counts.get(index))
            .copied()
            .unwrap_or(0)
    }
}

/// Extracts title, heading counts, and login-form presence
pub fn extract_metadata(document: &DocumentTree) -> PageMetadata {
    let title = document
        .first_text("title")
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    let mut heading_counts = [0u32; 6];
    for (count, tag) in heading_counts.iter_mut().zip(HEADING_TAGS) {
        *count = document.count(tag) as u32;
    }

    let has_login_form = document.has_descendant_within("form", "input", |input| {
        input
            .attr("type")
            .map(|kind| kind.trim().eq_ignore_ascii_case("password"))
            .unwrap_or(false)
    });

    PageMetadata {
        title,
        heading_counts,
        has_login_form,
    }
}

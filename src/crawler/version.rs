//! Doctype-based markup version detection

use crate::crawler::parser::DocumentTree;
use scraper::node::Doctype;

/// Label reported when the document has no doctype declaration
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Known doctype strings and their version labels
const VERSION_TABLE: &[(&str, &str)] = &[
    ("html", "HTML5"),
    (
        "html public \"-//w3c//dtd html 4.01 transitional//en\"",
        "HTML 4.01 Transitional",
    ),
    ("html public \"-//w3c//dtd html 4.01//en\"", "HTML 4.01 Strict"),
    (
        "html public \"-//w3c//dtd html 4.01 strict//en\"",
        "HTML 4.01 Strict",
    ),
    (
        "html public \"-//w3c//dtd xhtml 1.0 strict//en\"",
        "XHTML 1.0 Strict",
    ),
];

/// Classifies the document's markup version from its first doctype
///
/// Only the first doctype met in a pre-order walk of the whole tree counts.
/// Unrecognized doctypes are reported verbatim (lowercased); a document
/// without any doctype, or whose doctype declares nothing, is reported as
/// [`UNKNOWN_VERSION`].
pub fn detect_html_version(document: &DocumentTree) -> String {
    let declared = match document.doctypes().next() {
        Some(doctype) => doctype_string(doctype),
        None => return UNKNOWN_VERSION.to_string(),
    };

    if declared.is_empty() {
        return UNKNOWN_VERSION.to_string();
    }

    VERSION_TABLE
        .iter()
        .find(|(key, _)| *key == declared)
        .map(|(_, label)| label.to_string())
        .unwrap_or(declared)
}

/// Lowercased `name [public "id"]` form of a doctype declaration
fn doctype_string(doctype: &Doctype) -> String {
    let name = doctype.name().trim().to_lowercase();
    let public_id = doctype.public_id().trim();

    if public_id.is_empty() {
        name
    } else {
        format!("{} public \"{}\"", name, public_id.to_lowercase())
            .trim()
            .to_string()
    }
}

//! Plain-text document extraction
//!
//! Binary formats (PDF, DOCX) need dedicated parsers and are handled
//! outside this pipeline; here only plain-text files are read, as a single
//! page.

use std::fs;
use std::path::Path;

use tracing::info;

use splice_core::{DocumentPage, Error, Result};

/// Extract the pages of a document based on its file extension.
///
/// `.txt` and `.md` files are read as UTF-8 and returned as one page.
/// Anything else is an [`Error::UnsupportedFormat`].
pub fn extract_text(path: &Path) -> Result<Vec<DocumentPage>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" => extract_plain_text(path),
        other => Err(Error::UnsupportedFormat(format!(
            "cannot extract text from '.{}' files",
            other
        ))),
    }
}

fn extract_plain_text(path: &Path) -> Result<Vec<DocumentPage>> {
    info!(path = %path.display(), "extracting plain text");
    let text = fs::read_to_string(path)?;
    Ok(vec![DocumentPage::new(1, text)])
}

//! Document text extraction for uploaded job descriptions.
//!
//! Everything happens in memory. PDF parsing is CPU-bound, so async callers
//! run `extract_text` on the blocking pool.

mod docx;
mod pdf;

#[cfg(test)]
pub(crate) use docx::fixtures::docx_bytes;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("the uploaded file is empty")]
    Empty,

    #[error("unsupported file type '{0}': upload a .pdf or .docx file")]
    UnsupportedFormat(String),

    #[error("legacy .doc files are not supported: save the document as .docx or .pdf")]
    LegacyDoc,

    #[error("no extractable text found in {0} (is it a scanned image?)")]
    NoExtractableText(DocumentKind),

    #[error("could not read {kind} document: {reason}")]
    Corrupt { kind: DocumentKind, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolves a filename by extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, DocumentError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "doc" => Err(DocumentError::LegacyDoc),
            "" => Err(DocumentError::UnsupportedFormat(filename.to_string())),
            other => Err(DocumentError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "PDF"),
            DocumentKind::Docx => write!(f, "DOCX"),
        }
    }
}

/// Extracts plain text from an uploaded document.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    let kind = DocumentKind::from_filename(filename)?;
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }

    let text = match kind {
        DocumentKind::Pdf => pdf::extract(bytes)?,
        DocumentKind::Docx => docx::extract(bytes)?,
    };

    let text = text.trim();
    if text.is_empty() {
        warn!("{kind} '{filename}' produced no text");
        return Err(DocumentError::NoExtractableText(kind));
    }

    debug!("Extracted {} chars from {kind} '{filename}'", text.len());
    Ok(text.to_string())
}

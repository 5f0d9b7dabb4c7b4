use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{DocumentError, DocumentKind};

pub(super) fn extract(bytes: &[u8]) -> Result<String, DocumentError> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let result = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(DocumentError::Corrupt {
            kind: DocumentKind::Pdf,
            reason: e.to_string(),
        }),
        Err(_) => Err(DocumentError::Corrupt {
            kind: DocumentKind::Pdf,
            reason: "the PDF parser could not process this file".to_string(),
        }),
    }
}

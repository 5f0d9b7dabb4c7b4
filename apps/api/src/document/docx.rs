use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{DocumentError, DocumentKind};

const DOCUMENT_XML: &str = "word/document.xml";

pub(super) fn extract(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(corrupt)?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| match e {
            ZipError::FileNotFound => DocumentError::Corrupt {
                kind: DocumentKind::Docx,
                reason: format!("missing {DOCUMENT_XML}"),
            },
            other => corrupt(other),
        })?
        .read_to_string(&mut xml)
        .map_err(|e| corrupt(ZipError::Io(e)))?;

    Ok(xml_to_text(&xml))
}

fn corrupt(e: ZipError) -> DocumentError {
    DocumentError::Corrupt {
        kind: DocumentKind::Docx,
        reason: e.to_string(),
    }
}

/// Flattens WordprocessingML into plain text: one line per paragraph, tabs
/// and breaks kept, all other markup dropped.
fn xml_to_text(xml: &str) -> String {
    static PARAGRAPH_END_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"</w:p>").expect("valid regex"));
    static TAB_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<w:tab\s*/>").expect("valid regex"));
    static BREAK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<w:(?:br|cr)\b[^>]*/>").expect("valid regex"));
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
    static BLANK_LINES_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n[ \t]*\n+").expect("valid regex"));

    let text = PARAGRAPH_END_RE.replace_all(xml, "\n");
    let text = TAB_RE.replace_all(&text, "\t");
    let text = BREAK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = unescape_xml(&text);
    BLANK_LINES_RE.replace_all(&text, "\n").trim().to_string()
}

fn unescape_xml(text: &str) -> String {
    static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"&(?:(lt|gt|amp|quot|apos)|#(\d+)|#x([0-9a-fA-F]+));").expect("valid regex")
    });

    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            if let Some(named) = caps.get(1) {
                return match named.as_str() {
                    "lt" => "<",
                    "gt" => ">",
                    "amp" => "&",
                    "quot" => "\"",
                    _ => "'",
                }
                .to_string();
            }
            let code = match (caps.get(2), caps.get(3)) {
                (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                _ => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}

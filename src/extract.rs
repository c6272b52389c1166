//! Multi-format text extraction.
//!
//! Converts a file on disk into normalized plain text. Supported formats are
//! chosen by extension: plain text / Markdown, HTML, PDF, and DOCX.
//!
//! [`extract`] never fails: unsupported formats and broken files yield an
//! empty string so that one bad file cannot abort a batch. Callers that want
//! to log the reason use [`try_extract`].

use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::ExtractError;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>").expect("valid regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static HSPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static SPACE_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n ?").expect("valid regex"));
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Input formats recognized at the ingestion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Text,
    Html,
    Pdf,
    Docx,
}

impl DocFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" | "markdown" => Some(DocFormat::Text),
            "html" | "htm" => Some(DocFormat::Html),
            "pdf" => Some(DocFormat::Pdf),
            "docx" => Some(DocFormat::Docx),
            _ => None,
        }
    }
}

pub fn is_supported(path: &Path) -> bool {
    DocFormat::from_path(path).is_some()
}

/// Extracts normalized text, returning `""` on any failure.
pub fn extract(path: &Path) -> String {
    match try_extract(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "text extraction failed");
            String::new()
        }
    }
}

/// Extracts normalized text, reporting why it could not.
pub fn try_extract(path: &Path) -> Result<String, ExtractError> {
    let format = DocFormat::from_path(path)
        .ok_or_else(|| ExtractError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;
    let raw = match format {
        DocFormat::Text => String::from_utf8_lossy(&bytes).into_owned(),
        DocFormat::Html => html_to_text(&String::from_utf8_lossy(&bytes)),
        DocFormat::Pdf => extract_pdf(&bytes)?,
        DocFormat::Docx => extract_docx(&bytes)?,
    };
    Ok(normalize_whitespace(&raw))
}

/// Folds carriage returns, collapses horizontal whitespace runs, collapses
/// three or more newlines into one blank line, and trims.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HSPACE.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn html_to_text(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, "\n");
    let without_tags = TAG.replace_all(&without_code, "\n");
    let decoded = decode_entities(&without_tags);
    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Page-by-page extraction; a page without extractable text contributes "".
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let pages: Vec<String> = document
        .get_pages()
        .keys()
        .map(|&page_no| document.extract_text(&[page_no]).unwrap_or_default())
        .collect();
    Ok(pages.join("\n"))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx("word/document.xml not found".to_string()))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    docx_paragraphs(&doc_xml)
}

/// Collects `w:t` runs per `w:p` paragraph; paragraphs joined by newline.
fn docx_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push(' '),
                b"br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Docx(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let para = current.trim();
                    if !para.is_empty() {
                        paragraphs.push(para.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    let tail = current.trim();
    if !tail.is_empty() {
        paragraphs.push(tail.to_string());
    }
    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file(
                "word/document.xml",
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn normalize_collapses_whitespace() {
        let raw = "  Title\r\n\r\n\r\n\r\nBody   with\t\ttabs \n\n\n\nEnd  ";
        assert_eq!(
            normalize_whitespace(raw),
            "Title\n\nBody with tabs\n\nEnd"
        );
    }

    #[test]
    fn normalize_keeps_single_blank_line() {
        assert_eq!(normalize_whitespace("a\n\nb"), "a\n\nb");
        assert_eq!(normalize_whitespace("a\nb"), "a\nb");
    }

    #[test]
    fn markdown_is_read_through() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "notes.md", b"# Notes\r\n\r\nSome   text.\n");
        assert_eq!(extract(&path), "# Notes\n\nSome text.");
    }

    #[test]
    fn html_strips_script_style_and_tags() {
        let tmp = TempDir::new().unwrap();
        let html = b"<html><head><style>p { color: red; }</style><script>var x = 1;</script></head>\
<body><h1>Heading</h1><p>First &amp; second</p></body></html>";
        let path = write(&tmp, "page.HTML", html);
        let text = extract(&path);
        assert_eq!(text, "Heading\nFirst & second");
    }

    #[test]
    fn docx_paragraphs_joined_by_newline() {
        let tmp = TempDir::new().unwrap();
        let body = "<w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>\
<w:p><w:r><w:drawing/></w:r></w:p><w:p><w:r><w:t>Second paragraph</w:t></w:r></w:p>";
        let path = write(&tmp, "report.docx", &docx_with_body(body));
        assert_eq!(extract(&path), "Hello world\nSecond paragraph");
    }

    #[test]
    fn unsupported_extension_yields_empty() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "data.csv", b"a,b,c");
        assert!(!is_supported(&path));
        assert_eq!(extract(&path), "");
        assert!(matches!(
            try_extract(&path),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn corrupt_files_yield_empty() {
        let tmp = TempDir::new().unwrap();
        let pdf = write(&tmp, "broken.pdf", b"not a pdf");
        let docx = write(&tmp, "broken.docx", b"not a zip");
        assert_eq!(extract(&pdf), "");
        assert_eq!(extract(&docx), "");
        assert!(matches!(try_extract(&pdf), Err(ExtractError::Pdf(_))));
        assert!(matches!(try_extract(&docx), Err(ExtractError::Docx(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone.txt");
        assert!(matches!(try_extract(&path), Err(ExtractError::Io(_))));
        assert_eq!(extract(&path), "");
    }

    #[test]
    fn format_detection_is_case_insensitive() {
        assert_eq!(
            DocFormat::from_path(Path::new("A.PDF")),
            Some(DocFormat::Pdf)
        );
        assert_eq!(
            DocFormat::from_path(Path::new("x.htm")),
            Some(DocFormat::Html)
        );
        assert_eq!(DocFormat::from_path(Path::new("README")), None);
    }
}

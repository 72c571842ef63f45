//! Per-format text extraction. One function per `SourceFormat` variant;
//! every failure is reported as `Error::Ingestion` so the loader can skip
//! the file and keep going.

use quick_xml::events::Event;
use quick_xml::Reader;
use ragdb_core::types::SourceFormat;
use ragdb_core::{Error, Result};
use std::fs;
use std::io::Read;
use std::path::Path;

pub fn extract_text(path: &Path, format: SourceFormat) -> Result<String> {
    match format {
        SourceFormat::PlainText => read_plain(path),
        SourceFormat::Pdf => read_pdf(path),
        SourceFormat::Csv => read_csv(path),
        SourceFormat::Docx => read_docx(path),
        SourceFormat::Unsupported => Err(ingestion(path, "unsupported format")),
    }
}

fn ingestion(path: &Path, reason: impl ToString) -> Error {
    Error::Ingestion {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn read_plain(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        // Not valid UTF-8; fall back to a lossy read.
        Err(_) => {
            let bytes = fs::read(path).map_err(|e| ingestion(path, e))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}

fn read_pdf(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path).map_err(|e| ingestion(path, e))
}

/// Flatten a CSV file into plain text: the header line first, then one line
/// per row with fields joined by ", ".
fn read_csv(path: &Path) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ingestion(path, e))?;

    let mut lines = Vec::new();
    if let Ok(headers) = reader.headers() {
        if !headers.is_empty() {
            lines.push(headers.iter().collect::<Vec<_>>().join(", "));
        }
    }
    for record in reader.records() {
        let record = record.map_err(|e| ingestion(path, e))?;
        lines.push(record.iter().collect::<Vec<_>>().join(", "));
    }
    Ok(lines.join("\n"))
}

/// Extract paragraph text from a Word document: the zip member
/// `word/document.xml` parsed with a pull parser, collecting `w:t` runs and
/// emitting newlines at paragraph and line-break boundaries.
fn read_docx(path: &Path) -> Result<String> {
    let file = fs::File::open(path).map_err(|e| ingestion(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ingestion(path, e))?;
    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ingestion(path, e))?
        .read_to_string(&mut document_xml)
        .map_err(|e| ingestion(path, e))?;
    docx_body_text(&document_xml).map_err(|e| ingestion(path, e))
}

fn docx_body_text(xml: &str) -> std::result::Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text_run = false,
            Event::Text(t) if in_text_run => out.push_str(&t.unescape()?),
            Event::End(e) if e.name().as_ref() == b"w:p" => out.push('\n'),
            Event::Empty(e) if e.name().as_ref() == b"w:br" => out.push('\n'),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn csv_rows_flatten_to_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "name,role").unwrap();
        writeln!(f, "ada,engineer").unwrap();
        writeln!(f, "grace,admiral").unwrap();

        let text = extract_text(&path, SourceFormat::Csv).unwrap();
        assert_eq!(text, "name, role\nada, engineer\ngrace, admiral");
    }

    #[test]
    fn docx_xml_text_runs_and_paragraphs() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
    <w:p><w:r><w:t>Second</w:t></w:r><w:r><w:t xml:space="preserve"> half.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = docx_body_text(xml).unwrap();
        assert_eq!(text, "First paragraph.\nSecond half.\n");
    }

    #[test]
    fn invalid_utf8_text_file_reads_lossily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weird.txt");
        fs::write(&path, [b'o', b'k', 0xFF, b'!']).unwrap();

        let text = extract_text(&path, SourceFormat::PlainText).unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
    }

    #[test]
    fn broken_pdf_reports_ingestion_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.pdf");
        fs::write(&path, b"not a pdf at all").unwrap();

        let err = extract_text(&path, SourceFormat::Pdf).unwrap_err();
        assert!(matches!(err, Error::Ingestion { .. }));
    }
}

//! Document loading for the supported source types.
//!
//! Walks a directory in sorted order and dispatches on extension: plain
//! text and markdown are read directly, delimited files are ingested line
//! per row, PDFs go through `pdf-extract`, and docx/xlsx plaintext is pulled
//! out of the zip container's XML parts. A file that fails extraction is
//! skipped with a warning; it never aborts the walk.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::types::{DocKind, Document};

/// Extensions accepted by the loader.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["txt", "md", "csv", "tsv", "pdf", "docx", "xlsx"];

/// Load all supported documents under `dir`. A missing or empty directory
/// yields an empty list and a warning; callers decide whether that is fatal.
pub fn load_documents(dir: &Path, recursive: bool) -> Result<Vec<Document>> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "documents directory does not exist");
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = Vec::new();
    let walker = if recursive {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        match kind_for(path) {
            Some(_) => files.push(path.to_path_buf()),
            None => {
                warn!(file = %path.display(), "skipping unsupported document type");
            }
        }
    }
    files.sort();

    let mut documents = Vec::new();
    for path in files {
        match load_single_document(&path) {
            Ok(Some(doc)) => documents.push(doc),
            Ok(None) => {}
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed to extract document, skipping");
            }
        }
    }
    info!(count = documents.len(), dir = %dir.display(), "loaded documents");
    Ok(documents)
}

/// Load one file. Returns `Ok(None)` for unsupported extensions and for
/// files whose extracted text is empty.
pub fn load_single_document(path: &Path) -> Result<Option<Document>> {
    let Some(kind) = kind_for(path) else {
        return Ok(None);
    };
    let text = match kind {
        DocKind::Text | DocKind::Delimited => read_text_lossy(path)?,
        DocKind::Pdf => pdf_extract::extract_text(path)
            .map_err(|e| crate::error::RagError::Operation(format!("pdf extraction: {e}")))?,
        DocKind::WordProcessing => extract_zip_xml_text(path, "word/document.xml", "w:p")?,
        DocKind::Spreadsheet => extract_zip_xml_text(path, "xl/sharedStrings.xml", "si")?,
    };
    if text.trim().is_empty() {
        warn!(file = %path.display(), "document has no extractable text");
        return Ok(None);
    }
    let doc_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    Ok(Some(Document {
        doc_id,
        doc_path: path.to_path_buf(),
        kind,
        text,
    }))
}

fn kind_for(path: &Path) -> Option<DocKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "txt" | "md" => Some(DocKind::Text),
        "csv" | "tsv" => Some(DocKind::Delimited),
        "pdf" => Some(DocKind::Pdf),
        "docx" => Some(DocKind::WordProcessing),
        "xlsx" => Some(DocKind::Spreadsheet),
        _ => None,
    }
}

fn read_text_lossy(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

/// Pull character data out of one XML part of a zip container, inserting a
/// newline at each closing `block_tag` so paragraphs/rows stay separated.
fn extract_zip_xml_text(path: &Path, member: &str, block_tag: &str) -> Result<String> {
    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| crate::error::RagError::Operation(format!("zip container: {e}")))?;
    let mut part = archive
        .by_name(member)
        .map_err(|e| crate::error::RagError::Operation(format!("zip member {member}: {e}")))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml_character_data(&xml, block_tag))
}

fn xml_character_data(xml: &str, block_tag: &str) -> String {
    let close = format!("/{block_tag}");
    let mut out = String::new();
    let mut chars = xml.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '<' {
            let mut tag = String::new();
            for t in chars.by_ref() {
                if t == '>' {
                    break;
                }
                tag.push(t);
            }
            let name = tag.split_whitespace().next().unwrap_or("");
            if name == close && !out.ends_with('\n') {
                out.push('\n');
            }
            continue;
        }
        if c == '&' {
            let mut entity = String::new();
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == ';' {
                    break;
                }
                entity.push(next);
            }
            out.push(decode_entity(&entity));
            continue;
        }
        out.push(c);
    }
    out
}

fn decode_entity(entity: &str) -> char {
    match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => ' ',
    }
}

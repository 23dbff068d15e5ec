//! Sentence-aware text splitting.
//!
//! Documents are segmented at sentence boundaries (`.`, `!`, `?`, newline)
//! and whole sentences are packed into chunks of at most `chunk_size`
//! characters. A sentence that alone exceeds the budget is split at word
//! boundaries; only a single word longer than the whole budget is ever cut
//! mid-word. Adjacent chunks from one document share an overlap seeded from
//! the tail words of the previous chunk. The transformation is pure: the
//! same input and policy always produce the same chunks.

use crate::error::{RagError, Result};
use crate::types::{Document, DocumentChunk};
use tracing::warn;

/// Validated chunking parameters, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkPolicy {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

/// One chunk of a single document's text. `overlap_len` is the number of
/// leading characters carried over from the previous chunk; the remainder is
/// fresh content, so concatenating the fresh parts of all chunks
/// reconstructs the document up to whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    pub overlap_len: usize,
}

/// Split all documents into ordered chunks. An empty document list is not an
/// error: it yields an empty sequence and a warning.
pub fn split_documents(documents: &[Document], policy: ChunkPolicy) -> Vec<DocumentChunk> {
    if documents.is_empty() {
        warn!("no documents provided to the chunker");
        return Vec::new();
    }
    let mut out = Vec::new();
    for doc in documents {
        let pieces = split_text(&doc.text, policy);
        let total = pieces.len();
        for (chunk_index, piece) in pieces.into_iter().enumerate() {
            out.push(DocumentChunk {
                id: format!("{}:{}", doc.doc_id, chunk_index),
                doc_id: doc.doc_id.clone(),
                doc_path: doc.doc_path.to_string_lossy().to_string(),
                kind: doc.kind,
                content: piece.content,
                chunk_index,
                total_chunks: total,
                chunk_size: policy.chunk_size,
                chunk_overlap: policy.chunk_overlap,
            });
        }
    }
    out
}

/// Split one text into chunks of at most `policy.chunk_size` characters.
pub fn split_text(text: &str, policy: ChunkPolicy) -> Vec<TextChunk> {
    // Sentences first, then words for anything oversized. Every unit that
    // reaches the packer fits the budget on its own.
    let mut units: Vec<String> = Vec::new();
    for sentence in segment_sentences(text) {
        if char_len(&sentence) <= policy.chunk_size {
            units.push(sentence);
        } else {
            units.extend(split_oversized(&sentence, policy.chunk_size));
        }
    }

    let mut chunks: Vec<TextChunk> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut seed_len = 0usize;
    let mut has_fresh = false;

    for unit in units {
        let unit_len = char_len(&unit);
        let sep = usize::from(current_len > 0);
        if has_fresh && current_len + sep + unit_len > policy.chunk_size {
            let seed = overlap_tail(&current, policy.chunk_overlap);
            chunks.push(TextChunk {
                content: current,
                overlap_len: seed_len,
            });
            seed_len = char_len(&seed);
            current = seed;
            current_len = seed_len;
            has_fresh = false;
        }
        // A fresh chunk must always accept its first unit; shrink the seed
        // from the front until the unit fits.
        if !has_fresh && current_len > 0 {
            while current_len + 1 + unit_len > policy.chunk_size {
                match trim_first_word(&current) {
                    Some(rest) => {
                        current = rest;
                        current_len = char_len(&current);
                    }
                    None => {
                        current.clear();
                        current_len = 0;
                        break;
                    }
                }
            }
            seed_len = current_len;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&unit);
        current_len += unit_len;
        has_fresh = true;
    }

    if has_fresh {
        chunks.push(TextChunk {
            content: current,
            overlap_len: seed_len,
        });
    }
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut text into sentences at `.`, `!`, `?` (followed by whitespace or end
/// of input) and at newlines. Each returned sentence is trimmed and
/// non-empty, with internal whitespace collapsed to single spaces.
fn segment_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            flush_sentence(&mut current, &mut sentences);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let at_break = chars.peek().map_or(true, |next| next.is_whitespace());
            if at_break {
                flush_sentence(&mut current, &mut sentences);
            }
        }
    }
    flush_sentence(&mut current, &mut sentences);
    sentences
}

fn flush_sentence(current: &mut String, sentences: &mut Vec<String>) {
    let normalized = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() {
        sentences.push(normalized);
    }
    current.clear();
}

/// Word-boundary split of a sentence that exceeds the chunk budget. Only a
/// single word longer than the whole budget is cut by characters.
fn split_oversized(sentence: &str, chunk_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in sentence.split_whitespace() {
        let word_len = char_len(word);
        if word_len > chunk_size {
            if current_len > 0 {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let glyphs: Vec<char> = word.chars().collect();
            for slice in glyphs.chunks(chunk_size) {
                pieces.push(slice.iter().collect());
            }
            continue;
        }
        let sep = usize::from(current_len > 0);
        if current_len + sep + word_len > chunk_size {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Tail words of `chunk` fitting within `budget` characters, used to seed
/// the next chunk. Never cuts a word.
fn overlap_tail(chunk: &str, budget: usize) -> String {
    if budget == 0 {
        return String::new();
    }
    let words: Vec<&str> = chunk.split_whitespace().collect();
    let mut taken: Vec<&str> = Vec::new();
    let mut len = 0usize;
    for word in words.iter().rev() {
        let word_len = char_len(word);
        let sep = usize::from(!taken.is_empty());
        if len + sep + word_len > budget {
            break;
        }
        taken.push(word);
        len += sep + word_len;
    }
    taken.reverse();
    taken.join(" ")
}

fn trim_first_word(s: &str) -> Option<String> {
    let mut words = s.split_whitespace();
    words.next()?;
    let rest = words.collect::<Vec<_>>().join(" ");
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

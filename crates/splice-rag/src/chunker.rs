//! Sentence-aware text chunking with token-based sizing and overlap
//!
//! Sizes are expressed in estimated tokens (4 characters ~ 1 token) and
//! converted to character budgets internally. All length accounting is in
//! characters, not bytes, so multi-byte text is sized consistently.

use regex::Regex;
use tracing::{debug, info, warn};

use splice_core::{Chunk, ChunkMetadata, DocumentPage, SplitType};

/// Rough token count estimation using a character-based heuristic.
///
/// For English text, approximately 4 characters = 1 token. Used only for
/// sizing and metadata, never as an exactness guarantee.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.chars().count() / 4).max(1)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Last `n` characters of `text` (the whole text if shorter)
fn char_tail(text: &str, n: usize) -> &str {
    let len = char_len(text);
    if len <= n {
        return text;
    }
    let (idx, _) = text
        .char_indices()
        .nth(len - n)
        .unwrap_or((text.len(), ' '));
    &text[idx..]
}

/// Split on sentence boundaries: end punctuation, whitespace, capital letter.
/// Punctuation stays with the left sentence, the capital starts the next.
fn split_sentences(text: &str) -> Vec<&str> {
    let boundary = Regex::new(r"[.!?]\s+[A-Z]").unwrap();
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in boundary.find_iter(text) {
        sentences.push(&text[start..m.start() + 1]);
        start = m.end() - 1;
    }
    sentences.push(&text[start..]);
    sentences
}

/// Segment text into sentence-like units, falling back to blank-line and
/// then single-newline splitting when no sentence boundaries are detected
fn split_segments(text: &str) -> Vec<&str> {
    let sentences = split_sentences(text);
    if sentences.len() > 1 {
        return sentences;
    }
    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    if paragraphs.len() > 1 {
        return paragraphs;
    }
    text.split('\n').collect()
}

/// Byte offset just past the last sentence boundary inside the overlap
/// window, if any
fn last_boundary_end(window: &str) -> Option<usize> {
    let boundary = Regex::new(r"[.!?]\s+").unwrap();
    boundary.find_iter(window).last().map(|m| m.end())
}

fn push_chunk(
    chunks: &mut Vec<Chunk>,
    buffer: &str,
    file_name: &str,
    page_num: u32,
    split_type: Option<SplitType>,
) {
    chunks.push(Chunk {
        text: buffer.trim().to_string(),
        chunk_index: chunks.len(),
        file: file_name.to_string(),
        page: page_num,
        metadata: ChunkMetadata {
            token_estimate: estimate_tokens(buffer),
            char_count: char_len(buffer),
            split_type,
        },
    });
}

/// Force a word-level split of a buffer that grew past twice the chunk
/// budget (a single pathologically long "sentence"). Flushed sub-chunks are
/// tagged [`SplitType::WordBoundary`]; the remainder becomes the new buffer.
fn split_long_buffer(
    chunks: &mut Vec<Chunk>,
    buffer: &str,
    size_chars: usize,
    file_name: &str,
    page_num: u32,
) -> String {
    let mut temp = String::new();
    for word in buffer.split_whitespace() {
        if char_len(&temp) + char_len(word) + 1 <= size_chars {
            if temp.is_empty() {
                temp.push_str(word);
            } else {
                temp.push(' ');
                temp.push_str(word);
            }
        } else {
            if !temp.trim().is_empty() {
                push_chunk(chunks, &temp, file_name, page_num, Some(SplitType::WordBoundary));
            }
            temp = word.to_string();
        }
    }
    temp
}

/// Split one page of text into overlapping chunks of approximately
/// `chunk_size` estimated tokens.
///
/// Strategy: segment into sentences, greedily pack segments up to the
/// character budget, seed each new buffer with the tail of the previous one
/// to maintain context, and force word-level splits for runaway segments.
/// Empty or whitespace-only text yields an empty list; malformed input is
/// never an error.
///
/// Overlap seeding keeps only the text after the *last* sentence boundary
/// inside the overlap window, so the effective overlap can be shorter than
/// requested when the window spans several short sentences.
pub fn chunk_text(
    text: &str,
    file_name: &str,
    page_num: u32,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    if text.trim().is_empty() {
        warn!(file = file_name, page = page_num, "empty text, skipping chunking");
        return Vec::new();
    }

    debug!(
        file = file_name,
        page = page_num,
        tokens = estimate_tokens(text),
        chunk_size,
        chunk_overlap,
        "chunking page text"
    );

    let size_chars = chunk_size * 4;
    let overlap_chars = chunk_overlap * 4;

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();

    for segment in split_segments(text) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let potential_len = if current.is_empty() {
            char_len(segment)
        } else {
            char_len(&current) + 1 + char_len(segment)
        };

        if !current.is_empty() && potential_len > size_chars {
            // Current buffer is full, flush it
            push_chunk(&mut chunks, &current, file_name, page_num, None);

            if overlap_chars > 0 && char_len(&current) > overlap_chars {
                // Seed the new buffer from the tail of the flushed one,
                // starting after the last sentence boundary in the window
                let window = char_tail(&current, overlap_chars).to_string();
                current = match last_boundary_end(&window) {
                    Some(end) => format!("{} {}", &window[end..], segment),
                    None => format!("{} {}", window, segment),
                };
            } else {
                current = segment.to_string();
            }
        } else if current.is_empty() {
            current = segment.to_string();
        } else {
            current.push(' ');
            current.push_str(segment);
        }

        if char_len(&current) > size_chars * 2 {
            current = split_long_buffer(&mut chunks, &current, size_chars, file_name, page_num);
        }
    }

    if !current.trim().is_empty() {
        push_chunk(&mut chunks, &current, file_name, page_num, None);
    }

    info!(
        file = file_name,
        page = page_num,
        chunks = chunks.len(),
        "chunking complete"
    );

    chunks
}

/// Chunk all pages of a document
pub fn chunk_pages(
    pages: &[DocumentPage],
    file_name: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    let mut all_chunks = Vec::new();
    for page in pages {
        all_chunks.extend(chunk_text(
            &page.text,
            file_name,
            page.page_num,
            chunk_size,
            chunk_overlap,
        ));
    }
    info!(file = file_name, chunks = all_chunks.len(), "chunked document");
    all_chunks
}

//! Boundary-aware text chunking
//!
//! Splits a document into overlapping windows aligned to paragraph,
//! sentence, or line boundaries. Overlap keeps context that straddles a
//! boundary retrievable from either side.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use folio_core::{Chunk, ChunkingConfig};

/// Fragments shorter than this are noise, not content
const MIN_CHUNK_LEN: usize = 50;

fn spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("spaces regex"))
}

fn newlines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("newlines regex"))
}

/// Collapse runs of spaces/tabs and excess blank lines, trim the ends
fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = spaces_re().replace_all(&text, " ");
    let text = newlines_re().replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Find the best cut inside `window`, preferring the latest boundary past
/// `min`: paragraph break, else sentence end, else newline. Returns the
/// exclusive cut position in chars, or None to cut at the raw window end.
fn find_boundary(window: &[char], min: usize) -> Option<usize> {
    if window.len() < 2 {
        return None;
    }

    for i in (min..window.len() - 1).rev() {
        if window[i] == '\n' && window[i + 1] == '\n' {
            return Some(i);
        }
    }
    for i in (min..window.len() - 1).rev() {
        if window[i] == '.' && window[i + 1] == ' ' {
            // Keep the period and separating space with the chunk
            return Some(i + 2);
        }
    }
    for i in (min..window.len()).rev() {
        if window[i] == '\n' {
            return Some(i);
        }
    }

    None
}

/// Stable content-derived chunk id: stem, position, and a hash covering
/// source, position, and text, so unchanged content re-ingests to the same
/// id while edited content gets a new one.
fn chunk_id(source: &str, index: usize, text: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source);
    let digest = md5::compute(format!("{}:{}:{}", source, index, text));
    format!("{}-{}-{}", stem, index, &format!("{:x}", digest)[..12])
}

/// Split `text` into overlapping chunks of roughly `chunk_size` characters.
///
/// The window start always advances by at least one character per emitted
/// chunk, so the walk terminates even for pathological settings such as
/// `overlap >= chunk_size`.
pub fn chunk_text(text: &str, source: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let cleaned = normalize_whitespace(text);
    let chars: Vec<char> = cleaned.chars().collect();

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    while start < chars.len() {
        let mut end = (start + config.chunk_size).min(chars.len());

        if end < chars.len() {
            let window = &chars[start..end];
            if let Some(cut) = find_boundary(window, config.chunk_size / 2) {
                end = start + cut;
            }
        }
        if end <= start {
            end = (start + config.chunk_size).min(chars.len());
        }

        let chunk_text: String = chars[start..end].iter().collect();
        let chunk_text = chunk_text.trim().to_string();

        if chunk_text.len() >= MIN_CHUNK_LEN || (end == chars.len() && chunks.is_empty()) {
            let mut metadata = BTreeMap::new();
            metadata.insert("source".to_string(), source.to_string());
            metadata.insert("chunkIndex".to_string(), index.to_string());

            chunks.push(Chunk {
                id: chunk_id(source, index, &chunk_text),
                text: chunk_text,
                source: source.to_string(),
                metadata,
            });
            index += 1;
        }

        if end == chars.len() {
            break;
        }

        // Overlap the next window, but always move forward
        let next = end.saturating_sub(config.overlap);
        start = if next > start { next } else { end };
    }

    chunks
}

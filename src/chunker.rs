use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::error::HarvestError;

/// Break points in order of preference: paragraph, line, sentence, word.
/// The empty separator means a hard cut between characters.
pub const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Order of the chunk within its source text.
    pub position: usize,
    pub text: String,
}

/// Recursive splitter producing windows of at most `chunk_size` characters,
/// consecutive windows sharing up to `chunk_overlap` characters.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    size: usize,
    overlap: usize,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split after every occurrence of `sep`, keeping it on the left piece.
fn split_keeping<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, m) in text.match_indices(sep) {
        let end = i + m.len();
        pieces.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, HarvestError> {
        config.validate()?;
        Ok(Self {
            size: config.chunk_size,
            overlap: config.chunk_overlap,
        })
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        self.split(text, &SEPARATORS)
            .into_iter()
            .enumerate()
            .map(|(position, text)| Chunk { position, text })
            .collect()
    }

    fn split(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (idx, sep) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_empty() || text.contains(**s))
            .map(|(i, s)| (i, *s))
            .unwrap_or((separators.len(), ""));
        if sep.is_empty() {
            return self.hard_cut(text);
        }
        let finer = &separators[idx + 1..];

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping(text, sep) {
            if char_len(piece) <= self.size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            chunks.extend(self.split(piece, finer));
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }
        chunks
    }

    /// Greedily pack pieces into windows, carrying trailing pieces worth at
    /// most `overlap` characters into the next window.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.size && !window.is_empty() {
                push_trimmed(&mut chunks, window.iter().copied().collect());
                while total > self.overlap || (total + len > self.size && total > 0) {
                    let Some(front) = window.pop_front() else { break };
                    total -= char_len(front);
                }
            }
            window.push_back(piece);
            total += len;
        }
        if !window.is_empty() {
            push_trimmed(&mut chunks, window.iter().copied().collect());
        }
        chunks
    }

    /// Fixed windows for text with no usable break point.
    fn hard_cut(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.size).min(chars.len());
            push_trimmed(&mut chunks, chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, text: String) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

//! Sentence-respecting text chunking
//!
//! Sentences are packed greedily into windows of roughly `max_chars`
//! characters. Consecutive windows share `overlap_sentences` sentences so a
//! passage cut at a boundary still carries its context.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // Sentence-final punctuation followed by any run of whitespace.
    static ref SENTENCE_BOUNDARY_RE: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

/// A retrievable unit of the corpus.
///
/// `id` is 1-based and assigned in emission order; it is the chunk's identity
/// for the lifetime of a corpus version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
}

impl Chunk {
    /// Number chunk texts sequentially starting at 1.
    pub fn sequence(texts: Vec<String>) -> Vec<Chunk> {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk { id: i + 1, text })
            .collect()
    }
}

/// Split text into trimmed, non-empty sentences.
///
/// A boundary is `.`, `!` or `?` followed by whitespace; the punctuation
/// stays with the sentence it ends.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BOUNDARY_RE.find_iter(text) {
        // Punctuation is a single ASCII byte.
        let end = m.start() + 1;
        push_sentence(&mut sentences, &text[start..end]);
        start = m.end();
    }
    push_sentence(&mut sentences, &text[start..]);

    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, fragment: &'a str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

/// Chunk `text` into windows of at most `max_chars` characters where possible.
///
/// The budget counts every sentence's characters plus one separator per
/// sentence already in the window. When the next sentence does not fit, the
/// window is emitted and a new one starts with the last `overlap_sentences`
/// sentences of the old one, followed by the sentence that overflowed. That
/// sentence is appended whatever its size, so a single sentence longer than
/// `max_chars` becomes a chunk of its own instead of being cut.
///
/// Runs of whitespace, line breaks included, collapse to a single space, so
/// every chunk is one line of text.
pub fn chunk_text(text: &str, max_chars: usize, overlap_sentences: usize) -> Vec<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_chars = 0usize;

    for sentence in split_sentences(&collapsed) {
        let sentence_chars = sentence.chars().count();

        if current_chars + sentence_chars + current.len() <= max_chars {
            current.push(sentence);
            current_chars += sentence_chars;
            continue;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        let keep_from = current.len().saturating_sub(overlap_sentences);
        let carried = if overlap_sentences > 0 {
            current.split_off(keep_from)
        } else {
            Vec::new()
        };

        current = carried;
        current.push(sentence);
        current_chars = current.iter().map(|s| s.chars().count()).sum();
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a sentence of exactly `len` characters ending in a period.
    fn sentence(tag: usize, len: usize) -> String {
        let mut s = format!("S{}", tag);
        while s.chars().count() < len - 1 {
            s.push('x');
        }
        s.truncate(len - 1);
        s.push('.');
        s
    }

    fn corpus(lengths: &[usize]) -> (String, Vec<String>) {
        let sentences: Vec<String> = lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| sentence(i, len))
            .collect();
        (sentences.join(" "), sentences)
    }

    #[test]
    fn test_split_sentences() {
        let text = "First one. Second one!  Third one?\nFourth without end";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec!["First one.", "Second one!", "Third one?", "Fourth without end"]
        );
    }

    #[test]
    fn test_split_ignores_punctuation_without_whitespace() {
        let sentences = split_sentences("Version 3.14 is out. See e.g.the notes.");
        assert_eq!(sentences, vec!["Version 3.14 is out.", "See e.g.the notes."]);
    }

    #[test]
    fn test_split_discards_blank_fragments() {
        assert!(split_sentences("   \n\t ").is_empty());
        assert_eq!(split_sentences(".  . "), vec![".", "."]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("One sentence. Another sentence.", 500, 1);
        assert_eq!(chunks, vec!["One sentence. Another sentence."]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", 100, 1).is_empty());
        assert!(chunk_text("  \n ", 100, 1).is_empty());
    }

    #[test]
    fn test_budget_counts_separators() {
        // 10 + 10 + 1 separator = 21 chars: fits at 21, overflows at 20.
        let (text, _) = corpus(&[10, 10]);
        assert_eq!(chunk_text(&text, 21, 0).len(), 1);
        assert_eq!(chunk_text(&text, 20, 0).len(), 2);
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let (text, sentences) = corpus(&[20, 200, 20]);
        let chunks = chunk_text(&text, 50, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], sentences[1]);
        assert_eq!(chunks[1].chars().count(), 200);
    }

    #[test]
    fn test_oversized_first_sentence() {
        let (text, sentences) = corpus(&[120, 10]);
        let chunks = chunk_text(&text, 50, 1);
        assert_eq!(chunks[0], sentences[0]);
    }

    #[test]
    fn test_overlap_larger_than_chunk_carries_everything() {
        let (text, sentences) = corpus(&[10, 10, 10]);
        let chunks = chunk_text(&text, 21, 5);
        assert_eq!(chunks[0], format!("{} {}", sentences[0], sentences[1]));
        assert!(chunks[1].starts_with(&chunks[0]));
    }

    #[test]
    fn test_size_bound_holds() {
        // Sentences of 8..=30 chars; max_chars leaves room for overlap plus one sentence.
        for max_chars in [70usize, 100, 150] {
            for overlap in [0usize, 1] {
                let lengths: Vec<usize> = (0..60).map(|i| 8 + (i * 7) % 23).collect();
                let (text, _) = corpus(&lengths);
                for chunk in chunk_text(&text, max_chars, overlap) {
                    assert!(
                        chunk.chars().count() <= max_chars,
                        "chunk of {} chars exceeds {} (overlap {})",
                        chunk.chars().count(),
                        max_chars,
                        overlap
                    );
                }
            }
        }
    }

    #[test]
    fn test_overlap_sentences_shared() {
        for overlap in [1usize, 2] {
            let lengths: Vec<usize> = (0..40).map(|i| 10 + (i * 5) % 17).collect();
            let (text, _) = corpus(&lengths);
            let chunks = chunk_text(&text, 120, overlap);
            assert!(chunks.len() >= 2);

            for pair in chunks.windows(2) {
                let prev = split_sentences(&pair[0]);
                let next = split_sentences(&pair[1]);
                assert!(prev.len() >= overlap);
                assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
            }
        }
    }

    #[test]
    fn test_no_overlap_partitions_sentences() {
        let lengths: Vec<usize> = (0..30).map(|i| 12 + i % 9).collect();
        let (text, sentences) = corpus(&lengths);
        let chunks = chunk_text(&text, 80, 0);
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| split_sentences(c)).collect();
        assert_eq!(rejoined, sentences.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "Agents perceive. Agents act! Do they reason? Rational agents maximize expected utility. \
                    The environment may be partially observable.";
        let first = chunk_text(text, 40, 1);
        let second = chunk_text(text, 40, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_line_breaks_collapse_inside_chunks() {
        let text = "Intro sentence\nwraps here.\n\n--- CHUNK 9 --- appears   in the text. Last.";
        let chunks = chunk_text(text, 500, 0);
        assert_eq!(
            chunks,
            vec!["Intro sentence wraps here. --- CHUNK 9 --- appears in the text. Last."]
        );
    }

    #[test]
    fn test_sequence_assigns_one_based_ids() {
        let chunks = Chunk::sequence(vec!["a".into(), "b".into(), "c".into()]);
        let ids: Vec<usize> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(chunks[2].text, "c");
    }
}

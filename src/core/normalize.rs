//! Query normalization
//!
//! Short questions embed poorly when half their tokens are function words, so
//! questions are lowercased, stripped of punctuation, and filtered against a
//! stop-word list for the corpus language before they are embedded.

use std::collections::HashSet;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref SPANISH_STOP_WORDS: HashSet<&'static str> = HashSet::from([
        "a", "un", "una", "unas", "unos", "ante", "bajo", "cabe", "con", "contra", "de", "desde",
        "durante", "e", "el", "ella", "ellas", "ellos", "en", "entre", "esa", "esas", "ese",
        "eso", "esos", "esta", "estas", "este", "esto", "estos", "hasta", "la", "las", "le",
        "les", "lo", "los", "mas", "me", "mi", "mis", "muy", "o", "para", "pero", "por",
        "porque", "que", "qué", "se", "sin", "sobre", "su", "sus", "te", "tu", "tus", "y", "ya",
        "como", "cual", "cuales", "cuando", "donde", "es", "eres", "somos", "son",
    ]);
    static ref ENGLISH_STOP_WORDS: HashSet<&'static str> = HashSet::from([
        "a", "an", "the", "and", "or", "but", "if", "of", "at", "by", "for", "with", "about",
        "to", "from", "in", "on", "into", "over", "under", "is", "are", "was", "were", "be",
        "been", "being", "am", "do", "does", "did", "what", "which", "who", "whom", "whose",
        "this", "that", "these", "those", "it", "its", "i", "me", "my", "we", "our", "you",
        "your", "he", "him", "his", "she", "her", "they", "them", "their", "how", "why",
        "when", "where", "can", "could", "would", "should", "there", "here", "as", "so",
        "than", "too", "very", "not", "no",
    ]);
}

/// Corpus language. Selects the stop words and the no-match message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Spanish,
    English,
}

impl Language {
    pub fn stop_words(&self) -> &'static HashSet<&'static str> {
        match self {
            Language::Spanish => &SPANISH_STOP_WORDS,
            Language::English => &ENGLISH_STOP_WORDS,
        }
    }

    /// Shown to the user when no passage clears the similarity threshold.
    pub fn no_match_message(&self) -> &'static str {
        match self {
            Language::Spanish => {
                "🤖 Lo siento, no encontré información relevante sobre eso en el libro."
            }
            Language::English => {
                "🤖 Sorry, I couldn't find relevant information about that in the book."
            }
        }
    }
}

/// Lowercase, drop everything but letters, digits and whitespace, remove stop
/// words, and join the surviving tokens with single spaces.
pub fn normalize_question(question: &str, language: Language) -> String {
    let cleaned: String = question
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let stop_words = language.stop_words();
    cleaned
        .split_whitespace()
        .filter(|token| !stop_words.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

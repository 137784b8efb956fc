//! Lexer (tokenizer + tagger) for taxon names.
//!
//! Splits prepared text into word and punctuation tokens, then assigns each
//! token a [`TagKind`] using the compiled regex patterns. This is the bridge
//! between text preparation and chunking / grammar parsing.
//!
//! Pipeline: prepared text → tokenize → tag → tagged tokens

use super::error::TagError;
use super::patterns::{COMPILED_PATTERNS, CompiledPatterns};
use super::types::{TagKind, Token};

/// Characters that always form a token of their own.
fn is_standalone_punct(ch: char) -> bool {
    matches!(
        ch,
        ',' | '&' | '(' | ')' | '[' | ']' | ';' | ':' | '!' | '?' | '"' | '“' | '”'
    )
}

/// Split prepared text into tokens.
///
/// Whitespace separates tokens and is never emitted. Apostrophes, hyphens
/// and underscores stay inside words. A trailing period stays on words
/// starting with an uppercase letter (initials, abbreviations) and is
/// emitted as its own token otherwise.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for ch in text.chars() {
        if ch.is_whitespace() {
            flush_word(&mut word, &mut tokens);
        } else if is_standalone_punct(ch) {
            flush_word(&mut word, &mut tokens);
            tokens.push(ch.to_string());
        } else {
            word.push(ch);
        }
    }
    flush_word(&mut word, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<String>) {
    if word.is_empty() {
        return;
    }
    let starts_upper = word.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper && word.len() > 1 && word.ends_with('.') {
        word.pop();
        tokens.push(std::mem::take(word));
        tokens.push(".".to_string());
    } else {
        tokens.push(std::mem::take(word));
    }
}

/// A token from free text, tagged when a rule matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentToken {
    pub text: String,
    pub tag: Option<TagKind>,
}

/// Ordered-rule tagger over the closed [`TagKind`] vocabulary.
///
/// Holds only a reference to the process-wide compiled rule table, so it is
/// free to construct and safe to share across threads.
#[derive(Clone, Copy)]
pub struct Tagger {
    patterns: &'static CompiledPatterns,
}

impl Default for Tagger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tagger").finish_non_exhaustive()
    }
}

impl Tagger {
    pub fn new() -> Self {
        Self {
            patterns: &COMPILED_PATTERNS,
        }
    }

    /// Tag a single token, `None` if no rule matches.
    pub fn tag_token(&self, text: &str) -> Option<TagKind> {
        self.patterns.match_token(text)
    }

    /// Tag every token of a single name. Fails on the first untaggable token.
    ///
    /// `input` is only used for error reporting.
    pub fn tag(&self, words: &[String], input: &str) -> Result<Vec<Token>, TagError> {
        words
            .iter()
            .enumerate()
            .map(|(position, word)| match self.tag_token(word) {
                Some(tag) => Ok(Token::new(word.clone(), tag)),
                None => Err(TagError {
                    token: word.clone(),
                    position,
                    input: input.to_string(),
                }),
            })
            .collect()
    }

    /// Tag free text tokens, leaving unmatched tokens untagged.
    pub fn tag_document(&self, words: Vec<String>) -> Vec<DocumentToken> {
        words
            .into_iter()
            .map(|text| {
                let tag = self.tag_token(&text);
                DocumentToken { text, tag }
            })
            .collect()
    }
}

/// Tokenize and tag prepared text as a single name.
pub fn get_tokens(prepared: &str) -> Result<Vec<Token>, TagError> {
    Tagger::new().tag(&tokenize(prepared), prepared)
}

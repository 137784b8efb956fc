//! Tag regex patterns for taxon token classification.
//!
//! Patterns are tried sequentially against the whole token and the first
//! match wins. All patterns are compiled once at startup via LazyLock.

use std::sync::LazyLock;

use regex::Regex;

use super::types::TagKind;

/// A compiled pattern entry: regex + the tag it maps to.
struct PatternEntry {
    regex: Regex,
    tag: TagKind,
}

/// All compiled patterns, in order. First match wins.
pub(super) struct CompiledPatterns {
    patterns: Vec<PatternEntry>,
}

impl CompiledPatterns {
    /// Match a token against all patterns, returning the first matching tag.
    /// Returns `None` if no pattern matches.
    pub(super) fn match_token(&self, value: &str) -> Option<TagKind> {
        self.patterns
            .iter()
            .find(|entry| entry.regex.is_match(value))
            .map(|entry| entry.tag)
    }
}

/// Global compiled patterns, initialized once.
pub(super) static COMPILED_PATTERNS: LazyLock<CompiledPatterns> = LazyLock::new(|| {
    let patterns = build_pattern_list()
        .into_iter()
        .map(|(regex_str, tag)| PatternEntry {
            regex: Regex::new(regex_str)
                .unwrap_or_else(|e| panic!("Failed to compile regex '{}': {}", regex_str, e)),
            tag,
        })
        .collect();
    CompiledPatterns { patterns }
});

/// Build the ordered list of (regex_string, TagKind) pairs.
/// This is split from compilation to make it easier to test pattern strings.
fn build_pattern_list() -> Vec<(&'static str, TagKind)> {
    vec![
        // 1-4 digits starting with 1, 2 or 3
        (r"^[123][0-9]{0,3}$", TagKind::Year),
        (r"^,$", TagKind::Comma),
        (r"^&$", TagKind::Ampersand),
        // Capitalized word, initial or ligated particle: "Felder", "C.", "De_Nicéville"
        (r"^\p{Lu}[\p{L}\p{M}'’_\-]*\.?$", TagKind::Cap),
        // Epithet, optionally hyphenated: "karna", "c-album"
        (r"^\p{Ll}[\p{Ll}\p{M}]*(-\p{Ll}[\p{Ll}\p{M}]*)*$", TagKind::Low),
        // Rank suffixes. Shadowed by CAP above and kept only as reserved tags.
        (r"^\p{Lu}\p{Ll}+oidea$", TagKind::Superfamily),
        (r"^\p{Lu}\p{Ll}+dae$", TagKind::Family),
        (r"^\p{Lu}\p{Ll}+nae$", TagKind::Subfamily),
        (r"^\p{Lu}\p{Ll}+ini$", TagKind::Tribe),
        (r"^\p{Lu}\p{Ll}+ina$", TagKind::Subtribe),
        (r"^\($", TagKind::ParenL),
        (r"^\)$", TagKind::ParenR),
        (r"^\[$", TagKind::BracketL),
        (r"^\]$", TagKind::BracketR),
    ]
}

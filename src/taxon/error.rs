//! Error types for the taxon pipeline.
//!
//! Tagging and grammar failures are distinct: a [`TagError`] means a token
//! is outside the tag vocabulary, a [`TaxonError::GrammarParse`] means the
//! tags are valid but no derivation spans them.

use std::fmt;

use super::types::{Nonterminal, TagKind};

/// A token matched no tagging rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagError {
    /// The offending token text.
    pub token: String,
    /// 0-based token index in the tokenized input.
    pub position: usize,
    /// The normalized input the token came from.
    pub input: String,
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Untaggable token '{}' at position {} in '{}'",
            self.token, self.position, self.input
        )
    }
}

impl std::error::Error for TagError {}

/// Error type for name-to-record conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonError {
    /// Input was empty or whitespace only
    EmptyInput,

    /// A token matched no tagging rule
    Tag(TagError),

    /// Tagging succeeded but no derivation spans the tag sequence
    GrammarParse { input: String, tags: Vec<TagKind> },

    /// Input exceeds the configured token bound
    InputTooLong { tokens: usize, limit: usize },
}

impl TaxonError {
    /// Space-separated tag names, e.g. `CAP LOW COMMA YEAR`.
    fn render_tags(tags: &[TagKind]) -> String {
        tags.iter()
            .map(TagKind::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for TaxonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Empty taxon name"),
            Self::Tag(err) => write!(f, "{}", err),
            Self::GrammarParse { input, tags } => write!(
                f,
                "No taxon derivation for '{}' (tags: {})",
                input,
                Self::render_tags(tags)
            ),
            Self::InputTooLong { tokens, limit } => write!(
                f,
                "Input has {} tokens, more than the limit of {}",
                tokens, limit
            ),
        }
    }
}

impl std::error::Error for TaxonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tag(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TagError> for TaxonError {
    fn from(err: TagError) -> Self {
        Self::Tag(err)
    }
}

/// Convenience Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, TaxonError>;

/// A grammar the derivation engine cannot work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A production with an empty right-hand side
    EmptyProduction { lhs: String },

    /// A non-terminal is used (or is the start symbol) but has no productions
    MissingProductions { nonterminal: String },

    /// Unit productions form a cycle, so derivations would be unbounded
    UnitCycle { path: Vec<String> },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyProduction { lhs } => write!(f, "Empty production for {}", lhs),
            Self::MissingProductions { nonterminal } => {
                write!(f, "No productions for non-terminal {}", nonterminal)
            }
            Self::UnitCycle { path } => write!(f, "Unit production cycle: {}", path.join(" -> ")),
        }
    }
}

impl std::error::Error for GrammarError {}

impl GrammarError {
    pub(super) fn empty_production(lhs: Nonterminal) -> Self {
        Self::EmptyProduction {
            lhs: lhs.to_string(),
        }
    }

    pub(super) fn missing_productions(nonterminal: Nonterminal) -> Self {
        Self::MissingProductions {
            nonterminal: nonterminal.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_error_display() {
        let err = TagError {
            token: "5".to_string(),
            position: 2,
            input: "Aporia kamei 5".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Untaggable token '5' at position 2 in 'Aporia kamei 5'"
        );
    }

    #[test]
    fn test_grammar_parse_display_lists_tags() {
        let err = TaxonError::GrammarParse {
            input: "Aporia 1758".to_string(),
            tags: vec![TagKind::Cap, TagKind::Year],
        };
        assert_eq!(
            err.to_string(),
            "No taxon derivation for 'Aporia 1758' (tags: CAP YEAR)"
        );
    }

    #[test]
    fn test_tag_error_is_source() {
        use std::error::Error;

        let err = TaxonError::from(TagError {
            token: "%".to_string(),
            position: 0,
            input: "%".to_string(),
        });
        assert!(err.source().is_some());
        assert!(TaxonError::EmptyInput.source().is_none());
    }

    #[test]
    fn test_unit_cycle_display() {
        let err = GrammarError::UnitCycle {
            path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(err.to_string(), "Unit production cycle: A -> B -> A");
    }
}

//! Taxon name parsing.
//!
//! Turns scientific names such as `Papilio (Achillides) karna discordia
//! de Nicéville, [1893]` into structured records using a staged pipeline:
//! 1. Text preparation (NFC normalization, author particle ligation)
//! 2. Tokenizing and tagging over a closed tag vocabulary
//! 3. Chunking, to find candidate names in free text
//! 4. Chart parsing against the taxon grammar
//! 5. Record extraction from the chosen derivation

mod chunker;
mod config;
mod detector;
mod error;
mod grammar;
mod lexer;
mod parser;
mod patterns;
mod prepare;
mod record;
mod types;


pub use chunker::{ChunkLabel, ChunkNode, Chunker};
pub use config::{DerivationPolicy, ParseOptions, ParseOptionsBuilder};
pub use detector::{CandidateOutcome, DocumentReport, TaxonParser};
pub use error::{GrammarError, Result, TagError, TaxonError};
pub use grammar::{Grammar, Production};
pub use lexer::{DocumentToken, Tagger, get_tokens, tokenize};
pub use parser::{Chart, ChartParser, Derivations, ParseForest, slots_filled};
pub use prepare::{ligate_particles, prepare_text};
pub use record::{Authors, Record, RecordMeta, join_authors};
pub use types::{Nonterminal, ParseNode, Symbol, TagKind, Token};

/// Parse a single taxon name with default options.
pub fn parse_taxon(name: &str) -> Result<Record> {
    TaxonParser::new().parse(name)
}

/// Candidate taxon names found in free text, in document order.
pub fn extract_taxa(text: &str) -> Vec<String> {
    Chunker::new().extract_text(text)
}

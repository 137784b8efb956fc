//! Taxon parsing orchestrator.
//!
//! Runs the pipeline for one name: text → prepared text → tokens → tags
//! → derivations → record. For free text, the chunker first proposes
//! candidate spans and each candidate goes through the same pipeline.

use log::{debug, warn};
use rayon::prelude::*;

use super::chunker::Chunker;
use super::config::ParseOptions;
use super::error::{Result, TaxonError};
use super::grammar::Grammar;
use super::lexer::{Tagger, tokenize};
use super::parser::ChartParser;
use super::prepare::prepare_text;
use super::record::Record;
use super::types::{ParseNode, Token};

/// Outcome of parsing one chunker candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateOutcome {
    pub candidate: String,
    pub result: Result<Record>,
}

/// Candidates found in a document and what became of each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentReport {
    /// Candidate substrings in document order.
    pub candidates: Vec<String>,
    /// One outcome per candidate, same order.
    pub outcomes: Vec<CandidateOutcome>,
}

impl DocumentReport {
    /// Successfully parsed records with their candidate text.
    pub fn records(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .ok()
                .map(|record| (outcome.candidate.as_str(), record))
        })
    }

    /// Candidates that failed, with their error.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &TaxonError)> {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .err()
                .map(|err| (outcome.candidate.as_str(), err))
        })
    }
}

/// Stateless taxon name parser. Cheap to construct and `Sync`.
#[derive(Debug, Clone)]
pub struct TaxonParser {
    tagger: Tagger,
    chunker: Chunker,
    grammar: &'static Grammar,
    options: ParseOptions,
}

impl Default for TaxonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TaxonParser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            tagger: Tagger::new(),
            chunker: Chunker::new(),
            grammar: Grammar::taxon(),
            options,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a single taxon name into a record.
    pub fn parse(&self, name: &str) -> Result<Record> {
        let (prepared, tokens) = self.tag_name(name)?;
        let parser = ChartParser::new(self.grammar);
        let forest = parser
            .parse(&tokens)
            .ok_or_else(|| grammar_parse_error(prepared.as_str(), &tokens))?;

        if log::log_enabled!(log::Level::Debug) {
            let count = forest.count_derivations();
            if count > 1 {
                debug!("'{}' has {} derivations", prepared, count);
            }
        }

        let tree = forest
            .select(self.options.policy, self.options.max_derivations)
            .ok_or_else(|| grammar_parse_error(prepared.as_str(), &tokens))?;
        Ok(Record::from_tree(&tree, self.options.flat_authors))
    }

    /// Every derivation of `name`, in enumeration order, up to
    /// `max_derivations`.
    pub fn parse_all(&self, name: &str) -> Result<Vec<ParseNode>> {
        let (prepared, tokens) = self.tag_name(name)?;
        let parser = ChartParser::new(self.grammar);
        let forest = parser
            .parse(&tokens)
            .ok_or_else(|| grammar_parse_error(prepared.as_str(), &tokens))?;

        let limit = self.options.max_derivations;
        let trees: Vec<ParseNode> = forest.derivations().take(limit).collect();
        if trees.len() == limit && forest.count_derivations() > limit {
            warn!(
                "Derivations of '{}' truncated at {} of {}",
                prepared,
                limit,
                forest.count_derivations()
            );
        }
        Ok(trees)
    }

    /// Extract candidate names from free text and parse each in parallel.
    ///
    /// Failed candidates are reported in the outcome list; they never stop
    /// the remaining candidates.
    pub fn parse_document(&self, text: &str) -> DocumentReport {
        let candidates = self.extract_candidates(text);
        debug!("Found {} taxon candidates", candidates.len());

        let outcomes = candidates
            .par_iter()
            .map(|candidate| {
                let result = self.parse(candidate);
                if let Err(e) = &result {
                    warn!("Failed to parse candidate '{}': {}", candidate, e);
                }
                CandidateOutcome {
                    candidate: candidate.clone(),
                    result,
                }
            })
            .collect();

        DocumentReport {
            candidates,
            outcomes,
        }
    }

    /// Parse independent names in parallel, keeping input order.
    pub fn parse_names(&self, names: &[&str]) -> Vec<Result<Record>> {
        names.par_iter().map(|name| self.parse(name)).collect()
    }

    /// Candidate taxon substrings of `text`, in document order.
    pub fn extract_candidates(&self, text: &str) -> Vec<String> {
        let prepared = prepare_text(text);
        let tokens = self.tagger.tag_document(tokenize(&prepared));
        self.chunker.extract(&tokens)
    }

    fn tag_name(&self, name: &str) -> Result<(String, Vec<Token>)> {
        let prepared = prepare_text(name);
        let words = tokenize(&prepared);
        if words.is_empty() {
            return Err(TaxonError::EmptyInput);
        }
        if words.len() > self.options.max_tokens {
            return Err(TaxonError::InputTooLong {
                tokens: words.len(),
                limit: self.options.max_tokens,
            });
        }

        let tokens = self.tagger.tag(&words, &prepared)?;
        debug!(
            "Tags for '{}': {}",
            prepared,
            tokens
                .iter()
                .map(|t| t.tag.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        );
        Ok((prepared, tokens))
    }
}

fn grammar_parse_error(input: &str, tokens: &[Token]) -> TaxonError {
    TaxonError::GrammarParse {
        input: input.to_string(),
        tags: tokens.iter().map(|t| t.tag).collect(),
    }
}

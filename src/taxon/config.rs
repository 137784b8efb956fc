//! Parse options.
//!
//! Limits that bound the work done per name, author rendering, and the
//! policy for choosing among several derivations.

use derive_builder::Builder;
use serde::Serialize;

pub const DEFAULT_MAX_TOKENS: usize = 64;
pub const DEFAULT_MAX_DERIVATIONS: usize = 256;

/// How to choose among several derivations of the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationPolicy {
    /// The first derivation in enumeration order.
    #[default]
    FirstDeclared,
    /// The derivation filling the most optional slots (subgenus, species,
    /// subspecies, authority). Ties keep enumeration order.
    MostSlotsFilled,
}

/// Options for [`TaxonParser`](super::TaxonParser).
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(build_fn(skip))]
pub struct ParseOptions {
    /// Render authors as one joined string instead of a list.
    #[builder(default)]
    pub flat_authors: bool,
    /// Names with more tokens are rejected before parsing.
    #[builder(default)]
    pub max_tokens: usize,
    /// Upper bound on derivations inspected when choosing one.
    #[builder(default)]
    pub max_derivations: usize,
    #[builder(default)]
    pub policy: DerivationPolicy,
}

impl ParseOptionsBuilder {
    pub fn build(&self) -> Result<ParseOptions, String> {
        let max_tokens = self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err("max_tokens must be at least 1".to_string());
        }
        let max_derivations = self.max_derivations.unwrap_or(DEFAULT_MAX_DERIVATIONS);
        if max_derivations == 0 {
            return Err("max_derivations must be at least 1".to_string());
        }
        Ok(ParseOptions {
            flat_authors: self.flat_authors.unwrap_or_default(),
            max_tokens,
            max_derivations,
            policy: self.policy.unwrap_or_default(),
        })
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            flat_authors: false,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_derivations: DEFAULT_MAX_DERIVATIONS,
            policy: DerivationPolicy::default(),
        }
    }
}

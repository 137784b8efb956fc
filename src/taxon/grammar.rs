//! Context-free grammar over the tag alphabet.
//!
//! A [`Grammar`] is a start symbol plus an ordered list of productions.
//! Declaration order is significant: the parser enumerates derivations
//! trying alternatives in the order written.
//!
//! The taxon grammar:
//!
//! ```text
//! Taxon          -> NameCore Authority | NameCore | NameCore ParenAuthority
//! NameCore       -> Genus | Species | Genus Species | Genus Species Subspecies | Species Subspecies
//! Genus          -> GenusName | GenusName '(' Subgenus ')'
//! GenusName      -> CAP
//! Subgenus       -> CAP
//! Species        -> LOW
//! Subspecies     -> LOW
//! ParenAuthority -> '(' Authority ')'
//! Authority      -> AuthorList ',' Year
//! AuthorList     -> AuthorName | AuthorSequence '&' AuthorName
//! AuthorSequence -> AuthorName | AuthorSequence ',' AuthorName
//! AuthorName     -> CAP | CAP CAP | CAP CAP CAP
//! Year           -> YearValue | BracketedYear
//! BracketedYear  -> '[' YearValue ']'
//! YearValue      -> YEAR
//! ```
//!
//! `AuthorSequence` is left-recursive, so author lists have no arity limit;
//! a list of more than one author always ends with exactly one `&`.

use std::collections::HashMap;
use std::sync::LazyLock;

use strum::IntoEnumIterator;

use super::error::GrammarError;
use super::types::{Nonterminal, Symbol};

/// A production `lhs -> rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: Nonterminal,
    pub rhs: Vec<Symbol>,
}

impl Production {
    pub fn new(lhs: Nonterminal, rhs: &[Symbol]) -> Self {
        Self {
            lhs,
            rhs: rhs.to_vec(),
        }
    }

    /// `Some(B)` for a unit production `A -> B`.
    fn unit_target(&self) -> Option<Nonterminal> {
        match self.rhs.as_slice() {
            [Symbol::N(nt)] => Some(*nt),
            _ => None,
        }
    }
}

impl std::fmt::Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ->", self.lhs)?;
        for symbol in &self.rhs {
            write!(f, " {symbol}")?;
        }
        Ok(())
    }
}

/// A validated, indexed grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    start: Nonterminal,
    productions: Vec<Production>,
    by_lhs: HashMap<Nonterminal, Vec<usize>>,
}

impl Grammar {
    /// Build a grammar, rejecting shapes the derivation engine cannot
    /// enumerate finitely: empty productions, non-terminals without
    /// productions, and cycles of unit productions.
    pub fn new(start: Nonterminal, productions: Vec<Production>) -> Result<Self, GrammarError> {
        let mut by_lhs: HashMap<Nonterminal, Vec<usize>> = HashMap::new();
        for (idx, production) in productions.iter().enumerate() {
            if production.rhs.is_empty() {
                return Err(GrammarError::empty_production(production.lhs));
            }
            by_lhs.entry(production.lhs).or_default().push(idx);
        }

        if !by_lhs.contains_key(&start) {
            return Err(GrammarError::missing_productions(start));
        }
        for production in &productions {
            for symbol in &production.rhs {
                if let Symbol::N(nt) = symbol
                    && !by_lhs.contains_key(nt)
                {
                    return Err(GrammarError::missing_productions(*nt));
                }
            }
        }

        let grammar = Self {
            start,
            productions,
            by_lhs,
        };
        grammar.check_unit_cycles()?;
        Ok(grammar)
    }

    /// The shared taxon grammar, built once.
    pub fn taxon() -> &'static Grammar {
        &TAXON_GRAMMAR
    }

    pub fn start(&self) -> Nonterminal {
        self.start
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, idx: usize) -> &Production {
        &self.productions[idx]
    }

    /// Indices of the productions for `lhs`, in declaration order.
    pub fn productions_for(&self, lhs: Nonterminal) -> &[usize] {
        self.by_lhs.get(&lhs).map(Vec::as_slice).unwrap_or(&[])
    }

    fn check_unit_cycles(&self) -> Result<(), GrammarError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(
            grammar: &Grammar,
            nt: Nonterminal,
            marks: &mut HashMap<Nonterminal, Mark>,
            path: &mut Vec<Nonterminal>,
        ) -> Result<(), GrammarError> {
            match marks.get(&nt).copied().unwrap_or(Mark::Unvisited) {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    let from = path.iter().position(|p| *p == nt).unwrap_or(0);
                    let mut cycle: Vec<String> = path[from..].iter().map(|p| p.to_string()).collect();
                    cycle.push(nt.to_string());
                    return Err(GrammarError::UnitCycle { path: cycle });
                }
                Mark::Unvisited => {}
            }

            marks.insert(nt, Mark::InProgress);
            path.push(nt);
            for &idx in grammar.productions_for(nt) {
                if let Some(target) = grammar.productions[idx].unit_target() {
                    visit(grammar, target, marks, path)?;
                }
            }
            path.pop();
            marks.insert(nt, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for nt in Nonterminal::iter() {
            if self.by_lhs.contains_key(&nt) {
                visit(self, nt, &mut marks, &mut Vec::new())?;
            }
        }
        Ok(())
    }
}

// Convenience aliases to keep production definitions concise.
use Nonterminal as Nt;
use Symbol::{N, T};
use super::types::TagKind as Tk;

/// All taxon productions in declaration order.
static TAXON_PRODUCTIONS: &[(Nt, &[Symbol])] = &[
    // Taxon
    (Nt::Taxon, &[N(Nt::NameCore), N(Nt::Authority)]),
    (Nt::Taxon, &[N(Nt::NameCore)]),
    (Nt::Taxon, &[N(Nt::NameCore), N(Nt::ParenAuthority)]),
    // Name core
    (Nt::NameCore, &[N(Nt::Genus)]),
    (Nt::NameCore, &[N(Nt::Species)]),
    (Nt::NameCore, &[N(Nt::Genus), N(Nt::Species)]),
    (Nt::NameCore, &[N(Nt::Genus), N(Nt::Species), N(Nt::Subspecies)]),
    (Nt::NameCore, &[N(Nt::Species), N(Nt::Subspecies)]),
    // Genus, optional subgenus in parentheses
    (Nt::Genus, &[N(Nt::GenusName)]),
    (
        Nt::Genus,
        &[N(Nt::GenusName), T(Tk::ParenL), N(Nt::Subgenus), T(Tk::ParenR)],
    ),
    (Nt::GenusName, &[T(Tk::Cap)]),
    (Nt::Subgenus, &[T(Tk::Cap)]),
    // Epithets
    (Nt::Species, &[T(Tk::Low)]),
    (Nt::Subspecies, &[T(Tk::Low)]),
    // Authority
    (
        Nt::ParenAuthority,
        &[T(Tk::ParenL), N(Nt::Authority), T(Tk::ParenR)],
    ),
    (
        Nt::Authority,
        &[N(Nt::AuthorList), T(Tk::Comma), N(Nt::Year)],
    ),
    (Nt::AuthorList, &[N(Nt::AuthorName)]),
    (
        Nt::AuthorList,
        &[N(Nt::AuthorSequence), T(Tk::Ampersand), N(Nt::AuthorName)],
    ),
    (Nt::AuthorSequence, &[N(Nt::AuthorName)]),
    (
        Nt::AuthorSequence,
        &[N(Nt::AuthorSequence), T(Tk::Comma), N(Nt::AuthorName)],
    ),
    (Nt::AuthorName, &[T(Tk::Cap)]),
    (Nt::AuthorName, &[T(Tk::Cap), T(Tk::Cap)]),
    (Nt::AuthorName, &[T(Tk::Cap), T(Tk::Cap), T(Tk::Cap)]),
    // Year, optionally bracketed
    (Nt::Year, &[N(Nt::YearValue)]),
    (Nt::Year, &[N(Nt::BracketedYear)]),
    (
        Nt::BracketedYear,
        &[T(Tk::BracketL), N(Nt::YearValue), T(Tk::BracketR)],
    ),
    (Nt::YearValue, &[T(Tk::Year)]),
];

static TAXON_GRAMMAR: LazyLock<Grammar> = LazyLock::new(|| {
    let productions = TAXON_PRODUCTIONS
        .iter()
        .map(|(lhs, rhs)| Production::new(*lhs, rhs))
        .collect();
    Grammar::new(Nt::Taxon, productions)
        .unwrap_or_else(|e| panic!("Invalid built-in taxon grammar: {}", e))
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxon_grammar_builds() {
        let g = Grammar::taxon();
        assert_eq!(g.start(), Nt::Taxon);
        assert_eq!(g.productions().len(), TAXON_PRODUCTIONS.len());
    }

    #[test]
    fn test_every_nonterminal_has_productions() {
        let g = Grammar::taxon();
        for nt in Nonterminal::iter() {
            assert!(!g.productions_for(nt).is_empty(), "{nt} has no productions");
        }
    }

    #[test]
    fn test_productions_in_declared_order() {
        let g = Grammar::taxon();
        let taxon: Vec<String> = g
            .productions_for(Nt::Taxon)
            .iter()
            .map(|&idx| g.production(idx).to_string())
            .collect();
        assert_eq!(
            taxon,
            vec![
                "Taxon -> NameCore Authority",
                "Taxon -> NameCore",
                "Taxon -> NameCore ParenAuthority",
            ]
        );
    }

    #[test]
    fn test_production_display_quotes_terminals() {
        let p = Production::new(Nt::BracketedYear, &[T(Tk::BracketL), N(Nt::YearValue), T(Tk::BracketR)]);
        assert_eq!(
            p.to_string(),
            "BracketedYear -> 'BRACKET_L' YearValue 'BRACKET_R'"
        );
    }

    #[test]
    fn test_rejects_empty_production() {
        let err = Grammar::new(Nt::Taxon, vec![Production::new(Nt::Taxon, &[])]).unwrap_err();
        assert_eq!(
            err,
            GrammarError::EmptyProduction {
                lhs: "Taxon".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_missing_productions() {
        let err = Grammar::new(
            Nt::Taxon,
            vec![Production::new(Nt::Taxon, &[N(Nt::Genus)])],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GrammarError::MissingProductions {
                nonterminal: "Genus".to_string()
            }
        );

        let err = Grammar::new(Nt::Taxon, vec![]).unwrap_err();
        assert!(matches!(err, GrammarError::MissingProductions { .. }));
    }

    #[test]
    fn test_rejects_unit_cycle() {
        let err = Grammar::new(
            Nt::Taxon,
            vec![
                Production::new(Nt::Taxon, &[N(Nt::Genus)]),
                Production::new(Nt::Genus, &[N(Nt::Taxon)]),
                Production::new(Nt::Genus, &[T(Tk::Cap)]),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GrammarError::UnitCycle {
                path: vec!["Taxon".into(), "Genus".into(), "Taxon".into()]
            }
        );
    }

    #[test]
    fn test_left_recursion_is_not_a_unit_cycle() {
        let g = Grammar::new(
            Nt::AuthorSequence,
            vec![
                Production::new(Nt::AuthorSequence, &[N(Nt::AuthorName)]),
                Production::new(
                    Nt::AuthorSequence,
                    &[N(Nt::AuthorSequence), T(Tk::Comma), N(Nt::AuthorName)],
                ),
                Production::new(Nt::AuthorName, &[T(Tk::Cap)]),
            ],
        );
        assert!(g.is_ok());
    }
}

//! Chart parser for taxon names.
//!
//! Parsing runs in three steps:
//! 1. An Earley recognizer fills a chart with every completed
//!    `(non-terminal, start, end)` span reachable from the start symbol.
//! 2. A packed forest is built top-down from `(start, 0, n)`, keeping for
//!    each span only the productions and child boundaries backed by the
//!    chart, so every forest node yields at least one tree.
//! 3. Derivations are enumerated lazily from the forest.
//!
//! Enumeration order is fixed: productions in declaration order, then child
//! boundaries in ascending lexicographic order (shortest left child first),
//! then the children's own derivations, leftmost child varying slowest.
//! Identical input always yields the same sequence.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::config::DerivationPolicy;
use super::grammar::Grammar;
use super::types::{Nonterminal, ParseNode, Symbol, Token};

/// An Earley item: production, dot position, and origin set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Item {
    production: usize,
    dot: usize,
    origin: usize,
}

impl Item {
    fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }
}

/// Completed spans found by the recognizer.
#[derive(Debug, Default)]
pub struct Chart {
    ends: HashMap<(Nonterminal, usize), BTreeSet<usize>>,
}

impl Chart {
    /// Whether `nt` derives `tokens[start..end]`.
    pub fn spans(&self, nt: Nonterminal, start: usize, end: usize) -> bool {
        self.ends
            .get(&(nt, start))
            .is_some_and(|ends| ends.contains(&end))
    }

    fn ends_from(&self, nt: Nonterminal, start: usize) -> impl Iterator<Item = usize> + '_ {
        self.ends.get(&(nt, start)).into_iter().flatten().copied()
    }
}

/// Earley chart parser over a borrowed grammar.
#[derive(Debug, Clone, Copy)]
pub struct ChartParser<'g> {
    grammar: &'g Grammar,
}

impl<'g> ChartParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Run the Earley recognizer over the tag sequence of `tokens`.
    pub fn recognize(&self, tokens: &[Token]) -> Chart {
        let n = tokens.len();
        let mut sets: Vec<Vec<Item>> = vec![Vec::new(); n + 1];
        let mut seen: Vec<HashSet<Item>> = vec![HashSet::new(); n + 1];
        let mut chart = Chart::default();

        let mut add = |sets: &mut Vec<Vec<Item>>, at: usize, item: Item| {
            if seen[at].insert(item) {
                sets[at].push(item);
            }
        };

        for &production in self.grammar.productions_for(self.grammar.start()) {
            add(
                &mut sets,
                0,
                Item {
                    production,
                    dot: 0,
                    origin: 0,
                },
            );
        }

        for i in 0..=n {
            let mut k = 0;
            while k < sets[i].len() {
                let item = sets[i][k];
                k += 1;

                let production = self.grammar.production(item.production);
                match production.rhs.get(item.dot) {
                    // Complete: no empty productions, so origin < i and
                    // sets[origin] is final.
                    None => {
                        chart
                            .ends
                            .entry((production.lhs, item.origin))
                            .or_default()
                            .insert(i);
                        let waiting: Vec<Item> = sets[item.origin]
                            .iter()
                            .filter(|w| self.next_symbol(w) == Some(Symbol::N(production.lhs)))
                            .map(|w| w.advance())
                            .collect();
                        for advanced in waiting {
                            add(&mut sets, i, advanced);
                        }
                    }
                    // Predict
                    Some(Symbol::N(nt)) => {
                        for &p in self.grammar.productions_for(*nt) {
                            add(
                                &mut sets,
                                i,
                                Item {
                                    production: p,
                                    dot: 0,
                                    origin: i,
                                },
                            );
                        }
                    }
                    // Scan
                    Some(Symbol::T(tag)) => {
                        if i < n && tokens[i].tag == *tag {
                            add(&mut sets, i + 1, item.advance());
                        }
                    }
                }
            }
        }

        chart
    }

    /// Parse `tokens` into a packed forest, `None` if the start symbol does
    /// not span the whole input.
    pub fn parse<'a>(&'a self, tokens: &'a [Token]) -> Option<ParseForest<'a>> {
        if tokens.is_empty() {
            return None;
        }
        let chart = self.recognize(tokens);
        let start = self.grammar.start();
        if !chart.spans(start, 0, tokens.len()) {
            return None;
        }

        let mut forest = ParseForest {
            grammar: self.grammar,
            tokens,
            nodes: HashMap::new(),
        };
        forest.expand(&chart, start, 0, tokens.len());
        Some(forest)
    }

    fn next_symbol(&self, item: &Item) -> Option<Symbol> {
        self.grammar
            .production(item.production)
            .rhs
            .get(item.dot)
            .copied()
    }
}

/// One way to derive a forest node: a production and the boundaries of its
/// children (`bounds[k]..bounds[k + 1]` is child `k`).
#[derive(Debug, Clone)]
struct PackedNode {
    production: usize,
    bounds: Vec<usize>,
}

/// All derivations of a token sequence, shared as a packed forest.
#[derive(Debug)]
pub struct ParseForest<'a> {
    grammar: &'a Grammar,
    tokens: &'a [Token],
    nodes: HashMap<(Nonterminal, usize, usize), Vec<PackedNode>>,
}

impl<'a> ParseForest<'a> {
    fn expand(&mut self, chart: &Chart, nt: Nonterminal, start: usize, end: usize) {
        if self.nodes.contains_key(&(nt, start, end)) {
            return;
        }

        let grammar = self.grammar;
        let mut packed = Vec::new();
        for &production in grammar.productions_for(nt) {
            let rhs = &grammar.production(production).rhs;
            let mut bounds = vec![start];
            self.collect_splits(chart, rhs, end, production, &mut bounds, &mut packed);
        }

        let children: Vec<(Nonterminal, usize, usize)> = packed
            .iter()
            .flat_map(|pn| {
                let rhs = &grammar.production(pn.production).rhs;
                rhs.iter().enumerate().filter_map(|(k, symbol)| match symbol {
                    Symbol::N(child) => Some((*child, pn.bounds[k], pn.bounds[k + 1])),
                    Symbol::T(_) => None,
                })
            })
            .collect();

        self.nodes.insert((nt, start, end), packed);
        for (child, child_start, child_end) in children {
            self.expand(chart, child, child_start, child_end);
        }
    }

    /// Depth-first search over child boundaries backed by the chart.
    fn collect_splits(
        &self,
        chart: &Chart,
        rhs: &[Symbol],
        end: usize,
        production: usize,
        bounds: &mut Vec<usize>,
        out: &mut Vec<PackedNode>,
    ) {
        let idx = bounds.len() - 1;
        let pos = bounds[idx];
        if idx == rhs.len() {
            if pos == end {
                out.push(PackedNode {
                    production,
                    bounds: bounds.clone(),
                });
            }
            return;
        }

        // Every remaining symbol consumes at least one token.
        let remaining = rhs.len() - idx - 1;
        match rhs[idx] {
            Symbol::T(tag) => {
                if pos < end && self.tokens[pos].tag == tag {
                    bounds.push(pos + 1);
                    self.collect_splits(chart, rhs, end, production, bounds, out);
                    bounds.pop();
                }
            }
            Symbol::N(nt) => {
                for next in chart.ends_from(nt, pos) {
                    if next + remaining > end {
                        break;
                    }
                    bounds.push(next);
                    self.collect_splits(chart, rhs, end, production, bounds, out);
                    bounds.pop();
                }
            }
        }
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    /// Lazily enumerate every derivation rooted at the start symbol.
    pub fn derivations(&self) -> Derivations<'_> {
        Derivations {
            inner: self.trees(self.grammar.start(), 0, self.tokens.len()),
        }
    }

    /// Number of derivations, saturating at `usize::MAX`, without building trees.
    pub fn count_derivations(&self) -> usize {
        let mut memo = HashMap::new();
        self.count(self.grammar.start(), 0, self.tokens.len(), &mut memo)
    }

    pub fn is_ambiguous(&self) -> bool {
        self.count_derivations() > 1
    }

    fn count(
        &self,
        nt: Nonterminal,
        start: usize,
        end: usize,
        memo: &mut HashMap<(Nonterminal, usize, usize), usize>,
    ) -> usize {
        if let Some(&n) = memo.get(&(nt, start, end)) {
            return n;
        }
        let mut total = 0usize;
        for pn in self.packed(nt, start, end) {
            let rhs = &self.grammar.production(pn.production).rhs;
            let mut product = 1usize;
            for (k, symbol) in rhs.iter().enumerate() {
                if let Symbol::N(child) = symbol {
                    let n = self.count(*child, pn.bounds[k], pn.bounds[k + 1], memo);
                    product = product.saturating_mul(n);
                }
            }
            total = total.saturating_add(product);
        }
        memo.insert((nt, start, end), total);
        total
    }

    fn packed(&self, nt: Nonterminal, start: usize, end: usize) -> &[PackedNode] {
        self.nodes
            .get(&(nt, start, end))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn trees(
        &self,
        nt: Nonterminal,
        start: usize,
        end: usize,
    ) -> Box<dyn Iterator<Item = ParseNode> + '_> {
        Box::new(self.packed(nt, start, end).iter().flat_map(move |pn| {
            let rhs = self.grammar.production(pn.production).rhs.as_slice();
            self.children(rhs, &pn.bounds, 0)
                .map(move |children| ParseNode::Tree {
                    label: nt,
                    children,
                })
        }))
    }

    fn children<'s>(
        &'s self,
        rhs: &'s [Symbol],
        bounds: &'s [usize],
        idx: usize,
    ) -> Box<dyn Iterator<Item = Vec<ParseNode>> + 's> {
        if idx == rhs.len() {
            return Box::new(std::iter::once(Vec::with_capacity(rhs.len())));
        }

        let heads: Box<dyn Iterator<Item = ParseNode> + 's> = match rhs[idx] {
            Symbol::T(_) => Box::new(std::iter::once(ParseNode::Leaf(
                self.tokens[bounds[idx]].clone(),
            ))),
            Symbol::N(nt) => self.trees(nt, bounds[idx], bounds[idx + 1]),
        };

        Box::new(heads.flat_map(move |head| {
            self.children(rhs, bounds, idx + 1).map(move |tail| {
                let mut row = Vec::with_capacity(tail.len() + 1);
                row.push(head.clone());
                row.extend(tail);
                row
            })
        }))
    }

    /// Pick one derivation according to `policy`.
    ///
    /// `MostSlotsFilled` inspects at most `max_derivations` candidates.
    pub fn select(&self, policy: DerivationPolicy, max_derivations: usize) -> Option<ParseNode> {
        match policy {
            DerivationPolicy::FirstDeclared => self.derivations().next(),
            DerivationPolicy::MostSlotsFilled => {
                let total = self.count_derivations();
                if total > max_derivations {
                    log::warn!(
                        "Derivation enumeration capped at {} of {} candidates",
                        max_derivations,
                        total
                    );
                }
                let mut best: Option<(usize, ParseNode)> = None;
                for tree in self.derivations().take(max_derivations) {
                    let score = slots_filled(&tree);
                    if best.as_ref().is_none_or(|(top, _)| score > *top) {
                        best = Some((score, tree));
                    }
                }
                best.map(|(_, tree)| tree)
            }
        }
    }
}

/// Lazily produced derivations, in the declared enumeration order.
pub struct Derivations<'a> {
    inner: Box<dyn Iterator<Item = ParseNode> + 'a>,
}

impl Iterator for Derivations<'_> {
    type Item = ParseNode;

    fn next(&mut self) -> Option<ParseNode> {
        self.inner.next()
    }
}

/// Labels counted as optional slots by [`DerivationPolicy::MostSlotsFilled`].
const OPTIONAL_SLOTS: &[Nonterminal] = &[
    Nonterminal::Subgenus,
    Nonterminal::Species,
    Nonterminal::Subspecies,
    Nonterminal::Authority,
];

/// Number of distinct optional slots present in `tree`.
pub fn slots_filled(tree: &ParseNode) -> usize {
    OPTIONAL_SLOTS
        .iter()
        .filter(|label| tree.find(**label).is_some())
        .count()
}

//! Core types for taxon name parsing.
//!
//! This module defines:
//! - The closed tag vocabulary ([`TagKind`]) assigned to every token
//! - The [`Token`] struct linking surface text to its tag
//! - Grammar symbols ([`Nonterminal`], [`Symbol`])
//! - Parse tree nodes ([`ParseNode`]) produced by the chart parser

use std::fmt;

use serde::Serialize;
use strum::EnumIter;

/// Lexical tag of a token (type-safe, not stringly-typed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagKind {
    Year,      // "1758", "2021"
    Comma,     // ","
    Ampersand, // "&"
    Cap,       // "Papilio", "C.", "De_Nicéville"
    Low,       // "karna", "discordia"
    ParenL,    // "("
    ParenR,    // ")"
    BracketL,  // "["
    BracketR,  // "]"

    // Rank tags, declared after CAP and therefore never assigned.
    Superfamily, // "Papilionoidea"
    Family,      // "Papilionidae"
    Subfamily,   // "Papilioninae"
    Tribe,       // "Papilionini"
    Subtribe,    // "Papilionina"
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Comma => "COMMA",
            Self::Ampersand => "AMPERSAND",
            Self::Cap => "CAP",
            Self::Low => "LOW",
            Self::ParenL => "PAREN_L",
            Self::ParenR => "PAREN_R",
            Self::BracketL => "BRACKET_L",
            Self::BracketR => "BRACKET_R",
            Self::Superfamily => "SUPERFAMILY",
            Self::Family => "FAMILY",
            Self::Subfamily => "SUBFAMILY",
            Self::Tribe => "TRIBE",
            Self::Subtribe => "SUBTRIBE",
        }
    }

    /// Whether the tag belongs to the reserved rank set (family and friends).
    pub fn is_rank(&self) -> bool {
        matches!(
            self,
            Self::Superfamily | Self::Family | Self::Subfamily | Self::Tribe | Self::Subtribe
        )
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged token. `text` is the surface form after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub tag: TagKind,
}

impl Token {
    pub fn new(text: impl Into<String>, tag: TagKind) -> Self {
        Self {
            text: text.into(),
            tag,
        }
    }
}

/// Grammar non-terminals (parse tree labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, EnumIter)]
pub enum Nonterminal {
    Taxon,
    NameCore,
    Genus,
    GenusName,
    Subgenus,
    Species,
    Subspecies,
    ParenAuthority,
    Authority,
    AuthorList,
    AuthorSequence,
    AuthorName,
    Year,
    BracketedYear,
    YearValue,
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A grammar symbol: a terminal tag or a non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    T(TagKind),
    N(Nonterminal),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::T(tag) => write!(f, "'{tag}'"),
            Symbol::N(nt) => write!(f, "{nt}"),
        }
    }
}

/// A node in the parse tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNode {
    Leaf(Token),
    Tree {
        label: Nonterminal,
        children: Vec<ParseNode>,
    },
}

impl ParseNode {
    /// Get the tag of this node (for leaf tokens) or None (for trees)
    pub fn tag(&self) -> Option<TagKind> {
        match self {
            ParseNode::Leaf(token) => Some(token.tag),
            ParseNode::Tree { .. } => None,
        }
    }

    /// Get the label of this node (for trees) or None (for leaf tokens)
    pub fn label(&self) -> Option<Nonterminal> {
        match self {
            ParseNode::Tree { label, .. } => Some(*label),
            ParseNode::Leaf(_) => None,
        }
    }

    pub fn children(&self) -> &[ParseNode] {
        match self {
            ParseNode::Tree { children, .. } => children,
            ParseNode::Leaf(_) => &[],
        }
    }

    /// All leaf tokens, left to right.
    pub fn leaves(&self) -> Vec<&Token> {
        let mut result = Vec::new();
        collect_leaves(self, &mut result);
        result
    }

    /// Pre-order, left-to-right search for the first subtree with `label`
    /// (including `self`).
    pub fn find(&self, label: Nonterminal) -> Option<&ParseNode> {
        if self.label() == Some(label) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(label))
    }

    /// Every subtree labelled `label`, in pre-order.
    pub fn find_all(&self, label: Nonterminal) -> Vec<&ParseNode> {
        let mut result = Vec::new();
        collect_labelled(self, label, &mut result);
        result
    }
}

fn collect_leaves<'a>(node: &'a ParseNode, result: &mut Vec<&'a Token>) {
    match node {
        ParseNode::Leaf(token) => result.push(token),
        ParseNode::Tree { children, .. } => {
            for child in children {
                collect_leaves(child, result);
            }
        }
    }
}

fn collect_labelled<'a>(node: &'a ParseNode, label: Nonterminal, result: &mut Vec<&'a ParseNode>) {
    if node.label() == Some(label) {
        result.push(node);
    }
    for child in node.children() {
        collect_labelled(child, label, result);
    }
}

/// Bracketed notation: `(Genus (GenusName Aporia/CAP))`.
impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseNode::Leaf(token) => write!(f, "{}/{}", token.text, token.tag),
            ParseNode::Tree { label, children } => {
                write!(f, "({label}")?;
                for child in children {
                    write!(f, " {child}")?;
                }
                write!(f, ")")
            }
        }
    }
}

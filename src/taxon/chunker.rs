//! Shallow chunk grammar for locating taxon-shaped spans in free text.
//!
//! Chunk rules are written over tag names in angle brackets and compiled to
//! regexes over a `<TAG>` rendering of the current node sequence. Rules run
//! as a cascade: NAME groups tokens, AUTHORITY groups NAME chunks, TAXON
//! groups both. Each stage takes leftmost, greedy, non-overlapping matches.
//!
//! The chunker only checks shape. The grammar parser decides whether a
//! candidate really is a taxon name.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::lexer::{DocumentToken, Tagger, tokenize};
use super::prepare::prepare_text;
use super::types::TagKind;

/// Rendering of an untagged token. Never matches a rule.
const UNTAGGED: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkLabel {
    Name,
    Authority,
    Taxon,
}

impl ChunkLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Authority => "AUTHORITY",
            Self::Taxon => "TAXON",
        }
    }
}

impl std::fmt::Display for ChunkLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chunk rules in cascade order.
const CHUNK_GRAMMAR: &[(ChunkLabel, &str)] = &[
    // Capitalized names up to three tokens, possibly led by a list separator
    (ChunkLabel::Name, "<COMMA|AMPERSAND>?<CAP>{1,3}"),
    // Name groups followed by a year
    (
        ChunkLabel::Authority,
        "<PAREN_L>?<NAME>+<COMMA><BRACKET_L>?<YEAR><BRACKET_R>?<PAREN_R>?",
    ),
    // Genus, optional subgenus, one or two epithets, authority
    (
        ChunkLabel::Taxon,
        "<NAME>(<PAREN_L><NAME><PAREN_R>)?<LOW>{1,2}<AUTHORITY>",
    ),
];

/// A node of the chunk tree: a document token or a labelled chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkNode {
    Token(DocumentToken),
    Chunk {
        label: ChunkLabel,
        children: Vec<ChunkNode>,
    },
}

impl ChunkNode {
    pub fn label(&self) -> Option<ChunkLabel> {
        match self {
            ChunkNode::Chunk { label, .. } => Some(*label),
            ChunkNode::Token(_) => None,
        }
    }

    /// Name this node contributes to the `<TAG>` rendering.
    fn grammar_name(&self) -> &'static str {
        match self {
            ChunkNode::Chunk { label, .. } => label.as_str(),
            ChunkNode::Token(token) => token.tag.map_or(UNTAGGED, |tag| tag.as_str()),
        }
    }

    pub fn leaves(&self) -> Vec<&DocumentToken> {
        let mut result = Vec::new();
        self.collect_leaves(&mut result);
        result
    }

    fn collect_leaves<'a>(&'a self, result: &mut Vec<&'a DocumentToken>) {
        match self {
            ChunkNode::Token(token) => result.push(token),
            ChunkNode::Chunk { children, .. } => {
                for child in children {
                    child.collect_leaves(result);
                }
            }
        }
    }

    /// Reconstruct the chunk's surface text.
    pub fn text(&self) -> String {
        let leaves = self.leaves();
        let skip = leaves
            .first()
            .is_some_and(|t| matches!(t.tag, Some(TagKind::Comma | TagKind::Ampersand)));
        detokenize(leaves.iter().skip(usize::from(skip)).map(|t| t.text.as_str()))
    }
}

/// Join tokens with single spaces, closing up punctuation.
fn detokenize<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    let mut prev: Option<&str> = None;
    for token in tokens {
        if let Some(p) = prev
            && !matches!(token, "," | ")" | "]")
            && !matches!(p, "(" | "[")
        {
            out.push(' ');
        }
        out.push_str(token);
        prev = Some(token);
    }
    out
}

struct ChunkRule {
    label: ChunkLabel,
    regex: Regex,
}

impl ChunkRule {
    /// Replace every leftmost non-overlapping match with a chunk node.
    fn apply(&self, nodes: Vec<ChunkNode>) -> Vec<ChunkNode> {
        let rendered: String = nodes
            .iter()
            .map(|n| format!("<{}>", n.grammar_name()))
            .collect();

        let mut out = Vec::with_capacity(nodes.len());
        let mut remaining = nodes.into_iter();
        let mut last_end = 0;
        for m in self.regex.find_iter(&rendered) {
            if m.is_empty() {
                continue;
            }
            // Every rendered node contributes exactly one '<'.
            let skipped = rendered[last_end..m.start()].matches('<').count();
            let taken = m.as_str().matches('<').count();
            out.extend(remaining.by_ref().take(skipped));
            out.push(ChunkNode::Chunk {
                label: self.label,
                children: remaining.by_ref().take(taken).collect(),
            });
            last_end = m.end();
        }
        out.extend(remaining);
        out
    }
}

/// Compile tag-pattern notation into a regex over `<TAG>` strings.
///
/// `<A|B>` matches one node named `A` or `B`; parentheses group without
/// capturing; quantifiers pass through unchanged.
fn compile_tag_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                let names: String = chars.by_ref().take_while(|c| *c != '>').collect();
                out.push_str("(?:<(?:");
                out.push_str(&names);
                out.push_str(")>)");
            }
            '(' => out.push_str("(?:"),
            _ => out.push(ch),
        }
    }
    Regex::new(&out)
}

static CHUNK_RULES: LazyLock<Vec<ChunkRule>> = LazyLock::new(|| {
    CHUNK_GRAMMAR
        .iter()
        .map(|(label, pattern)| ChunkRule {
            label: *label,
            regex: compile_tag_pattern(pattern)
                .unwrap_or_else(|e| panic!("Failed to compile chunk rule '{}': {}", pattern, e)),
        })
        .collect()
});

/// Cascaded chunker over document tokens.
#[derive(Clone, Copy)]
pub struct Chunker {
    rules: &'static [ChunkRule],
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Chunker {
    pub fn new() -> Self {
        Self {
            rules: &CHUNK_RULES,
        }
    }

    /// Run the cascade, returning the top-level node sequence.
    pub fn chunk(&self, tokens: &[DocumentToken]) -> Vec<ChunkNode> {
        let nodes: Vec<ChunkNode> = tokens.iter().cloned().map(ChunkNode::Token).collect();
        self.rules.iter().fold(nodes, |nodes, rule| rule.apply(nodes))
    }

    /// Reconstructed text of every TAXON chunk, in document order.
    pub fn extract(&self, tokens: &[DocumentToken]) -> Vec<String> {
        self.chunk(tokens)
            .iter()
            .filter(|node| node.label() == Some(ChunkLabel::Taxon))
            .map(ChunkNode::text)
            .collect()
    }

    /// Prepare, tokenize and tag `text`, then extract candidates.
    pub fn extract_text(&self, text: &str) -> Vec<String> {
        let prepared = prepare_text(text);
        let tokens = Tagger::new().tag_document(tokenize(&prepared));
        self.extract(&tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Vec<DocumentToken> {
        Tagger::new().tag_document(tokenize(&prepare_text(text)))
    }

    #[test]
    fn test_compile_tag_pattern() {
        let re = compile_tag_pattern("<COMMA|AMPERSAND>?<CAP>{1,3}").unwrap();
        assert_eq!(re.as_str(), "(?:<(?:COMMA|AMPERSAND)>)?(?:<(?:CAP)>){1,3}");
        assert!(re.is_match("<AMPERSAND><CAP>"));
        assert!(!re.is_match("<CAPITAL>"));
    }

    #[test]
    fn test_compile_group() {
        let re = compile_tag_pattern("<NAME>(<PAREN_L><NAME><PAREN_R>)?<LOW>").unwrap();
        assert!(re.is_match("<NAME><PAREN_L><NAME><PAREN_R><LOW>"));
        assert!(re.is_match("<NAME><LOW>"));
        assert_eq!(re.captures_len(), 1);
    }

    #[test]
    fn test_name_chunks_are_greedy_up_to_three() {
        let tokens = doc("Abc Def Ghi Jkl");
        let nodes = Chunker::new().chunk(&tokens);
        let labels: Vec<Option<ChunkLabel>> = nodes.iter().map(ChunkNode::label).collect();
        assert_eq!(labels, vec![Some(ChunkLabel::Name), Some(ChunkLabel::Name)]);
        assert_eq!(nodes[0].leaves().len(), 3);
        assert_eq!(nodes[1].leaves().len(), 1);
    }

    #[test]
    fn test_extract_multi_author() {
        let found = Chunker::new().extract(&doc("Aporia chunhaoi Hu, Zhang & Yang, 2021"));
        assert_eq!(found, vec!["Aporia chunhaoi Hu, Zhang & Yang, 2021"]);
    }

    #[test]
    fn test_extract_paren_authority() {
        let found = Chunker::new().extract(&doc("Anthocharis cardamines (Linnaeus, 1758)"));
        assert_eq!(found, vec!["Anthocharis cardamines (Linnaeus, 1758)"]);
    }

    #[test]
    fn test_extract_subgenus_and_bracketed_year() {
        let found = Chunker::new().extract_text(
            "Papilio (Achillides) karna discordia de Nicéville, [1893]",
        );
        assert_eq!(
            found,
            vec!["Papilio (Achillides) karna discordia De_Nicéville, [1893]"]
        );
    }

    #[test]
    fn test_extract_particle_wrapped_across_lines() {
        let found = Chunker::new().extract_text("Papilio karna discordia de\nNicéville, [1893]");
        assert_eq!(found, vec!["Papilio karna discordia De_Nicéville, [1893]"]);
    }

    #[test]
    fn test_extract_from_running_text() {
        let text = "Records of Aporia kamei Koiwaya, 1989 and Aporia bieti \
                    (Oberthür, 1884) from Sichuan: see also Takashia nana.";
        let found = Chunker::new().extract_text(text);
        assert_eq!(
            found,
            vec!["Aporia kamei Koiwaya, 1989", "Aporia bieti (Oberthür, 1884)"]
        );
    }

    #[test]
    fn test_leading_separator_dropped() {
        let found = Chunker::new().extract_text("Smith, Aporia kamei Koiwaya, 1989");
        assert_eq!(found, vec!["Aporia kamei Koiwaya, 1989"]);
    }

    #[test]
    fn test_untagged_token_is_boundary() {
        let found = Chunker::new().extract_text("Aporia kamei Koiwaya: 1989");
        assert!(found.is_empty());
    }

    #[test]
    fn test_no_candidates_is_empty() {
        assert!(Chunker::new().extract_text("no names in here").is_empty());
        assert!(Chunker::new().extract(&[]).is_empty());
    }

    #[test]
    fn test_detokenize() {
        let text = detokenize(["Aa", "(", "Bb", ",", "[", "1990", "]", ")"].into_iter());
        assert_eq!(text, "Aa (Bb, [1990])");
    }
}

//! Structured taxon records extracted from parse trees.

use serde::Serialize;

use super::types::{Nonterminal, ParseNode};

/// Authors as a list, or as one joined string in flat mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Authors {
    List(Vec<String>),
    Flat(String),
}

impl Authors {
    pub fn is_empty(&self) -> bool {
        match self {
            Authors::List(list) => list.is_empty(),
            Authors::Flat(flat) => flat.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub year_bracketed: bool,
    /// `None` without an author citation, `Some(false)` when the citation is
    /// parenthesized (species moved to another genus).
    pub original_genus: Option<bool>,
    pub flat_author: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub genus: String,
    pub subgenus: String,
    pub species: String,
    pub subspecies: String,
    pub year: String,
    pub authors: Authors,
    pub meta: RecordMeta,
}

impl Record {
    /// Extract a record from a taxon parse tree.
    pub fn from_tree(tree: &ParseNode, flat_authors: bool) -> Self {
        let authors: Vec<String> = tree
            .find_all(Nonterminal::AuthorName)
            .into_iter()
            .flat_map(ParseNode::leaves)
            .map(|token| token.text.clone())
            .collect();

        let original_genus = if tree.find(Nonterminal::ParenAuthority).is_some() {
            Some(false)
        } else if tree.find(Nonterminal::Authority).is_some() {
            Some(true)
        } else {
            None
        };

        Record {
            genus: field(tree, Nonterminal::GenusName),
            subgenus: field(tree, Nonterminal::Subgenus),
            species: field(tree, Nonterminal::Species),
            subspecies: field(tree, Nonterminal::Subspecies),
            year: field(tree, Nonterminal::YearValue),
            authors: if flat_authors {
                Authors::Flat(join_authors(&authors))
            } else {
                Authors::List(authors)
            },
            meta: RecordMeta {
                year_bracketed: tree.find(Nonterminal::BracketedYear).is_some(),
                original_genus,
                flat_author: flat_authors,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Text of the first `label` subtree in pre-order, empty if absent.
fn field(tree: &ParseNode, label: Nonterminal) -> String {
    tree.find(label)
        .map(|node| {
            node.leaves()
                .iter()
                .map(|token| token.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// `["Hu", "Zhang", "Yang"]` → `"Hu, Zhang & Yang"`.
pub fn join_authors(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} & {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxon::types::{TagKind, Token};

    fn leaf(text: &str, tag: TagKind) -> ParseNode {
        ParseNode::Leaf(Token::new(text, tag))
    }

    fn node(label: Nonterminal, children: Vec<ParseNode>) -> ParseNode {
        ParseNode::Tree { label, children }
    }

    /// `Anthocharis cardamines (Linnaeus, 1758)`
    fn paren_authority_tree() -> ParseNode {
        node(
            Nonterminal::Taxon,
            vec![
                node(
                    Nonterminal::NameCore,
                    vec![
                        node(
                            Nonterminal::Genus,
                            vec![node(
                                Nonterminal::GenusName,
                                vec![leaf("Anthocharis", TagKind::Cap)],
                            )],
                        ),
                        node(
                            Nonterminal::Species,
                            vec![leaf("cardamines", TagKind::Low)],
                        ),
                    ],
                ),
                node(
                    Nonterminal::ParenAuthority,
                    vec![
                        leaf("(", TagKind::ParenL),
                        node(
                            Nonterminal::Authority,
                            vec![
                                node(
                                    Nonterminal::AuthorList,
                                    vec![node(
                                        Nonterminal::AuthorName,
                                        vec![leaf("Linnaeus", TagKind::Cap)],
                                    )],
                                ),
                                leaf(",", TagKind::Comma),
                                node(
                                    Nonterminal::Year,
                                    vec![node(
                                        Nonterminal::YearValue,
                                        vec![leaf("1758", TagKind::Year)],
                                    )],
                                ),
                            ],
                        ),
                        leaf(")", TagKind::ParenR),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_join_authors() {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_authors(&[]), "");
        assert_eq!(join_authors(&names(&["Linnaeus"])), "Linnaeus");
        assert_eq!(join_authors(&names(&["D'Abrera", "Bálint"])), "D'Abrera & Bálint");
        assert_eq!(
            join_authors(&names(&["Hu", "Zhang", "Yang"])),
            "Hu, Zhang & Yang"
        );
    }

    #[test]
    fn test_paren_authority_record() {
        let record = Record::from_tree(&paren_authority_tree(), false);
        assert_eq!(record.genus, "Anthocharis");
        assert_eq!(record.species, "cardamines");
        assert_eq!(record.subgenus, "");
        assert_eq!(record.year, "1758");
        assert_eq!(record.authors, Authors::List(vec!["Linnaeus".to_string()]));
        assert_eq!(record.meta.original_genus, Some(false));
        assert!(!record.meta.year_bracketed);
        assert!(!record.meta.flat_author);
    }

    #[test]
    fn test_no_authority_record() {
        let tree = node(
            Nonterminal::Taxon,
            vec![node(
                Nonterminal::NameCore,
                vec![node(
                    Nonterminal::Species,
                    vec![leaf("nana", TagKind::Low)],
                )],
            )],
        );
        let record = Record::from_tree(&tree, true);
        assert_eq!(record.species, "nana");
        assert_eq!(record.genus, "");
        assert_eq!(record.authors, Authors::Flat(String::new()));
        assert!(record.authors.is_empty());
        assert_eq!(record.meta.original_genus, None);
        assert!(record.meta.flat_author);
    }

    #[test]
    fn test_json_shape() {
        let record = Record::from_tree(&paren_authority_tree(), false);
        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "genus": "Anthocharis",
                "subgenus": "",
                "species": "cardamines",
                "subspecies": "",
                "year": "1758",
                "authors": ["Linnaeus"],
                "meta": {"yearBracketed": false, "originalGenus": false, "flatAuthor": false}
            })
        );
    }

    #[test]
    fn test_json_field_order_and_unicode() {
        let mut record = Record::from_tree(&paren_authority_tree(), true);
        record.authors = Authors::Flat("Oberthür".to_string());
        let json = record.to_json().unwrap();
        assert!(json.contains("\"authors\": \"Oberthür\""));
        let genus_at = json.find("\"genus\"").unwrap();
        let meta_at = json.find("\"meta\"").unwrap();
        assert!(genus_at < meta_at);
    }
}

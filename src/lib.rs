pub mod taxon;

pub use taxon::{
    DocumentReport, ParseOptions, ParseOptionsBuilder, Record, TaxonError, TaxonParser,
    extract_taxa, parse_taxon,
};

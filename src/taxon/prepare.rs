//! Text preparation and normalization for taxon parsing.
//!
//! Normalizes raw text before tokenization:
//! - Unicode NFC composition (decomposed diacritics → composed)
//! - Author particle ligation: `de Nicéville` → `De_Nicéville`,
//!   `d'Orbigny` → `D'_Orbigny`, so particle and surname stay one token

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Word-initial lowercase `de`, whitespace (possibly a line break), then a
/// capitalized word.
static DE_PARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bde\s+(\p{Lu})").unwrap());

/// Word-initial lowercase `d'` immediately followed by a capitalized word.
static D_APOSTROPHE_PARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bd'(\p{Lu})").unwrap());

/// Prepare `text` for tokenization.
///
/// Idempotent: preparing already prepared text returns it unchanged.
pub fn prepare_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    ligate_particles(&composed)
}

/// Rewrite author-name particles into single capitalized units.
pub fn ligate_particles(text: &str) -> String {
    let s = DE_PARTICLE_RE.replace_all(text, "De_${1}");
    D_APOSTROPHE_PARTICLE_RE
        .replace_all(&s, "D'_${1}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_de_particle() {
        assert_eq!(
            prepare_text("Papilio karna discordia de Nicéville, [1893]"),
            "Papilio karna discordia De_Nicéville, [1893]"
        );
    }

    #[test]
    fn test_de_particle_across_whitespace_runs() {
        assert_eq!(ligate_particles("de  Nicéville"), "De_Nicéville");
        assert_eq!(
            ligate_particles("discordia de\nNicéville, [1893]"),
            "discordia De_Nicéville, [1893]"
        );
        assert_eq!(ligate_particles("de\t Ébano"), "De_Ébano");
    }

    #[test]
    fn test_d_apostrophe_particle() {
        assert_eq!(ligate_particles("d'Orbigny, 1842"), "D'_Orbigny, 1842");
    }

    #[test]
    fn test_capitalized_particle_untouched() {
        assert_eq!(
            ligate_particles("Gulliveria D'Abrera & Bálint, 2001"),
            "Gulliveria D'Abrera & Bálint, 2001"
        );
    }

    #[test]
    fn test_de_requires_word_boundary() {
        // "linde Xyz" must not become "linDe_Xyz"
        assert_eq!(ligate_particles("linde Xyz"), "linde Xyz");
    }

    #[test]
    fn test_de_requires_capitalized_follower() {
        assert_eq!(ligate_particles("de nicéville"), "de nicéville");
    }

    #[test]
    fn test_unicode_uppercase_follower() {
        assert_eq!(ligate_particles("de Ébano"), "De_Ébano");
    }

    #[test]
    fn test_nfc_composition() {
        // "u" + combining diaeresis composes to "ü"
        let decomposed = "Oberthu\u{0308}r";
        assert_eq!(prepare_text(decomposed), "Oberthür");
    }

    #[test]
    fn test_idempotent() {
        let once = prepare_text("Aporia bieti de Nicéville & d'Orbigny, 1884");
        assert_eq!(prepare_text(&once), once);
    }
}

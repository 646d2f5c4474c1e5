use kiji_common::{ExtractedDocument, NormalizedDocument};
use unicode_normalization::{is_nfkc_quick, IsNormalized, UnicodeNormalization};

/// NFKC canonicalisation, so width and compatibility variants hash and
/// compare identically downstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, doc: ExtractedDocument) -> NormalizedDocument {
        NormalizedDocument {
            url: doc.url,
            text: self.normalize_str(&doc.text),
            links: doc.links,
        }
    }

    /// ```
    /// use kiji_text::TextNormalizer;
    ///
    /// assert_eq!(TextNormalizer::new().normalize_str("ＡＢＣ１２３ｶﾞ"), "ABC123ガ");
    /// ```
    pub fn normalize_str(&self, text: &str) -> String {
        if is_nfkc_quick(text.chars()) == IsNormalized::Yes {
            return text.to_string();
        }
        text.nfkc().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_width_and_compatibility_variants() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize_str("２０２３年０６月２１日"), "2023年06月21日");
        assert_eq!(n.normalize_str("㈱"), "(株)");
        assert_eq!(n.normalize_str("ﬁ"), "fi");
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = TextNormalizer::new();
        for input in ["ﾃｽﾄ ＴＥＳＴ ①", "plain ascii", "e\u{301}", "㍻ ㌔"] {
            let once = n.normalize_str(input);
            assert_eq!(n.normalize_str(&once), once);
        }
    }

    #[test]
    fn visually_identical_inputs_converge() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize_str("café"), n.normalize_str("cafe\u{301}"));
    }

    #[test]
    fn links_pass_through() {
        let doc = ExtractedDocument {
            url: "u".into(),
            text: "Ｘ".into(),
            links: vec!["/a".into(), "/a".into()],
        };
        let out = TextNormalizer::new().normalize(doc);
        assert_eq!(out.text, "X");
        assert_eq!(out.links, ["/a", "/a"]);
    }
}

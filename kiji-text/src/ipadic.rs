//! IPADIC morphological analysis through lindera (cargo feature `ipadic`).

use kiji_common::KijiError;
use lindera::dictionary::{load_dictionary_from_kind, DictionaryKind};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use tracing::{debug, warn};

use crate::tagger::{Token, Tokenizer};

/// Tokenizer over the IPADIC dictionary embedded at build time.
///
/// Part-of-speech fields come straight from the dictionary, so proper nouns
/// such as `トヨタ` or `名古屋` carry `名詞,固有名詞,...`.
pub struct IpadicTokenizer {
    inner: lindera::tokenizer::Tokenizer,
}

impl IpadicTokenizer {
    pub fn new() -> kiji_common::Result<Self> {
        let dictionary = load_dictionary_from_kind(DictionaryKind::IPADIC)
            .map_err(|e| KijiError::DataFile(format!("ipadic dictionary: {e}")))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        debug!("text.tokenizer.ipadic.loaded");
        Ok(Self {
            inner: lindera::tokenizer::Tokenizer::new(segmenter),
        })
    }
}

impl Tokenizer for IpadicTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut analyzed = match self.inner.tokenize(text) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(error = %err, chars = text.chars().count(), "text.tokenizer.ipadic.failed");
                return vec![Token::new(text, &["未知語"])];
            }
        };

        // Gaps the analyzer skipped (whitespace) become their own tokens so
        // the surfaces still cover the input.
        let mut tokens = Vec::with_capacity(analyzed.len());
        let mut last = 0;
        for token in analyzed.iter_mut() {
            let (start, end) = (token.byte_start, token.byte_end);
            if start < last || end > text.len() {
                continue;
            }
            if start > last {
                tokens.push(Token::new(&text[last..start], &["空白"]));
            }
            let pos: Vec<String> = token.details().iter().map(|d| d.to_string()).collect();
            tokens.push(Token {
                surface: text[start..end].to_string(),
                pos,
            });
            last = end;
        }
        if last < text.len() {
            tokens.push(Token::new(&text[last..], &["空白"]));
        }
        tokens
    }
}

//! Proper-noun tagging over a morphological tokenizer.
//!
//! [`EntityTagger`] only depends on the [`Tokenizer`] capability. The
//! bundled [`LexiconTokenizer`] is a dictionary-driven longest-match
//! segmenter; any analyzer that can produce `(surface, part of speech)` pairs
//! covering the input can be plugged in instead.

use std::collections::HashMap;
use std::path::Path;

use kiji_common::{DatedDocument, KijiError, TaggedDocument};
use tracing::debug;

const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.tsv");

pub const ENTITY_OPEN: &str = "<NE>";
pub const ENTITY_CLOSE: &str = "</NE>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    /// Part-of-speech fields, most general first (e.g. `名詞,固有名詞,地名`).
    pub pos: Vec<String>,
}

impl Token {
    pub fn new(surface: impl Into<String>, pos: &[&str]) -> Self {
        Self {
            surface: surface.into(),
            pos: pos.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn is_proper_noun(&self) -> bool {
        self.pos.first().map(String::as_str) == Some("名詞")
            && self.pos.get(1).map(String::as_str) == Some("固有名詞")
    }
}

/// Splits text into tokens whose surfaces concatenate back to the input.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Kanji,
    Hiragana,
    Katakana,
    AsciiAlnum,
    Letter,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        match c {
            c if c.is_whitespace() => Self::Space,
            c if c.is_ascii_alphanumeric() => Self::AsciiAlnum,
            '\u{3005}' | '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' => Self::Kanji,
            '\u{3041}'..='\u{309F}' => Self::Hiragana,
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' => Self::Katakana,
            c if c.is_alphanumeric() => Self::Letter,
            _ => Self::Other,
        }
    }

    fn groups(self) -> bool {
        self != Self::Other
    }

    fn unknown_pos(self) -> &'static [&'static str] {
        match self {
            Self::Space => &["空白"],
            Self::Other => &["補助記号"],
            _ => &["未知語"],
        }
    }
}

/// Greedy longest-match tokenizer over a `(surface, pos)` lexicon.
///
/// Text not covered by the lexicon is grouped into runs of one character
/// class. ASCII entries only match on ASCII word boundaries, so `Twitter`
/// is found in `Twitter公式` but not in `Twitterbot`.
#[derive(Debug, Clone, Default)]
pub struct LexiconTokenizer {
    entries: HashMap<String, Vec<String>>,
    max_chars: usize,
}

impl LexiconTokenizer {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tokenizer over the lexicon compiled into this crate.
    pub fn builtin() -> Self {
        Self::from_tsv(BUILTIN_LEXICON).expect("built-in lexicon is well formed")
    }

    pub fn from_path(path: &Path) -> kiji_common::Result<Self> {
        let src = std::fs::read_to_string(path)?;
        Self::from_tsv(&src)
            .map_err(|e| KijiError::DataFile(format!("{}: {e}", path.display())))
    }

    /// Parse `surface<TAB>pos,pos,...` lines; `#` starts a comment line.
    pub fn from_tsv(src: &str) -> kiji_common::Result<Self> {
        let mut lexicon = Self::empty();
        for (lineno, line) in src.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (surface, pos) = line.split_once('\t').ok_or_else(|| {
                KijiError::DataFile(format!("lexicon line {}: missing tab", lineno + 1))
            })?;
            if surface.is_empty() {
                return Err(KijiError::DataFile(format!(
                    "lexicon line {}: empty surface",
                    lineno + 1
                )));
            }
            let pos: Vec<&str> = pos.split(',').map(str::trim).collect();
            lexicon.insert(surface, &pos);
        }
        debug!(entries = lexicon.len(), "text.lexicon.loaded");
        Ok(lexicon)
    }

    pub fn insert(&mut self, surface: &str, pos: &[&str]) {
        self.max_chars = self.max_chars.max(surface.chars().count());
        self.entries.insert(
            surface.to_string(),
            pos.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length in chars of the longest acceptable entry starting at char `i`.
    fn longest_match(&self, text: &str, chars: &[(usize, char)], i: usize) -> Option<usize> {
        let n = chars.len();
        let byte_at = |k: usize| if k < n { chars[k].0 } else { text.len() };
        let longest = self.max_chars.min(n - i);

        (1..=longest).rev().find(|&len| {
            let candidate = &text[byte_at(i)..byte_at(i + len)];
            self.entries.contains_key(candidate) && self.on_word_boundary(chars, i, len)
        })
    }

    fn on_word_boundary(&self, chars: &[(usize, char)], i: usize, len: usize) -> bool {
        let alnum = |k: usize| chars.get(k).is_some_and(|(_, c)| c.is_ascii_alphanumeric());
        let starts_mid_word = alnum(i) && i > 0 && alnum(i - 1);
        let ends_mid_word = alnum(i + len - 1) && alnum(i + len);
        !starts_mid_word && !ends_mid_word
    }
}

impl Tokenizer for LexiconTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let n = chars.len();
        let byte_at = |k: usize| if k < n { chars[k].0 } else { text.len() };

        let mut tokens = Vec::new();
        let mut i = 0;
        while i < n {
            if let Some(len) = self.longest_match(text, &chars, i) {
                let surface = &text[byte_at(i)..byte_at(i + len)];
                tokens.push(Token {
                    surface: surface.to_string(),
                    pos: self.entries[surface].clone(),
                });
                i += len;
                continue;
            }

            let class = CharClass::of(chars[i].1);
            let start = i;
            i += 1;
            if class.groups() {
                while i < n
                    && CharClass::of(chars[i].1) == class
                    && self.longest_match(text, &chars, i).is_none()
                {
                    i += 1;
                }
            }
            tokens.push(Token::new(&text[byte_at(start)..byte_at(i)], class.unknown_pos()));
        }
        tokens
    }
}

/// Wraps every proper-noun token as `<NE>surface</NE>`.
pub struct EntityTagger {
    tokenizer: Box<dyn Tokenizer>,
}

impl EntityTagger {
    pub fn new(tokenizer: impl Tokenizer + 'static) -> Self {
        Self {
            tokenizer: Box::new(tokenizer),
        }
    }

    pub fn tag(&self, doc: DatedDocument) -> TaggedDocument {
        TaggedDocument {
            url: doc.url,
            date: doc.date,
            text: self.tag_str(&doc.text),
            links: doc.links,
        }
    }

    /// ```
    /// use kiji_text::{EntityTagger, LexiconTokenizer};
    ///
    /// let tagger = EntityTagger::new(LexiconTokenizer::builtin());
    /// assert_eq!(tagger.tag_str("東京の記事"), "<NE>東京</NE>の記事");
    /// ```
    pub fn tag_str(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 4);
        for token in self.tokenizer.tokenize(text) {
            if token.is_proper_noun() {
                out.push_str(ENTITY_OPEN);
                out.push_str(&token.surface);
                out.push_str(ENTITY_CLOSE);
            } else {
                out.push_str(&token.surface);
            }
        }
        out
    }
}

impl Default for EntityTagger {
    fn default() -> Self {
        Self::new(LexiconTokenizer::builtin())
    }
}

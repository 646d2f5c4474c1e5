//! Text stages of the cleaning pipeline.
//!
//! Applied in this order by the pipeline:
//!
//! - [`TextNormalizer`]: NFKC canonicalisation
//! - [`DateExtractor`]: pull out the first `YYYY年MM月DD日 HH:MM` timestamp
//! - [`EntityTagger`]: wrap proper nouns as `<NE>…</NE>` using a [`Tokenizer`]
//! - [`BoilerplatePruner`]: ordered rule list removing site chrome
//!
//! The built-in lexicon and rule set live in `data/` and are compiled in;
//! both can be replaced from files at runtime. With the `ipadic` feature,
//! [`IpadicTokenizer`] offers full IPADIC analysis instead of the lexicon.

pub mod date;
#[cfg(feature = "ipadic")]
pub mod ipadic;
pub mod normalize;
pub mod prune;
pub mod rules;
pub mod tagger;

pub use date::DateExtractor;
#[cfg(feature = "ipadic")]
pub use ipadic::IpadicTokenizer;
pub use normalize::TextNormalizer;
pub use prune::BoilerplatePruner;
pub use rules::RuleSet;
pub use tagger::{EntityTagger, LexiconTokenizer, Token, Tokenizer};

//! Stage composition: one raw record in, one outcome out.

use anyhow::Context;
use kiji_common::{CleanedDocument, RawRecord, RunState};
use kiji_config::{PipelineConfig, TokenizerKind};
use kiji_dedup::{ExactDedup, NearDedup};
use kiji_text::{
    BoilerplatePruner, DateExtractor, EntityTagger, LexiconTokenizer, RuleSet, TextNormalizer,
};
use kiji_web::HtmlExtractor;
use tracing::{debug, info, warn};

/// What happened to one record after the cleaning and dedup stages.
#[derive(Debug)]
pub enum Outcome {
    /// Cleaned text came out empty.
    Empty,
    /// Cleaned text was already seen in this run state.
    Duplicate,
    /// Ready for the record writer. `lines_dropped` counts near-dup lines.
    Retained {
        doc: CleanedDocument,
        lines_dropped: usize,
    },
}

pub struct Pipeline {
    extractor: HtmlExtractor,
    normalizer: TextNormalizer,
    dates: DateExtractor,
    tagger: EntityTagger,
    pruner: BoilerplatePruner,
    exact: ExactDedup,
    near: NearDedup,
}

impl Pipeline {
    /// Build the stages, loading lexicon and rule files when configured.
    pub fn from_config(cfg: &PipelineConfig) -> anyhow::Result<Self> {
        let tagger = build_tagger(cfg)?;
        let rules = match &cfg.rules {
            Some(path) => RuleSet::from_path(path)
                .with_context(|| format!("loading rule set {}", path.display()))?,
            None => RuleSet::builtin(),
        };
        let pruner = BoilerplatePruner::new(&rules, cfg.preserve_line_breaks)
            .context("compiling rule set")?;

        info!(
            tokenizer = ?cfg.tokenizer,
            section_rules = rules.sections.len(),
            trailing_rules = rules.trailing.len(),
            threshold = cfg.similarity_threshold,
            "pipeline.build"
        );

        Ok(Self {
            extractor: HtmlExtractor::new(),
            normalizer: TextNormalizer::new(),
            dates: DateExtractor::new(),
            tagger,
            pruner,
            exact: ExactDedup::new(),
            near: NearDedup::new(cfg.similarity_threshold),
        })
    }

    /// Extraction through boilerplate pruning.
    pub fn clean(&self, raw: RawRecord) -> CleanedDocument {
        let extracted = self.extractor.extract(raw);
        let normalized = self.normalizer.normalize(extracted);
        let dated = self.dates.extract(normalized);
        let tagged = self.tagger.tag(dated);
        self.pruner.prune(tagged)
    }

    /// Clean, then run exact and near dedup against `state`.
    pub fn process(&self, raw: RawRecord, state: &mut RunState) -> Outcome {
        let doc = self.clean(raw);
        if doc.text.is_empty() {
            debug!(url = %doc.url, "pipeline.record.empty");
            return Outcome::Empty;
        }
        if !self.exact.admit(state, &doc) {
            return Outcome::Duplicate;
        }
        let (doc, lines_dropped) = self.near.dedup(doc);
        Outcome::Retained { doc, lines_dropped }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            extractor: HtmlExtractor::new(),
            normalizer: TextNormalizer::new(),
            dates: DateExtractor::new(),
            tagger: EntityTagger::default(),
            pruner: BoilerplatePruner::builtin(false),
            exact: ExactDedup::new(),
            near: NearDedup::default(),
        }
    }
}

fn build_tagger(cfg: &PipelineConfig) -> anyhow::Result<EntityTagger> {
    match cfg.tokenizer {
        TokenizerKind::Lexicon => {
            let tokenizer = match &cfg.lexicon {
                Some(path) => LexiconTokenizer::from_path(path)
                    .with_context(|| format!("loading lexicon {}", path.display()))?,
                None => LexiconTokenizer::builtin(),
            };
            debug!(entries = tokenizer.len(), "pipeline.lexicon.ready");
            Ok(EntityTagger::new(tokenizer))
        }
        TokenizerKind::Ipadic => {
            if let Some(path) = &cfg.lexicon {
                warn!(lexicon = %path.display(), "pipeline.lexicon.ignored");
            }
            ipadic_tagger()
        }
    }
}

#[cfg(feature = "ipadic")]
fn ipadic_tagger() -> anyhow::Result<EntityTagger> {
    let tokenizer = kiji_text::IpadicTokenizer::new().context("loading IPADIC dictionary")?;
    Ok(EntityTagger::new(tokenizer))
}

#[cfg(not(feature = "ipadic"))]
fn ipadic_tagger() -> anyhow::Result<EntityTagger> {
    anyhow::bail!("tokenizer `ipadic` is not available: kiji was built without the `ipadic` feature")
}

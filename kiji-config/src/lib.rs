//! Loader for `kiji.yaml` with `KIJI__` environment overlays.
//!
//! Sources are merged by the `config` crate (file first, then environment,
//! where `KIJI__PIPELINE__SIMILARITY_THRESHOLD=95` overrides
//! `pipeline.similarity_threshold`). String values may reference `${VAR}`
//! placeholders, which are expanded before the typed structs are built.
use config::{Config, ConfigError, Environment, File};
use kiji_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const DEFAULT_SIMILARITY_THRESHOLD: u8 = 90;

#[derive(Debug, Deserialize)]
pub struct KijiConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: true,
            filter: default_filter(),
        }
    }
}

/// Knobs for the cleaning stages. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Two lines are near-duplicates when their score is strictly greater.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: u8,
    /// Keep line breaks (collapsed to one) instead of folding them into spaces.
    #[serde(default)]
    pub preserve_line_breaks: bool,
    /// Morphological analyzer behind the entity tagger.
    #[serde(default)]
    pub tokenizer: TokenizerKind,
    /// TSV lexicon for the `lexicon` tokenizer; built-in lexicon when absent.
    #[serde(default)]
    pub lexicon: Option<PathBuf>,
    /// YAML rule set for the boilerplate pruner; built-in rules when absent.
    #[serde(default)]
    pub rules: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            preserve_line_breaks: false,
            tokenizer: TokenizerKind::Lexicon,
            lexicon: None,
            rules: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// Longest-match segmenter over a TSV lexicon.
    #[default]
    Lexicon,
    /// IPADIC morphological analysis; needs the `ipadic` cargo feature.
    Ipadic,
}

/// One output target fed by a set of archive files or directories.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One CSV file with an `index,date,text,links` header.
    #[default]
    Csv,
    /// One `.txt` file per record inside the output directory.
    Text,
}

fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "info".into()
}
fn default_similarity_threshold() -> u8 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn validate(cfg: &KijiConfig) -> Result<(), ConfigError> {
    if cfg.pipeline.similarity_threshold > 100 {
        return Err(ConfigError::Message(format!(
            "pipeline.similarity_threshold must be within 0..=100, got {}",
            cfg.pipeline.similarity_threshold
        )));
    }
    for job in &cfg.jobs {
        if job.inputs.is_empty() {
            return Err(ConfigError::Message(format!(
                "job `{}` has no inputs",
                job.name
            )));
        }
    }
    Ok(())
}

/// Builder over the `config` crate wiring (YAML + env overrides).
pub struct KijiConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for KijiConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl KijiConfigLoader {
    /// Start empty; `KIJI__` environment overrides are layered on last in [`load`](Self::load).
    ///
    /// ```
    /// use kiji_config::KijiConfigLoader;
    ///
    /// let config = KijiConfigLoader::new()
    ///     .with_yaml_str("version: '1'\njobs: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.pipeline.similarity_threshold, 90);
    /// assert!(config.jobs.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but tolerates a missing file, so a
    /// run can be configured entirely from the command line.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use kiji_config::{KijiConfigLoader, OutputFormat};
    ///
    /// let cfg = KijiConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// jobs:
    ///   - name: "2023"
    ///     inputs: ["data/2023"]
    ///     output: "out/2023"
    ///     format: text
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.jobs.len(), 1);
    /// assert_eq!(cfg.jobs[0].format, OutputFormat::Text);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Build the merged sources, expand `${VAR}` placeholders, and validate.
    pub fn load(self) -> Result<KijiConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("KIJI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: KijiConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        validate(&typed)?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_paths_from_env() {
        temp_env::with_var("KIJI_DATA", Some("/srv/warc"), || {
            let mut v = json!({ "inputs": ["${KIJI_DATA}/2023", 3] });
            expand_env_in_value(&mut v);
            assert_eq!(v, json!({ "inputs": ["/srv/warc/2023", 3] }));
        });
    }

    #[test]
    fn expansion_terminates_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}");
            expand_env_in_value(&mut v);
            assert!(v.as_str().unwrap().contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("out/${KIJI_DOES_NOT_EXIST}.csv");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("out/${KIJI_DOES_NOT_EXIST}.csv"));
    }

    #[test]
    fn rejects_threshold_above_hundred() {
        let err = KijiConfigLoader::new()
            .with_yaml_str("pipeline:\n  similarity_threshold: 120\n")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn tokenizer_defaults_to_lexicon_and_accepts_ipadic() {
        let cfg = KijiConfigLoader::new().with_yaml_str("{}").load().unwrap();
        assert_eq!(cfg.pipeline.tokenizer, TokenizerKind::Lexicon);

        let cfg = KijiConfigLoader::new()
            .with_yaml_str("pipeline:\n  tokenizer: ipadic\n")
            .load()
            .unwrap();
        assert_eq!(cfg.pipeline.tokenizer, TokenizerKind::Ipadic);

        assert!(KijiConfigLoader::new()
            .with_yaml_str("pipeline:\n  tokenizer: mecab\n")
            .load()
            .is_err());
    }

    #[test]
    fn rejects_job_without_inputs() {
        let result = KijiConfigLoader::new()
            .with_yaml_str("jobs:\n  - name: empty\n    inputs: []\n    output: out.csv\n")
            .load();
        assert!(result.is_err());
    }
}

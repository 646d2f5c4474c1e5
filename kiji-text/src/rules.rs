//! Rule sets for the boilerplate pruner.
//!
//! A [`RuleSet`] is plain data (deserialized from YAML). Compiling it yields
//! the regexes the pruner runs, with section rules ordered longest pattern
//! first; equal lengths keep file order.

use std::path::Path;

use kiji_common::KijiError;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

const BUILTIN_RULES: &str = include_str!("../data/rules.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Delete from the first match to the end of the text.
    Heading,
    /// Delete every match.
    Phrase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionRule {
    pub kind: SectionKind,
    pub pattern: String,
    #[serde(default)]
    pub ignore_case: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub sections: Vec<SectionRule>,
    #[serde(default)]
    pub trailing: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledSection {
    pub kind: SectionKind,
    pub regex: Regex,
}

impl RuleSet {
    pub fn builtin() -> Self {
        Self::from_yaml(BUILTIN_RULES).expect("built-in rule set is well formed")
    }

    pub fn from_yaml(src: &str) -> kiji_common::Result<Self> {
        serde_yaml::from_str(src).map_err(|e| KijiError::DataFile(format!("rule set: {e}")))
    }

    pub fn from_path(path: &Path) -> kiji_common::Result<Self> {
        let src = std::fs::read_to_string(path)?;
        Self::from_yaml(&src).map_err(|e| KijiError::DataFile(format!("{}: {e}", path.display())))
    }

    pub(crate) fn compile_sections(&self) -> kiji_common::Result<Vec<CompiledSection>> {
        let mut ordered: Vec<&SectionRule> = self.sections.iter().collect();
        ordered.sort_by_key(|r| std::cmp::Reverse(r.pattern.chars().count()));

        ordered
            .into_iter()
            .map(|rule| {
                let regex = RegexBuilder::new(&rule.pattern)
                    .case_insensitive(rule.ignore_case)
                    .dot_matches_new_line(true)
                    .build()
                    .map_err(|e| bad_pattern(&rule.pattern, e))?;
                Ok(CompiledSection {
                    kind: rule.kind,
                    regex,
                })
            })
            .collect()
    }

    /// Each trailing pattern anchored to the end of the text and to the start
    /// of a whitespace-separated token.
    pub(crate) fn compile_trailing(&self) -> kiji_common::Result<Vec<Regex>> {
        let mut ordered: Vec<&String> = self.trailing.iter().collect();
        ordered.sort_by_key(|p| std::cmp::Reverse(p.chars().count()));

        ordered
            .into_iter()
            .map(|p| Regex::new(&format!(r"(?:^|\s)(?:{p})\s*$")).map_err(|e| bad_pattern(p, e)))
            .collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

fn bad_pattern(pattern: &str, err: regex::Error) -> KijiError {
    KijiError::DataFile(format!("invalid rule pattern {pattern:?}: {err}"))
}

//! Boilerplate pruning as an ordered rule list over one text buffer.
//!
//! Rules run strictly in sequence and later rules see the output of earlier
//! ones:
//!
//! 1. collapse a repeated URL to one occurrence
//! 2. remove `.jpg` image links (optional query string)
//! 3. remove `[...]` segments
//! 4. keep only the first link
//! 5. section rules from the [`RuleSet`] (headings truncate to end of text)
//! 6. strip trailing phrases from the [`RuleSet`]
//! 7. collapse whitespace and trim
//!
//! Step 4 acts on the link list rather than the text.

use std::sync::LazyLock;

use kiji_common::{CleanedDocument, TaggedDocument};
use regex::{Captures, Regex};
use tracing::trace;

use crate::rules::{CompiledSection, RuleSet, SectionKind};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("static url regex"));
static URL_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://").expect("static url start regex"));
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+").expect("static token regex"));
static IMAGE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S*?\.jpg\b(?:\?\S*)?").expect("static image link regex")
});
static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("static bracket regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace regex"));

const MAX_LINKS: usize = 1;

enum Action {
    Transform(fn(&str) -> String),
    Remove(Regex),
    TruncateFrom(Regex),
    StripTrailing(Vec<Regex>),
}

struct Rule {
    name: &'static str,
    action: Action,
}

impl Rule {
    fn apply(&self, mut text: String) -> String {
        match &self.action {
            Action::Transform(f) => f(&text),
            Action::Remove(re) => {
                if re.is_match(&text) {
                    re.replace_all(&text, "").into_owned()
                } else {
                    text
                }
            }
            Action::TruncateFrom(re) => {
                if let Some(start) = re.find(&text).map(|m| m.start()) {
                    text.truncate(start);
                }
                text
            }
            Action::StripTrailing(patterns) => strip_trailing(text, patterns),
        }
    }
}

pub struct BoilerplatePruner {
    rules: Vec<Rule>,
}

impl BoilerplatePruner {
    /// Pruner over the built-in rule set.
    pub fn builtin(preserve_line_breaks: bool) -> Self {
        Self::new(&RuleSet::builtin(), preserve_line_breaks)
            .expect("built-in rule set compiles")
    }

    pub fn new(rules: &RuleSet, preserve_line_breaks: bool) -> kiji_common::Result<Self> {
        let mut ordered = vec![
            Rule {
                name: "repeated_url",
                action: Action::Transform(collapse_repeated_urls),
            },
            Rule {
                name: "image_link",
                action: Action::Remove(IMAGE_LINK_RE.clone()),
            },
            Rule {
                name: "bracketed",
                action: Action::Remove(BRACKET_RE.clone()),
            },
        ];

        for section in rules.compile_sections()? {
            let CompiledSection { kind, regex } = section;
            ordered.push(match kind {
                SectionKind::Heading => Rule {
                    name: "section_heading",
                    action: Action::TruncateFrom(regex),
                },
                SectionKind::Phrase => Rule {
                    name: "section_phrase",
                    action: Action::Remove(regex),
                },
            });
        }

        ordered.push(Rule {
            name: "trailing_phrases",
            action: Action::StripTrailing(rules.compile_trailing()?),
        });
        let whitespace: fn(&str) -> String = if preserve_line_breaks {
            collapse_whitespace_keep_lines
        } else {
            collapse_whitespace
        };
        ordered.push(Rule {
            name: "whitespace",
            action: Action::Transform(whitespace),
        });

        Ok(Self { rules: ordered })
    }

    pub fn prune(&self, doc: TaggedDocument) -> CleanedDocument {
        let mut links = doc.links;
        links.truncate(MAX_LINKS);
        CleanedDocument {
            url: doc.url,
            date: doc.date,
            text: self.prune_text(doc.text),
            links,
        }
    }

    pub fn prune_text(&self, mut text: String) -> String {
        for rule in &self.rules {
            let before = text.len();
            text = rule.apply(text);
            if text.len() != before {
                trace!(
                    rule = rule.name,
                    removed = before.saturating_sub(text.len()),
                    "text.prune.rule"
                );
            }
        }
        text
    }
}

/// Collapse a URL glued to a repeat of itself (same scheme and host), and a
/// URL token repeated verbatim after whitespace.
fn collapse_repeated_urls(text: &str) -> String {
    let glued = URL_RE.replace_all(text, |caps: &Captures| collapse_glued(&caps[0]));

    let mut out = String::with_capacity(glued.len());
    let mut last_end = 0;
    let mut prev_url: Option<&str> = None;
    for m in TOKEN_RE.find_iter(&glued) {
        let token = m.as_str();
        let is_url = URL_START_RE.find(token).is_some_and(|u| u.start() == 0);
        if is_url && prev_url == Some(token) {
            last_end = m.end();
            continue;
        }
        out.push_str(&glued[last_end..m.start()]);
        out.push_str(token);
        prev_url = is_url.then_some(token);
        last_end = m.end();
    }
    out.push_str(&glued[last_end..]);
    out
}

fn collapse_glued(token: &str) -> String {
    let starts: Vec<usize> = URL_START_RE
        .find_iter(token)
        .map(|m| m.start())
        .filter(|&s| s > 0)
        .collect();
    if starts.is_empty() {
        return token.to_string();
    }

    let mut bounds = vec![0];
    bounds.extend(&starts);
    bounds.push(token.len());
    let segments: Vec<&str> = bounds.windows(2).map(|w| &token[w[0]..w[1]]).collect();

    let origin = url_origin(segments[0]);
    let mut out = segments[0].to_string();
    for segment in &segments[1..] {
        if url_origin(segment) != origin {
            out.push_str(segment);
        }
    }
    out
}

/// `scheme://host` prefix of a URL.
fn url_origin(url: &str) -> &str {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    let host_end = url[after_scheme..]
        .find(['/', '?', '#'])
        .map(|i| after_scheme + i)
        .unwrap_or(url.len());
    &url[..host_end]
}

fn strip_trailing(mut text: String, patterns: &[Regex]) -> String {
    loop {
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);
        let cut = patterns
            .iter()
            .filter_map(|re| re.find(&text))
            .find(|m| !m.is_empty())
            .map(|m| m.start());
        match cut {
            Some(start) => text.truncate(start),
            None => return text,
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

fn collapse_whitespace_keep_lines(text: &str) -> String {
    WHITESPACE_RE
        .replace_all(text, |caps: &Captures| {
            if caps[0].contains('\n') {
                "\n"
            } else {
                " "
            }
        })
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pruner() -> BoilerplatePruner {
        BoilerplatePruner::builtin(false)
    }

    fn prune(text: &str) -> String {
        pruner().prune_text(text.to_string())
    }

    #[test]
    fn collapses_glued_repeat_of_same_origin() {
        assert_eq!(
            collapse_repeated_urls("see https://a.jp/x/1https://a.jp/x/1 now"),
            "see https://a.jp/x/1 now"
        );
        assert_eq!(
            collapse_repeated_urls("https://a.jp/1https://b.jp/2"),
            "https://a.jp/1https://b.jp/2"
        );
    }

    #[test]
    fn collapses_whitespace_separated_repeat() {
        assert_eq!(
            collapse_repeated_urls("x https://a.jp/1  https://a.jp/1 y https://a.jp/1"),
            "x https://a.jp/1 y https://a.jp/1"
        );
    }

    #[test]
    fn removes_jpg_links_with_query() {
        assert_eq!(
            prune("写真 https://img.example.com/p/a.jpg?w=640&h=480 の説明"),
            "写真 の説明"
        );
        assert_eq!(prune("https://example.com/a.jpgx"), "https://example.com/a.jpgx");
    }

    #[test]
    fn removes_bracketed_segments() {
        assert_eq!(prune("本文[編集] 続き [注1]"), "本文 続き");
    }

    #[test]
    fn keeps_only_first_link() {
        let doc = TaggedDocument {
            url: "u".into(),
            date: "Unknown".into(),
            text: "t".into(),
            links: vec!["/a".into(), "/b".into(), "/c".into()],
        };
        assert_eq!(pruner().prune(doc).links, ["/a"]);
    }

    #[test]
    fn heading_truncates_to_end_of_text() {
        let text = "本文です。 モバイル版へ戻る ランキング 1位 2位 <NE>Twitter</NE>";
        assert_eq!(prune(text), "本文です。");
    }

    #[test]
    fn heading_words_alone_do_not_truncate() {
        let text = "新規登録の手順を説明します。 本文が続きます。";
        assert_eq!(prune(text), text);
    }

    #[test]
    fn trailing_phrase_removed_only_at_end() {
        let text = "ログイン方法を解説します。 手順は簡単です。 ログイン";
        assert_eq!(prune(text), "ログイン方法を解説します。 手順は簡単です。");
    }

    #[test]
    fn trailing_phrase_must_start_a_token() {
        assert_eq!(prune("新規ログイン"), "新規ログイン");
        assert_eq!(prune("本文です。 新規ログイン"), "本文です。 新規ログイン");
        assert_eq!(prune("本文 ログイン"), "本文");
        assert_eq!(prune("ログイン"), "");
    }

    #[test]
    fn trailing_phrases_strip_repeatedly() {
        let text = "本文 <NE>YouTube</NE> ニコニコ livedoor ニュース ログイン";
        assert_eq!(prune(text), "本文");
    }

    #[test]
    fn marked_share_phrases_are_removed_anywhere() {
        let text = "<NE>Twitter</NE>(公式アカウント) 本文 Tweet 12 コメント 続き";
        assert_eq!(prune(text), "本文 続き");
    }

    #[test]
    fn rule_order_lets_heading_cut_before_trailing_rules() {
        // The heading removes the tail; the trailing rule then sees the shortened text.
        let text = "記事 ログイン 新規登録 / ログイン フッター";
        assert_eq!(prune(text), "記事");
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        assert_eq!(prune("  a \n\n b\t c  "), "a b c");
    }

    #[test]
    fn line_breaks_survive_when_requested() {
        let pruner = BoilerplatePruner::builtin(true);
        assert_eq!(pruner.prune_text("  a  \n \n b \t c  ".into()), "a\nb c");
    }

    #[test]
    fn custom_rule_set_replaces_builtin() {
        let rules = RuleSet::from_yaml(
            "sections: [{ kind: heading, pattern: 'END' }]\ntrailing: ['bye']",
        )
        .unwrap();
        let pruner = BoilerplatePruner::new(&rules, false).unwrap();
        assert_eq!(pruner.prune_text("keep END drop".into()), "keep");
        assert_eq!(pruner.prune_text("keep ログイン bye".into()), "keep ログイン");
    }
}

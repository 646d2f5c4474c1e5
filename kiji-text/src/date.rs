//! Embedded timestamp extraction.
//!
//! Looks for the first `YYYY年MM月DD日 HH:MM` in the text, converts it to
//! `YYYY-MM-DD HH:MM`, and removes that one occurrence. Later occurrences
//! are left in place.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use kiji_common::{DatedDocument, NormalizedDocument, UNKNOWN_DATE};
use regex::Regex;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{4}年[0-9]{2}月[0-9]{2}日 [0-9]{2}:[0-9]{2}").expect("static date regex")
});

const SOURCE_FORMAT: &str = "%Y年%m月%d日 %H:%M";
const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Default, Clone, Copy)]
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, doc: NormalizedDocument) -> DatedDocument {
        let (date, text) = self.extract_str(&doc.text);
        DatedDocument {
            url: doc.url,
            date,
            text,
            links: doc.links,
        }
    }

    /// Returns `(date, text without the first match)`.
    ///
    /// ```
    /// use kiji_text::DateExtractor;
    ///
    /// let (date, rest) = DateExtractor::new().extract_str("公開 2023年06月21日 14:30 本文");
    /// assert_eq!(date, "2023-06-21 14:30");
    /// assert_eq!(rest, "公開  本文");
    /// ```
    pub fn extract_str(&self, text: &str) -> (String, String) {
        let Some(found) = DATE_RE.find(text) else {
            return (UNKNOWN_DATE.to_string(), text.to_string());
        };

        let date = NaiveDateTime::parse_from_str(found.as_str(), SOURCE_FORMAT)
            .map(|dt| dt.format(CANONICAL_FORMAT).to_string())
            .unwrap_or_else(|_| UNKNOWN_DATE.to_string());

        let mut rest = String::with_capacity(text.len() - found.len());
        rest.push_str(&text[..found.start()]);
        rest.push_str(&text[found.end()..]);
        (date, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_and_removes_first_occurrence_only() {
        let text = "2023年06月21日 14:30 記事 2024年01月02日 03:04";
        let (date, rest) = DateExtractor::new().extract_str(text);
        assert_eq!(date, "2023-06-21 14:30");
        assert_eq!(rest, " 記事 2024年01月02日 03:04");
    }

    #[test]
    fn invalid_calendar_date_is_unknown_but_still_removed() {
        let (date, rest) = DateExtractor::new().extract_str("a 2023年13月40日 25:61 b");
        assert_eq!(date, UNKNOWN_DATE);
        assert_eq!(rest, "a  b");
    }

    #[test]
    fn no_match_leaves_text_unchanged() {
        let text = "2023年6月21日 14:30 は一桁の月";
        let (date, rest) = DateExtractor::new().extract_str(text);
        assert_eq!(date, UNKNOWN_DATE);
        assert_eq!(rest, text);
    }

    #[test]
    fn document_fields_carry_over() {
        let doc = NormalizedDocument {
            url: "u".into(),
            text: "2020年02月29日 23:59".into(),
            links: vec!["l".into()],
        };
        let dated = DateExtractor::new().extract(doc);
        assert_eq!(dated.date, "2020-02-29 23:59");
        assert_eq!(dated.text, "");
        assert_eq!(dated.links, ["l"]);
    }
}

//! Regex tokenizers, one per highlighted category.
//!
//! Every pattern is compiled once into a shared, immutable [`Regex`]. The
//! `regex` crate keeps no scan position between calls and runs in linear time,
//! so matching is reentrant and has no pathological inputs.

use regex::Regex;
use std::sync::OnceLock;

use super::span::{Category, Token};

/// Opening of a fenced code block written as a plain paragraph.
pub const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// `[^note]`
    Footnote,
    /// `<tag ...>` optionally followed by text and a closing tag, one line.
    Html,
    /// Bare `http(s)://` or `ftp://` URLs, scheme case-insensitive.
    Link,
    /// `{{ ... }}` with at least one non-`}` inside.
    JinjaVariable,
    /// `{% ... %}` with at least one non-`%` inside.
    JinjaTag,
    /// `{# ... #}` on a single line.
    JinjaComment,
}

impl Matcher {
    fn regex(self) -> &'static Regex {
        static FOOTNOTE: OnceLock<Regex> = OnceLock::new();
        static HTML: OnceLock<Regex> = OnceLock::new();
        static LINK: OnceLock<Regex> = OnceLock::new();
        static JINJA_VARIABLE: OnceLock<Regex> = OnceLock::new();
        static JINJA_TAG: OnceLock<Regex> = OnceLock::new();
        static JINJA_COMMENT: OnceLock<Regex> = OnceLock::new();

        match self {
            Matcher::Footnote => FOOTNOTE
                .get_or_init(|| Regex::new(r"\[\^[^\]]+\]").expect("Invalid footnote regex")),
            Matcher::Html => HTML.get_or_init(|| {
                Regex::new(r#"<[a-z]+[\s"'=:;()A-Za-z0-9_\-\[\]/.]*/?>(.*</[a-z]+>:?)?"#)
                    .expect("Invalid HTML regex")
            }),
            Matcher::Link => LINK.get_or_init(|| {
                Regex::new(r"(?i)(https?|ftp)://[-A-Za-z0-9+&@#/%?=~_|!:,.;]+[-A-Za-z0-9+&@#/%=~_|]")
                    .expect("Invalid link regex")
            }),
            Matcher::JinjaVariable => JINJA_VARIABLE
                .get_or_init(|| Regex::new(r"\{\{[^}]+\}\}").expect("Invalid Jinja variable regex")),
            Matcher::JinjaTag => JINJA_TAG
                .get_or_init(|| Regex::new(r"\{%[^%]+%\}").expect("Invalid Jinja tag regex")),
            Matcher::JinjaComment => JINJA_COMMENT
                .get_or_init(|| Regex::new(r"\{#[^\n]*?#\}").expect("Invalid Jinja comment regex")),
        }
    }

    fn category(self, matched: &str) -> Category {
        match self {
            Matcher::Footnote => Category::FootnoteRef,
            Matcher::Html => Category::Html,
            Matcher::Link => Category::Link {
                target: matched.to_string(),
            },
            Matcher::JinjaVariable => Category::JinjaVariable,
            Matcher::JinjaTag => Category::JinjaTag,
            Matcher::JinjaComment => Category::JinjaComment,
        }
    }

    /// All non-overlapping matches in `text`, ascending by start.
    pub fn find(self, text: &str) -> Vec<Token> {
        let mut chars = CharOffsets::new(text);
        self.regex()
            .find_iter(text)
            .map(|m| {
                let start = chars.at(m.start());
                let end = chars.at(m.end());
                Token {
                    start,
                    end,
                    category: self.category(m.as_str()),
                }
            })
            .collect()
    }
}

/// Converts ascending byte offsets to char offsets without rescanning from 0.
struct CharOffsets<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharOffsets<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    fn at(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            return self.text[..byte].chars().count();
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

/// Groups of matchers the decorator switches on and off together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchGroup {
    /// Footnote references then inline HTML.
    Markup,
    Link,
    /// Variables, tags, then comments.
    Jinja,
}

impl MatchGroup {
    pub fn matchers(self) -> &'static [Matcher] {
        match self {
            MatchGroup::Markup => &[Matcher::Footnote, Matcher::Html],
            MatchGroup::Link => &[Matcher::Link],
            MatchGroup::Jinja => &[
                Matcher::JinjaVariable,
                Matcher::JinjaTag,
                Matcher::JinjaComment,
            ],
        }
    }
}

/// Source of tokens for the decorator.
pub trait Scanner {
    fn scan(&self, group: MatchGroup, text: &str) -> Vec<Token>;
}

impl<S: Scanner + ?Sized> Scanner for &S {
    fn scan(&self, group: MatchGroup, text: &str) -> Vec<Token> {
        (**self).scan(group, text)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexScanner;

impl Scanner for RegexScanner {
    fn scan(&self, group: MatchGroup, text: &str) -> Vec<Token> {
        group
            .matchers()
            .iter()
            .flat_map(|matcher| matcher.find(text))
            .collect()
    }
}

fn table_row_regex() -> &'static Regex {
    static TABLE_ROW: OnceLock<Regex> = OnceLock::new();
    TABLE_ROW.get_or_init(|| Regex::new(r"^\|([^|]+\|)+$").expect("Invalid table row regex"))
}

/// Marker for a paragraph that is a raw code fence or table row.
///
/// A fence yields its three backticks; a `| a | b |` row yields the whole line.
pub fn line_marker(text: &str) -> Option<Token> {
    if text.starts_with(FENCE) {
        return Some(Token {
            start: 0,
            end: FENCE.len(),
            category: Category::CodeFenceMarker,
        });
    }
    if table_row_regex().is_match(text) {
        return Some(Token {
            start: 0,
            end: text.chars().count(),
            category: Category::TableRowMarker,
        });
    }
    None
}

use serde::Serialize;

use crate::document::{Path, Point, Range};

/// What a highlighted region is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Category {
    FootnoteRef,
    Html,
    Link { target: String },
    JinjaVariable,
    JinjaTag,
    JinjaComment,
    CodeFenceMarker,
    TableRowMarker,
    /// Supplied by the host (search hits and the like), never produced by a matcher.
    Host { class: String },
}

impl Category {
    pub fn is_jinja(&self) -> bool {
        matches!(
            self,
            Category::JinjaVariable | Category::JinjaTag | Category::JinjaComment
        )
    }
}

/// A match inside a single string, in char offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub category: Category,
}

/// A highlighted region of one text run inside an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Path of the decorated element.
    pub path: Path,
    /// Index of the text run within that element.
    pub child_index: usize,
    pub start: usize,
    pub end: usize,
    pub category: Category,
}

impl Span {
    pub fn new(path: &Path, child_index: usize, token: Token) -> Self {
        Self {
            path: path.clone(),
            child_index,
            start: token.start,
            end: token.end,
            category: token.category,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The span as a document range over the text run it covers.
    pub fn range(&self) -> Range {
        let run = self.path.child(self.child_index);
        Range::new(
            Point::new(run.clone(), self.start),
            Point::new(run, self.end),
        )
    }
}

use super::{Element, NodeId, Path, Point, Range};

/// A single document mutation. Several edits passed to
/// [`Document::apply`](super::Document::apply) land together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    InsertText { at: Point, text: String },
    Delete { range: Range },
    InsertNode { at: Path, node: Element },
    RemoveNode { at: Path },
    SetDirty { at: Path, dirty: bool },
}

/// Result of applying a batch of edits
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub version: u64,
    /// Paths touched by the edits, in the order they were applied.
    pub changed: Vec<Path>,
    /// Element ids that no longer exist in the document.
    pub retired: Vec<NodeId>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("No node at path {0}")]
    InvalidPath(Path),
    #[error("Node at {0} is not a text run")]
    NotText(Path),
    #[error("Node at {0} is not an element")]
    NotElement(Path),
    #[error("Offset {offset} is outside text run at {path} (length {len})")]
    OffsetOutOfRange { path: Path, offset: usize, len: usize },
    #[error("Range ends before it starts: {anchor:?} .. {focus:?}")]
    InvalidRange { anchor: Point, focus: Point },
}

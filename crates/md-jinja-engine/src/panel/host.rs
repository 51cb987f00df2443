use std::collections::HashMap;

use crate::document::{Document, DocumentError, Edit, Patch, Path, Point};

/// Screen rectangle of a rendered node, in host units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub height: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

impl Viewport {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Keyboard,
    OutsideClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Document operations the panel needs to commit a template.
pub trait DocumentHost {
    fn end_of(&self, path: &Path) -> Option<Point>;
    fn point_before(&self, at: &Point, distance: usize) -> Option<Point>;
    /// Must apply every edit or none, with no observable state in between.
    fn apply_edits(&mut self, edits: Vec<Edit>) -> Result<Patch, DocumentError>;
    fn focus(&mut self);
    fn string_at(&self, path: &Path) -> String;
}

impl DocumentHost for Document {
    fn end_of(&self, path: &Path) -> Option<Point> {
        self.end(path)
    }

    fn point_before(&self, at: &Point, distance: usize) -> Option<Point> {
        self.before(at, distance)
    }

    fn apply_edits(&mut self, edits: Vec<Edit>) -> Result<Patch, DocumentError> {
        self.apply(edits)
    }

    fn focus(&mut self) {
        Document::focus(self);
    }

    fn string_at(&self, path: &Path) -> String {
        self.string(path)
    }
}

/// Everything the panel needs from the editor it floats over.
pub trait EditorHost: DocumentHost {
    /// Where the node at `path` is drawn, if it is drawn at all.
    fn anchor_rect(&self, path: &Path) -> Option<Rect>;
    fn viewport(&self) -> Viewport;
    fn listen(&mut self, kind: ListenerKind) -> ListenerId;
    fn unlisten(&mut self, id: ListenerId);
}

/// An [`EditorHost`] without a screen: a document, fixed node rectangles and
/// a listener registry.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    pub document: Document,
    pub viewport: Viewport,
    rects: HashMap<Path, Rect>,
    listeners: HashMap<ListenerId, ListenerKind>,
    next_listener: u64,
    patches: Vec<Patch>,
}

impl HeadlessHost {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            viewport: Viewport::new(800.0),
            ..Self::default()
        }
    }

    pub fn set_rect(&mut self, path: Path, rect: Rect) {
        self.rects.insert(path, rect);
    }

    pub fn live_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_listening(&self, kind: ListenerKind) -> bool {
        self.listeners.values().any(|k| *k == kind)
    }

    /// Patches applied since the last call, for syncing a decorator.
    pub fn take_patches(&mut self) -> Vec<Patch> {
        std::mem::take(&mut self.patches)
    }
}

impl DocumentHost for HeadlessHost {
    fn end_of(&self, path: &Path) -> Option<Point> {
        self.document.end(path)
    }

    fn point_before(&self, at: &Point, distance: usize) -> Option<Point> {
        self.document.before(at, distance)
    }

    fn apply_edits(&mut self, edits: Vec<Edit>) -> Result<Patch, DocumentError> {
        let patch = self.document.apply(edits)?;
        self.patches.push(patch.clone());
        Ok(patch)
    }

    fn focus(&mut self) {
        self.document.focus();
    }

    fn string_at(&self, path: &Path) -> String {
        self.document.string(path)
    }
}

impl EditorHost for HeadlessHost {
    fn anchor_rect(&self, path: &Path) -> Option<Rect> {
        self.document.node(path)?;
        self.rects.get(path).copied()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn listen(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, kind);
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }
}

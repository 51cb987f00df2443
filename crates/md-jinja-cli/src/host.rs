use std::collections::HashMap;

use md_jinja_engine::document::{Document, DocumentError, Edit, Patch, Path, Point};
use md_jinja_engine::panel::{DocumentHost, EditorHost, ListenerId, ListenerKind, Rect, Viewport};

/// The terminal editor as seen by the template panel.
///
/// Block rectangles are recorded by the renderer on every frame, in terminal
/// cells, so the panel is always placed against what was last drawn.
#[derive(Debug, Default)]
pub struct TerminalHost {
    pub document: Document,
    rects: HashMap<Path, Rect>,
    viewport: Viewport,
    listeners: HashMap<ListenerId, ListenerKind>,
    next_listener: u64,
    patches: Vec<Patch>,
}

impl TerminalHost {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    /// Forget the previous frame's layout.
    pub fn begin_frame(&mut self, height: u16) {
        self.rects.clear();
        self.viewport = Viewport::new(f32::from(height));
    }

    pub fn record_block(&mut self, index: usize, x: u16, y: u16, width: u16) {
        let (x, y) = (f32::from(x), f32::from(y));
        self.rects
            .insert(Path::from([index]), Rect::new(x, y, x + f32::from(width), y + 1.0));
    }

    /// Whether an open panel has claimed events of this kind.
    pub fn captures(&self, kind: ListenerKind) -> bool {
        self.listeners.values().any(|k| *k == kind)
    }

    /// Apply edits made by the editor itself, outside the panel.
    pub fn edit(&mut self, edits: Vec<Edit>) -> Result<(), DocumentError> {
        self.apply_edits(edits).map(|_| ())
    }

    pub fn take_patches(&mut self) -> Vec<Patch> {
        std::mem::take(&mut self.patches)
    }
}

impl DocumentHost for TerminalHost {
    fn end_of(&self, path: &Path) -> Option<Point> {
        self.document.end(path)
    }

    fn point_before(&self, at: &Point, distance: usize) -> Option<Point> {
        self.document.before(at, distance)
    }

    fn apply_edits(&mut self, edits: Vec<Edit>) -> Result<Patch, DocumentError> {
        let patch = self.document.apply(edits)?;
        log::debug!("document v{} changed {:?}", patch.version, patch.changed);
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

impl EditorHost for TerminalHost {
    fn anchor_rect(&self, path: &Path) -> Option<Rect> {
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

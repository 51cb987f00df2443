use std::collections::HashMap;

use super::span::Span;
use crate::document::{Document, NodeId, NodeKind, Path};

#[derive(Debug, Clone, PartialEq)]
struct CacheEntry {
    path: Path,
    spans: Vec<Span>,
}

/// Last computed spans per element, keyed by element identity.
///
/// An entry is only valid while the element is still at the path it was
/// decorated at: the spans carry that path, so a moved element must be
/// rescanned even though its text is unchanged. Entries live as long as their
/// element; feed [`Patch::retired`](crate::document::Patch::retired) to
/// [`DecorationCache::forget_all`] or call [`DecorationCache::retain_live`]
/// after edits.
#[derive(Debug, Clone, Default)]
pub struct DecorationCache {
    entries: HashMap<NodeId, CacheEntry>,
}

impl DecorationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached spans for `id`, if they were computed at `path`.
    pub fn get(&self, id: NodeId, path: &Path) -> Option<&[Span]> {
        self.entries
            .get(&id)
            .filter(|entry| entry.path == *path)
            .map(|entry| entry.spans.as_slice())
    }

    pub fn set(&mut self, id: NodeId, path: Path, spans: Vec<Span>) {
        self.entries.insert(id, CacheEntry { path, spans });
    }

    pub fn forget(&mut self, id: NodeId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn forget_all(&mut self, ids: &[NodeId]) {
        for id in ids {
            self.entries.remove(id);
        }
    }

    /// Drop entries whose element is no longer in `document`.
    pub fn retain_live(&mut self, document: &Document) {
        let live: std::collections::HashSet<NodeId> = document
            .elements()
            .iter()
            .map(|(_, element)| element.id)
            .collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id));
        log::trace!(
            "decoration cache pruned {} of {before} entries",
            before - self.entries.len()
        );
    }

    /// Drop entries for every element of `kind`, e.g. inline math after the
    /// math renderer changes.
    pub fn forget_kind(&mut self, document: &Document, kind: NodeKind) {
        for (_, element) in document.elements() {
            if element.kind == kind {
                self.entries.remove(&element.id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Edit, Element, Point};
    use crate::highlight::span::Category;

    fn span_at(path: &Path) -> Span {
        Span {
            path: path.clone(),
            child_index: 0,
            start: 0,
            end: 1,
            category: Category::Html,
        }
    }

    #[test]
    fn hit_requires_same_path() {
        let mut cache = DecorationCache::new();
        let id = NodeId::fresh();
        let path = Path::from([0]);
        cache.set(id, path.clone(), vec![span_at(&path)]);

        assert_eq!(cache.get(id, &path), Some(&[span_at(&path)][..]));
        assert_eq!(cache.get(id, &Path::from([1])), None);
        assert_eq!(cache.get(NodeId::fresh(), &path), None);
    }

    #[test]
    fn set_overwrites() {
        let mut cache = DecorationCache::new();
        let id = NodeId::fresh();
        cache.set(id, Path::from([0]), vec![]);
        cache.set(id, Path::from([1]), vec![span_at(&Path::from([1]))]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(id, &Path::from([0])), None);
        assert_eq!(cache.get(id, &Path::from([1])).map(<[Span]>::len), Some(1));
    }

    #[test]
    fn retain_live_drops_removed_elements() {
        let mut document = Document::from_markdown_lines("a\nb");
        let mut cache = DecorationCache::new();
        for (path, element) in document.elements() {
            cache.set(element.id, path, vec![]);
        }
        assert_eq!(cache.len(), 2);

        document
            .apply(vec![Edit::RemoveNode { at: Path::from([0]) }])
            .unwrap();
        cache.retain_live(&document);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn forget_all_accepts_patch_retirements() {
        let mut document = Document::from_markdown_lines("a\nb");
        let mut cache = DecorationCache::new();
        for (path, element) in document.elements() {
            cache.set(element.id, path, vec![]);
        }
        let patch = document
            .apply(vec![Edit::InsertText {
                at: Point::new([1, 0], 1),
                text: "!".into(),
            }])
            .unwrap();
        cache.forget_all(&patch.retired);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn forget_kind_only_touches_that_kind() {
        let document = Document::from_blocks(vec![
            Element::paragraph("p"),
            Element::text(NodeKind::InlineMath, "x"),
        ]);
        let mut cache = DecorationCache::new();
        for (path, element) in document.elements() {
            cache.set(element.id, path, vec![]);
        }
        cache.forget_kind(&document, NodeKind::InlineMath);
        assert_eq!(cache.len(), 1);
        assert!(cache.forget(document.blocks().next().unwrap().id));
        assert!(cache.is_empty());
    }
}

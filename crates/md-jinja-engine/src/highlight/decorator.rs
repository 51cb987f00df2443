use std::collections::HashMap;

use super::cache::DecorationCache;
use super::matchers::{MatchGroup, RegexScanner, Scanner, line_marker};
use super::span::Span;
use crate::document::{Document, Element, Node, NodeId, NodeKind, Patch, Path};

/// How an element kind takes part in decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationMode {
    /// Only host-supplied highlights are returned.
    HostOnly,
    /// Text runs are scanned; `markers` adds fence/table-row markers.
    Scan { markers: bool },
}

impl NodeKind {
    /// `None` for kinds that are never decorated.
    pub fn decoration_mode(self) -> Option<DecorationMode> {
        match self {
            NodeKind::Paragraph => Some(DecorationMode::Scan { markers: true }),
            NodeKind::TableCell => Some(DecorationMode::Scan { markers: false }),
            NodeKind::Table | NodeKind::Code | NodeKind::Heading | NodeKind::InlineMath => {
                Some(DecorationMode::HostOnly)
            }
            NodeKind::BlockQuote
            | NodeKind::List
            | NodeKind::ListItem
            | NodeKind::ThematicBreak
            | NodeKind::Html => None,
        }
    }
}

/// Produces highlight spans for elements, one element at a time.
///
/// Scanned spans are cached per element identity and path. A cache hit
/// returns exactly the spans the miss produced, fence/table markers included.
pub struct Decorator<S = RegexScanner> {
    scanner: S,
    cache: DecorationCache,
    host_highlights: HashMap<NodeId, Vec<Span>>,
    jinja_enabled: bool,
}

impl Decorator<RegexScanner> {
    pub fn new(jinja_enabled: bool) -> Self {
        Self::with_scanner(RegexScanner, jinja_enabled)
    }
}

impl<S: Scanner> Decorator<S> {
    pub fn with_scanner(scanner: S, jinja_enabled: bool) -> Self {
        Self {
            scanner,
            cache: DecorationCache::new(),
            host_highlights: HashMap::new(),
            jinja_enabled,
        }
    }

    pub fn jinja_enabled(&self) -> bool {
        self.jinja_enabled
    }

    /// Cached spans were computed under the old flag, so a change clears them.
    pub fn set_jinja_enabled(&mut self, enabled: bool) {
        if self.jinja_enabled != enabled {
            self.jinja_enabled = enabled;
            self.cache.clear();
        }
    }

    pub fn cache(&self) -> &DecorationCache {
        &self.cache
    }

    /// Extra spans (search hits etc.) returned ahead of scanned spans for `id`.
    pub fn set_host_highlights(&mut self, id: NodeId, spans: Vec<Span>) {
        self.host_highlights.insert(id, spans);
    }

    /// Forget everything tied to elements the patch retired.
    pub fn sync(&mut self, patch: &Patch) {
        self.cache.forget_all(&patch.retired);
        for id in &patch.retired {
            self.host_highlights.remove(id);
        }
    }

    pub fn decorate(&mut self, element: &Element, path: &Path) -> Vec<Span> {
        let Some(mode) = element.kind.decoration_mode() else {
            return Vec::new();
        };

        let mut spans = self
            .host_highlights
            .get(&element.id)
            .cloned()
            .unwrap_or_default();

        if let DecorationMode::Scan { markers } = mode {
            if let Some(cached) = self.cache.get(element.id, path) {
                spans.extend_from_slice(cached);
            } else {
                log::trace!("decorating {:?} at {path}", element.kind);
                let scanned = self.scan(element, path, markers);
                spans.extend_from_slice(&scanned);
                self.cache.set(element.id, path.clone(), scanned);
            }
        }

        spans
    }

    /// Decorate every element in document order.
    pub fn decorate_document(&mut self, document: &Document) -> Vec<Span> {
        document
            .elements()
            .into_iter()
            .flat_map(|(path, element)| self.decorate(element, &path))
            .collect()
    }

    fn scan(&self, element: &Element, path: &Path, markers: bool) -> Vec<Span> {
        let mut spans = Vec::new();

        for (index, child) in element.children.iter().enumerate() {
            let Node::Text(run) = child else {
                continue;
            };
            if run.text.is_empty() {
                continue;
            }

            let mut groups = vec![MatchGroup::Markup];
            if !run.is_annotated() {
                groups.push(MatchGroup::Link);
            }
            if self.jinja_enabled && !run.dirty {
                groups.push(MatchGroup::Jinja);
            }
            for group in groups {
                spans.extend(
                    self.scanner
                        .scan(group, &run.text)
                        .into_iter()
                        .map(|token| Span::new(path, index, token)),
                );
            }
        }

        if markers
            && let [Node::Text(run)] = element.children.as_slice()
            && !run.dirty
            && let Some(token) = line_marker(&run.text)
        {
            spans.push(Span::new(path, 0, token));
        }

        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextRun;
    use crate::highlight::span::{Category, Token};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::cell::Cell;

    /// Counts scans and delegates to the regex scanner.
    #[derive(Default)]
    struct CountingScanner {
        calls: Cell<usize>,
    }

    impl Scanner for CountingScanner {
        fn scan(&self, group: MatchGroup, text: &str) -> Vec<Token> {
            self.calls.set(self.calls.get() + 1);
            RegexScanner.scan(group, text)
        }
    }

    fn jinja_spans(spans: &[Span]) -> Vec<&Span> {
        spans.iter().filter(|s| s.category.is_jinja()).collect()
    }

    #[test]
    fn jinja_spans_only_when_enabled() {
        let element = Element::paragraph("{{ x }}");
        let path = Path::from([0]);

        let spans = Decorator::new(false).decorate(&element, &path);
        assert!(jinja_spans(&spans).is_empty());

        let spans = Decorator::new(true).decorate(&element, &path);
        let jinja = jinja_spans(&spans);
        assert_eq!(jinja.len(), 1);
        assert_eq!((jinja[0].start, jinja[0].end), (0, 7));
        assert_eq!(jinja[0].category, Category::JinjaVariable);
    }

    #[test]
    fn ineligible_kinds_yield_nothing() {
        let mut decorator = Decorator::new(true);
        for kind in [NodeKind::BlockQuote, NodeKind::List, NodeKind::ListItem, NodeKind::Html] {
            let element = Element::text(kind, "{{ x }} https://a.b [^1]");
            assert!(decorator.decorate(&element, &Path::from([0])).is_empty());
        }
    }

    #[test]
    fn host_only_kinds_return_host_highlights_unscanned() {
        let mut decorator = Decorator::new(true);
        let element = Element::text(NodeKind::Code, "{{ x }}");
        let path = Path::from([0]);
        assert!(decorator.decorate(&element, &path).is_empty());

        let hit = Span {
            path: path.clone(),
            child_index: 0,
            start: 3,
            end: 4,
            category: Category::Host {
                class: "search".into(),
            },
        };
        decorator.set_host_highlights(element.id, vec![hit.clone()]);
        assert_eq!(decorator.decorate(&element, &path), vec![hit.clone()]);
        assert_eq!(decorator.decorate(&element, &path), vec![hit]);
        assert!(decorator.cache().is_empty());
    }

    #[test]
    fn cache_hit_skips_scanning() {
        let scanner = CountingScanner::default();
        let mut decorator = Decorator::with_scanner(&scanner, true);
        let element = Element::paragraph("a {{ b }} c");
        let path = Path::from([0]);

        let first = decorator.decorate(&element, &path);
        let calls = scanner.calls.get();
        assert_eq!(calls, 3);

        let second = decorator.decorate(&element, &path);
        assert_eq!(first, second);
        assert_eq!(scanner.calls.get(), calls);

        let moved = decorator.decorate(&element, &Path::from([1]));
        assert_eq!(scanner.calls.get(), calls * 2);
        assert!(moved.iter().all(|s| s.path == Path::from([1])));
    }

    #[test]
    fn annotated_runs_skip_link_matching() {
        let element = Element::new(
            NodeKind::Paragraph,
            vec![
                TextRun::new("https://a.example").with_url("https://a.example").into(),
                TextRun::new(" see https://b.example").into(),
            ],
        );
        let spans = Decorator::new(false).decorate(&element, &Path::from([0]));
        let links: Vec<(usize, usize)> = spans
            .iter()
            .filter(|s| matches!(s.category, Category::Link { .. }))
            .map(|s| (s.child_index, s.start))
            .collect();
        assert_eq!(links, vec![(1, 5)]);
    }

    #[test]
    fn dirty_runs_skip_jinja_but_keep_markup() {
        let element = Element::new(
            NodeKind::Paragraph,
            vec![TextRun::new("{{ x }} [^1]").dirty().into()],
        );
        let spans = Decorator::new(true).decorate(&element, &Path::from([0]));
        let categories: Vec<&Category> = spans.iter().map(|s| &s.category).collect();
        assert_eq!(categories, vec![&Category::FootnoteRef]);
    }

    #[rstest]
    #[case("```rust")]
    #[case("| a | b |")]
    fn dirty_runs_get_no_line_marker(#[case] line: &str) {
        let element = Element::new(NodeKind::Paragraph, vec![TextRun::new(line).dirty().into()]);
        let spans = Decorator::new(true).decorate(&element, &Path::from([0]));
        assert!(!spans.iter().any(|s| matches!(
            s.category,
            Category::CodeFenceMarker | Category::TableRowMarker
        )));

        let clean = Element::paragraph(line);
        assert_eq!(Decorator::new(true).decorate(&clean, &Path::from([0])).len(), 1);
    }

    #[test]
    fn crlf_table_row_still_gets_a_marker() {
        let document = Document::from_markdown_lines("| a | b |\r\nnext");
        let spans = Decorator::new(true).decorate_document(&document);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].category, Category::TableRowMarker);
    }

    #[test]
    fn table_cells_do_not_get_line_markers() {
        let element = Element::text(NodeKind::TableCell, "```");
        assert!(Decorator::new(true).decorate(&element, &Path::from([0, 0])).is_empty());
    }

    #[test]
    fn marker_and_child_spans_share_one_cache_entry() {
        let scanner = CountingScanner::default();
        let mut decorator = Decorator::with_scanner(&scanner, true);
        let element = Element::paragraph("| {{ a }} | b |");
        let path = Path::from([2]);

        let first = decorator.decorate(&element, &path);
        let categories: Vec<&Category> = first.iter().map(|s| &s.category).collect();
        assert_eq!(
            categories,
            vec![&Category::JinjaVariable, &Category::TableRowMarker]
        );

        let second = decorator.decorate(&element, &path);
        assert_eq!(first, second);
        assert_eq!(scanner.calls.get(), 3);
    }

    #[test]
    fn multi_run_paragraph_gets_no_marker() {
        let element = Element::new(
            NodeKind::Paragraph,
            vec![TextRun::new("```").into(), TextRun::new("rust").into()],
        );
        let spans = Decorator::new(true).decorate(&element, &Path::from([0]));
        assert!(spans.is_empty());
    }

    #[test]
    fn toggling_jinja_clears_cache() {
        let mut decorator = Decorator::new(false);
        let element = Element::paragraph("{{ x }}");
        let path = Path::from([0]);
        assert!(decorator.decorate(&element, &path).is_empty());

        decorator.set_jinja_enabled(true);
        assert!(decorator.cache().is_empty());
        assert_eq!(decorator.decorate(&element, &path).len(), 1);
    }

    #[test]
    fn sync_forgets_retired_elements() {
        let mut document = Document::from_markdown_lines("{{ a }}\nb");
        let mut decorator = Decorator::new(true);
        decorator.decorate_document(&document);
        assert_eq!(decorator.cache().len(), 2);

        let patch = document
            .apply(vec![crate::document::Edit::InsertText {
                at: crate::document::Point::new([0, 0], 0),
                text: "x".into(),
            }])
            .unwrap();
        decorator.sync(&patch);
        assert_eq!(decorator.cache().len(), 1);
    }
}

use md_jinja_engine::document::{Document, Edit, Element, NodeKind, Path, Point, TextRun};
use md_jinja_engine::highlight::{Category, Decorator, Span};
use pretty_assertions::assert_eq;

fn fixture(name: &str) -> Document {
    let md = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.md",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    Document::from_markdown_lines(md.trim_end_matches('\n'))
}

#[test]
fn fixture_jinja_blocks() {
    let document = fixture("jinja_blocks");
    let spans = Decorator::new(true).decorate_document(&document);
    insta::assert_yaml_snapshot!("jinja_blocks", spans);
}

#[test]
fn jinja_disabled_leaves_markup_and_markers() {
    let document = fixture("jinja_blocks");
    let spans = Decorator::new(false).decorate_document(&document);

    assert!(spans.iter().all(|span| !span.category.is_jinja()));
    let categories: Vec<&Category> = spans.iter().map(|span| &span.category).collect();
    assert_eq!(
        categories,
        vec![
            &Category::FootnoteRef,
            &Category::TableRowMarker,
            &Category::CodeFenceMarker,
        ]
    );
}

#[test]
fn second_pass_is_served_from_cache() {
    let document = fixture("jinja_blocks");
    let mut decorator = Decorator::new(true);

    let first = decorator.decorate_document(&document);
    let cached = decorator.cache().len();
    let second = decorator.decorate_document(&document);

    assert_eq!(first, second);
    assert_eq!(decorator.cache().len(), cached);
}

#[test]
fn editing_one_block_only_rescans_that_block() {
    let mut document = fixture("jinja_blocks");
    let mut decorator = Decorator::new(true);
    let before = decorator.decorate_document(&document);

    let patch = document
        .apply(vec![Edit::InsertText {
            at: Point::new([0, 0], 0),
            text: "{{ greeting }} ".into(),
        }])
        .unwrap();
    decorator.sync(&patch);
    let after = decorator.decorate_document(&document);

    let first_block = |spans: &[Span]| -> Vec<(usize, usize)> {
        spans
            .iter()
            .filter(|span| span.path == Path::from([0]))
            .map(|span| (span.start, span.end))
            .collect()
    };
    assert_eq!(first_block(&before), vec![(6, 16)]);
    assert_eq!(first_block(&after), vec![(0, 14), (21, 31)]);

    let rest = |spans: &[Span]| -> Vec<Span> {
        spans
            .iter()
            .filter(|span| span.path != Path::from([0]))
            .cloned()
            .collect()
    };
    assert_eq!(rest(&before), rest(&after));
}

#[test]
fn code_blocks_are_never_scanned() {
    let document = Document::from_blocks(vec![
        Element::text(NodeKind::Code, "{{ not highlighted }}"),
        Element::text(NodeKind::InlineMath, "{% raw %}"),
    ]);
    let spans = Decorator::new(true).decorate_document(&document);
    assert_eq!(spans, vec![]);
}

#[test]
fn footnotes_and_links_inside_quotes_are_scanned_per_paragraph() {
    let document = Document::from_blocks(vec![Element::new(
        NodeKind::BlockQuote,
        vec![
            Element::new(
                NodeKind::Paragraph,
                vec![
                    TextRun::new("see ").into(),
                    TextRun::new("https://example.com/docs").with_url("https://example.com/docs").into(),
                    TextRun::new(" and https://jinja.palletsprojects.com/ [^2]").into(),
                ],
            )
            .into(),
        ],
    )]);

    let spans = Decorator::new(true).decorate_document(&document);
    let summary: Vec<(usize, usize, usize, &Category)> = spans
        .iter()
        .map(|span| (span.child_index, span.start, span.end, &span.category))
        .collect();

    assert!(spans.iter().all(|span| span.path == Path::from([0, 0])));
    assert_eq!(
        summary,
        vec![
            (2, 40, 44, &Category::FootnoteRef),
            (
                2,
                5,
                39,
                &Category::Link {
                    target: "https://jinja.palletsprojects.com/".into()
                }
            ),
        ]
    );
}

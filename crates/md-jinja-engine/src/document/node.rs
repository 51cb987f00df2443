use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an element instance.
///
/// Two elements with identical content but separate construction have different
/// ids. Cloning keeps the id; [`Element::fresh_copy`] does not.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Block and inline element categories understood by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Paragraph,
    TableCell,
    Table,
    Code,
    Heading,
    InlineMath,
    BlockQuote,
    List,
    ListItem,
    ThematicBreak,
    Html,
}

/// A leaf of inline text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub text: String,
    pub url: Option<String>,
    pub doc_id: Option<String>,
    pub hash: Option<String>,
    /// Set by the host while the run is mid-composition (IME etc).
    pub dirty: bool,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    /// True when the run already points somewhere, so bare-URL matching is skipped.
    pub fn is_annotated(&self) -> bool {
        self.url.is_some() || self.doc_id.is_some() || self.hash.is_some()
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(TextRun),
}

impl Node {
    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Node::Text(run) => Some(run),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

impl From<TextRun> for Node {
    fn from(run: TextRun) -> Self {
        Node::Text(run)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: NodeId,
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            id: NodeId::fresh(),
            kind,
            children,
        }
    }

    /// Element holding a single plain text run.
    pub fn text(kind: NodeKind, text: impl Into<String>) -> Self {
        Self::new(kind, vec![Node::Text(TextRun::new(text))])
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::text(NodeKind::Paragraph, text)
    }

    /// Same content, new identity for this element and every descendant.
    pub fn fresh_copy(&self) -> Self {
        Self {
            id: NodeId::fresh(),
            kind: self.kind,
            children: self
                .children
                .iter()
                .map(|child| match child {
                    Node::Element(element) => Node::Element(element.fresh_copy()),
                    Node::Text(run) => Node::Text(run.clone()),
                })
                .collect(),
        }
    }

    /// Concatenated text of every run below this element.
    pub fn string(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(run) => out.push_str(&run.text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Ids of this element and every element below it.
    pub fn subtree_ids(&self) -> Vec<NodeId> {
        let mut ids = vec![self.id];
        for child in &self.children {
            if let Node::Element(element) = child {
                ids.extend(element.subtree_ids());
            }
        }
        ids
    }
}

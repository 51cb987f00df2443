use std::collections::HashSet;

use super::{DocumentError, Edit, Element, Node, NodeId, NodeKind, Patch, Path, Point, Range, TextRun};

/// In-memory rich-text document.
///
/// The tree is a list of top-level elements whose children are either nested
/// elements or text runs. Edits go through [`Document::apply`], which is
/// all-or-nothing and gives every element whose content changed a new
/// [`NodeId`]. Identity therefore behaves like an immutable tree: a node id
/// always refers to the same content, so anything keyed by id only has to
/// check whether the node has moved.
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Vec<Node>,
    version: u64,
    focused: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Element>) -> Self {
        Self {
            root: blocks.into_iter().map(Node::Element).collect(),
            version: 0,
            focused: false,
        }
    }

    /// One block per line. Lines starting with `#` become headings, everything
    /// else a paragraph holding the raw line.
    pub fn from_markdown_lines(text: &str) -> Self {
        let blocks = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .map(|line| {
                let kind = if line.starts_with('#') {
                    NodeKind::Heading
                } else {
                    NodeKind::Paragraph
                };
                Element::text(kind, line)
            })
            .collect();
        Self::from_blocks(blocks)
    }

    /// Inverse of [`Document::from_markdown_lines`].
    pub fn to_text(&self) -> String {
        self.blocks()
            .map(Element::string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Element> {
        self.root.iter().filter_map(Node::as_element)
    }

    pub fn block_count(&self) -> usize {
        self.root.len()
    }

    pub fn node(&self, path: &Path) -> Option<&Node> {
        node_in(&self.root, &path.0)
    }

    pub fn element(&self, path: &Path) -> Option<&Element> {
        self.node(path).and_then(Node::as_element)
    }

    pub fn text(&self, path: &Path) -> Option<&TextRun> {
        self.node(path).and_then(Node::as_text)
    }

    /// Concatenated text under `path`, empty if the path is invalid.
    pub fn string(&self, path: &Path) -> String {
        match self.node(path) {
            Some(Node::Text(run)) => run.text.clone(),
            Some(Node::Element(element)) => element.string(),
            None => String::new(),
        }
    }

    /// Every element with its path, parents before children.
    pub fn elements(&self) -> Vec<(Path, &Element)> {
        let mut out = Vec::new();
        collect_elements(&self.root, &Path::root(), &mut out);
        out
    }

    /// Paths of all text runs in document order.
    pub fn text_paths(&self) -> Vec<Path> {
        text_paths_in(&self.root)
    }

    /// End of the last text run at or below `path`.
    pub fn end(&self, path: &Path) -> Option<Point> {
        match self.node(path)? {
            Node::Text(run) => Some(Point::new(path.clone(), run.char_len())),
            Node::Element(_) => {
                let last = self
                    .text_paths()
                    .into_iter()
                    .filter(|p| p.starts_with(path))
                    .last()?;
                let len = self.text(&last)?.char_len();
                Some(Point::new(last, len))
            }
        }
    }

    /// The point `distance` characters before `at`, walking back across text
    /// runs. Block boundaries do not count as characters.
    pub fn before(&self, at: &Point, distance: usize) -> Option<Point> {
        let paths = self.text_paths();
        let index = paths.iter().position(|p| *p == at.path)?;
        let len = self.text(&at.path)?.char_len();
        if at.offset > len {
            return None;
        }
        if distance <= at.offset {
            return Some(Point::new(at.path.clone(), at.offset - distance));
        }

        let mut remaining = distance - at.offset;
        for path in paths[..index].iter().rev() {
            let len = self.text(path)?.char_len();
            if remaining <= len {
                return Some(Point::new(path.clone(), len - remaining));
            }
            remaining -= len;
        }
        None
    }

    /// Apply `edits` in order against a working copy and swap it in only if
    /// every edit succeeds.
    pub fn apply(&mut self, edits: Vec<Edit>) -> Result<Patch, DocumentError> {
        let original_ids: HashSet<NodeId> = self
            .elements()
            .iter()
            .map(|(_, element)| element.id)
            .collect();

        let mut work = self.root.clone();
        let mut changed = Vec::new();
        let mut retired = Vec::new();

        for edit in edits {
            let touched = apply_edit(&mut work, edit, &mut retired)?;
            for path in &touched {
                refresh_ancestors(&mut work, path, &mut retired);
            }
            changed.extend(touched);
        }

        retired.retain(|id| original_ids.contains(id));
        retired.sort();
        retired.dedup();

        self.root = work;
        self.version += 1;

        Ok(Patch {
            version: self.version,
            changed,
            retired,
        })
    }
}

fn node_in<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get(*first)?;
    if rest.is_empty() {
        return Some(node);
    }
    match node {
        Node::Element(element) => node_in(&element.children, rest),
        Node::Text(_) => None,
    }
}

fn children_mut<'a>(mut nodes: &'a mut Vec<Node>, parent: &[usize]) -> Option<&'a mut Vec<Node>> {
    for &index in parent {
        nodes = match nodes.get_mut(index)? {
            Node::Element(element) => &mut element.children,
            Node::Text(_) => return None,
        };
    }
    Some(nodes)
}

fn node_in_mut<'a>(nodes: &'a mut Vec<Node>, path: &[usize]) -> Option<&'a mut Node> {
    let (last, parent) = path.split_last()?;
    children_mut(nodes, parent)?.get_mut(*last)
}

fn collect_elements<'a>(nodes: &'a [Node], base: &Path, out: &mut Vec<(Path, &'a Element)>) {
    for (index, node) in nodes.iter().enumerate() {
        if let Node::Element(element) = node {
            let path = base.child(index);
            out.push((path.clone(), element));
            collect_elements(&element.children, &path, out);
        }
    }
}

fn text_paths_in(nodes: &[Node]) -> Vec<Path> {
    fn walk(nodes: &[Node], base: &Path, out: &mut Vec<Path>) {
        for (index, node) in nodes.iter().enumerate() {
            let path = base.child(index);
            match node {
                Node::Text(_) => out.push(path),
                Node::Element(element) => walk(&element.children, &path, out),
            }
        }
    }
    let mut out = Vec::new();
    walk(nodes, &Path::root(), &mut out);
    out
}

fn char_to_byte(text: &str, offset: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(offset)
}

fn text_mut<'a>(nodes: &'a mut Vec<Node>, path: &Path) -> Result<&'a mut TextRun, DocumentError> {
    match node_in_mut(nodes, &path.0) {
        Some(Node::Text(run)) => Ok(run),
        Some(Node::Element(_)) => Err(DocumentError::NotText(path.clone())),
        None => Err(DocumentError::InvalidPath(path.clone())),
    }
}

fn byte_offset(run: &TextRun, point: &Point) -> Result<usize, DocumentError> {
    char_to_byte(&run.text, point.offset).ok_or_else(|| DocumentError::OffsetOutOfRange {
        path: point.path.clone(),
        offset: point.offset,
        len: run.char_len(),
    })
}

/// The sibling list `path` indexes into.
fn siblings_mut<'a>(work: &'a mut Vec<Node>, path: &Path) -> Result<&'a mut Vec<Node>, DocumentError> {
    let parent = path
        .parent()
        .ok_or_else(|| DocumentError::InvalidPath(path.clone()))?;
    children_mut(work, &parent.0).ok_or_else(|| DocumentError::InvalidPath(path.clone()))
}

/// Applies one edit and returns the paths it touched.
fn apply_edit(work: &mut Vec<Node>, edit: Edit, retired: &mut Vec<NodeId>) -> Result<Vec<Path>, DocumentError> {
    match edit {
        Edit::InsertText { at, text } => {
            let run = text_mut(work, &at.path)?;
            let byte = byte_offset(run, &at)?;
            run.text.insert_str(byte, &text);
            Ok(vec![at.path])
        }
        Edit::Delete { range } => delete_range(work, range),
        Edit::InsertNode { at, node } => {
            let siblings = siblings_mut(work, &at)?;
            let index = at.last().unwrap_or_default();
            if index > siblings.len() {
                return Err(DocumentError::InvalidPath(at));
            }
            siblings.insert(index, Node::Element(node));
            Ok(vec![at])
        }
        Edit::RemoveNode { at } => {
            let siblings = siblings_mut(work, &at)?;
            let index = at.last().unwrap_or_default();
            if index >= siblings.len() {
                return Err(DocumentError::InvalidPath(at));
            }
            if let Node::Element(element) = siblings.remove(index) {
                retired.extend(element.subtree_ids());
            }
            Ok(vec![at])
        }
        Edit::SetDirty { at, dirty } => {
            text_mut(work, &at)?.dirty = dirty;
            Ok(vec![at])
        }
    }
}

fn delete_range(work: &mut Vec<Node>, range: Range) -> Result<Vec<Path>, DocumentError> {
    let Range { anchor, focus } = range;
    let paths = text_paths_in(work);
    let position = |point: &Point| -> Result<usize, DocumentError> {
        match node_in(work, &point.path.0) {
            Some(Node::Text(_)) => paths
                .iter()
                .position(|p| *p == point.path)
                .ok_or_else(|| DocumentError::InvalidPath(point.path.clone())),
            Some(Node::Element(_)) => Err(DocumentError::NotText(point.path.clone())),
            None => Err(DocumentError::InvalidPath(point.path.clone())),
        }
    };
    let start = position(&anchor)?;
    let end = position(&focus)?;
    if start > end || (start == end && anchor.offset > focus.offset) {
        return Err(DocumentError::InvalidRange { anchor, focus });
    }

    if start == end {
        let run = text_mut(work, &anchor.path)?;
        let from = byte_offset(run, &anchor)?;
        let to = byte_offset(run, &focus)?;
        run.text.replace_range(from..to, "");
        return Ok(vec![anchor.path]);
    }

    // Validate both ends before mutating anything.
    {
        let run = text_mut(work, &anchor.path)?;
        byte_offset(run, &anchor)?;
    }
    let to = {
        let run = text_mut(work, &focus.path)?;
        byte_offset(run, &focus)?
    };

    let run = text_mut(work, &anchor.path)?;
    let from = byte_offset(run, &anchor)?;
    run.text.truncate(from);
    for path in &paths[start + 1..end] {
        text_mut(work, path)?.text.clear();
    }
    text_mut(work, &focus.path)?.text.replace_range(..to, "");

    Ok(paths[start..=end].to_vec())
}

fn refresh_ancestors(work: &mut Vec<Node>, path: &Path, retired: &mut Vec<NodeId>) {
    for ancestor in path.ancestors() {
        if let Some(Node::Element(element)) = node_in_mut(work, &ancestor.0) {
            retired.push(element.id);
            element.id = NodeId::fresh();
        }
    }
}

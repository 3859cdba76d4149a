/// Structured-document tree for fetched pages.
///
/// Pages are parsed with `scraper` (html5ever underneath) and immediately copied into an
/// arena of plain nodes: tag, attributes, children, text. The arena is `Send`, cheap to
/// clone by subtree, and can be mutated, which the highlighter relies on. The parsed
/// `scraper::Html` never outlives `Document::parse`.
///
/// Node ids are indexes into the arena. Freshly parsed documents number their nodes in
/// document order; nodes created later are appended at the end.
use std::fmt::Write as _;

pub type NodeId = usize;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse a full HTML document. html5ever recovers from any malformed input, so this
    /// never fails; an empty string yields the usual `html/head/body` skeleton.
    pub fn parse(html: &str) -> Self {
        let parsed = scraper::Html::parse_document(html);
        let mut doc = Self::new();

        let mut stack: Vec<_> = parsed
            .tree
            .root()
            .children()
            .rev()
            .map(|child| (child, doc.root()))
            .collect();

        while let Some((node, parent)) = stack.pop() {
            let data = match node.value() {
                scraper::Node::Element(el) => NodeData::Element {
                    tag: el.name().to_ascii_lowercase(),
                    attrs: el
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect(),
                },
                scraper::Node::Text(text) => NodeData::Text(String::from(&**text)),
                scraper::Node::Comment(comment) => NodeData::Comment(String::from(&**comment)),
                _ => continue,
            };
            let id = doc.create(data);
            doc.append_child(parent, id);
            for child in node.children().rev() {
                stack.push((child, id));
            }
        }

        doc
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Lowercase tag name, or `None` for non-element nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag(id).is_some()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// The element's `id` attribute, ignoring empty values.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id").filter(|v| !v.is_empty())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Strict ancestors, nearest first. The root document node is included.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// The node itself, then its ancestors, restricted to elements satisfying `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.is_element(n) && pred(self, n))
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.nodes[next].children.iter().rev());
            Some(next)
        })
    }

    /// Every element reachable from the root, in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root()).filter(|&n| self.is_element(n))
    }

    /// Concatenated text of all descendant text nodes, like the DOM's `textContent`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            if let NodeData::Text(text) = &self.nodes[n].data {
                out.push_str(text);
            }
        }
        out
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&n| n == id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|&n| self.is_element(n))
    }

    /// First element in document order whose `id` attribute equals `element_id`.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        if element_id.is_empty() {
            return None;
        }
        self.elements()
            .find(|&n| self.element_id(n) == Some(element_id))
    }

    /// Deep copy of the subtree at `id` as a standalone document whose root is the copy.
    pub fn subtree(&self, id: NodeId) -> Document {
        let mut copy = Document {
            nodes: vec![Node {
                data: self.nodes[id].data.clone(),
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut stack: Vec<(NodeId, NodeId)> = self.nodes[id]
            .children
            .iter()
            .rev()
            .map(|&child| (child, 0))
            .collect();
        while let Some((src, parent)) = stack.pop() {
            let dst = copy.create(self.nodes[src].data.clone());
            copy.append_child(parent, dst);
            for &child in self.nodes[src].children.iter().rev() {
                stack.push((child, dst));
            }
        }
        copy
    }

    /// Allocate a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeData::Text(text.into()))
    }

    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.create(NodeData::Element {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Swap `target` for `replacements` in its parent's child list. The target is left
    /// detached in the arena. Does nothing for a parentless node.
    pub fn replace_with(&mut self, target: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.parent(target) else {
            return;
        };
        let Some(pos) = self.nodes[parent].children.iter().position(|&n| n == target) else {
            return;
        };
        for &r in replacements {
            self.nodes[r].parent = Some(parent);
        }
        self.nodes[parent]
            .children
            .splice(pos..=pos, replacements.iter().copied());
        self.nodes[target].parent = None;
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let NodeData::Element { attrs, .. } = &mut self.nodes[id].data else {
            return;
        };
        match attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case("class")) {
            Some((_, value)) if !value.trim().is_empty() => {
                value.push(' ');
                value.push_str(class);
            }
            Some((_, value)) => *value = class.to_string(),
            None => attrs.push(("class".to_string(), class.to_string())),
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let NodeData::Element { attrs, .. } = &mut self.nodes[id].data else {
            return;
        };
        if let Some((_, value)) = attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case("class")) {
            *value = value
                .split_ascii_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    /// Serialized markup of the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialized markup of the node itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].data {
            NodeData::Document => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
            NodeData::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|p| self.tag(p))
                    .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            NodeData::Comment(comment) => {
                let _ = write!(out, "<!--{comment}-->");
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

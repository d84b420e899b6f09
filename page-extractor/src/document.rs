use threadmood_core::ExtractionError;

/// Selector-like predicate over elements: `#id`, `.class` or a bare tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Id(String),
    Class(String),
    Tag(String),
}

impl Matcher {
    pub fn parse(selector: &str) -> Result<Self, ExtractionError> {
        let invalid = || ExtractionError::InvalidSelector {
            selector: selector.to_string(),
        };

        let trimmed = selector.trim();
        let (kind, name) = match trimmed.chars().next() {
            Some('#') => ('#', &trimmed[1..]),
            Some('.') => ('.', &trimmed[1..]),
            Some(_) => (' ', trimmed),
            None => return Err(invalid()),
        };

        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_name {
            return Err(invalid());
        }

        Ok(match kind {
            '#' => Matcher::Id(name.to_string()),
            '.' => Matcher::Class(name.to_string()),
            _ => Matcher::Tag(name.to_ascii_lowercase()),
        })
    }

    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Matcher::Id(id) => element.id.as_deref() == Some(id.as_str()),
            Matcher::Class(class) => element.classes.iter().any(|c| c == class),
            Matcher::Tag(tag) => element.tag == *tag,
        }
    }
}

/// Read-only view of a structured document.
///
/// Nodes are opaque handles. Every query returns nodes in document order.
pub trait StructuredDocument {
    type Node: Copy + PartialEq;

    /// Elements below `scope` (or anywhere, for `None`) that match, in
    /// document order. The scope node itself is never part of the result.
    fn query_all(&self, scope: Option<Self::Node>, matcher: &Matcher) -> Vec<Self::Node>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn matches(&self, node: Self::Node, matcher: &Matcher) -> bool;

    /// Concatenated text of every text node below `node`.
    fn text_content(&self, node: Self::Node) -> String;

    fn query_first(&self, scope: Option<Self::Node>, matcher: &Matcher) -> Option<Self::Node> {
        self.query_all(scope, matcher).into_iter().next()
    }

    /// Closest node matching `matcher`, starting with `node` itself.
    fn nearest_ancestor(&self, node: Self::Node, matcher: &Matcher) -> Option<Self::Node> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.matches(candidate, matcher) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone)]
enum NodeData {
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Arena-backed document tree. Built from HTML or assembled by hand.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<NodeEntry>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeEntry {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append an element under `parent`. Only the `id` and `class`
    /// attributes are retained.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut element = Element {
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
        };
        for (name, value) in attrs {
            match *name {
                "id" => element.id = Some(value.to_string()),
                "class" => element
                    .classes
                    .extend(value.split_whitespace().map(str::to_string)),
                _ => {}
            }
        }
        self.push(parent, NodeData::Element(element))
    }

    pub(crate) fn append_parsed_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.push(parent, NodeData::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeData::Text(text.to_string()))
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Pre-order walk of the descendants of `scope`, excluding `scope`.
    fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.nodes[scope.0].children.clone();
        stack.reverse();
        Descendants { tree: self, stack }
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

struct Descendants<'a> {
    tree: &'a DocumentTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.tree.nodes[node.0].children.iter().rev().copied());
        Some(node)
    }
}

impl StructuredDocument for DocumentTree {
    type Node = NodeId;

    fn query_all(&self, scope: Option<NodeId>, matcher: &Matcher) -> Vec<NodeId> {
        self.descendants(scope.unwrap_or_else(|| self.root()))
            .filter(|node| self.matches(*node, matcher))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn matches(&self, node: NodeId, matcher: &Matcher) -> bool {
        self.element(node)
            .map(|element| matcher.matches(element))
            .unwrap_or(false)
    }

    fn text_content(&self, node: NodeId) -> String {
        if let Some(NodeEntry {
            data: NodeData::Text(text),
            ..
        }) = self.nodes.get(node.0)
        {
            return text.clone();
        }

        self.descendants(node)
            .filter_map(|child| match &self.nodes[child.0].data {
                NodeData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

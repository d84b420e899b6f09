use crate::document::{DocumentTree, Element, NodeId};
use scraper::{ElementRef, Html};

/// Subtrees that never contain visible comment text.
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

impl DocumentTree {
    /// Parse an HTML page into a tree. Comments, doctypes and the contents of
    /// script-like elements are dropped.
    pub fn from_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut tree = DocumentTree::new();

        let root = tree.root();
        let top = tree.append_parsed_element(root, convert(html.root_element()));
        let mut pending: Vec<(NodeId, ElementRef<'_>)> = vec![(top, html.root_element())];

        while let Some((node, element)) = pending.pop() {
            for child in element.children() {
                if let Some(child_element) = ElementRef::wrap(child) {
                    if SKIPPED_TAGS.contains(&child_element.value().name()) {
                        continue;
                    }
                    let child_node = tree.append_parsed_element(node, convert(child_element));
                    pending.push((child_node, child_element));
                } else if let Some(text) = child.value().as_text() {
                    tree.append_text(node, &text.text);
                }
            }
        }

        tree
    }
}

fn convert(element: ElementRef<'_>) -> Element {
    let value = element.value();
    Element {
        tag: value.name().to_ascii_lowercase(),
        id: value.id().map(str::to_string),
        classes: value.classes().map(str::to_string).collect(),
    }
}

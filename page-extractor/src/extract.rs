use crate::document::{Matcher, StructuredDocument};
use threadmood_core::{ExtractionError, ExtractionSelectors, RawComment};
use tracing::debug;

/// Thread-aware comment extractor.
///
/// Every node matching the comment-text selector produces one record, in
/// document order, until `limit` records have been produced. Reply text nodes
/// match the same selector, so replies also appear as records of their own.
#[derive(Debug, Clone)]
pub struct CommentExtractor {
    comment_text: Matcher,
    thread: Matcher,
    author: Matcher,
    replies: Matcher,
}

impl CommentExtractor {
    pub fn new(selectors: &ExtractionSelectors) -> Result<Self, ExtractionError> {
        Ok(Self {
            comment_text: Matcher::parse(&selectors.comment_text)?,
            thread: Matcher::parse(&selectors.thread)?,
            author: Matcher::parse(&selectors.author)?,
            replies: Matcher::parse(&selectors.replies)?,
        })
    }

    pub fn extract<D: StructuredDocument>(&self, document: &D, limit: usize) -> Vec<RawComment> {
        let comments: Vec<RawComment> = document
            .query_all(None, &self.comment_text)
            .into_iter()
            .take(limit)
            .map(|node| self.read_comment(document, node))
            .collect();

        debug!("Extracted {} comments (limit {})", comments.len(), limit);
        comments
    }

    fn read_comment<D: StructuredDocument>(&self, document: &D, node: D::Node) -> RawComment {
        let container = document
            .nearest_ancestor(node, &self.thread)
            .or_else(|| document.parent(node));

        let (author, replies) = match container {
            Some(container) => (
                self.read_author(document, container),
                self.read_replies(document, container),
            ),
            None => (String::new(), Vec::new()),
        };

        RawComment {
            author,
            text: document.text_content(node).trim().to_string(),
            replies,
        }
    }

    fn read_author<D: StructuredDocument>(&self, document: &D, container: D::Node) -> String {
        document
            .query_first(Some(container), &self.author)
            .map(|author| document.text_content(author).trim().to_string())
            .unwrap_or_default()
    }

    /// Comment-text nodes inside any replies sub-container of `container`.
    fn read_replies<D: StructuredDocument>(&self, document: &D, container: D::Node) -> Vec<String> {
        document
            .query_all(Some(container), &self.comment_text)
            .into_iter()
            .filter(|node| self.inside_replies(document, *node, container))
            .map(|node| document.text_content(node).trim().to_string())
            .collect()
    }

    fn inside_replies<D: StructuredDocument>(
        &self,
        document: &D,
        node: D::Node,
        container: D::Node,
    ) -> bool {
        let mut current = document.parent(node);
        while let Some(ancestor) = current {
            if ancestor == container {
                return false;
            }
            if document.matches(ancestor, &self.replies) {
                return true;
            }
            current = document.parent(ancestor);
        }
        false
    }
}

impl Default for CommentExtractor {
    fn default() -> Self {
        Self {
            comment_text: Matcher::Id("content-text".to_string()),
            thread: Matcher::Tag("ytd-comment-thread-renderer".to_string()),
            author: Matcher::Id("author-text".to_string()),
            replies: Matcher::Tag("ytd-comment-replies-renderer".to_string()),
        }
    }
}

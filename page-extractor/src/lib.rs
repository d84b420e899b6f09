//! Thread-aware comment extraction from structured documents, and the
//! request/response bridge used to ask a document host for comments.

pub mod bridge;
pub mod document;
pub mod extract;
pub mod html;

#[cfg(test)]
mod tests;

pub use bridge::{
    DocumentHost, ExtractionBridge, ExtractionRequest, ExtractionResponse, PageSource,
    PendingRequest, EXTRACT_COMMENTS_ACTION,
};
pub use document::{DocumentTree, Matcher, NodeId, StructuredDocument};
pub use extract::CommentExtractor;

//! Request/response link between the pipeline and the process that owns the
//! page.
//!
//! The pipeline side holds an [`ExtractionBridge`]. The page side is a
//! [`DocumentHost`] task that answers every request with a single
//! [`ExtractionResponse`]. A bridge without a live host reports
//! [`ExtractionError::NoTarget`], which is kept distinct from a host that
//! answers `success: false`.

use crate::document::DocumentTree;
use crate::extract::CommentExtractor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use threadmood_core::{
    ExtractionError, RawComment, DEFAULT_EXTRACTION_LIMIT, DEFAULT_EXTRACTION_TIMEOUT_SECS,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use url::Url;

pub const EXTRACT_COMMENTS_ACTION: &str = "extract_comments";

const CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ExtractionRequest {
    pub fn extract_comments(limit: usize) -> Self {
        Self {
            action: EXTRACT_COMMENTS_ACTION.to_string(),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<RawComment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResponse {
    pub fn ok(comments: Vec<RawComment>) -> Self {
        Self {
            success: true,
            comments: Some(comments),
            error: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            comments: None,
            error: Some(reason.into()),
        }
    }

    pub fn into_result(self) -> Result<Vec<RawComment>, ExtractionError> {
        match (self.success, self.comments) {
            (true, Some(comments)) => Ok(comments),
            (true, None) => Err(ExtractionError::Failed {
                reason: "response carried no comments".to_string(),
            }),
            (false, _) => Err(ExtractionError::Failed {
                reason: self
                    .error
                    .unwrap_or_else(|| "unknown extraction error".to_string()),
            }),
        }
    }
}

/// A request waiting for the host's answer.
#[derive(Debug)]
pub struct PendingRequest {
    pub request: ExtractionRequest,
    reply: oneshot::Sender<ExtractionResponse>,
}

impl PendingRequest {
    pub fn respond(self, response: ExtractionResponse) {
        if self.reply.send(response).is_err() {
            debug!("Extraction requester went away before the response was delivered");
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionBridge {
    sender: Option<mpsc::Sender<PendingRequest>>,
    timeout: Duration,
}

impl ExtractionBridge {
    /// A bridge with nothing on the other end.
    pub fn disconnected() -> Self {
        Self {
            sender: None,
            timeout: Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS),
        }
    }

    /// A bridge plus the receiving end a host serves requests from.
    pub fn channel() -> (Self, mpsc::Receiver<PendingRequest>) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let bridge = Self {
            sender: Some(sender),
            timeout: Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS),
        };
        (bridge, receiver)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.sender
            .as_ref()
            .map(|sender| !sender.is_closed())
            .unwrap_or(false)
    }

    pub async fn send(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionResponse, ExtractionError> {
        let sender = self.sender.as_ref().ok_or_else(|| ExtractionError::NoTarget {
            reason: "no active page".to_string(),
        })?;

        let (reply, response) = oneshot::channel();
        let round_trip = async {
            sender
                .send(PendingRequest { request, reply })
                .await
                .map_err(|_| ExtractionError::NoTarget {
                    reason: "document host is not running".to_string(),
                })?;
            response.await.map_err(|_| ExtractionError::NoTarget {
                reason: "document host dropped the request".to_string(),
            })
        };

        match tokio::time::timeout(self.timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Extraction request timed out after {:?}", self.timeout);
                Err(ExtractionError::Timeout {
                    after: self.timeout,
                })
            }
        }
    }

    pub async fn extract_comments(&self, limit: usize) -> Result<Vec<RawComment>, ExtractionError> {
        self.send(ExtractionRequest::extract_comments(limit))
            .await?
            .into_result()
    }
}

/// Where the document host reads its page from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    File(PathBuf),
    Remote(Url),
}

impl PageSource {
    /// `http(s)://` locations are fetched, anything else is a file path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => PageSource::Remote(url),
            _ => PageSource::File(PathBuf::from(trimmed)),
        }
    }

    pub fn location(&self) -> String {
        match self {
            PageSource::File(path) => path.display().to_string(),
            PageSource::Remote(url) => url.to_string(),
        }
    }

    pub async fn load(&self, http: &reqwest::Client) -> Result<String, ExtractionError> {
        let page_error = |reason: String| ExtractionError::PageLoad {
            location: self.location(),
            reason,
        };

        match self {
            PageSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| page_error(e.to_string())),
            PageSource::Remote(url) => {
                let response = http
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(|e| page_error(e.to_string()))?;
                response.text().await.map_err(|e| page_error(e.to_string()))
            }
        }
    }
}

/// Owns a page and answers extraction requests for it.
///
/// The page is re-read for every request so that the answer reflects its
/// current contents.
pub struct DocumentHost {
    source: PageSource,
    extractor: CommentExtractor,
    http: reqwest::Client,
    load_timeout: Duration,
}

impl DocumentHost {
    pub fn new(source: PageSource, extractor: CommentExtractor) -> Self {
        Self {
            source,
            extractor,
            http: reqwest::Client::new(),
            load_timeout: Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS),
        }
    }

    /// Upper bound on reading the page for one request. A page that never
    /// answers fails that request and the host moves on to the next one.
    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    /// Start serving on the current tokio runtime and return the bridge to it.
    pub fn spawn(self) -> ExtractionBridge {
        let (bridge, receiver) = ExtractionBridge::channel();
        info!("Starting document host for {}", self.source.location());
        tokio::spawn(self.serve(receiver));
        bridge
    }

    pub async fn serve(self, mut receiver: mpsc::Receiver<PendingRequest>) {
        while let Some(pending) = receiver.recv().await {
            let response = self.handle(&pending.request).await;
            pending.respond(response);
        }
        info!("Document host for {} stopped", self.source.location());
    }

    pub async fn handle(&self, request: &ExtractionRequest) -> ExtractionResponse {
        if request.action != EXTRACT_COMMENTS_ACTION {
            warn!("Unsupported bridge action: {}", request.action);
            return ExtractionResponse::failure(format!(
                "unsupported action: {}",
                request.action
            ));
        }

        let limit = request.limit.unwrap_or(DEFAULT_EXTRACTION_LIMIT);
        match tokio::time::timeout(self.load_timeout, self.source.load(&self.http)).await {
            Ok(Ok(page)) => ExtractionResponse::ok(self.extract_page(&page, limit)),
            Ok(Err(e)) => {
                error!("Document host could not read its page: {}", e);
                ExtractionResponse::failure(e.to_string())
            }
            Err(_) => {
                warn!(
                    "{} did not load within {:?}",
                    self.source.location(),
                    self.load_timeout
                );
                ExtractionResponse::failure(format!(
                    "page did not load within {:?}",
                    self.load_timeout
                ))
            }
        }
    }

    fn extract_page(&self, page: &str, limit: usize) -> Vec<RawComment> {
        let tree = DocumentTree::from_html(page);
        self.extractor.extract(&tree, limit)
    }
}

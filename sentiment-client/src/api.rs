use crate::merge::{merge, MergeReport};
use crate::metrics::{ClassifierMetrics, EndpointMetrics, MetricsCollector, RequestMetrics};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use threadmood_core::{
    ClassificationError, MergedComment, PredictionBatch, RawComment, Sentiment,
};
use tracing::{debug, error, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("threadmood/", env!("CARGO_PKG_VERSION"));

/// Body sent to the classification endpoint. Index-aligned with the comments
/// being classified.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRequest<'a> {
    pub comments: Vec<&'a str>,
}

/// Success body of the classification endpoint. Every field is optional so
/// that a partial answer still merges.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassificationResponse {
    #[serde(default)]
    pub sentiments: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub confidences: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub stats: Option<HashMap<String, u64>>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub inference_time_ms: Option<f64>,
}

impl ClassificationResponse {
    /// Convert to a prediction batch. Labels that are not -1, 0 or 1 keep
    /// their position as `None`; the second value counts them.
    pub fn into_batch(self) -> (PredictionBatch, usize) {
        let mut unexpected = 0;
        let sentiments = self
            .sentiments
            .unwrap_or_default()
            .into_iter()
            .map(|value| {
                let label = value.as_i64().and_then(|v| Sentiment::try_from(v).ok());
                if label.is_none() {
                    unexpected += 1;
                }
                label
            })
            .collect();

        let batch = PredictionBatch {
            sentiments,
            confidences: self.confidences.unwrap_or_default(),
            stats: self.stats,
            total: self.total,
            inference_time_ms: self.inference_time_ms,
        };
        (batch, unexpected)
    }
}

/// Result of one classification round trip.
#[derive(Debug, Clone)]
pub struct Classified {
    pub comments: Vec<MergedComment>,
    pub predictions: PredictionBatch,
    pub report: MergeReport,
}

#[derive(Debug, Clone)]
pub struct ClassifierClient {
    http_client: Client,
    metrics: Arc<MetricsCollector>,
}

impl ClassifierClient {
    pub fn new(request_timeout: Duration) -> Result<Self, ClassificationError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClassificationError::Transport {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Classify `raw` and merge the predictions onto it by position.
    ///
    /// An empty input is answered locally: the service rejects empty batches.
    pub async fn classify(
        &self,
        endpoint: &Url,
        raw: Vec<RawComment>,
    ) -> Result<Classified, ClassificationError> {
        if raw.is_empty() {
            info!("No comments to classify, skipping request to {}", endpoint);
            return Ok(Classified {
                comments: Vec::new(),
                predictions: PredictionBatch {
                    total: Some(0),
                    ..Default::default()
                },
                report: MergeReport::default(),
            });
        }

        let texts: Vec<&str> = raw.iter().map(|comment| comment.text.as_str()).collect();
        let (predictions, unexpected_labels) = self.predict(endpoint, texts).await?;

        let (comments, mut report) = merge(raw, &predictions);
        report.unexpected_labels = unexpected_labels;
        if unexpected_labels > 0 {
            warn!(
                "{} predictions carried an unknown label and were left unset",
                unexpected_labels
            );
        }

        Ok(Classified {
            comments,
            predictions,
            report,
        })
    }

    /// Send one batch of texts and parse the predictions.
    pub async fn predict(
        &self,
        endpoint: &Url,
        texts: Vec<&str>,
    ) -> Result<(PredictionBatch, usize), ClassificationError> {
        let start_time = Instant::now();
        let comment_count = texts.len();
        let payload = ClassificationRequest { comments: texts };

        info!("Sending {} comments to {}", comment_count, endpoint);
        let outcome = self.send(endpoint, &payload).await;

        let (status_code, error_type) = match &outcome {
            Ok((status_code, _)) => (Some(*status_code), None),
            Err(ClassificationError::Status { status_code, .. }) => {
                (Some(*status_code), Some("status".to_string()))
            }
            Err(ClassificationError::Transport { .. }) => (None, Some("transport".to_string())),
            Err(ClassificationError::InvalidResponse { .. }) => {
                (None, Some("invalid_response".to_string()))
            }
        };
        self.metrics
            .record_request(RequestMetrics {
                endpoint: endpoint.to_string(),
                status_code,
                response_time: start_time.elapsed(),
                comments: comment_count,
                success: outcome.is_ok(),
                error_type,
            })
            .await;

        let (_, response) = outcome?;
        if let Some(ms) = response.inference_time_ms {
            debug!("Service reported {:.1} ms inference time", ms);
        }
        Ok(response.into_batch())
    }

    async fn send(
        &self,
        endpoint: &Url,
        payload: &ClassificationRequest<'_>,
    ) -> Result<(u16, ClassificationResponse), ClassificationError> {
        let response = self
            .http_client
            .post(endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for {}: {}", endpoint, e);
                ClassificationError::Transport {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read classification response body: {}", e);
            ClassificationError::Transport {
                message: e.to_string(),
            }
        })?;

        if !status.is_success() {
            error!("Classification request failed with status: {}", status);
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(ClassificationError::Status {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse classification response: {}", e);
            ClassificationError::InvalidResponse {
                details: format!("Malformed classification response: {}", e),
            }
        })?;
        Ok((status.as_u16(), parsed))
    }

    pub async fn get_metrics(&self) -> ClassifierMetrics {
        self.metrics.get_metrics().await
    }

    pub async fn reset_metrics(&self) {
        self.metrics.reset_metrics().await;
    }

    pub async fn endpoint_metrics(&self, endpoint: &Url) -> Option<EndpointMetrics> {
        self.metrics.get_endpoint_metrics(endpoint.as_str()).await
    }

    pub async fn export_metrics(&self) -> Result<String, serde_json::Error> {
        self.metrics.export_metrics().await
    }
}

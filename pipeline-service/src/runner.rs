use crate::store::{ApplyOutcome, Dataset, DatasetStore, Epoch};
use page_extractor::ExtractionBridge;
use sentiment_client::{ClassifierClient, MergeReport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use threadmood_core::{
    aggregate, validate_endpoint, CoreError, ErrorExt, ErrorReporter, Preferences, RawComment,
    SentimentCounts,
};
use tracing::{debug, info, info_span, Instrument};
use url::Url;
use uuid::Uuid;

pub const DONE_STATUS: &str = "Done ✅";

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub epoch: Epoch,
    pub comments: usize,
    pub counts: SentimentCounts,
    pub report: MergeReport,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The run finished and its dataset is now current.
    Applied(RunSummary),
    /// A later run was issued first. Nothing was applied and nothing should
    /// be shown.
    Superseded { epoch: Epoch },
    /// The run failed; the previous dataset is untouched.
    Failed(CoreError),
}

impl RunOutcome {
    /// Status line for the user, if this outcome warrants one.
    pub fn status_message(&self) -> Option<String> {
        match self {
            RunOutcome::Applied(_) => Some(DONE_STATUS.to_string()),
            RunOutcome::Superseded { .. } => None,
            RunOutcome::Failed(error) => Some(error.user_friendly_message()),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, RunOutcome::Applied(_))
    }
}

/// Comments read from the page by [`Pipeline::start`], not yet classified.
#[derive(Debug, Clone)]
pub struct Extracted {
    run_id: Uuid,
    epoch: Epoch,
    endpoint: Url,
    comments: Vec<RawComment>,
    started: Instant,
}

impl Extracted {
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn comments(&self) -> &[RawComment] {
        &self.comments
    }

    pub fn status_message(&self) -> String {
        format!("Sending {} comments to API...", self.comments.len())
    }
}

/// Where [`Pipeline::start`] left a run.
#[derive(Debug)]
pub enum Stage {
    Extracted(Extracted),
    Finished(RunOutcome),
}

/// Extract, classify, aggregate, then publish to the store.
#[derive(Debug, Clone)]
pub struct Pipeline {
    bridge: ExtractionBridge,
    client: ClassifierClient,
    store: Arc<DatasetStore>,
    limit: usize,
}

impl Pipeline {
    pub fn new(
        bridge: ExtractionBridge,
        client: ClassifierClient,
        store: Arc<DatasetStore>,
        limit: usize,
    ) -> Self {
        Self {
            bridge,
            client,
            store,
            limit,
        }
    }

    pub fn from_preferences(
        bridge: ExtractionBridge,
        preferences: &Preferences,
    ) -> Result<Self, CoreError> {
        let client = ClassifierClient::new(Duration::from_secs(preferences.request_timeout_secs))?;
        let bridge =
            bridge.with_timeout(Duration::from_secs(preferences.extraction_timeout_secs));

        Ok(Self::new(
            bridge,
            client,
            Arc::new(DatasetStore::new()),
            preferences.extraction_limit,
        ))
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    pub fn client(&self) -> &ClassifierClient {
        &self.client
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Counters for every classification request this pipeline has sent,
    /// as pretty JSON.
    pub async fn export_metrics(&self) -> Result<String, CoreError> {
        Ok(self.client.export_metrics().await?)
    }

    /// Run the pipeline once against `endpoint`.
    pub async fn run(&self, endpoint: &str) -> RunOutcome {
        match self.start(endpoint).await {
            Stage::Extracted(extracted) => self.finish(extracted).await,
            Stage::Finished(outcome) => outcome,
        }
    }

    /// First half of a run: issue an epoch and read the page.
    ///
    /// An unusable endpoint fails before an epoch is issued, so it does not
    /// cancel a run already in flight.
    pub async fn start(&self, endpoint: &str) -> Stage {
        let endpoint = match validate_endpoint(endpoint) {
            Ok(url) => url,
            Err(e) => {
                let error = CoreError::from(e);
                ErrorReporter::new().report_warning(&error);
                return Stage::Finished(RunOutcome::Failed(error));
            }
        };

        let run_id = Uuid::new_v4();
        let epoch = self.store.begin().await;
        let span = info_span!("pipeline_run", %run_id, %epoch);
        self.extract(run_id, epoch, endpoint).instrument(span).await
    }

    /// Second half of a run: classify what [`Pipeline::start`] extracted and
    /// publish it, unless a later run has begun in the meantime.
    pub async fn finish(&self, extracted: Extracted) -> RunOutcome {
        let span = info_span!(
            "pipeline_run",
            run_id = %extracted.run_id,
            epoch = %extracted.epoch
        );
        self.classify(extracted).instrument(span).await
    }

    async fn extract(&self, run_id: Uuid, epoch: Epoch, endpoint: Url) -> Stage {
        let started = Instant::now();

        info!("Extracting up to {} comments", self.limit);
        let comments = match self.bridge.extract_comments(self.limit).await {
            Ok(comments) => comments,
            Err(e) => return Stage::Finished(self.fail(epoch, e.into()).await),
        };
        info!("Extracted {} comments", comments.len());

        if !self.store.is_latest(epoch).await {
            debug!("Run superseded during extraction");
            return Stage::Finished(RunOutcome::Superseded { epoch });
        }

        Stage::Extracted(Extracted {
            run_id,
            epoch,
            endpoint,
            comments,
            started,
        })
    }

    async fn classify(&self, extracted: Extracted) -> RunOutcome {
        let Extracted {
            run_id,
            epoch,
            endpoint,
            comments,
            started,
        } = extracted;

        if !self.store.is_latest(epoch).await {
            debug!("Run superseded before classification");
            return RunOutcome::Superseded { epoch };
        }

        let classified = self.client.classify(&endpoint, comments).await;
        self.log_endpoint_metrics(&endpoint).await;
        let classified = match classified {
            Ok(classified) => classified,
            Err(e) => return self.fail(epoch, e.into()).await,
        };

        let counts = aggregate(&classified.predictions);
        let dataset = Dataset::new(epoch, classified.comments, counts);
        let summary = RunSummary {
            run_id,
            epoch,
            comments: dataset.comments.len(),
            counts: dataset.counts,
            report: classified.report,
            elapsed: started.elapsed(),
        };

        match self.store.apply(dataset).await {
            ApplyOutcome::Applied => {
                info!(
                    "Run finished in {:?}: {} comments ({} positive, {} neutral, {} negative)",
                    summary.elapsed,
                    summary.comments,
                    summary.counts.positive,
                    summary.counts.neutral,
                    summary.counts.negative
                );
                RunOutcome::Applied(summary)
            }
            ApplyOutcome::Stale { latest } => {
                debug!("Run superseded by epoch {}", latest);
                RunOutcome::Superseded { epoch }
            }
        }
    }

    async fn fail(&self, epoch: Epoch, error: CoreError) -> RunOutcome {
        if !self.store.is_latest(epoch).await {
            debug!("Dropping failure from superseded run: {}", error);
            return RunOutcome::Superseded { epoch };
        }
        ErrorReporter::new().report_error(&error);
        RunOutcome::Failed(error)
    }

    async fn log_endpoint_metrics(&self, endpoint: &Url) {
        if let Some(metrics) = self.client.endpoint_metrics(endpoint).await {
            info!(
                "{}: {} requests, {:.0}% succeeded, average {:?}",
                endpoint,
                metrics.request_count,
                metrics.success_rate() * 100.0,
                metrics.average_response_time()
            );
        }
    }
}

use chrono::{DateTime, Utc};
use std::fmt;
use threadmood_core::{MergedComment, SentimentCounts};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Sequence number handed to each pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The classified comments and counts produced by one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub epoch: Epoch,
    pub comments: Vec<MergedComment>,
    pub counts: SentimentCounts,
    pub updated_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(epoch: Epoch, comments: Vec<MergedComment>, counts: SentimentCounts) -> Self {
        Self {
            epoch,
            comments,
            counts,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A later run was issued before this one finished.
    Stale { latest: Epoch },
}

#[derive(Debug, Default)]
struct StoreState {
    issued: Epoch,
    current: Option<Dataset>,
}

/// Holds the current dataset. Only the run holding the latest issued epoch
/// may replace it.
#[derive(Debug, Default)]
pub struct DatasetStore {
    state: RwLock<StoreState>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the epoch for a new run. Every run issued earlier becomes stale.
    pub async fn begin(&self) -> Epoch {
        let mut state = self.state.write().await;
        state.issued = Epoch(state.issued.0 + 1);
        debug!("Issued epoch {}", state.issued);
        state.issued
    }

    /// Replace the current dataset if `dataset.epoch` is still the latest
    /// issued epoch. The comparison and the swap happen under one write lock.
    pub async fn apply(&self, dataset: Dataset) -> ApplyOutcome {
        let mut state = self.state.write().await;
        if dataset.epoch != state.issued {
            debug!(
                "Discarding dataset from epoch {} (latest is {})",
                dataset.epoch, state.issued
            );
            return ApplyOutcome::Stale {
                latest: state.issued,
            };
        }

        info!(
            "Applying dataset from epoch {} with {} comments",
            dataset.epoch,
            dataset.comments.len()
        );
        state.current = Some(dataset);
        ApplyOutcome::Applied
    }

    pub async fn is_latest(&self, epoch: Epoch) -> bool {
        self.state.read().await.issued == epoch
    }

    pub async fn latest_epoch(&self) -> Epoch {
        self.state.read().await.issued
    }

    pub async fn current(&self) -> Option<Dataset> {
        self.state.read().await.current.clone()
    }

    pub async fn clear(&self) {
        self.state.write().await.current = None;
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One comment as it was read from the page, together with its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub replies: Vec<String>,
}

impl RawComment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            replies: Vec::new(),
        }
    }

    pub fn with_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies = replies.into_iter().map(Into::into).collect();
        self
    }
}

/// Sentiment label returned by the classifier. Serialized as -1, 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn value(self) -> i64 {
        match self {
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
            Sentiment::Positive => 1,
        }
    }

    /// Key used by the classification service in its `stats` map.
    pub fn stats_key(self) -> &'static str {
        match self {
            Sentiment::Negative => "-1",
            Sentiment::Neutral => "0",
            Sentiment::Positive => "1",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Positive => "Positive",
        }
    }
}

impl TryFrom<i64> for Sentiment {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Sentiment::Negative),
            0 => Ok(Sentiment::Neutral),
            1 => Ok(Sentiment::Positive),
            other => Err(format!("unknown sentiment label: {}", other)),
        }
    }
}

impl From<Sentiment> for i64 {
    fn from(sentiment: Sentiment) -> Self {
        sentiment.value()
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Predictions for one classification request, index-aligned with the
/// comments that were sent.
///
/// Entries that the service left out or labelled with something outside
/// {-1, 0, 1} are `None` so that positions never shift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionBatch {
    pub sentiments: Vec<Option<Sentiment>>,
    pub confidences: Vec<Option<f64>>,
    pub stats: Option<HashMap<String, u64>>,
    pub total: Option<u64>,
    pub inference_time_ms: Option<f64>,
}

impl PredictionBatch {
    pub fn sentiment_at(&self, index: usize) -> Option<Sentiment> {
        self.sentiments.get(index).copied().flatten()
    }

    pub fn confidence_at(&self, index: usize) -> Option<f64> {
        self.confidences.get(index).copied().flatten()
    }

    /// Server-reported count for a label, zero when the service omitted it.
    pub fn reported_count(&self, sentiment: Sentiment) -> u64 {
        self.stats
            .as_ref()
            .and_then(|stats| stats.get(sentiment.stats_key()))
            .copied()
            .unwrap_or(0)
    }
}

/// A raw comment with the prediction for its position attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedComment {
    pub author: String,
    pub text: String,
    pub replies: Vec<String>,
    pub sentiment: Option<Sentiment>,
    pub confidence: Option<f64>,
}

impl MergedComment {
    pub fn from_raw(raw: RawComment, sentiment: Option<Sentiment>, confidence: Option<f64>) -> Self {
        Self {
            author: raw.author,
            text: raw.text,
            replies: raw.replies,
            sentiment,
            confidence,
        }
    }
}

/// Label counts ready for presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    pub total: u64,
}

impl SentimentCounts {
    pub fn count(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    pub fn labelled(&self) -> u64 {
        self.positive
            .saturating_add(self.neutral)
            .saturating_add(self.negative)
    }

    /// Whether the label counts fit inside the reported total.
    pub fn consistent(&self) -> bool {
        self.labelled() <= self.total
    }

    /// Fraction of the total carrying `sentiment`; 0.0 for an empty total.
    pub fn share(&self, sentiment: Sentiment) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(sentiment) as f64 / self.total as f64
        }
    }
}

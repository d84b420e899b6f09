use threadmood_core::{MergedComment, Sentiment, SentimentCounts};

pub const PLACEHOLDER_AUTHOR: &str = "User";
pub const CONFIDENCE_UNAVAILABLE: &str = "N/A";
pub const UNKNOWN_SENTIMENT: &str = "Unknown";

/// A merged comment with every field ready to show.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayComment {
    pub author: String,
    pub text: String,
    pub replies: Vec<String>,
    pub sentiment: String,
    pub confidence: String,
}

impl From<&MergedComment> for DisplayComment {
    fn from(comment: &MergedComment) -> Self {
        let author = if comment.author.is_empty() {
            PLACEHOLDER_AUTHOR.to_string()
        } else {
            comment.author.clone()
        };

        Self {
            author,
            text: comment.text.clone(),
            replies: comment.replies.clone(),
            sentiment: sentiment_label(comment.sentiment).to_string(),
            confidence: format_confidence(comment.confidence),
        }
    }
}

pub fn to_display(data: &[MergedComment]) -> Vec<DisplayComment> {
    data.iter().map(DisplayComment::from).collect()
}

pub fn sentiment_label(sentiment: Option<Sentiment>) -> &'static str {
    sentiment.map(Sentiment::label).unwrap_or(UNKNOWN_SENTIMENT)
}

pub fn format_confidence(confidence: Option<f64>) -> String {
    confidence
        .map(|c| c.to_string())
        .unwrap_or_else(|| CONFIDENCE_UNAVAILABLE.to_string())
}

/// One-line summary, e.g. `Positive: 1 | Neutral: 0 | Negative: 1 (total 2)`.
pub fn format_counts(counts: &SentimentCounts) -> String {
    format!(
        "Positive: {} | Neutral: {} | Negative: {} (total {})",
        counts.positive, counts.neutral, counts.negative, counts.total
    )
}

/// Text bar of `width` cells for one label's share of the total.
pub fn distribution_bar(counts: &SentimentCounts, sentiment: Sentiment, width: usize) -> String {
    let filled = ((counts.share(sentiment) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

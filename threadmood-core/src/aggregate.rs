use crate::types::{PredictionBatch, Sentiment, SentimentCounts};
use tracing::{debug, warn};

/// Shape the server-reported statistics into presentation counts.
///
/// The service computed `stats` and `total` over everything it classified, so
/// they are taken as-is rather than recounted from `sentiments`. A missing
/// `stats` map yields zero counts and a missing `total` falls back to the
/// number of returned predictions.
pub fn aggregate(batch: &PredictionBatch) -> SentimentCounts {
    let counts = SentimentCounts {
        positive: batch.reported_count(Sentiment::Positive),
        neutral: batch.reported_count(Sentiment::Neutral),
        negative: batch.reported_count(Sentiment::Negative),
        total: batch.total.unwrap_or(batch.sentiments.len() as u64),
    };

    if batch.stats.is_none() {
        debug!("Classification response carried no stats; reporting zero counts");
    }

    if !counts.consistent() {
        warn!(
            "Reported label counts ({}) exceed reported total ({})",
            counts.labelled(),
            counts.total
        );
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn stats(pairs: &[(&str, u64)]) -> Option<HashMap<String, u64>> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    #[test]
    fn test_aggregate_uses_reported_stats() {
        let batch = PredictionBatch {
            sentiments: vec![Some(Sentiment::Positive), Some(Sentiment::Negative)],
            confidences: vec![Some(0.9), Some(0.75)],
            stats: stats(&[("1", 1), ("-1", 1), ("0", 0)]),
            total: Some(2),
            inference_time_ms: None,
        };

        let counts = aggregate(&batch);
        assert_eq!(counts.positive, 1);
        assert_eq!(counts.neutral, 0);
        assert_eq!(counts.negative, 1);
        assert_eq!(counts.total, 2);
        assert!(counts.consistent());
    }

    #[test]
    fn test_aggregate_trusts_server_over_window() {
        // Server classified more than it returned.
        let batch = PredictionBatch {
            sentiments: vec![Some(Sentiment::Neutral)],
            stats: stats(&[("1", 4), ("0", 5), ("-1", 1)]),
            total: Some(10),
            ..Default::default()
        };

        let counts = aggregate(&batch);
        assert_eq!(counts.positive, 4);
        assert_eq!(counts.neutral, 5);
        assert_eq!(counts.total, 10);
    }

    #[test]
    fn test_aggregate_missing_stats_and_total() {
        let batch = PredictionBatch {
            sentiments: vec![Some(Sentiment::Positive), None, None],
            ..Default::default()
        };

        let counts = aggregate(&batch);
        assert_eq!(counts.labelled(), 0);
        assert_eq!(counts.total, 3);
    }

    #[test]
    fn test_aggregate_flags_inconsistent_totals() {
        let batch = PredictionBatch {
            stats: stats(&[("1", 3), ("0", 3)]),
            total: Some(4),
            ..Default::default()
        };

        let counts = aggregate(&batch);
        assert!(!counts.consistent());
        assert_eq!(counts.total, 4);
    }

    #[test]
    fn test_aggregate_survives_huge_stats() {
        let batch = PredictionBatch {
            stats: stats(&[("1", u64::MAX), ("0", u64::MAX), ("-1", 3)]),
            total: Some(3),
            ..Default::default()
        };

        let counts = aggregate(&batch);
        assert_eq!(counts.positive, u64::MAX);
        assert_eq!(counts.labelled(), u64::MAX);
        assert!(!counts.consistent());
    }
}

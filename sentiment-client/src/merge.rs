use threadmood_core::{MergedComment, PredictionBatch, RawComment};
use tracing::warn;

/// How far a prediction batch fell short of the comments it was merged onto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub missing_sentiments: usize,
    pub missing_confidences: usize,
    pub unexpected_labels: usize,
    pub surplus_predictions: usize,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        *self == MergeReport::default()
    }
}

/// Attach predictions to comments by position.
///
/// `merged[i]` is always built from `raw[i]`; nothing is reordered or
/// dropped. Positions without a usable prediction get `None`, and predictions
/// past the end of `raw` are ignored.
pub fn merge(raw: Vec<RawComment>, predictions: &PredictionBatch) -> (Vec<MergedComment>, MergeReport) {
    let mut report = MergeReport {
        surplus_predictions: predictions.sentiments.len().saturating_sub(raw.len()),
        ..Default::default()
    };

    let merged = raw
        .into_iter()
        .enumerate()
        .map(|(index, comment)| {
            let sentiment = predictions.sentiment_at(index);
            let confidence = predictions.confidence_at(index);
            if sentiment.is_none() {
                report.missing_sentiments += 1;
            }
            if confidence.is_none() {
                report.missing_confidences += 1;
            }
            MergedComment::from_raw(comment, sentiment, confidence)
        })
        .collect();

    if report.missing_sentiments > 0 || report.surplus_predictions > 0 {
        warn!(
            "Prediction batch misaligned: {} comments without sentiment, {} surplus predictions",
            report.missing_sentiments, report.surplus_predictions
        );
    }

    (merged, report)
}

use std::fs;
use std::path::Path;
use threadmood_core::{CoreError, MergedComment};
use tracing::info;

pub const CSV_HEADER: &str = "author,text,sentiment,confidence";
pub const DEFAULT_CSV_FILE_NAME: &str = "comments_sentiment.csv";

/// Render the dataset as CSV.
///
/// `text` is always quoted with inner quotes doubled; the other columns are
/// written bare. Unset sentiment and confidence become empty fields. Rows are
/// joined by `\n` with no trailing newline.
pub fn to_csv(data: &[MergedComment]) -> String {
    let mut rows = Vec::with_capacity(data.len() + 1);
    rows.push(CSV_HEADER.to_string());

    for comment in data {
        rows.push(format!(
            "{},{},{},{}",
            comment.author,
            quote(&comment.text),
            comment
                .sentiment
                .map(|s| s.value().to_string())
                .unwrap_or_default(),
            comment
                .confidence
                .map(|c| c.to_string())
                .unwrap_or_default(),
        ));
    }

    rows.join("\n")
}

pub fn write_csv(path: &Path, data: &[MergedComment]) -> Result<(), CoreError> {
    fs::write(path, to_csv(data))?;
    info!("Wrote {} rows to {}", data.len(), path.display());
    Ok(())
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

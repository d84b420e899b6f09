use crate::display::{distribution_bar, DisplayComment};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use threadmood_core::{CoreError, Sentiment, SentimentCounts};
use tracing::info;

pub const DEFAULT_HTML_FILE_NAME: &str = "comments_sentiment.html";

const BAR_WIDTH: usize = 20;

/// Escape text for use in HTML element content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Standalone HTML report: a stats block followed by one block per comment.
pub fn render_html(data: &[DisplayComment], counts: &SentimentCounts) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Comment sentiment</title>\n</head>\n<body>\n");

    html.push_str("<section class=\"stats\">\n");
    let _ = writeln!(html, "<p>Total comments: {}</p>", counts.total);
    for sentiment in Sentiment::ALL {
        let _ = writeln!(
            html,
            "<p class=\"{}\">{}: {} <code>{}</code></p>",
            sentiment.label().to_lowercase(),
            sentiment.label(),
            counts.count(sentiment),
            distribution_bar(counts, sentiment, BAR_WIDTH)
        );
    }
    html.push_str("</section>\n<section class=\"comments\">\n");

    for comment in data {
        html.push_str("<div class=\"comment\">\n");
        let _ = writeln!(html, "<strong>{}</strong>", escape_html(&comment.author));
        let _ = writeln!(html, "<p>{}</p>", escape_html(&comment.text));
        if !comment.replies.is_empty() {
            html.push_str("<ul class=\"replies\">\n");
            for reply in &comment.replies {
                let _ = writeln!(html, "<li>{}</li>", escape_html(reply));
            }
            html.push_str("</ul>\n");
        }
        let _ = writeln!(
            html,
            "<small>Sentiment: {} | confidence: {}</small>",
            escape_html(&comment.sentiment),
            escape_html(&comment.confidence)
        );
        html.push_str("</div>\n");
    }

    html.push_str("</section>\n</body>\n</html>\n");
    html
}

pub fn write_html(
    path: &Path,
    data: &[DisplayComment],
    counts: &SentimentCounts,
) -> Result<(), CoreError> {
    fs::write(path, render_html(data, counts))?;
    info!("Wrote HTML report with {} comments to {}", data.len(), path.display());
    Ok(())
}

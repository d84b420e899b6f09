pub mod csv;
pub mod display;
pub mod html;

pub use csv::{to_csv, write_csv, CSV_HEADER, DEFAULT_CSV_FILE_NAME};
pub use display::{
    distribution_bar, format_confidence, format_counts, sentiment_label, to_display,
    DisplayComment, CONFIDENCE_UNAVAILABLE, PLACEHOLDER_AUTHOR, UNKNOWN_SENTIMENT,
};
pub use html::{escape_html, render_html, write_html, DEFAULT_HTML_FILE_NAME};

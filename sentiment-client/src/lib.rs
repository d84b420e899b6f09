pub mod api;
pub mod merge;
pub mod metrics;


pub use api::{ClassificationRequest, ClassificationResponse, Classified, ClassifierClient};
pub use merge::{merge, MergeReport};
pub use metrics::{ClassifierMetrics, EndpointMetrics, MetricsCollector, RequestMetrics};

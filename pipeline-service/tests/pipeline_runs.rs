use page_extractor::{ExtractionBridge, ExtractionResponse};
use pipeline_service::{DatasetStore, Pipeline, RunOutcome, Stage, DONE_STATUS};
use sentiment_client::ClassifierClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use threadmood_core::{
    ClassificationError, ConfigError, CoreError, ExtractionError, RawComment, Sentiment,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_comments() -> Vec<RawComment> {
    vec![
        RawComment::new("@alice", "love it"),
        RawComment::new("@bob", "hate it").with_replies(["why?"]),
    ]
}

/// A stand-in page process answering every request with `comments`.
fn serve(comments: Vec<RawComment>) -> ExtractionBridge {
    let (bridge, mut receiver) = ExtractionBridge::channel();
    tokio::spawn(async move {
        while let Some(pending) = receiver.recv().await {
            let limit = pending.request.limit.unwrap_or(200);
            let batch = comments.iter().take(limit).cloned().collect();
            pending.respond(ExtractionResponse::ok(batch));
        }
    });
    bridge
}

fn serve_failure(reason: &'static str) -> ExtractionBridge {
    let (bridge, mut receiver) = ExtractionBridge::channel();
    tokio::spawn(async move {
        while let Some(pending) = receiver.recv().await {
            pending.respond(ExtractionResponse::failure(reason));
        }
    });
    bridge
}

fn pipeline(bridge: ExtractionBridge) -> Pipeline {
    let client = ClassifierClient::new(Duration::from_secs(5)).unwrap();
    Pipeline::new(bridge, client, Arc::new(DatasetStore::new()), 200)
}

fn success_body(sentiment: i64) -> serde_json::Value {
    let key = sentiment.to_string();
    json!({
        "sentiments": [sentiment, sentiment],
        "confidences": [0.8, 0.7],
        "stats": { key: 2 },
        "total": 2
    })
}

async fn mount_success(server: &MockServer, route: &str, sentiment: i64, delay: Duration) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_body(sentiment))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_run_applies_classified_dataset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict_batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sentiments": [1, -1],
            "confidences": [0.9, 0.75],
            "stats": { "1": 1, "-1": 1, "0": 0 },
            "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(serve(page_comments()));
    let outcome = pipeline
        .run(&format!("{}/predict_batch", server.uri()))
        .await;

    assert!(outcome.is_applied());
    assert_eq!(outcome.status_message().as_deref(), Some(DONE_STATUS));

    let dataset = pipeline.store().current().await.unwrap();
    assert_eq!(dataset.comments.len(), 2);
    assert_eq!(dataset.comments[0].sentiment, Some(Sentiment::Positive));
    assert_eq!(dataset.comments[1].sentiment, Some(Sentiment::Negative));
    assert_eq!(dataset.comments[1].replies, vec!["why?"]);
    assert_eq!(
        (dataset.counts.positive, dataset.counts.neutral, dataset.counts.negative),
        (1, 0, 1)
    );
}

#[tokio::test]
async fn test_classification_failure_keeps_previous_dataset() {
    let server = MockServer::start().await;
    mount_success(&server, "/good", 0, Duration::ZERO).await;
    Mock::given(method("POST"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .mount(&server)
        .await;

    let pipeline = pipeline(serve(page_comments()));
    assert!(pipeline
        .run(&format!("{}/good", server.uri()))
        .await
        .is_applied());
    let before = pipeline.store().current().await.unwrap();

    let outcome = pipeline.run(&format!("{}/bad", server.uri())).await;
    match &outcome {
        RunOutcome::Failed(CoreError::Classification(error)) => {
            assert_eq!(error.message(), "Internal error");
            assert_eq!(error.status_code(), Some(500));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(
        outcome.status_message().as_deref(),
        Some("API error: Internal error")
    );
    assert_eq!(pipeline.store().current().await, Some(before));
}

#[tokio::test]
async fn test_first_run_failure_leaves_store_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .mount(&server)
        .await;

    let pipeline = pipeline(serve(page_comments()));
    let outcome = pipeline.run(&server.uri()).await;
    assert!(matches!(
        outcome,
        RunOutcome::Failed(CoreError::Classification(ClassificationError::Status { .. }))
    ));
    assert!(pipeline.store().current().await.is_none());
}

#[tokio::test]
async fn test_missing_page_aborts_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(1)))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(ExtractionBridge::disconnected());
    let outcome = pipeline.run(&server.uri()).await;

    assert!(matches!(
        outcome,
        RunOutcome::Failed(CoreError::Extraction(ExtractionError::NoTarget { .. }))
    ));
    assert_eq!(
        outcome.status_message().as_deref(),
        Some("Could not extract comments: no active page.")
    );
}

#[tokio::test]
async fn test_extraction_failure_aborts_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(1)))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(serve_failure("page not ready"));
    let outcome = pipeline.run(&server.uri()).await;

    match outcome {
        RunOutcome::Failed(CoreError::Extraction(ExtractionError::Failed { reason })) => {
            assert_eq!(reason, "page not ready");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_endpoint_does_not_issue_epoch() {
    let pipeline = pipeline(serve(page_comments()));
    let before = pipeline.store().latest_epoch().await;

    let outcome = pipeline.run("   ").await;
    assert!(matches!(
        outcome,
        RunOutcome::Failed(CoreError::Config(ConfigError::MissingField { .. }))
    ));
    assert_eq!(outcome.status_message().as_deref(), Some("Set API URL first"));
    assert_eq!(pipeline.store().latest_epoch().await, before);
}

#[tokio::test]
async fn test_empty_page_yields_empty_dataset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Empty comments list"))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(serve(Vec::new()));
    let outcome = pipeline.run(&server.uri()).await;

    assert!(outcome.is_applied());
    let dataset = pipeline.store().current().await.unwrap();
    assert!(dataset.comments.is_empty());
    assert_eq!(dataset.counts.total, 0);
}

#[tokio::test]
async fn test_later_run_wins_over_slow_earlier_run() {
    let server = MockServer::start().await;
    mount_success(&server, "/slow", 1, Duration::from_millis(500)).await;
    mount_success(&server, "/fast", -1, Duration::ZERO).await;

    let pipeline = pipeline(serve(page_comments()));
    let slow = format!("{}/slow", server.uri());
    let fast = format!("{}/fast", server.uri());

    let (first, second) = tokio::join!(pipeline.run(&slow), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        pipeline.run(&fast).await
    });

    assert!(matches!(first, RunOutcome::Superseded { .. }));
    assert_eq!(first.status_message(), None);
    assert!(second.is_applied());

    let dataset = pipeline.store().current().await.unwrap();
    assert_eq!(dataset.epoch, pipeline.store().latest_epoch().await);
    assert!(dataset
        .comments
        .iter()
        .all(|c| c.sentiment == Some(Sentiment::Negative)));
}

#[tokio::test]
async fn test_stale_failure_is_silent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slow-error"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("Internal error")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    mount_success(&server, "/fast", 0, Duration::ZERO).await;

    let pipeline = pipeline(serve(page_comments()));
    let slow = format!("{}/slow-error", server.uri());
    let fast = format!("{}/fast", server.uri());

    let (first, second) = tokio::join!(pipeline.run(&slow), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        pipeline.run(&fast).await
    });

    assert!(matches!(first, RunOutcome::Superseded { .. }));
    assert!(second.is_applied());
    assert_eq!(
        pipeline.store().current().await.unwrap().counts.neutral,
        2
    );
}

#[tokio::test]
async fn test_limit_is_forwarded_to_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sentiments": [1] })))
        .mount(&server)
        .await;

    let client = ClassifierClient::new(Duration::from_secs(5)).unwrap();
    let pipeline = Pipeline::new(
        serve(page_comments()),
        client,
        Arc::new(DatasetStore::new()),
        1,
    );
    assert!(pipeline.run(&server.uri()).await.is_applied());

    let dataset = pipeline.store().current().await.unwrap();
    assert_eq!(dataset.comments.len(), 1);
    assert_eq!(dataset.comments[0].author, "@alice");
}

#[tokio::test]
async fn test_start_reports_extracted_count_before_classifying() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = pipeline(serve(page_comments()));
    let extracted = match pipeline.start(&server.uri()).await {
        Stage::Extracted(extracted) => extracted,
        Stage::Finished(outcome) => panic!("run ended early: {:?}", outcome),
    };
    assert_eq!(extracted.status_message(), "Sending 2 comments to API...");
    assert_eq!(extracted.comments().len(), 2);
    assert_eq!(extracted.epoch(), pipeline.store().latest_epoch().await);
    assert!(pipeline.store().current().await.is_none());

    assert!(pipeline.finish(extracted).await.is_applied());
    assert_eq!(pipeline.store().current().await.unwrap().comments.len(), 2);
}

#[tokio::test]
async fn test_start_failure_finishes_without_classifying() {
    let pipeline = pipeline(ExtractionBridge::disconnected());
    let stage = pipeline.start("http://localhost:8000/predict_batch").await;
    assert!(matches!(
        stage,
        Stage::Finished(RunOutcome::Failed(CoreError::Extraction(
            ExtractionError::NoTarget { .. }
        )))
    ));
}

#[tokio::test]
async fn test_extracted_run_is_dropped_once_superseded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(1)))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(serve(page_comments()));
    let Stage::Extracted(first) = pipeline.start(&server.uri()).await else {
        panic!("first run ended early");
    };
    let Stage::Extracted(_second) = pipeline.start(&server.uri()).await else {
        panic!("second run ended early");
    };

    let outcome = pipeline.finish(first).await;
    assert!(matches!(outcome, RunOutcome::Superseded { .. }));
    assert!(pipeline.store().current().await.is_none());
}

#[tokio::test]
async fn test_metrics_export_covers_runs() {
    let server = MockServer::start().await;
    mount_success(&server, "/predict_batch", 0, Duration::ZERO).await;

    let pipeline = pipeline(serve(page_comments()));
    assert!(pipeline
        .run(&format!("{}/predict_batch", server.uri()))
        .await
        .is_applied());

    let exported: serde_json::Value =
        serde_json::from_str(&pipeline.export_metrics().await.unwrap()).unwrap();
    assert_eq!(exported["total_requests"], 1);
    assert_eq!(exported["successful_requests"], 1);
    assert_eq!(exported["comments_sent"], 2);
}

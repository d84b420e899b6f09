use crate::{
    CommentExtractor, DocumentHost, DocumentTree, ExtractionBridge, ExtractionRequest,
    ExtractionResponse, NodeId, PageSource, EXTRACT_COMMENTS_ACTION,
};
use std::time::{Duration, Instant};
use threadmood_core::{ExtractionError, ExtractionSelectors, RawComment, DEFAULT_EXTRACTION_LIMIT};
use tokio::net::TcpListener;

fn append_comment(tree: &mut DocumentTree, parent: NodeId, author: &str, text: &str) {
    let author_node = tree.append_element(parent, "a", &[("id", "author-text")]);
    tree.append_text(author_node, &format!("\n    {}\n  ", author));
    let body = tree.append_element(parent, "yt-formatted-string", &[("id", "content-text")]);
    tree.append_text(body, text);
}

fn append_thread(tree: &mut DocumentTree, parent: NodeId, author: &str, text: &str, replies: &[&str]) {
    let thread = tree.append_element(parent, "ytd-comment-thread-renderer", &[]);
    append_comment(tree, thread, author, text);

    if !replies.is_empty() {
        let container = tree.append_element(thread, "ytd-comment-replies-renderer", &[]);
        for reply in replies {
            let renderer = tree.append_element(container, "ytd-comment-renderer", &[]);
            append_comment(tree, renderer, "replier", reply);
        }
    }
}

fn page(threads: Vec<(&str, &str, Vec<&str>)>) -> DocumentTree {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let contents = tree.append_element(root, "div", &[("id", "contents")]);
    for (author, text, replies) in threads {
        append_thread(&mut tree, contents, author, text, &replies);
    }
    tree
}

#[test]
fn test_two_top_level_comments_without_replies() {
    let tree = page(vec![("@ann", "First!", vec![]), ("@bob", "  Nice video  ", vec![])]);

    let comments = CommentExtractor::default().extract(&tree, 50);
    assert_eq!(
        comments,
        vec![
            RawComment::new("@ann", "First!"),
            RawComment::new("@bob", "Nice video"),
        ]
    );
    assert!(comments.iter().all(|c| c.replies.is_empty()));
}

#[test]
fn test_replies_are_collected_in_order() {
    let tree = page(vec![("@ann", "Loved it", vec!["  great!\n", "thanks"])]);

    let comments = CommentExtractor::default().extract(&tree, 50);
    assert_eq!(comments[0].author, "@ann");
    assert_eq!(comments[0].text, "Loved it");
    assert_eq!(comments[0].replies, vec!["great!", "thanks"]);

    // Reply text nodes are comment-text nodes too and produce their own records.
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[1].text, "great!");
    assert_eq!(comments[2].text, "thanks");
}

#[test]
fn test_limit_caps_output() {
    let tree = page(vec![
        ("a", "one", vec![]),
        ("b", "two", vec![]),
        ("c", "three", vec![]),
    ]);
    let extractor = CommentExtractor::default();

    for limit in 0..6 {
        let comments = extractor.extract(&tree, limit);
        assert_eq!(comments.len(), limit.min(3));
    }
    let texts: Vec<String> = extractor
        .extract(&tree, 2)
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, vec!["one", "two"]);
}

#[test]
fn test_extraction_is_deterministic() {
    let tree = page(vec![("a", "one", vec!["r1", "r2"]), ("b", "two", vec![])]);
    let extractor = CommentExtractor::default();

    assert_eq!(extractor.extract(&tree, 200), extractor.extract(&tree, 200));
}

#[test]
fn test_parent_used_when_no_thread_container() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let card = tree.append_element(root, "div", &[("class", "card")]);
    append_comment(&mut tree, card, "Bob", "  standalone  ");

    let comments = CommentExtractor::default().extract(&tree, 10);
    assert_eq!(comments, vec![RawComment::new("Bob", "standalone")]);
}

#[test]
fn test_parent_fallback_collects_replies() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let card = tree.append_element(root, "div", &[("class", "card")]);
    append_comment(&mut tree, card, "Bob", "top");
    let container = tree.append_element(card, "ytd-comment-replies-renderer", &[]);
    append_comment(&mut tree, container, "Cat", " first reply ");
    append_comment(&mut tree, container, "Dan", "second reply");

    let comments = CommentExtractor::default().extract(&tree, 10);
    assert_eq!(comments[0].author, "Bob");
    assert_eq!(comments[0].text, "top");
    assert_eq!(comments[0].replies, vec!["first reply", "second reply"]);

    // A reply's own parent is the replies container, which holds no nested container.
    assert_eq!(comments[1].author, "Cat");
    assert!(comments[1].replies.is_empty());
}

#[test]
fn test_missing_author_is_empty_string() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let thread = tree.append_element(root, "ytd-comment-thread-renderer", &[]);
    let body = tree.append_element(thread, "p", &[("id", "content-text")]);
    tree.append_text(body, "anonymous");

    let comments = CommentExtractor::default().extract(&tree, 10);
    assert_eq!(comments[0].author, "");
    assert!(comments[0].replies.is_empty());
}

#[test]
fn test_custom_selectors() {
    let selectors = ExtractionSelectors {
        comment_text: ".body".to_string(),
        thread: "article".to_string(),
        author: ".who".to_string(),
        replies: ".answers".to_string(),
    };
    let extractor = CommentExtractor::new(&selectors).unwrap();

    let tree = DocumentTree::from_html(
        r#"<article><b class="who">Cy</b><p class="body">Top</p>
           <ul class="answers"><li><p class="body">Sub</p></li></ul></article>"#,
    );
    let comments = extractor.extract(&tree, 1);
    assert_eq!(
        comments,
        vec![RawComment::new("Cy", "Top").with_replies(["Sub"])]
    );
}

#[test]
fn test_invalid_selector_rejected() {
    let selectors = ExtractionSelectors {
        thread: "div > section".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        CommentExtractor::new(&selectors),
        Err(ExtractionError::InvalidSelector { .. })
    ));
}

#[test]
fn test_wire_format() {
    let request = serde_json::to_value(ExtractionRequest::extract_comments(200)).unwrap();
    assert_eq!(
        request,
        serde_json::json!({ "action": "extract_comments", "limit": 200 })
    );

    let failure: ExtractionResponse =
        serde_json::from_str(r#"{"success": false, "error": "boom"}"#).unwrap();
    assert_eq!(
        failure.into_result(),
        Err(ExtractionError::Failed {
            reason: "boom".to_string()
        })
    );

    let success: ExtractionResponse = serde_json::from_str(
        r#"{"success": true, "comments": [{"author": "a", "text": "b", "replies": ["c"]}]}"#,
    )
    .unwrap();
    assert_eq!(
        success.into_result().unwrap(),
        vec![RawComment::new("a", "b").with_replies(["c"])]
    );
}

#[tokio::test]
async fn test_disconnected_bridge_is_no_target() {
    let bridge = ExtractionBridge::disconnected();
    assert!(!bridge.is_connected());

    let result = bridge.extract_comments(200).await;
    assert!(matches!(result, Err(ExtractionError::NoTarget { .. })));
}

#[tokio::test]
async fn test_stopped_host_is_no_target() {
    let (bridge, receiver) = ExtractionBridge::channel();
    drop(receiver);

    let result = bridge.extract_comments(200).await;
    assert!(matches!(result, Err(ExtractionError::NoTarget { .. })));
}

#[tokio::test]
async fn test_unanswered_request_times_out() {
    let (bridge, _receiver) = ExtractionBridge::channel();
    let bridge = bridge.with_timeout(Duration::from_millis(50));

    let result = bridge.extract_comments(200).await;
    assert_eq!(
        result,
        Err(ExtractionError::Timeout {
            after: Duration::from_millis(50)
        })
    );
}

/// Accepts connections and never answers them.
async fn silent_server() -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (format!("http://{}/watch?v=abc", address), handle)
}

#[tokio::test]
async fn test_stalled_page_fails_each_request_and_host_keeps_serving() {
    let (location, server) = silent_server().await;
    let bridge = DocumentHost::new(PageSource::parse(&location), CommentExtractor::default())
        .with_load_timeout(Duration::from_millis(200))
        .spawn()
        .with_timeout(Duration::from_secs(5));

    for _ in 0..3 {
        let started = Instant::now();
        let result = bridge.extract_comments(10).await;
        match result {
            Err(ExtractionError::Failed { reason }) => {
                assert!(reason.contains("did not load within 200ms"), "{reason}")
            }
            other => panic!("expected a load failure, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    server.abort();
}

#[tokio::test]
async fn test_missing_limit_uses_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.html");
    let body: String = (0..DEFAULT_EXTRACTION_LIMIT + 5)
        .map(|i| format!("<ytd-comment-thread-renderer><p id=\"content-text\">c{i}</p></ytd-comment-thread-renderer>"))
        .collect();
    std::fs::write(&path, format!("<html><body>{body}</body></html>")).unwrap();

    let host = DocumentHost::new(PageSource::File(path), CommentExtractor::default());
    let request = ExtractionRequest {
        action: EXTRACT_COMMENTS_ACTION.to_string(),
        limit: None,
    };

    let comments = host.handle(&request).await.into_result().unwrap();
    assert_eq!(comments.len(), DEFAULT_EXTRACTION_LIMIT);
    assert_eq!(comments[0].text, "c0");
}

#[tokio::test]
async fn test_host_failure_is_extraction_failure() {
    let (bridge, mut receiver) = ExtractionBridge::channel();
    tokio::spawn(async move {
        if let Some(pending) = receiver.recv().await {
            pending.respond(ExtractionResponse::failure("page not ready"));
        }
    });

    let result = bridge.extract_comments(10).await;
    assert_eq!(
        result,
        Err(ExtractionError::Failed {
            reason: "page not ready".to_string()
        })
    );
}

#[tokio::test]
async fn test_host_rejects_unknown_action() {
    let host = DocumentHost::new(
        PageSource::File("/nonexistent/page.html".into()),
        CommentExtractor::default(),
    );
    let request = ExtractionRequest {
        action: "scroll".to_string(),
        limit: None,
    };

    let response = host.handle(&request).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("unsupported action"));
}

#[tokio::test]
async fn test_host_reports_unreadable_page() {
    let bridge = DocumentHost::new(
        PageSource::File("/nonexistent/page.html".into()),
        CommentExtractor::default(),
    )
    .spawn();

    let result = bridge.extract_comments(10).await;
    assert!(matches!(result, Err(ExtractionError::Failed { .. })));
}

#[test]
fn test_page_source_parse() {
    assert!(matches!(
        PageSource::parse("https://www.youtube.com/watch?v=abc"),
        PageSource::Remote(_)
    ));
    assert_eq!(
        PageSource::parse(" ./saved/page.html "),
        PageSource::File("./saved/page.html".into())
    );
}

//! End-to-end revision workflow against a mock rewrite proxy:
//! capture a selection, dispatch, interleave edits, apply with relocation.

use draft_reviser::{
    load_from_str, Buffer, RestRewriteClient, RevisionEngine, RevisionError, Selection,
};
use serde_json::json;
use std::sync::Once;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env(),
            )
            .with_test_writer()
            .init();
    });
}

async fn mock_proxy(reply: &str) -> MockServer {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/content/modify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": reply })))
        .mount(&server)
        .await;
    server
}

fn engine_for(server: &MockServer) -> RevisionEngine<RestRewriteClient> {
    let config = load_from_str(&format!(
        r#"
[service]
endpoint = "{}/content/modify"
timeout_secs = 5

[limits]
max_instruction_len = 200
"#,
        server.uri()
    ))
    .unwrap();

    RevisionEngine::new(RestRewriteClient::from_config(&config.service).unwrap())
        .with_max_instruction_len(config.limits.max_instruction_len)
}

#[tokio::test]
async fn revise_end_to_end() {
    let server = mock_proxy("panther").await;
    let engine = engine_for(&server);

    let mut buffer = Buffer::new("The cat sat on the mat.");
    let selection = Selection::capture(&buffer, 4, 7).unwrap().unwrap();

    let applied = engine
        .revise(&mut buffer, selection, "make it more dramatic")
        .await
        .unwrap();

    assert_eq!(buffer.content(), "The panther sat on the mat.");
    assert_eq!(buffer.version(), 1);
    assert_eq!((applied.start, applied.end), (4, 11));
}

#[tokio::test]
async fn typing_during_the_round_trip_still_lands_the_edit() {
    let server = mock_proxy("panther").await;
    let engine = engine_for(&server);

    let mut buffer = Buffer::new("The cat sat on the mat.");
    let selection = Selection::capture(&buffer, 4, 7).unwrap().unwrap();
    let request = engine
        .request_revision(&buffer, selection, "make it more dramatic")
        .unwrap();

    // No lock is held on the buffer while the request is outstanding.
    buffer.insert(22, " quickly").unwrap();
    buffer.insert(0, "Note: ").unwrap();
    assert_eq!(buffer.content(), "Note: The cat sat on the mat quickly.");

    let replacement = engine.dispatch(&request).await.unwrap();
    let applied = engine
        .apply_revision(&mut buffer, &request, &replacement)
        .unwrap();

    assert_eq!(buffer.content(), "Note: The panther sat on the mat quickly.");
    assert_eq!(applied.replaced, "cat");
    assert_eq!(buffer.version(), 3);
}

#[tokio::test]
async fn deleting_the_selection_surfaces_stale_not_a_guess() {
    let server = mock_proxy("panther").await;
    let engine = engine_for(&server);

    let mut buffer = Buffer::new("The cat sat on the mat.");
    let selection = Selection::capture(&buffer, 4, 7).unwrap().unwrap();
    let request = engine
        .request_revision(&buffer, selection, "make it more dramatic")
        .unwrap();

    buffer.delete(4, 7).unwrap();

    let replacement = engine.dispatch(&request).await.unwrap();
    let err = engine
        .apply_revision(&mut buffer, &request, &replacement)
        .unwrap_err();

    assert!(matches!(err, RevisionError::StaleSelection { .. }));
    assert_eq!(buffer.content(), "The  sat on the mat.");
}

#[tokio::test]
async fn full_buffer_content_travels_as_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/content/modify"))
        .and(body_partial_json(json!({
            "fullContext": "The cat sat on the mat.",
            "selectedText": "cat",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": "panther" })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let mut buffer = Buffer::new("The cat sat on the mat.");
    let selection = Selection::capture(&buffer, 4, 7).unwrap().unwrap();

    engine
        .revise(&mut buffer, selection, "make it more dramatic")
        .await
        .unwrap();
}

#[tokio::test]
async fn proxy_failure_is_recoverable_and_leaves_buffer_alone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let engine = RevisionEngine::new(RestRewriteClient::new(format!(
        "{}/content/modify",
        server.uri()
    )));

    let mut buffer = Buffer::new("The cat sat on the mat.");
    let selection = Selection::capture(&buffer, 4, 7).unwrap().unwrap();

    let err = engine
        .revise(&mut buffer, selection, "make it more dramatic")
        .await
        .unwrap_err();
    assert!(matches!(err, RevisionError::Service(_)));
    assert_eq!(buffer.content(), "The cat sat on the mat.");
    assert_eq!(buffer.version(), 0);

    // The user may retry with a fresh capture once the proxy recovers.
    server.reset().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": "panther" })))
        .mount(&server)
        .await;

    let selection = Selection::capture(&buffer, 4, 7).unwrap().unwrap();
    engine
        .revise(&mut buffer, selection, "make it more dramatic")
        .await
        .unwrap();
    assert_eq!(buffer.content(), "The panther sat on the mat.");
}

use analog::core::action::{Action, update};
use analog::core::state::{App, RequestPhase};
use analog::core::transcript::{ERROR_TURN_TEXT, Role};
use analog::inference::{
    ChatRequest, Dispatcher, HttpDispatcher, StreamError, StreamEvent, TransportError, TurnError,
    stream_response,
};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_partial_json, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn dispatcher_for(server: &MockServer) -> HttpDispatcher {
    HttpDispatcher::new(
        format!("{}/chat", server.uri()),
        format!("{}/models", server.uri()),
    )
}

/// Runs one full request cycle and feeds every outcome through `update()`,
/// the same way the event loop does.
async fn run_cycle(dispatcher: &dyn Dispatcher, app: &mut App, prompt: &str) -> Result<(), TurnError> {
    let request = match update(app, Action::Submit(prompt.to_string())) {
        analog::core::action::Effect::SpawnRequest(request) => request,
        other => panic!("expected a request, got {other:?}"),
    };

    let (tx, mut rx) = mpsc::channel(100);
    let result = stream_response(dispatcher, &request, tx).await;

    while let Some(event) = rx.recv().await {
        update(app, Action::from(event));
    }
    if let Err(e) = &result {
        update(app, Action::RequestFailed(e.clone()));
    }
    result
}

fn contents(app: &App) -> Vec<(Role, String)> {
    app.transcript
        .current()
        .turns()
        .iter()
        .map(|t| (t.role, t.content.clone()))
        .collect()
}

// ============================================================================
// Chat Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_request_body_carries_prompt_and_model() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"prompt": "Hi", "modelId": "test-model"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = App::new("test-model".to_string());
    run_cycle(&dispatcher_for(&server), &mut app, "Hi").await.unwrap();
}

#[tokio::test]
async fn test_generation_params_are_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_partial_json(json!({"modelId": "m", "max_tokens": 64})))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest {
        max_tokens: Some(64),
        ..ChatRequest::new("Hi", "m")
    };
    let (tx, _rx) = mpsc::channel(100);
    stream_response(&dispatcher_for(&server), &request, tx).await.unwrap();
}

#[tokio::test]
async fn test_streamed_reply_lands_in_transcript() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes("Grüße, world! €5".as_bytes()))
        .mount(&server)
        .await;

    let mut app = App::new("test-model".to_string());
    run_cycle(&dispatcher_for(&server), &mut app, "Hi").await.unwrap();

    assert_eq!(
        contents(&app),
        vec![
            (Role::User, "Hi".to_string()),
            (Role::Assistant, "Grüße, world! €5".to_string()),
        ]
    );
    assert!(!app.is_loading);
    assert_eq!(app.phase, RequestPhase::Idle);
    assert!(!app.transcript.current().is_open());
}

#[tokio::test]
async fn test_empty_body_leaves_empty_closed_turn() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut app = App::new("test-model".to_string());
    run_cycle(&dispatcher_for(&server), &mut app, "Hi").await.unwrap();

    assert_eq!(
        contents(&app),
        vec![(Role::User, "Hi".to_string()), (Role::Assistant, String::new())]
    );
    assert!(!app.is_loading);
}

#[tokio::test]
async fn test_error_status_body_is_still_streamed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let mut app = App::new("test-model".to_string());
    run_cycle(&dispatcher_for(&server), &mut app, "Hi").await.unwrap();

    assert_eq!(contents(&app)[1].1, "upstream exploded");
}

#[tokio::test]
async fn test_no_content_status_is_a_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::channel(100);
    let result = stream_response(&dispatcher_for(&server), &ChatRequest::new("Hi", "m"), tx).await;

    assert_eq!(
        result,
        Err(TurnError::Transport(TransportError::NoBody { status: 204 }))
    );
    assert_eq!(rx.recv().await, None::<StreamEvent>);
}

#[tokio::test]
async fn test_invalid_utf8_body_ends_in_error_turn() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok \xFF rest".to_vec()))
        .mount(&server)
        .await;

    let mut app = App::new("test-model".to_string());
    let result = run_cycle(&dispatcher_for(&server), &mut app, "Hi").await;

    assert_eq!(
        result,
        Err(TurnError::Stream(StreamError::Decode { offset: 3 }))
    );
    assert_eq!(
        contents(&app),
        vec![
            (Role::User, "Hi".to_string()),
            (Role::Assistant, "ok ".to_string()),
            (Role::Assistant, ERROR_TURN_TEXT.to_string()),
        ]
    );
    assert!(!app.is_loading);
}

#[tokio::test]
async fn test_unreachable_endpoint_adds_error_turn() {
    // Nothing listens on port 1.
    let dispatcher = HttpDispatcher::new("http://127.0.0.1:1/chat", "http://127.0.0.1:1/models");

    let mut app = App::new("test-model".to_string());
    let result = run_cycle(&dispatcher, &mut app, "Hi").await;

    assert!(matches!(
        result,
        Err(TurnError::Transport(TransportError::Network(_)))
    ));
    assert_eq!(
        contents(&app),
        vec![
            (Role::User, "Hi".to_string()),
            (Role::Assistant, ERROR_TURN_TEXT.to_string()),
        ]
    );
    assert!(!app.is_loading);
    assert_eq!(app.phase, RequestPhase::Idle);
}

#[tokio::test]
async fn test_second_submission_after_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("reply"))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);
    let mut app = App::new("test-model".to_string());
    run_cycle(&dispatcher, &mut app, "one").await.unwrap();
    run_cycle(&dispatcher, &mut app, "two").await.unwrap();

    assert_eq!(app.transcript.current().len(), 4);
}

// ============================================================================
// Model Catalogue Tests
// ============================================================================

#[tokio::test]
async fn test_list_models_parses_catalogue() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "us.anthropic.claude-sonnet-4-5-20250929-v1:0", "name": "Claude Sonnet 4.5"},
            {"id": "amazon.titan-text-express-v1", "name": "Titan Text Express"}
        ])))
        .mount(&server)
        .await;

    let models = dispatcher_for(&server).list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[1].id, "amazon.titan-text-express-v1");
    assert_eq!(models[0].name, "Claude Sonnet 4.5");
}

#[tokio::test]
async fn test_list_models_malformed_catalogue_is_invalid_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = dispatcher_for(&server).list_models().await;
    assert!(matches!(result, Err(TransportError::InvalidBody(_))));
}

#[tokio::test]
async fn test_list_models_unreachable_is_network_error() {
    let dispatcher = HttpDispatcher::new("http://127.0.0.1:1/chat", "http://127.0.0.1:1/models");
    let result = dispatcher.list_models().await;
    assert!(matches!(result, Err(TransportError::Network(_))));
}

//! Integration tests for Wizard Chat
//!
//! These tests drive the view through a real HTTP client against a mock store,
//! and through the in-memory store where the store must remember writes.

use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wizard_chat::core::message::{FeedbackScale, END_TEXT, START_TEXT};
use wizard_chat::view::PollConfig;
use wizard_chat::{
    ConversationView, InMemoryStore, MessageStore, NewMessage, PollOutcome, Role, StoreClient,
    StoreConfig, TurnPolicy, ViewState,
};

fn fast_poll() -> PollConfig {
    PollConfig {
        interval_ms: 10,
        backoff_factor: 1.0,
        max_interval_ms: 10,
        timeout_secs: 5,
    }
}

async fn mount_listing(server: &MockServer, messages: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .and(header("Authorization", "Bearer integration-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": messages })))
        .mount(server)
        .await;
}

async fn connected_client(server: &MockServer) -> StoreClient {
    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(server)
        .await;

    StoreClient::connect(&StoreConfig::new(server.uri(), "integration-key"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_render_over_http_applies_rendering_rules() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([
            {"role": "assistant", "content": "<s>"},
            {"role": "user", "content": "Plan my trip", "files": ["dates.txt"]},
            {"role": "system", "content": "x"},
            {"role": "assistant", "content": "Done!", "reasoning": "all booked"},
            {"role": "assistant", "content": "</s>", "feedback": 4}
        ]),
    )
    .await;

    let client = connected_client(&server).await;
    let mut view = ConversationView::new(
        Arc::new(client),
        Role::Assistant,
        TurnPolicy::LastRole,
        fast_poll(),
    )
    .unwrap();

    let transcript = view.render().await.unwrap().clone();
    assert_eq!(transcript.bubbles.len(), 4);
    assert_eq!(transcript.skipped, 1);

    let greeting = transcript.bubble_at(0).unwrap();
    assert_eq!(greeting.body, START_TEXT);
    assert!(greeting.feedback.is_none());

    assert_eq!(transcript.bubble_at(1).unwrap().files, vec!["dates.txt"]);
    assert!(transcript.bubble_at(2).is_none());

    let answer = transcript.bubble_at(3).unwrap();
    assert_eq!(answer.reasoning.as_deref(), Some("all booked"));
    assert_eq!(answer.feedback.as_ref().unwrap().scale, FeedbackScale::Thumbs);

    let closing = transcript.bubble_at(4).unwrap();
    assert_eq!(closing.body, END_TEXT);
    let stars = closing.feedback.as_ref().unwrap();
    assert_eq!(stars.scale, FeedbackScale::Stars);
    assert_eq!(stars.value, Some(4));

    assert_eq!(view.state(), ViewState::AwaitingCounterparty);
    assert!(!view.input_enabled());
}

#[tokio::test]
async fn test_operator_reply_is_posted_over_http() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([
            {"role": "assistant", "content": "<s>"},
            {"role": "user", "content": "Any cheap flights?"}
        ]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/messages"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "role": "assistant",
            "content": "Tuesday departures are cheapest",
            "files": null,
            "reasoning": "checked fares",
            "feedback": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = connected_client(&server).await;
    let mut view = ConversationView::new(
        Arc::new(client),
        Role::Assistant,
        TurnPolicy::LastRole,
        fast_poll(),
    )
    .unwrap();

    view.render().await.unwrap();
    assert!(view.input_enabled());

    let bubble = view
        .submit(r#"{"content": "Tuesday departures are cheapest", "reasoning": "checked fares"}"#)
        .await
        .unwrap();
    assert_eq!(bubble.index, 2);
    assert_eq!(view.state(), ViewState::Render);
}

#[tokio::test]
async fn test_store_failure_propagates_without_retry() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = ConversationView::new(
        Arc::new(client),
        Role::Assistant,
        TurnPolicy::LastRole,
        fast_poll(),
    )
    .unwrap();

    let err = view.render().await.err().unwrap();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_new_chat_over_http_clears_then_seeds() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/messages"))
        .and(body_json(json!({
            "role": "assistant",
            "content": "<s>",
            "files": null,
            "reasoning": null,
            "feedback": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = connected_client(&server).await;
    client.reset().await.unwrap();
}

#[tokio::test]
async fn test_full_turn_cycle_in_memory() {
    let store = InMemoryStore::new();
    let mut view = ConversationView::new(
        Arc::new(store.clone()),
        Role::Assistant,
        TurnPolicy::LastRole,
        fast_poll(),
    )
    .unwrap();

    view.new_chat().await.unwrap();
    view.render().await.unwrap();
    assert_eq!(view.state(), ViewState::AwaitingCounterparty);

    let user = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        user.post_message(NewMessage::user("Is Porto nice in May?"))
            .await
            .unwrap();
    });

    let outcome = view.await_counterparty(&CancellationToken::new()).await.unwrap();
    assert!(matches!(outcome, PollOutcome::Found { index: 1, .. }));
    assert!(view.input_enabled());

    view.submit("Yes, warm and not too crowded").await.unwrap();
    view.render().await.unwrap();
    assert_eq!(view.state(), ViewState::AwaitingCounterparty);

    view.rate(2, 1).await.unwrap();

    let stored = store.get_messages().await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[2].role, Role::Assistant);
    assert_eq!(stored[2].feedback, Some(1));
    assert_eq!(stored[1].feedback, None);
}

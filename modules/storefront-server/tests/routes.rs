//! Router tests over in-memory stores and scripted providers.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ai_client::ProviderKind;
use storefront_assistant::testing::{
    MockCatalog, MockConversations, MockSettings, RecordingProviderFactory, ScriptedProvider,
};
use storefront_assistant::{Assistant, FallbackCredentials, GenerationClient};
use storefront_core::{AssistantDefaults, AssistantSettings, CatalogItem, KeyCipher};
use storefront_server::{build_router, AppState};

const TEST_KEY: &str = "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDE=";

struct Harness {
    router: Router,
    settings: Arc<MockSettings>,
    conversations: Arc<MockConversations>,
    factory: Arc<RecordingProviderFactory>,
    cipher: KeyCipher,
}

fn harness(settings: MockSettings) -> Harness {
    let cipher = KeyCipher::from_base64_key(TEST_KEY).unwrap();
    let settings = Arc::new(settings);
    let conversations = Arc::new(MockConversations::new());
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying(
        "Te sugiero el Zenbook 14.",
    )));

    let catalog = MockCatalog::new().with_item(
        CatalogItem::new("Zenbook 14", 3_200_000.0, 2)
            .with_brand("Asus")
            .with_category("Laptops"),
    );
    let generation = GenerationClient::new(
        factory.clone(),
        Some(cipher.clone()),
        FallbackCredentials::default(),
        AssistantDefaults::default(),
    );
    let assistant = Arc::new(Assistant::new(Arc::new(catalog), settings.clone(), generation));

    let state = AppState {
        assistant,
        conversations: conversations.clone(),
        settings: settings.clone(),
        cipher: Some(cipher.clone()),
    };

    Harness {
        router: build_router(state, &[]),
        settings,
        conversations,
        factory,
        cipher,
    }
}

fn stored_settings(cipher: &KeyCipher) -> AssistantSettings {
    AssistantSettings {
        provider: ProviderKind::OpenAi,
        api_key: Some(cipher.encrypt("sk-live").unwrap()),
        model_name: "gpt-4o-mini".to_string(),
        clarify_before_recommend: false,
        ..Default::default()
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_ok_and_not_cached() {
    let h = harness(MockSettings::empty());
    let response = h
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["cache-control"], "no-store");
}

#[tokio::test]
async fn chat_answers_and_records_both_turns() {
    let cipher = KeyCipher::from_base64_key(TEST_KEY).unwrap();
    let h = harness(MockSettings::with(stored_settings(&cipher)));

    let (status, body) = send(
        &h.router,
        json_request(
            "POST",
            "/api/assistant/chat",
            json!({"message": "quiero una laptop", "session_id": "abc"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Te sugiero el Zenbook 14.");
    assert_eq!(body["outcome"], "generate");
    assert_eq!(body["provider"], "openai");
    assert_eq!(h.factory.calls()[0].api_key, "sk-live");

    let turns = h.conversations.all();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "quiero una laptop");
    assert_eq!(turns[1].provider.as_deref(), Some("openai"));
}

#[tokio::test]
async fn second_message_carries_history() {
    let cipher = KeyCipher::from_base64_key(TEST_KEY).unwrap();
    let h = harness(MockSettings::with(stored_settings(&cipher)));

    for text in ["hola, busco laptop", "¿y otra laptop más liviana?"] {
        let (status, _) = send(
            &h.router,
            json_request(
                "POST",
                "/api/assistant/chat",
                json!({"message": text, "session_id": "abc"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let calls = h.factory.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].request.history.is_empty());
    assert_eq!(calls[1].request.history.len(), 2);
    assert!(calls[1].request.system.contains("no vuelvas a saludar"));

    let (status, body) = send(
        &h.router,
        Request::get("/api/assistant/conversations/abc")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn chat_rejects_blank_message() {
    let h = harness(MockSettings::empty());
    let (status, body) = send(
        &h.router,
        json_request(
            "POST",
            "/api/assistant/chat",
            json!({"message": "   ", "session_id": "abc"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn settings_round_trip_encrypts_and_redacts_the_key() {
    let h = harness(MockSettings::empty());

    let (status, _) = send(
        &h.router,
        Request::get("/api/assistant/settings").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &h.router,
        json_request(
            "PUT",
            "/api/assistant/settings",
            json!({
                "provider": "openrouter",
                "api_key": "sk-or-plain",
                "model_name": "deepseek/deepseek-chat",
                "max_tokens": 400,
                "temperature": 0.3,
                "stopwords": ["Hola", " "],
                "clarify_max_questions": 2
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_api_key"], true);
    assert!(body.get("api_key").is_none());
    assert_eq!(body["stopwords"], json!(["hola"]));

    let saved = h.settings.current().unwrap();
    let stored_key = saved.api_key.unwrap();
    assert_ne!(stored_key, "sk-or-plain");
    assert_eq!(h.cipher.decrypt(&stored_key).unwrap(), "sk-or-plain");

    let (status, body) = send(
        &h.router,
        Request::get("/api/assistant/settings").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "openrouter");
    assert_eq!(body["clarify_max_questions"], 2);
}

#[tokio::test]
async fn settings_update_without_key_keeps_the_stored_one() {
    let cipher = KeyCipher::from_base64_key(TEST_KEY).unwrap();
    let original = stored_settings(&cipher);
    let original_key = original.api_key.clone();
    let h = harness(MockSettings::with(original));

    let (status, _) = send(
        &h.router,
        json_request(
            "PUT",
            "/api/assistant/settings",
            json!({
                "provider": "openai",
                "model_name": "gpt-4o",
                "max_tokens": 800,
                "temperature": 0.5
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.settings.current().unwrap().api_key, original_key);
}

#[tokio::test]
async fn settings_provider_change_without_key_drops_the_stored_one() {
    let cipher = KeyCipher::from_base64_key(TEST_KEY).unwrap();
    let h = harness(MockSettings::with(stored_settings(&cipher)));

    let (status, body) = send(
        &h.router,
        json_request(
            "PUT",
            "/api/assistant/settings",
            json!({
                "provider": "openrouter",
                "model_name": "deepseek/deepseek-chat",
                "max_tokens": 400,
                "temperature": 0.3
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_api_key"], false);

    let saved = h.settings.current().unwrap();
    assert_eq!(saved.provider, ProviderKind::OpenRouter);
    assert!(saved.api_key.is_none());
}

#[tokio::test]
async fn settings_update_validates_input() {
    let h = harness(MockSettings::empty());
    let cases = [
        json!({"provider": "gemini", "model_name": "m", "max_tokens": 10, "temperature": 0.1}),
        json!({"provider": "openai", "model_name": " ", "max_tokens": 10, "temperature": 0.1}),
        json!({"provider": "openai", "model_name": "m", "max_tokens": 0, "temperature": 0.1}),
        json!({"provider": "openai", "model_name": "m", "max_tokens": 10, "temperature": 3.0}),
        json!({"provider": "openai", "model_name": "m", "max_tokens": 10, "temperature": 0.1,
               "clarify_max_questions": 9}),
    ];
    for case in cases {
        let (status, _) =
            send(&h.router, json_request("PUT", "/api/assistant/settings", case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {case}");
    }
    assert!(h.settings.current().is_none());
}

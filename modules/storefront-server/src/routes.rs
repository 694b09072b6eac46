use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

use ai_client::ProviderKind;
use storefront_assistant::generation::HISTORY_TURNS;
use storefront_assistant::{
    Assistant, ConversationStore, QueryContext, SettingsStore, UserMessage,
};
use storefront_core::{AssistantSettings, ConversationTurn, KeyCipher, MAX_CLARIFY_QUESTIONS};

/// Longest accepted chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Most turns returned by the conversation endpoint.
const CONVERSATION_PAGE: usize = 200;

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub conversations: Arc<dyn ConversationStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub cipher: Option<KeyCipher>,
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/assistant/chat", post(chat))
        .route("/api/assistant/conversations/{session_id}", get(conversation))
        .route("/api/assistant/settings", get(get_settings).put(put_settings))
        .with_state(state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path only (no bodies, no query params)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

async fn health() -> &'static str {
    "ok"
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

// --- Chat ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    message: String,
    session_id: String,
    budget: Option<f64>,
    intended_use: Option<String>,
    brand_preference: Option<String>,
}

async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Response {
    let text = body.message.trim();
    let session_id = body.session_id.trim();
    if text.is_empty() || session_id.is_empty() {
        return error(StatusCode::BAD_REQUEST, "message and session_id are required");
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return error(
            StatusCode::BAD_REQUEST,
            format!("message too long (max {MAX_MESSAGE_CHARS} characters)"),
        );
    }

    let history = match state.conversations.history(session_id, HISTORY_TURNS).await {
        Ok(turns) => turns,
        Err(e) => {
            warn!(error = %e, "Failed to load conversation history");
            return error(StatusCode::INTERNAL_SERVER_ERROR, "failed to load conversation");
        }
    };

    let message = UserMessage::new(text, session_id).with_prior_turns(!history.is_empty());
    let context = QueryContext {
        budget: body.budget,
        intended_use: body.intended_use,
        brand_preference: body.brand_preference,
        history: history.iter().map(ConversationTurn::to_message).collect(),
    };

    let result = match state.assistant.process_user_query(&message, &context).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Assistant query failed");
            return error(StatusCode::INTERNAL_SERVER_ERROR, "assistant unavailable");
        }
    };

    let turns = [
        ConversationTurn::user(session_id, text),
        ConversationTurn::assistant(session_id, &result.content, &result.provider),
    ];
    if let Err(e) = state.conversations.append(&turns).await {
        warn!(error = %e, "Failed to store conversation turns");
    }

    info!(outcome = %result.outcome, provider = %result.provider, "Chat answered");
    Json(result).into_response()
}

// --- Conversations ---

async fn conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.conversations.history(&session_id, CONVERSATION_PAGE).await {
        Ok(messages) => Json(serde_json::json!({
            "session_id": session_id,
            "messages": messages,
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load conversation");
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to load conversation")
        }
    }
}

// --- Settings ---

/// Settings as returned to clients. The key itself never leaves the server.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    provider: ProviderKind,
    has_api_key: bool,
    model_name: String,
    max_tokens: u32,
    temperature: f32,
    stopwords: Vec<String>,
    clarify_before_recommend: bool,
    clarify_max_questions: usize,
}

impl From<AssistantSettings> for SettingsView {
    fn from(s: AssistantSettings) -> Self {
        Self {
            provider: s.provider,
            has_api_key: s.api_key.as_deref().is_some_and(|k| !k.is_empty()),
            model_name: s.model_name,
            max_tokens: s.max_tokens,
            temperature: s.temperature,
            stopwords: s.stopwords,
            clarify_before_recommend: s.clarify_before_recommend,
            clarify_max_questions: s.clarify_max_questions,
        }
    }
}

/// Replacement settings. `api_key` is plaintext; omit it to keep the stored
/// one, which is only kept while the provider stays the same.
#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    provider: String,
    api_key: Option<String>,
    model_name: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(default)]
    stopwords: Vec<String>,
    clarify_before_recommend: Option<bool>,
    clarify_max_questions: Option<usize>,
}

async fn get_settings(State(state): State<AppState>) -> Response {
    match state.settings.active_settings().await {
        Ok(Some(settings)) => Json(SettingsView::from(settings)).into_response(),
        Ok(None) => error(StatusCode::NOT_FOUND, "assistant settings not configured"),
        Err(e) => {
            warn!(error = %e, "Failed to read assistant settings");
            error(StatusCode::INTERNAL_SERVER_ERROR, "failed to read settings")
        }
    }
}

async fn put_settings(State(state): State<AppState>, Json(body): Json<SettingsUpdate>) -> Response {
    let provider = match body.provider.parse::<ProviderKind>() {
        Ok(p) => p,
        Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
    };
    if body.model_name.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "model_name is required");
    }
    if body.max_tokens == 0 {
        return error(StatusCode::BAD_REQUEST, "max_tokens must be positive");
    }
    if !(0.0..=2.0).contains(&body.temperature) {
        return error(StatusCode::BAD_REQUEST, "temperature must be between 0 and 2");
    }
    let clarify_max_questions = body.clarify_max_questions.unwrap_or(3);
    if !(1..=MAX_CLARIFY_QUESTIONS).contains(&clarify_max_questions) {
        return error(
            StatusCode::BAD_REQUEST,
            format!("clarify_max_questions must be between 1 and {MAX_CLARIFY_QUESTIONS}"),
        );
    }

    let existing = match state.settings.active_settings().await {
        Ok(existing) => existing,
        Err(e) => {
            warn!(error = %e, "Failed to read assistant settings");
            return error(StatusCode::INTERNAL_SERVER_ERROR, "failed to read settings");
        }
    };

    let api_key = match body.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(plaintext) => {
            let Some(cipher) = state.cipher.as_ref() else {
                return error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ASSISTANT_ENCRYPTION_KEY is not configured",
                );
            };
            match cipher.encrypt(plaintext) {
                Ok(encrypted) => Some(encrypted),
                Err(e) => {
                    warn!(error = %e, "Failed to encrypt API key");
                    return error(StatusCode::INTERNAL_SERVER_ERROR, "failed to store API key");
                }
            }
        }
        // A stored key belongs to the provider it was issued for.
        None => existing
            .filter(|s| s.provider == provider)
            .and_then(|s| s.api_key),
    };

    let mut settings = AssistantSettings {
        provider,
        api_key,
        model_name: body.model_name.trim().to_string(),
        max_tokens: body.max_tokens,
        temperature: body.temperature,
        stopwords: body.stopwords,
        clarify_before_recommend: body.clarify_before_recommend.unwrap_or(true),
        clarify_max_questions,
    };
    settings.stopwords = settings.normalized_stopwords();

    if let Err(e) = state.settings.save_settings(&settings).await {
        warn!(error = %e, "Failed to save assistant settings");
        return error(StatusCode::INTERNAL_SERVER_ERROR, "failed to save settings");
    }

    info!(provider = %settings.provider, model = %settings.model_name, "Assistant settings updated");
    Json(SettingsView::from(settings)).into_response()
}

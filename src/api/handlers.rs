//! API request handlers

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Query;
use axum::extract::State;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::api::types::ConvIdParams;
use crate::api::types::DeleteResponse;
use crate::api::types::ErrorDetail;
use crate::api::types::HealthResponse;
use crate::api::types::InvokeRequest;
use crate::conversation::sanitize_conv_id;
use crate::conversation::ChatMessage;
use crate::conversation::ConversationStore;
use crate::rag::RagChain;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub conversations: Arc<ConversationStore>,
    pub chain: Arc<RagChain>,
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Answer a question in a conversation (POST /invoke)
///
/// The history snapshot is taken before the chain runs; the new turn is
/// appended only after the chain returns successfully, so a failed request
/// leaves the conversation untouched.
pub async fn invoke(
    State(state): State<AppState>,
    Query(params): Query<ConvIdParams>,
    Json(req): Json<InvokeRequest>,
) -> Response {
    let conv_id = sanitize_conv_id(&params.conv_id);
    info!("POST /invoke - conversation id: {}", conv_id);

    let history = state.conversations.get_history(&conv_id);

    match state.chain.invoke(&req.query, &history).await {
        Ok(response) => {
            state
                .conversations
                .add_message(&conv_id, ChatMessage::user(req.query));
            state
                .conversations
                .add_message(&conv_id, ChatMessage::assistant(response.answer.clone()));

            response.answer.into_response()
        }
        Err(e) => {
            error!("Error processing RAG query: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response()
        }
    }
}

/// Answer a question as a plain-text stream (POST /stream)
///
/// Streaming responses do not update conversation history; only /invoke
/// records the new turn.
pub async fn stream(
    State(state): State<AppState>,
    Query(params): Query<ConvIdParams>,
    Json(req): Json<InvokeRequest>,
) -> Response {
    let conv_id = sanitize_conv_id(&params.conv_id);
    info!("POST /stream - conversation id: {}", conv_id);

    let history = state.conversations.get_history(&conv_id);

    match state.chain.stream(&req.query, &history).await {
        Ok(streaming) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            Body::from_stream(streaming.into_stream()),
        )
            .into_response(),
        Err(e) => {
            error!("Error processing streaming RAG query: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response()
        }
    }
}

/// Count the conversations not yet deleted (GET /count_conversations)
pub async fn count_conversations(State(state): State<AppState>) -> Json<usize> {
    Json(state.conversations.conversation_count())
}

/// Delete a conversation (DELETE /delete)
pub async fn delete_conversation(
    State(state): State<AppState>,
    Query(params): Query<ConvIdParams>,
) -> Response {
    let conv_id = sanitize_conv_id(&params.conv_id);
    info!("Called delete, conv_id: {}...", conv_id);

    if state.conversations.clear_conversation(&conv_id) {
        Json(DeleteResponse {
            conv_id,
            messages: Vec::new(),
        })
        .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorDetail {
                detail: "Conversation not found!".to_string(),
            }),
        )
            .into_response()
    }
}

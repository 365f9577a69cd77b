//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::conversation::ChatMessage;

/// Body of an invoke or stream request
///
/// `query` is the request from the user.
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub query: String,
}

/// Query parameters carrying the conversation identifier
#[derive(Debug, Deserialize)]
pub struct ConvIdParams {
    pub conv_id: String,
}

/// Acknowledgement returned after a conversation is deleted
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub conv_id: String,
    pub messages: Vec<ChatMessage>,
}

/// Error detail payload for non-success statuses
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

//! HTTP server implementation

use std::sync::Arc;

use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::conversation::ConversationStore;
use crate::rag::RagChain;
use crate::Result;

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("🚀 Starting ragchat API server...");

    // Initialize services
    let conversations = Arc::new(ConversationStore::new(config.conv_max_msgs()));
    let chain = Arc::new(RagChain::new(config).await?);

    info!(
        "Conversation history bounded to {} messages per conversation",
        conversations.max_messages()
    );

    let state = AppState {
        conversations,
        chain,
    };

    // Build routes with middleware layers
    let mut app = routes::api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    // Add CORS if enabled
    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Start server
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("");
    info!("Available endpoints:");
    info!("  GET    /health              - Health check");
    info!("  POST   /invoke              - Answer a question in a conversation");
    info!("  POST   /stream              - Answer a question as a text stream");
    info!("  GET    /count_conversations - Count active conversations");
    info!("  DELETE /delete              - Delete a conversation");

    axum::serve(listener, app).await?;

    Ok(())
}

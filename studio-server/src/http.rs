//! Creator Studio HTTP REST API
//!
//! Axum-based HTTP server in front of the generation adapter and the content
//! gallery store.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function returning `(StatusCode, serde_json::Value)`. The inner
//! functions are directly testable without axum dispatch machinery.
//!
//! Endpoints:
//! - GET    /                       — banner
//! - GET    /health                 — liveness with timestamp
//! - POST   /api/scripts/generate   — video script (saved to gallery)
//! - POST   /api/images/generate    — enhanced image prompt (saved to gallery)
//! - POST   /api/hashtags/generate  — hashtag list
//! - POST   /api/prompt/process     — prompt analysis + suggested tools
//! - POST   /api/video/suggestions  — editing suggestions + style
//! - GET    /api/gallery            — list records, optional `content_type` filter
//! - GET    /api/gallery/:id        — one record or 404
//! - DELETE /api/gallery/:id        — delete or 404

use std::fmt::Display;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use studio_core::generation::{
    DEFAULT_DURATION, DEFAULT_PLATFORM, DEFAULT_SIZE, DEFAULT_STYLE, DEFAULT_TONE,
};
use studio_core::{
    ContentStore, GeminiTextClient, GenerationError, GenerationService, Metadata, StoreError,
    StudioConfig, StudioError,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Longest image prompt prefix used as a gallery title.
const IMAGE_TITLE_CHARS: usize = 50;

/// Shared state for all HTTP handlers
pub struct HttpState {
    pub store: ContentStore,
    /// Initialization failure is kept and reported by every generation endpoint,
    /// so gallery endpoints stay usable without a model credential.
    pub generation: Result<GenerationService, GenerationError>,
    pub config: StudioConfig,
}

impl HttpState {
    /// Open the store and build the Gemini-backed generation service once.
    pub fn from_config(config: StudioConfig) -> Result<Self, StudioError> {
        let store = ContentStore::open(&config.storage.path)?;

        let generation = GeminiTextClient::new(&config.gemini)
            .map(|client| GenerationService::new(Arc::new(client)));
        match &generation {
            Ok(service) => tracing::info!(
                backend = service.backend_name(),
                model = %config.gemini.model,
                "Generation service ready"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "Generation service unavailable: generation endpoints will return 500"
            ),
        }

        Ok(Self {
            store,
            generation,
            config,
        })
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let cors = cors_layer(&state.config.http.allowed_origins);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/scripts/generate", post(script_handler))
        .route("/api/images/generate", post(image_handler))
        .route("/api/hashtags/generate", post(hashtags_handler))
        .route("/api/prompt/process", post(process_prompt_handler))
        .route("/api/video/suggestions", post(video_suggestions_handler))
        .route("/api/gallery", get(gallery_list_handler))
        .route(
            "/api/gallery/:content_id",
            get(gallery_get_handler).delete(gallery_delete_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<HttpState>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Creator Studio API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

fn default_tone() -> String {
    DEFAULT_TONE.to_string()
}

fn default_duration() -> String {
    DEFAULT_DURATION.to_string()
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

fn default_size() -> u32 {
    DEFAULT_SIZE
}

#[derive(Debug, Deserialize)]
pub struct ScriptRequest {
    pub topic: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_duration")]
    pub duration: String,
    pub keywords: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_size")]
    pub size: u32,
}

#[derive(Debug, Deserialize)]
pub struct HashtagRequest {
    pub topic: String,
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct GalleryQuery {
    pub content_type: Option<String>,
}

/// Body of every 500 response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error: "Internal server error".to_string(),
            detail: detail.into(),
        }
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub fn root_inner() -> Value {
    json!({
        "message": "Creator Studio Co-Pilot API is running",
        "status": "healthy",
    })
}

pub fn health_inner() -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
    )
}

pub async fn generate_script_inner(state: &HttpState, req: ScriptRequest) -> (StatusCode, Value) {
    const CONTEXT: &str = "Error generating script";

    let service = match generation_service(state, CONTEXT) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let script = match service
        .generate_script(&req.topic, &req.tone, &req.duration, req.keywords.as_deref())
        .await
    {
        Ok(s) => s,
        Err(e) => return internal_error(CONTEXT, e),
    };

    let stored = metadata(json!({
        "tone": req.tone,
        "duration": req.duration,
        "keywords": req.keywords,
    }));
    let (topic, body) = (req.topic.clone(), script.clone());
    let content_id = match with_store(state, move |store| {
        store.save("script", &topic, &body, Some(stored))
    })
    .await
    {
        Ok(id) => id,
        Err(e) => return internal_error(CONTEXT, e),
    };

    (
        StatusCode::OK,
        json!({
            "success": true,
            "script": script,
            "content_id": content_id,
            "metadata": {
                "tone": req.tone,
                "duration": req.duration,
                "topic": req.topic,
            },
        }),
    )
}

pub async fn generate_image_inner(state: &HttpState, req: ImageRequest) -> (StatusCode, Value) {
    const CONTEXT: &str = "Error generating image";

    let service = match generation_service(state, CONTEXT) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let image = match service
        .enhance_image_prompt(&req.prompt, &req.style, req.size)
        .await
    {
        Ok(i) => i,
        Err(e) => return internal_error(CONTEXT, e),
    };

    let title: String = req.prompt.chars().take(IMAGE_TITLE_CHARS).collect();
    let stored = metadata(json!({
        "style": req.style,
        "size": req.size,
        "prompt": req.prompt,
    }));
    let content = image.image_url.clone().unwrap_or_default();
    let content_id = match with_store(state, move |store| {
        store.save("image", &title, &content, Some(stored))
    })
    .await
    {
        Ok(id) => id,
        Err(e) => return internal_error(CONTEXT, e),
    };

    (
        StatusCode::OK,
        json!({
            "success": true,
            "image_url": image.image_url,
            "image_base64": image.image_base64,
            "enhanced_prompt": image.enhanced_prompt,
            "content_id": content_id,
            "metadata": {
                "style": req.style,
                "size": req.size,
                "prompt": req.prompt,
            },
        }),
    )
}

pub async fn generate_hashtags_inner(
    state: &HttpState,
    req: HashtagRequest,
) -> (StatusCode, Value) {
    const CONTEXT: &str = "Error generating hashtags";

    let service = match generation_service(state, CONTEXT) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let platform = req.platform.as_deref().unwrap_or(DEFAULT_PLATFORM);
    match service.generate_hashtags(&req.topic, platform).await {
        Ok(hashtags) => (
            StatusCode::OK,
            json!({
                "success": true,
                "count": hashtags.len(),
                "hashtags": hashtags,
            }),
        ),
        Err(e) => internal_error(CONTEXT, e),
    }
}

pub async fn process_prompt_inner(state: &HttpState, req: PromptRequest) -> (StatusCode, Value) {
    const CONTEXT: &str = "Error processing prompt";

    let service = match generation_service(state, CONTEXT) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match service.process_prompt(&req.prompt).await {
        Ok(analysis) => (
            StatusCode::OK,
            json!({
                "success": true,
                "suggestions": analysis,
                "prompt": req.prompt,
            }),
        ),
        Err(e) => internal_error(CONTEXT, e),
    }
}

pub async fn video_suggestions_inner(
    state: &HttpState,
    req: PromptRequest,
) -> (StatusCode, Value) {
    const CONTEXT: &str = "Error getting video suggestions";

    let service = match generation_service(state, CONTEXT) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match service.video_editing_suggestions(&req.prompt).await {
        Ok(suggestions) => (
            StatusCode::OK,
            json!({
                "success": true,
                "suggestions": suggestions,
            }),
        ),
        Err(e) => internal_error(CONTEXT, e),
    }
}

pub async fn gallery_list_inner(state: &HttpState, query: GalleryQuery) -> (StatusCode, Value) {
    match with_store(state, move |store| store.list(query.content_type.as_deref())).await {
        Ok(items) => (
            StatusCode::OK,
            json!({
                "success": true,
                "count": items.len(),
                "items": items,
            }),
        ),
        Err(e) => internal_error("Error fetching gallery", e),
    }
}

pub async fn gallery_get_inner(state: &HttpState, content_id: String) -> (StatusCode, Value) {
    match with_store(state, move |store| store.get(&content_id)).await {
        Ok(Some(item)) => (StatusCode::OK, json!({ "success": true, "item": item })),
        Ok(None) => not_found(),
        Err(e) => internal_error("Error fetching content", e),
    }
}

pub async fn gallery_delete_inner(state: &HttpState, content_id: String) -> (StatusCode, Value) {
    match with_store(state, move |store| store.delete(&content_id)).await {
        Ok(true) => (
            StatusCode::OK,
            json!({
                "success": true,
                "message": "Content deleted successfully",
            }),
        ),
        Ok(false) => not_found(),
        Err(e) => internal_error("Error deleting content", e),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(root_inner()))
}

pub async fn health_handler() -> impl IntoResponse {
    let (status, body) = health_inner();
    (status, Json(body))
}

pub async fn script_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ScriptRequest>,
) -> impl IntoResponse {
    let (status, body) = generate_script_inner(&state, req).await;
    (status, Json(body))
}

pub async fn image_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ImageRequest>,
) -> impl IntoResponse {
    let (status, body) = generate_image_inner(&state, req).await;
    (status, Json(body))
}

pub async fn hashtags_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<HashtagRequest>,
) -> impl IntoResponse {
    let (status, body) = generate_hashtags_inner(&state, req).await;
    (status, Json(body))
}

pub async fn process_prompt_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<PromptRequest>,
) -> impl IntoResponse {
    let (status, body) = process_prompt_inner(&state, req).await;
    (status, Json(body))
}

pub async fn video_suggestions_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<PromptRequest>,
) -> impl IntoResponse {
    let (status, body) = video_suggestions_inner(&state, req).await;
    (status, Json(body))
}

pub async fn gallery_list_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<GalleryQuery>,
) -> impl IntoResponse {
    let (status, body) = gallery_list_inner(&state, query).await;
    (status, Json(body))
}

pub async fn gallery_get_handler(
    State(state): State<Arc<HttpState>>,
    Path(content_id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = gallery_get_inner(&state, content_id).await;
    (status, Json(body))
}

pub async fn gallery_delete_handler(
    State(state): State<Arc<HttpState>>,
    Path(content_id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = gallery_delete_inner(&state, content_id).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

fn generation_service<'a>(
    state: &'a HttpState,
    context: &str,
) -> std::result::Result<&'a GenerationService, (StatusCode, Value)> {
    state.generation.as_ref().map_err(|e| {
        internal_error(
            context,
            format!(
                "Failed to initialize Gemini service: {}. Please check your GEMINI_API_KEY in .env file.",
                e
            ),
        )
    })
}

/// Run a store operation on the blocking thread pool.
async fn with_store<T, F>(state: &HttpState, op: F) -> std::result::Result<T, StudioError>
where
    F: FnOnce(&ContentStore) -> std::result::Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    Ok(tokio::task::spawn_blocking(move || op(&store)).await??)
}

fn internal_error(context: &str, err: impl Display) -> (StatusCode, Value) {
    let detail = format!("{}: {}", context, err);
    tracing::error!(detail = %detail, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!(ErrorResponse::new(detail)),
    )
}

fn not_found() -> (StatusCode, Value) {
    (StatusCode::NOT_FOUND, json!({ "detail": "Content not found" }))
}

fn metadata(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================

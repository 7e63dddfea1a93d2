//! # HTTP Routes
//!
//! | Method | Path      | Form fields                               |
//! |--------|-----------|-------------------------------------------|
//! | POST   | `/encode` | `image`, `recipient`, `device_id`, `secret` |
//! | POST   | `/decode` | `image`, `device_id`                      |
//! | GET    | `/blocks` |                                           |
//! | GET    | `/`       |                                           |
//! | GET    | `/health` |                                           |
//!
//! POST bodies are `multipart/form-data`. Every response is JSON with a
//! `success` flag; failures carry a `message`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use log::{error, info, warn};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use uuid::Uuid;

use super::response::{ApiError, BlocksResponse, DecodeResponse, EncodeResponse};
use crate::common::config::ServerSection;
use crate::protocol::{self, ProtocolContext};

pub struct AppState {
    pub ctx: ProtocolContext,
}

/// Build the router over an already constructed protocol context.
pub fn build_router(ctx: ProtocolContext, settings: &ServerSection) -> Router {
    let state = Arc::new(AppState { ctx });

    let mut router = Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/encode", post(encode_handler))
        .route("/decode", post(decode_handler))
        .route("/blocks", get(blocks_handler));

    if let Some(dir) = &settings.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(settings.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Uploaded form: the `image` file plus any text fields.
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<Vec<u8>>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::new(e.status(), format!("Failed to read multipart data: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "image" {
            let data = field.bytes().await.map_err(|e| {
                ApiError::new(e.status(), format!("Failed to read image data: {}", e))
            })?;
            form.image = Some(data.to_vec());
        } else if !name.is_empty() {
            let value = field.text().await.map_err(|e| {
                ApiError::new(e.status(), format!("Failed to read field '{}': {}", name, e))
            })?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

async fn home() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "stego-ledger backend is live 🔐"
    }))
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.ctx.ledger().len().await {
        Ok(records) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "service": "stego-ledger",
                "records": records
            })),
        ),
        Err(e) => {
            error!("❌ Health check could not read the ledger: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "degraded",
                    "service": "stego-ledger"
                })),
            )
        }
    }
}

async fn encode_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<EncodeResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let mut form = read_form(multipart).await?;

    let image = form
        .image
        .take()
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::from(protocol::ProtocolError::MissingInput("image")))?;

    info!("📤 [{}] Encode request with {} byte cover", request_id, image.len());

    let issued = protocol::issue(
        &state.ctx,
        image,
        form.text("recipient").trim(),
        form.text("device_id").trim(),
        form.text("secret").trim(),
    )
    .await
    .map_err(|e| {
        error!("❌ [{}] Encode failed: {}", request_id, e);
        ApiError::from(e)
    })?;

    Ok(Json(EncodeResponse {
        success: true,
        image_base64: general_purpose::STANDARD.encode(&issued.image),
    }))
}

async fn decode_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DecodeResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let mut form = read_form(multipart).await?;
    let image = form.image.take().unwrap_or_default();

    info!("📥 [{}] Decode request with {} byte image", request_id, image.len());

    let secret = protocol::decode(&state.ctx, image, form.text("device_id"))
        .await
        .map_err(|e| {
            warn!("[{}] Decode rejected: {}", request_id, e);
            ApiError::from(e)
        })?;

    Ok(Json(DecodeResponse {
        success: true,
        secret,
    }))
}

async fn blocks_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BlocksResponse>, ApiError> {
    let blocks = protocol::list_records(&state.ctx).await.map_err(|e| {
        error!("❌ Listing failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(BlocksResponse {
        success: true,
        blocks,
    }))
}

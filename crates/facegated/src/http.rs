//! HTTP interface.
//!
//! | Method | Path           | Body                         |
//! |--------|----------------|------------------------------|
//! | GET    | `/`            | upload form                  |
//! | GET    | `/status`      | daemon status                |
//! | POST   | `/set_target`  | multipart, image in `file`   |
//! | POST   | `/verify_face` | multipart, image in `file`   |

use crate::error::ApiError;
use crate::service::{FaceService, Registration};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

const UPLOAD_FIELD: &str = "file";
const INDEX_HTML: &str = include_str!("index.html");

const REGISTERED_MESSAGE: &str =
    "Target face set and saved successfully! The robot will now recognize this person.";
const NO_FACE_MESSAGE: &str = "No face detected in the image. Please try a clearer photo.";
const NO_TARGET_MESSAGE: &str = "No target face set yet";

#[derive(Debug, Serialize)]
pub struct SetTargetResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl From<Registration> for SetTargetResponse {
    fn from(outcome: Registration) -> Self {
        match outcome {
            Registration::Registered => Self {
                status: "success",
                message: REGISTERED_MESSAGE,
            },
            Registration::NoFace => Self {
                status: "error",
                message: NO_FACE_MESSAGE,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub target_set: bool,
    pub tolerance: f32,
}

pub fn router(service: FaceService, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/set_target", post(set_target))
        .route("/verify_face", post(verify_face))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn status(State(service): State<FaceService>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        target_set: service.has_target().await,
        tolerance: service.tolerance(),
    })
}

async fn set_target(
    State(service): State<FaceService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SetTargetResponse>, ApiError> {
    let image = read_upload(multipart?).await?;
    tracing::info!(bytes = image.len(), "set_target requested");
    let outcome = service.register(image).await?;
    Ok(Json(outcome.into()))
}

async fn verify_face(
    State(service): State<FaceService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let multipart = multipart?;

    let Some(target) = service.target().await else {
        tracing::info!("verify_face requested with no target set");
        return Ok(Json(VerifyResponse {
            matched: false,
            error: Some(NO_TARGET_MESSAGE),
        }));
    };

    let image = read_upload(multipart).await?;
    tracing::info!(bytes = image.len(), "verify_face requested");
    let matched = service.verify_against(target, image).await?;
    Ok(Json(VerifyResponse {
        matched,
        error: None,
    }))
}

/// Read the bytes of the `file` field, skipping any other fields.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }
    Err(ApiError::BadRequest(format!(
        "missing multipart field `{UPLOAD_FIELD}`"
    )))
}

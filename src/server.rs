//! HTTP surface
//!
//! - `POST /data`: extract a page and overwrite a sheet tab with it
//! - `POST /preview`: extract only, raw links, nothing written
//! - `GET /health`

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::Error;
use crate::fetch::Fetcher;
use crate::pipeline::{Pipeline, Preview, PreviewRequest, PublishRequest};
use crate::sheets::SheetsClient;

pub type SheetPipeline = Pipeline<Fetcher, SheetsClient>;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SheetPipeline>,
}

impl AppState {
    pub fn new(pipeline: SheetPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Pipeline error as an HTTP response: input errors are 400, the rest 500
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_input() {
            tracing::warn!(error = %self.0, "rejected request");
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!(error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/data", post(publish))
        .route("/preview", post(preview))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process stops
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, create_router(state)).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct PublishResponse {
    message: &'static str,
    values: Vec<Vec<String>>,
}

async fn publish(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, ApiError> {
    let published = state.pipeline.publish(request).await?;
    Ok(Json(PublishResponse {
        message: "Data saved",
        values: published.values,
    }))
}

async fn preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<Preview>, ApiError> {
    Ok(Json(state.pipeline.preview(request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_bad_request() {
        let resp = ApiError(Error::MissingInput("Sheet name, link and content are required.".into()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError(Error::InvalidSelector {
            selector: "div[".into(),
            reason: "bad".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_other_errors_are_server_errors() {
        let resp = ApiError(Error::UnknownSheet("Missing".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = ApiError(Error::Render {
            url: "https://x".into(),
            reason: "exit status 1".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! HTTP surface (axum)
//!
//! | Route                     | Auth              |
//! |---------------------------|-------------------|
//! | `POST /login`             | none              |
//! | `POST /upload`            | Bearer Technician |
//! | `GET /scans`              | Bearer Dentist    |
//! | `GET /generate-pdf/{id}`  | Bearer Dentist    |
//! | `GET /images/{f}/{file}`  | none              |
//! | `GET /health`             | none              |

mod error;
mod handlers;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::domain::result::{Error, Result};
use crate::OralVisContext;

pub use error::ApiError;
pub use handlers::{extract_bearer_token, IMAGE_FIELD};

/// Upper bound on a whole request, including image store round trips
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Room for multipart framing and text fields on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<OralVisContext>,
}

/// Build the router with CORS, body-limit and timeout layers
pub fn router(ctx: Arc<OralVisContext>) -> Router {
    let body_limit = ctx.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route("/upload", post(handlers::upload))
        .route("/scans", get(handlers::list_scans))
        .route("/generate-pdf/{id}", get(handlers::generate_pdf))
        .route("/images/{folder}/{file}", get(handlers::serve_image))
        .with_state(AppState { ctx })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(ctx: Arc<OralVisContext>, bind: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| Error::config(format!("cannot bind {}: {}", bind, e)))?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, store = ctx.image_store.name(), "oralvis listening");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

// HTTP-01 challenge responder for stateless domain validation

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

use super::account::Thumbprint;

/// Compute the key authorization for a challenge token.
///
/// Stateless HTTP-01: the response is derived purely from the token and the
/// account thumbprint, so no per-order state is kept.
pub fn key_authorization(token: &str, thumbprint: &Thumbprint) -> String {
    format!("{}.{}", token, thumbprint)
}

/// Router exposing `GET /.well-known/acme-challenge/:token`.
///
/// The embedder merges this into the application router served on the
/// plaintext HTTP port. Registration has already completed by the time this
/// router exists, so the thumbprint is always present.
pub fn router(thumbprint: Thumbprint) -> Router {
    Router::new()
        .route("/.well-known/acme-challenge/:token", get(handle_challenge))
        .with_state(thumbprint)
}

async fn handle_challenge(
    Path(token): Path<String>,
    State(thumbprint): State<Thumbprint>,
) -> impl IntoResponse {
    info!("serving challenge response for token: {}", token);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        key_authorization(&token, &thumbprint),
    )
}

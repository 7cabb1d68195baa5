use axum::http::StatusCode;

/// Health check route.
pub async fn index() -> &'static str {
    "Server is running. Use the `/generate` endpoint to create videos."
}

/// Browsers ask for this on every page load; answer without logging noise.
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

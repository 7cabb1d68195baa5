use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

/// CORS restricted to the single configured frontend origin.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            // No allowed origin means cross-origin calls are refused
            tracing::warn!("Invalid CORS origin {:?}: {}", origin, e);
            layer
        }
    }
}

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use services::pipeline::VideoPipeline;

#[derive(Clone)]
pub struct AppState {
    /// Generation pipeline shared by every request
    pub pipeline: Arc<VideoPipeline>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Model calls can take minutes on CPU
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let pipeline = VideoPipeline::from_config(&config, client);
        Ok(Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        })
    }
}

/// Prompt-to-video API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::generate::generate,
        handlers::files::serve_output,
        handlers::files::download,
    ),
    components(schemas(
        dto::generate::GenerateRequest,
        dto::generate::GenerateResponse,
        dto::generate::ErrorResponse
    )),
    tags(
        (name = "video", description = "Prompt to narrated video generation"),
        (name = "files", description = "Generated artifact access")
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = middleware::cors_layer(&state.config.server.cors_origin);

    let api_routes = Router::new()
        .route("/", get(handlers::health::index))
        .route("/favicon.ico", get(handlers::health::favicon))
        .route("/generate", post(handlers::generate::generate));

    // Generated artifacts; `/static` is kept as an alias of `/output`
    let file_routes = Router::new()
        .route("/output/*file", get(handlers::files::serve_output))
        .route("/static/*file", get(handlers::files::serve_output))
        .route("/download/*file", get(handlers::files::download));

    let api_docs_routes = Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    Router::new()
        .merge(api_routes)
        .merge(file_routes)
        .merge(api_docs_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

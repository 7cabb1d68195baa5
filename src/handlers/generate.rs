use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use tracing::{info, warn};

use crate::{
    dto::generate::{ErrorResponse, GenerateRequest, GenerateResponse},
    error::PipelineError,
    models::prompt::Prompt,
    AppState,
};

#[utoipa::path(
    post,
    path = "/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Video generated", body = GenerateResponse),
        (status = 400, description = "Prompt missing or empty", body = ErrorResponse),
        (status = 500, description = "Generation or muxing failed", body = ErrorResponse)
    ),
    tag = "video"
)]
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, PipelineError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected /generate body: {}", rejection.body_text());
            GenerateRequest::default()
        }
    };

    // Nothing touches the disk until the prompt is valid
    let prompt = Prompt::parse(request.prompt.as_deref())?;
    info!("Generate request received ({} chars)", prompt.as_str().len());

    let video = state.pipeline.generate(&prompt).await?;
    let base_url = state.config.server.public_base_url();

    Ok(Json(GenerateResponse::new(&base_url, &video.file_name)))
}

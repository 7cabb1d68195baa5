//! Still-image generation.
//!
//! Every backend offers the same capability: write one image for a prompt to a
//! given path. The backend is picked once from configuration and shared by all
//! requests; the remote ones serialize inference calls behind their own lock.

pub mod diffusion;
pub mod gan;
pub mod text;

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use reqwest::Client;
use tracing::info;

use crate::config::{AppConfig, ImageBackendKind};
use crate::error::PipelineError;
use crate::utils::is_nonempty_file;

pub use diffusion::DiffusionGenerator;
pub use gan::GanGenerator;
pub use text::TextRenderer;

pub enum ImageBackend {
    Text(TextRenderer),
    Gan(GanGenerator),
    Diffusion(DiffusionGenerator),
}

impl ImageBackend {
    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        match config.pipeline.image_backend {
            ImageBackendKind::Text => Self::Text(TextRenderer::new(config.text_image.clone())),
            ImageBackendKind::Gan => Self::Gan(GanGenerator::new(client, config.gan.clone())),
            ImageBackendKind::Diffusion => {
                Self::Diffusion(DiffusionGenerator::new(client, config.diffusion.clone()))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageBackend::Text(_) => "text",
            ImageBackend::Gan(_) => "gan",
            ImageBackend::Diffusion(_) => "diffusion",
        }
    }

    pub async fn generate(&self, prompt: &str, output: &Path) -> Result<(), PipelineError> {
        info!("Generating image with {} backend -> {}", self.name(), output.display());
        match self {
            ImageBackend::Text(renderer) => renderer.generate(prompt, output).await?,
            ImageBackend::Gan(gan) => gan.generate(prompt, output).await?,
            ImageBackend::Diffusion(pipeline) => pipeline.generate(prompt, output).await?,
        }

        if !is_nonempty_file(output).await {
            return Err(PipelineError::generation(format!(
                "image backend {} wrote nothing to {}",
                self.name(),
                output.display()
            )));
        }
        Ok(())
    }
}

/// Encode as PNG off the async runtime.
pub(crate) async fn save_png(image: RgbImage, path: &Path) -> Result<(), PipelineError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || image.save_with_format(&path, ImageFormat::Png))
        .await
        .map_err(|e| PipelineError::generation(format!("image encoder task failed: {e}")))?
        .map_err(|e| PipelineError::generation(format!("saving image failed: {e}")))
}

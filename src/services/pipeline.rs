use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::models::artifact::ArtifactSet;
use crate::models::prompt::{Expansion, Prompt};
use crate::services::captions::write_captions;
use crate::services::expander::PromptExpander;
use crate::services::image::ImageBackend;
use crate::services::muxer::{MuxJob, VideoMuxer};
use crate::services::narrator::Narrator;
use crate::utils::is_nonempty_file;

/// What one successful run produced.
#[derive(Debug, Clone)]
pub struct GeneratedVideo {
    pub video_path: PathBuf,
    pub file_name: String,
    pub expansion: Expansion,
    pub image_backend: &'static str,
    pub artifacts: ArtifactSet,
}

/// validate → (expand) → image → narration → (captions) → mux.
pub struct VideoPipeline {
    output_dir: PathBuf,
    clip_seconds: u32,
    expander: Option<PromptExpander>,
    image: ImageBackend,
    narrator: Narrator,
    captions: bool,
    muxer: VideoMuxer,
}

impl VideoPipeline {
    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let expander = config
            .pipeline
            .expand_prompt
            .then(|| PromptExpander::new(client.clone(), config.expander.clone()));

        Self {
            output_dir: config.output.dir.clone(),
            clip_seconds: config.pipeline.clip_seconds,
            expander,
            image: ImageBackend::from_config(config, client.clone()),
            narrator: Narrator::new(client, config.narrator.clone()),
            captions: config.pipeline.captions,
            muxer: VideoMuxer::new(config.ffmpeg.clone()),
        }
    }

    #[instrument(skip_all, fields(prompt = %prompt))]
    pub async fn generate(&self, prompt: &Prompt) -> Result<GeneratedVideo, PipelineError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let artifacts = ArtifactSet::allocate(&self.output_dir);
        info!("Starting generation {}", artifacts.stamp);

        let expansion = match &self.expander {
            Some(expander) => expander.expand(prompt).await,
            None => Expansion::Original(prompt.as_str().to_string()),
        };

        self.image.generate(prompt.as_str(), &artifacts.image).await?;
        self.narrator.narrate(expansion.text(), &artifacts.audio).await?;

        let subtitles = if self.captions {
            let clip = Duration::from_secs(u64::from(self.clip_seconds));
            write_captions(prompt.as_str(), clip, &artifacts.captions).await?;
            Some(artifacts.captions.clone())
        } else {
            None
        };

        let job = MuxJob {
            image: artifacts.image.clone(),
            audio: artifacts.audio.clone(),
            subtitles,
            output: artifacts.video.clone(),
            clip_seconds: self.clip_seconds,
        };
        self.muxer.run(&job).await?;

        if !is_nonempty_file(&artifacts.video).await {
            return Err(PipelineError::generation("Video generation failed"));
        }

        info!("Video ready: {}", artifacts.video.display());
        Ok(GeneratedVideo {
            video_path: artifacts.video.clone(),
            file_name: artifacts.video_file_name(),
            expansion,
            image_backend: self.image.name(),
            artifacts,
        })
    }
}

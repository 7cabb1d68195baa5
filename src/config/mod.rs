use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Application configuration structure
///
/// Features:
/// - AppConfig
/// - ServerConfig / OutputConfig
/// - PipelineConfig and one section per generation stage

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
    pub text_image: TextImageConfig,
    pub gan: GanConfig,
    pub diffusion: DiffusionConfig,
    pub expander: ExpanderConfig,
    pub narrator: NarratorConfig,
    pub ffmpeg: FfmpegConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base used for the URLs handed back to clients. Derived from host/port when unset.
    pub public_base_url: Option<String>,
    pub cors_origin: String,
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.host, self.port),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackendKind {
    Text,
    Gan,
    Diffusion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub image_backend: ImageBackendKind,
    pub expand_prompt: bool,
    pub captions: bool,
    pub clip_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextImageConfig {
    pub width: u32,
    pub height: u32,
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GanConfig {
    pub endpoint: String,
    pub truncation: f32,
    pub noise_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffusionConfig {
    pub endpoint: String,
    pub model: String,
    pub steps: u32,
    pub guidance_scale: f32,
    pub safety_checker: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpanderConfig {
    pub endpoint: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarratorProvider {
    Google,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarratorConfig {
    pub provider: NarratorProvider,
    pub base_url: String,
    pub lang: String,
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegConfig {
    pub binary: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
    pub shortest: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "ai-shorts".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                public_base_url: None,
                cors_origin: "http://localhost:5173".to_string(),
            },
            output: OutputConfig {
                dir: PathBuf::from("output"),
            },
            pipeline: PipelineConfig {
                image_backend: ImageBackendKind::Text,
                expand_prompt: false,
                captions: false,
                clip_seconds: 10,
            },
            text_image: TextImageConfig {
                width: 512,
                height: 512,
                font_path: None,
                font_size: 40.0,
                max_chars: 20,
            },
            gan: GanConfig {
                endpoint: "http://127.0.0.1:8001/biggan".to_string(),
                truncation: 0.4,
                noise_dim: 128,
            },
            diffusion: DiffusionConfig {
                endpoint: "http://127.0.0.1:8002/txt2img".to_string(),
                model: "runwayml/stable-diffusion-v1-5".to_string(),
                steps: 30,
                guidance_scale: 7.5,
                safety_checker: false,
            },
            expander: ExpanderConfig {
                endpoint: "http://127.0.0.1:8003/generate".to_string(),
                max_new_tokens: 60,
                temperature: 0.7,
                top_k: 50,
                top_p: 0.95,
            },
            narrator: NarratorConfig {
                provider: NarratorProvider::Google,
                base_url: "https://translate.google.com/translate_tts".to_string(),
                lang: "en".to_string(),
                command: "piper".to_string(),
                args: vec!["--output_file".to_string(), "{output}".to_string()],
            },
            ffmpeg: FfmpegConfig {
                binary: "ffmpeg".to_string(),
                video_codec: "libx264".to_string(),
                audio_codec: "aac".to_string(),
                pixel_format: "yuv420p".to_string(),
                shortest: true,
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        info!("Loading application configuration...");

        let mut figment = Figment::new()
            // Start with default values
            .merge(Serialized::defaults(Self::default()))
            // Override with config file if present
            .merge(Yaml::file("config.yaml"))
            // Override with environment variables, e.g. APP_PIPELINE__IMAGE_BACKEND=gan
            .merge(Env::prefixed("APP_").split("__"));

        // Bare PORT wins over everything else
        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port.trim().parse()?;
            figment = figment.merge(Serialized::default("server.port", port));
        }

        let config: AppConfig = figment.extract()?;

        info!("Configuration loaded successfully");
        info!("name: {:?}, version: {}", config.app.name, config.app.version);
        info!("Output directory: {}", config.output.dir.display());
        info!("Image backend: {:?}", config.pipeline.image_backend);
        info!(
            "Prompt expansion: {}, captions: {}",
            config.pipeline.expand_prompt, config.pipeline.captions
        );

        Ok(config)
    }
}

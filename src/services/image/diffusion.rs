use std::path::Path;

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::save_png;
use crate::config::DiffusionConfig;
use crate::error::PipelineError;

#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    num_inference_steps: u32,
    guidance_scale: f32,
    /// `false` swaps the content filter for a pass-through check.
    safety_checker: bool,
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    images: Vec<String>,
}

/// Text-to-image diffusion pipeline served by an inference endpoint.
pub struct DiffusionGenerator {
    client: Client,
    config: DiffusionConfig,
    inference_lock: Mutex<()>,
}

impl DiffusionGenerator {
    pub fn new(client: Client, config: DiffusionConfig) -> Self {
        if !config.safety_checker {
            warn!("Diffusion safety checker is disabled");
        }
        Self {
            client,
            config,
            inference_lock: Mutex::new(()),
        }
    }

    pub async fn generate(&self, prompt: &str, output: &Path) -> Result<(), PipelineError> {
        let request = Txt2ImgRequest {
            model: &self.config.model,
            prompt,
            num_inference_steps: self.config.steps,
            guidance_scale: self.config.guidance_scale,
            safety_checker: self.config.safety_checker,
        };

        let body: Txt2ImgResponse = {
            let _guard = self.inference_lock.lock().await;
            info!("Sampling {} ({} steps)", self.config.model, self.config.steps);
            let response = self
                .client
                .post(&self.config.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    error!("Diffusion request failed: {}", e);
                    PipelineError::generation(format!("diffusion service unreachable: {e}"))
                })?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
                error!("Diffusion service returned {}: {}", status, text);
                return Err(PipelineError::generation(format!("diffusion service returned {status}")));
            }
            response
                .json()
                .await
                .map_err(|e| PipelineError::generation(format!("invalid diffusion response: {e}")))?
        };

        let first = body
            .images
            .first()
            .ok_or_else(|| PipelineError::generation("diffusion service returned no images"))?;
        let image = decode_image(first)?;
        save_png(image.to_rgb8(), output).await
    }
}

/// Decode one base64 image, tolerating a `data:` URL prefix.
fn decode_image(encoded: &str) -> Result<image::DynamicImage, PipelineError> {
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| PipelineError::generation(format!("image is not valid base64: {e}")))?;
    image::load_from_memory(&bytes)
        .map_err(|e| PipelineError::generation(format!("image could not be decoded: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn encoded_png(width: u32, height: u32) -> String {
        let mut bytes = Vec::new();
        RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        let plain = encoded_png(3, 2);
        assert_eq!(decode_image(&plain).unwrap().width(), 3);

        let data_url = format!("data:image/png;base64,{plain}");
        assert_eq!(decode_image(&data_url).unwrap().height(), 2);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_image("not an image").is_err());
        let not_png = base64::engine::general_purpose::STANDARD.encode(b"hello");
        assert!(decode_image(&not_png).is_err());
    }

    #[test]
    fn request_carries_safety_flag() {
        let request = Txt2ImgRequest {
            model: "runwayml/stable-diffusion-v1-5",
            prompt: "a cat",
            num_inference_steps: 30,
            guidance_scale: 7.5,
            safety_checker: false,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["safety_checker"], false);
        assert_eq!(body["prompt"], "a cat");
    }
}

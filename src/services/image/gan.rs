use std::path::Path;

use image::{Rgb, RgbImage};
use rand::Rng;
use rand_distr::StandardNormal;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::save_png;
use crate::config::GanConfig;
use crate::error::PipelineError;

/// Golden retriever, used when no prompt word is in the vocabulary.
pub const DEFAULT_CLASS: u16 = 207;

/// Single-word keywords to ImageNet class ids understood by the class-conditional GAN.
const CLASS_VOCABULARY: &[(&str, u16)] = &[
    ("goldfish", 1),
    ("fish", 1),
    ("shark", 2),
    ("frog", 31),
    ("turtle", 37),
    ("dog", 207),
    ("wolf", 269),
    ("fox", 277),
    ("cat", 281),
    ("lion", 291),
    ("tiger", 292),
    ("bear", 294),
    ("butterfly", 323),
    ("zebra", 340),
    ("elephant", 386),
    ("panda", 388),
    ("airplane", 404),
    ("balloon", 417),
    ("train", 466),
    ("castle", 483),
    ("ship", 510),
    ("bus", 779),
    ("car", 817),
    ("pizza", 963),
    ("mountain", 970),
    ("beach", 978),
    ("volcano", 980),
    ("flower", 985),
];

/// Class id for the first prompt word, in prompt order, that exactly matches
/// the vocabulary.
pub fn select_class(prompt: &str) -> u16 {
    prompt
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .find_map(|word| {
            CLASS_VOCABULARY
                .iter()
                .find(|(keyword, _)| *keyword == word)
                .map(|(_, class)| *class)
        })
        .unwrap_or(DEFAULT_CLASS)
}

/// Standard-normal samples rejected outside [-2, 2], then scaled by `truncation`.
pub fn truncated_noise<R: Rng>(rng: &mut R, dim: usize, truncation: f32) -> Vec<f32> {
    (0..dim)
        .map(|_| loop {
            let x: f32 = rng.sample(StandardNormal);
            if x.abs() <= 2.0 {
                break x * truncation;
            }
        })
        .collect()
}

/// Convert a `[3, H, W]` (optionally `[1, 3, H, W]`) tensor in [-1, 1] to RGB.
pub fn tensor_to_image(shape: &[usize], data: &[f32]) -> Result<RgbImage, PipelineError> {
    let dims = match shape {
        [1, c, h, w] | [c, h, w] => (*c, *h, *w),
        _ => {
            return Err(PipelineError::generation(format!(
                "unexpected GAN output shape {shape:?}"
            )))
        }
    };
    let (channels, height, width) = dims;
    if channels != 3 || height == 0 || width == 0 {
        return Err(PipelineError::generation(format!("unexpected GAN output shape {shape:?}")));
    }
    let (Ok(image_width), Ok(image_height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(PipelineError::generation(format!("GAN output shape {shape:?} is too large")));
    };
    let Some((plane, expected)) = height
        .checked_mul(width)
        .and_then(|plane| plane.checked_mul(channels).map(|expected| (plane, expected)))
    else {
        return Err(PipelineError::generation(format!("GAN output shape {shape:?} is too large")));
    };
    if data.len() != expected {
        return Err(PipelineError::generation(format!(
            "GAN output has {} values, shape {shape:?} needs {expected}",
            data.len(),
        )));
    }

    let to_byte = |v: f32| (((v + 1.0) / 2.0).clamp(0.0, 1.0) * 255.0).round() as u8;
    let image = RgbImage::from_fn(image_width, image_height, |x, y| {
        let offset = y as usize * width + x as usize;
        Rgb([
            to_byte(data[offset]),
            to_byte(data[plane + offset]),
            to_byte(data[2 * plane + offset]),
        ])
    });
    Ok(image)
}

#[derive(Debug, Serialize)]
struct GanRequest<'a> {
    class_id: u16,
    noise: &'a [f32],
    truncation: f32,
}

#[derive(Debug, Deserialize)]
struct GanTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

/// Class-conditional GAN served by an inference endpoint.
pub struct GanGenerator {
    client: Client,
    config: GanConfig,
    inference_lock: Mutex<()>,
}

impl GanGenerator {
    pub fn new(client: Client, config: GanConfig) -> Self {
        Self {
            client,
            config,
            inference_lock: Mutex::new(()),
        }
    }

    pub async fn generate(&self, prompt: &str, output: &Path) -> Result<(), PipelineError> {
        let class_id = select_class(prompt);
        let noise = truncated_noise(&mut rand::thread_rng(), self.config.noise_dim, self.config.truncation);
        info!("GAN class {} for prompt {:?}", class_id, prompt);

        let request = GanRequest {
            class_id,
            noise: &noise,
            truncation: self.config.truncation,
        };

        let tensor: GanTensor = {
            let _guard = self.inference_lock.lock().await;
            let response = self
                .client
                .post(&self.config.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    error!("GAN request failed: {}", e);
                    PipelineError::generation(format!("GAN service unreachable: {e}"))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
                error!("GAN service returned {}: {}", status, body);
                return Err(PipelineError::generation(format!("GAN service returned {status}")));
            }
            response
                .json()
                .await
                .map_err(|e| PipelineError::generation(format!("invalid GAN response: {e}")))?
        };

        debug!("GAN tensor shape {:?}", tensor.shape);
        let image = tensor_to_image(&tensor.shape, &tensor.data)?;
        save_png(image, output).await
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdue::layout::{
    CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign,
};
use fontdue::{Font, FontSettings};
use image::RgbImage;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::save_png;
use crate::config::TextImageConfig;
use crate::error::PipelineError;

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Offline fallback: prompt text drawn white-on-black, no model involved.
pub struct TextRenderer {
    config: TextImageConfig,
    font: OnceCell<Arc<Font>>,
}

impl TextRenderer {
    pub fn new(config: TextImageConfig) -> Self {
        Self {
            config,
            font: OnceCell::new(),
        }
    }

    pub async fn generate(&self, prompt: &str, output: &Path) -> Result<(), PipelineError> {
        let font = self
            .font
            .get_or_try_init(|| load_font(self.config.font_path.clone()))
            .await?
            .clone();

        let text = headline(prompt, self.config.max_chars);
        let (width, height, size) = (self.config.width, self.config.height, self.config.font_size);
        let canvas = tokio::task::spawn_blocking(move || draw_centered(&font, &text, width, height, size))
            .await
            .map_err(|e| PipelineError::generation(format!("text render task failed: {e}")))?;

        save_png(canvas, output).await
    }
}

/// The leading `max_chars` characters of the prompt.
pub fn headline(prompt: &str, max_chars: usize) -> String {
    prompt.trim().chars().take(max_chars).collect()
}

async fn load_font(configured: Option<PathBuf>) -> Result<Arc<Font>, PipelineError> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    };

    for path in &candidates {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| {
            PipelineError::generation(format!("failed to parse font {}: {e}", path.display()))
        })?;
        info!("Loaded font {}", path.display());
        return Ok(Arc::new(font));
    }

    Err(PipelineError::generation(format!(
        "no usable font found (tried {})",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

pub fn draw_centered(font: &Font, text: &str, width: u32, height: u32, size: f32) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);

    let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x: 0.0,
        y: 0.0,
        max_width: Some(width as f32),
        max_height: Some(height as f32),
        horizontal_align: HorizontalAlign::Center,
        vertical_align: VerticalAlign::Middle,
        ..LayoutSettings::default()
    });
    layout.append(&[font], &TextStyle::new(text, size, 0));

    for glyph in layout.glyphs() {
        if glyph.width == 0 || glyph.height == 0 {
            continue;
        }
        let (_, bitmap) = font.rasterize_config(glyph.key);
        blend_glyph(
            &mut canvas,
            glyph.x.round() as i32,
            glyph.y.round() as i32,
            glyph.width,
            glyph.height,
            &bitmap,
        );
    }
    debug!("Rendered {:?} on {}x{} canvas", text, width, height);
    canvas
}

/// Lighten the canvas with a white glyph coverage mask, clipping at the edges.
fn blend_glyph(canvas: &mut RgbImage, x: i32, y: i32, w: usize, h: usize, coverage: &[u8]) {
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    for row in 0..h {
        for col in 0..w {
            let px = x + col as i32;
            let py = y + row as i32;
            if px < 0 || py < 0 || px >= cw || py >= ch {
                continue;
            }
            let alpha = coverage[row * w + col];
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            for channel in pixel.0.iter_mut() {
                *channel = (*channel).max(alpha);
            }
        }
    }
}

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Paths for every file one generation request writes into the output directory.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub stamp: String,
    pub image: PathBuf,
    pub audio: PathBuf,
    pub captions: PathBuf,
    pub video: PathBuf,
}

impl ArtifactSet {
    pub fn allocate(output_dir: &Path) -> Self {
        Self::with_stamp(output_dir, request_stamp(Utc::now()))
    }

    pub fn with_stamp(output_dir: &Path, stamp: String) -> Self {
        Self {
            image: output_dir.join(format!("generated_image_{stamp}.png")),
            audio: output_dir.join(format!("narration_{stamp}.mp3")),
            captions: output_dir.join(format!("captions_{stamp}.srt")),
            video: output_dir.join(format!("generated_video_{stamp}.mp4")),
            stamp,
        }
    }

    pub fn video_file_name(&self) -> String {
        file_name(&self.video)
    }
}

/// `YYYYmmdd_HHMMSS_xxxxxxxx`: second-resolution time plus a random suffix so
/// two requests in the same second never share files.
pub fn request_stamp(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8])
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::FfmpegConfig;
use crate::error::PipelineError;
use crate::utils::{display_command, is_nonempty_file};

const STDERR_TAIL_LINES: usize = 20;

/// One still-image + narration (+ captions) encode.
#[derive(Debug, Clone)]
pub struct MuxJob {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub subtitles: Option<PathBuf>,
    pub output: PathBuf,
    pub clip_seconds: u32,
}

#[derive(Debug, Clone)]
pub struct VideoMuxer {
    config: FfmpegConfig,
}

impl VideoMuxer {
    pub fn new(config: FfmpegConfig) -> Self {
        Self { config }
    }

    /// Fixed ffmpeg template: loop the still, attach narration, optionally burn
    /// in captions, cap the clip length.
    pub fn build_args(&self, job: &MuxJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-loop".into(), "1".into(), "-i".into()];
        args.push(job.image.clone().into_os_string());
        args.push("-i".into());
        args.push(job.audio.clone().into_os_string());

        if let Some(subtitles) = &job.subtitles {
            args.push("-vf".into());
            args.push(format!("subtitles={}", escape_filter_path(&subtitles.to_string_lossy())).into());
        }

        for arg in [
            "-c:v",
            self.config.video_codec.as_str(),
            "-tune",
            "stillimage",
            "-c:a",
            self.config.audio_codec.as_str(),
            "-pix_fmt",
            self.config.pixel_format.as_str(),
            "-t",
        ] {
            args.push(arg.into());
        }
        args.push(job.clip_seconds.to_string().into());

        if self.config.shortest {
            args.push("-shortest".into());
        }
        args.push(job.output.clone().into_os_string());
        args
    }

    pub async fn run(&self, job: &MuxJob) -> Result<(), PipelineError> {
        let args = self.build_args(job);
        let command = display_command(&self.config.binary, &args);
        info!("Muxing video: {}", job.output.display());
        debug!("Running {}", command);

        let output = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                error!("Failed to start encoder: {}", e);
                PipelineError::Mux {
                    command: command.clone(),
                    status: "not started".to_string(),
                    stderr: e.to_string(),
                }
            })?;

        if !output.status.success() {
            let stderr = stderr_tail(&String::from_utf8_lossy(&output.stderr));
            error!("Encoder exited with {}: {}", output.status, stderr);
            return Err(PipelineError::Mux {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        if !is_nonempty_file(&job.output).await {
            return Err(PipelineError::generation(format!(
                "encoder reported success but {} is missing or empty",
                job.output.display()
            )));
        }

        Ok(())
    }
}

/// Escape a path for use as a filtergraph option value.
fn escape_filter_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        if matches!(ch, '\\' | ':' | '\'' | ',' | ';' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

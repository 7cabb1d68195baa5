use std::path::Path;
use std::time::Duration;

use crate::error::PipelineError;

/// Single-cue SRT track holding the whole prompt for the full clip.
pub fn render_srt(text: &str, clip: Duration) -> String {
    format!(
        "1\n{} --> {}\n{}\n\n",
        format_srt_time(Duration::ZERO),
        format_srt_time(clip),
        cue_text(text)
    )
}

/// A blank line terminates an SRT cue, so the text keeps only non-empty lines.
fn cue_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn write_captions(text: &str, clip: Duration, path: &Path) -> Result<(), PipelineError> {
    tokio::fs::write(path, render_srt(text, clip)).await?;
    tracing::debug!("Captions written to {}", path.display());
    Ok(())
}

fn format_srt_time(at: Duration) -> String {
    let total_ms = at.as_millis();
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

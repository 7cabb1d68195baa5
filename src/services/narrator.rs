use std::path::Path;
use std::process::Stdio;

use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::{NarratorConfig, NarratorProvider};
use crate::error::PipelineError;
use crate::utils::{display_command, is_nonempty_file};

/// Longest text the translate endpoint accepts in one request.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Text-to-speech stage. Writes an encoded speech file for the given text.
#[derive(Clone)]
pub struct Narrator {
    client: Client,
    config: NarratorConfig,
}

impl Narrator {
    pub fn new(client: Client, config: NarratorConfig) -> Self {
        Self { client, config }
    }

    pub async fn narrate(&self, text: &str, output: &Path) -> Result<(), PipelineError> {
        info!("Synthesizing narration ({} chars) -> {}", text.len(), output.display());
        match self.config.provider {
            NarratorProvider::Google => self.narrate_google(text, output).await?,
            NarratorProvider::Command => self.narrate_command(text, output).await?,
        }

        if !is_nonempty_file(output).await {
            return Err(PipelineError::generation("speech synthesis produced no audio"));
        }
        Ok(())
    }

    async fn narrate_google(&self, text: &str, output: &Path) -> Result<(), PipelineError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(PipelineError::generation("no speakable text"));
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let response = self
                .client
                .get(&self.config.base_url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.config.lang.as_str()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await
                .map_err(|e| {
                    error!("Speech request failed: {}", e);
                    PipelineError::generation(format!("speech service unreachable: {e}"))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
                error!("Speech service returned {}: {}", status, body);
                return Err(PipelineError::generation(format!("speech service returned {status}")));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| PipelineError::generation(format!("reading speech audio failed: {e}")))?;
            if bytes.is_empty() {
                return Err(PipelineError::generation(format!("speech service returned no audio for chunk {idx}")));
            }
            debug!("Chunk {}/{}: {} bytes", idx, total, bytes.len());
            audio.extend_from_slice(&bytes);
        }

        // MP3 frames concatenate cleanly
        tokio::fs::write(output, audio).await?;
        Ok(())
    }

    async fn narrate_command(&self, text: &str, output: &Path) -> Result<(), PipelineError> {
        let output_arg = output.to_string_lossy();
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|a| a.replace("{output}", &output_arg))
            .collect();
        let command = display_command(&self.config.command, &args);
        debug!("Running {}", command);

        let mut child = Command::new(&self.config.command)
            .args(&args)
            .kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::generation(format!("failed to start `{command}`: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            error!("TTS command failed for {}: {}", output.display(), stderr.trim());
            return Err(PipelineError::generation(format!(
                "`{command}` exited with {}",
                result.status
            )));
        }
        Ok(())
    }
}

/// Split text into pieces of at most `max_chars` characters, breaking between
/// words. A break right after `.`, `!`, `?` or `,` is preferred when one fits.
/// Words longer than the limit are cut.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(current.join(" "));
                current.clear();
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            chunks.push(head);
        }
        if word.is_empty() {
            continue;
        }

        let word_len = word.chars().count();
        if !fits(&current, word_len, max_chars) {
            // Close the chunk at the last clause end, carrying the tail over
            let clause_end = current
                .iter()
                .rposition(|w| w.ends_with(|c: char| matches!(c, '.' | '!' | '?' | ',')))
                .filter(|&i| i + 1 < current.len());
            let carried = match clause_end {
                Some(i) => current.split_off(i + 1),
                None => Vec::new(),
            };
            chunks.push(current.join(" "));
            current = carried;

            if !fits(&current, word_len, max_chars) {
                chunks.push(current.join(" "));
                current.clear();
            }
        }
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

fn fits(words: &[String], word_len: usize, max_chars: usize) -> bool {
    if words.is_empty() {
        return word_len <= max_chars;
    }
    let joined: usize = words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len() - 1;
    joined + 1 + word_len <= max_chars
}

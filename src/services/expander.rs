use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ExpanderConfig;
use crate::models::prompt::{Expansion, Prompt};

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    do_sample: bool,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Best-effort prompt elaboration through a sequence-to-sequence model.
pub struct PromptExpander {
    client: Client,
    config: ExpanderConfig,
    // One generation at a time against the shared model
    inference_lock: Mutex<()>,
}

impl PromptExpander {
    pub fn new(client: Client, config: ExpanderConfig) -> Self {
        Self {
            client,
            config,
            inference_lock: Mutex::new(()),
        }
    }

    /// Never fails: any problem falls back to the original prompt.
    pub async fn expand(&self, prompt: &Prompt) -> Expansion {
        match self.try_expand(prompt.as_str()).await {
            Ok(text) => {
                info!("Prompt expanded to {} chars", text.len());
                Expansion::Expanded(text)
            }
            Err(e) => {
                warn!("Prompt expansion failed, using original prompt: {}", e);
                Expansion::Original(prompt.as_str().to_string())
            }
        }
    }

    async fn try_expand(&self, prompt: &str) -> anyhow::Result<String> {
        let request = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_new_tokens: self.config.max_new_tokens,
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                do_sample: true,
                return_full_text: false,
            },
        };

        let _guard = self.inference_lock.lock().await;
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("expander returned {}", response.status());
        }

        let generated: Vec<GeneratedText> = response.json().await?;
        let text = generated
            .into_iter()
            .next()
            .map(|g| g.generated_text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            anyhow::bail!("expander returned no text");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn request_uses_configured_sampling_parameters() {
        let config = AppConfig::default().expander;
        let request = GenerationRequest {
            inputs: "a cat",
            parameters: GenerationParameters {
                max_new_tokens: config.max_new_tokens,
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                do_sample: true,
                return_full_text: false,
            },
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["inputs"], "a cat");
        assert_eq!(body["parameters"]["top_k"], 50);
        assert_eq!(body["parameters"]["max_new_tokens"], 60);
        assert_eq!(body["parameters"]["do_sample"], true);
    }

    #[tokio::test]
    async fn unreachable_model_falls_back_to_original() {
        let mut config = AppConfig::default().expander;
        // Port 9 (discard) is not serving HTTP
        config.endpoint = "http://127.0.0.1:9/generate".to_string();
        let expander = PromptExpander::new(Client::new(), config);
        let prompt = Prompt::parse(Some("a cat")).unwrap();

        let outcome = expander.expand(&prompt).await;
        assert_eq!(outcome, Expansion::Original("a cat".to_string()));
    }
}

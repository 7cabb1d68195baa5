use std::fmt;

use crate::error::PipelineError;

/// Caller-supplied description of the video, trimmed and known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn parse(raw: Option<&str>) -> Result<Self, PipelineError> {
        let raw = raw.ok_or_else(|| PipelineError::Validation("Prompt is required".to_string()))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::Validation("Prompt cannot be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of the best-effort expansion stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// The language model produced a longer description.
    Expanded(String),
    /// Expansion was skipped or failed; the prompt is used as given.
    Original(String),
}

impl Expansion {
    pub fn text(&self) -> &str {
        match self {
            Expansion::Expanded(text) | Expansion::Original(text) => text,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, Expansion::Expanded(_))
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub prompt: Option<String>,
}

/// Carries both URL shapes clients have relied on: `video_url`, and the
/// `videoUrl` / `downloadUrl` pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub video_url: String,
    #[serde(rename = "videoUrl")]
    pub view_url: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

impl GenerateResponse {
    pub fn new(base_url: &str, file_name: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let view_url = format!("{base_url}/output/{file_name}");
        Self {
            video_url: view_url.clone(),
            view_url,
            download_url: format!("{base_url}/download/{file_name}"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_serializes_both_url_shapes() {
        let response = GenerateResponse::new("http://127.0.0.1:5000/", "generated_video_x.mp4");
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["video_url"], "http://127.0.0.1:5000/output/generated_video_x.mp4");
        assert_eq!(body["videoUrl"], body["video_url"]);
        assert_eq!(body["downloadUrl"], "http://127.0.0.1:5000/download/generated_video_x.mp4");
    }
}

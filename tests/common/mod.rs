#![allow(dead_code)]

use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ai_shorts::{
    config::{AppConfig, ImageBackendKind, NarratorProvider},
    AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Everything a mocked model service saw.
#[derive(Clone, Default)]
pub struct Recorder {
    pub gan_classes: Arc<Mutex<Vec<u16>>>,
    pub tts_queries: Arc<Mutex<Vec<String>>>,
    pub expander_inputs: Arc<Mutex<Vec<String>>>,
    pub diffusion_prompts: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct MockState {
    recorder: Recorder,
    expander_text: Option<String>,
}

/// Local stand-ins for the GAN, diffusion, expander and speech endpoints.
pub struct MockModels {
    pub base_url: String,
    pub recorder: Recorder,
}

impl MockModels {
    pub async fn start(expander_text: Option<&str>) -> Self {
        let recorder = Recorder::default();
        let state = MockState {
            recorder: recorder.clone(),
            expander_text: expander_text.map(str::to_string),
        };

        let app = Router::new()
            .route("/biggan", post(mock_gan))
            .route("/txt2img", post(mock_diffusion))
            .route("/generate", post(mock_expander))
            .route("/translate_tts", get(mock_tts))
            .route("/broken/txt2img", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route("/empty/txt2img", post(|| async { Json(json!({ "images": [] })) }))
            .route("/broken/translate_tts", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/empty/translate_tts", get(|| async { Vec::<u8>::new() }))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            recorder,
        }
    }
}

async fn mock_gan(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    let class_id = body["class_id"].as_u64().unwrap() as u16;
    state.recorder.gan_classes.lock().unwrap().push(class_id);
    Json(json!({ "shape": [3, 8, 8], "data": vec![0.25f32; 3 * 8 * 8] }))
}

async fn mock_diffusion(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    use base64::Engine;
    use std::io::Cursor;

    state.recorder.diffusion_prompts.lock().unwrap().push(body);
    let mut png = Vec::new();
    image::RgbImage::new(16, 16)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    Json(json!({ "images": [encoded] }))
}

async fn mock_expander(State(state): State<MockState>, Json(body): Json<Value>) -> impl IntoResponse {
    state
        .recorder
        .expander_inputs
        .lock()
        .unwrap()
        .push(body["inputs"].as_str().unwrap_or_default().to_string());
    match state.expander_text {
        Some(text) => (StatusCode::OK, Json(json!([{ "generated_text": text }]))),
        None => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "model loading" }))),
    }
}

async fn mock_tts(State(state): State<MockState>, Query(params): Query<HashMap<String, String>>) -> Vec<u8> {
    let q = params.get("q").cloned().unwrap_or_default();
    state.recorder.tts_queries.lock().unwrap().push(q.clone());
    format!("ID3[{q}]").into_bytes()
}

/// Stand-in encoder: writes a few bytes to its last argument and logs its
/// arguments next to itself.
pub fn fake_encoder(dir: &Path) -> PathBuf {
    let log = dir.join("encoder_args.txt");
    let script = format!(
        "#!/bin/sh\necho \"$@\" > '{}'\nfor last; do :; done\nprintf 'fake mp4 data' > \"$last\"\n",
        log.display()
    );
    write_script(dir, "fake-ffmpeg", &script)
}

/// Stand-in encoder that always fails.
pub fn failing_encoder(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "broken-ffmpeg",
        "#!/bin/sh\necho 'Unknown encoder libx264' >&2\nexit 1\n",
    )
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub struct TestEnv {
    pub output: TempDir,
    pub tools: TempDir,
    pub models: MockModels,
    pub config: AppConfig,
}

impl TestEnv {
    /// GAN backend, shell narrator, fake encoder.
    pub async fn new() -> Self {
        Self::with_expander(None).await
    }

    pub async fn with_expander(expander_text: Option<&str>) -> Self {
        let output = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let models = MockModels::start(expander_text).await;

        let mut config = AppConfig::default();
        config.output.dir = output.path().to_path_buf();
        config.pipeline.image_backend = ImageBackendKind::Gan;
        config.gan.endpoint = format!("{}/biggan", models.base_url);
        config.diffusion.endpoint = format!("{}/txt2img", models.base_url);
        config.expander.endpoint = format!("{}/generate", models.base_url);
        config.narrator.provider = NarratorProvider::Command;
        config.narrator.base_url = format!("{}/translate_tts", models.base_url);
        config.narrator.command = "sh".to_string();
        config.narrator.args = vec![
            "-c".to_string(),
            "cat > \"$0\"".to_string(),
            "{output}".to_string(),
        ];
        config.ffmpeg.binary = fake_encoder(tools.path()).to_string_lossy().into_owned();

        Self {
            output,
            tools,
            models,
            config,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.config.clone()).unwrap()
    }

    pub fn encoder_args(&self) -> String {
        std::fs::read_to_string(self.tools.path().join("encoder_args.txt")).unwrap_or_default()
    }

    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

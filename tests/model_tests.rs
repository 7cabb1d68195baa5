use std::path::Path;
use std::time::Duration;

use ai_shorts::dto::generate::{GenerateRequest, GenerateResponse};
use ai_shorts::models::artifact::ArtifactSet;
use ai_shorts::models::prompt::{Expansion, Prompt};
use ai_shorts::services::captions::write_captions;
use ai_shorts::services::image::gan::select_class;

#[test]
fn test_prompt_validation() {
    assert_eq!(Prompt::parse(Some("\ta red balloon ")).unwrap().as_str(), "a red balloon");
    assert_eq!(Prompt::parse(None).unwrap_err().to_string(), "Prompt is required");
    assert_eq!(
        Prompt::parse(Some(" \n ")).unwrap_err().to_string(),
        "Prompt cannot be empty"
    );
}

#[test]
fn test_request_without_prompt_deserializes() {
    let request: GenerateRequest = serde_json::from_str(r#"{"other": 1}"#).unwrap();
    assert!(request.prompt.is_none());
}

#[test]
fn test_response_carries_all_url_keys() {
    let response = GenerateResponse::new("http://localhost:5000", "generated_video_x.mp4");
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["video_url"], "http://localhost:5000/output/generated_video_x.mp4");
    assert_eq!(json["videoUrl"], json["video_url"]);
    assert_eq!(json["downloadUrl"], "http://localhost:5000/download/generated_video_x.mp4");
}

#[test]
fn test_artifact_names_share_a_stamp() {
    let set = ArtifactSet::with_stamp(Path::new("out"), "20240101_120000_abcd1234".to_string());

    assert_eq!(set.video_file_name(), "generated_video_20240101_120000_abcd1234.mp4");
    assert_eq!(set.image, Path::new("out/generated_image_20240101_120000_abcd1234.png"));
    assert_eq!(set.audio, Path::new("out/narration_20240101_120000_abcd1234.mp3"));
    assert_eq!(set.captions, Path::new("out/captions_20240101_120000_abcd1234.srt"));
}

#[test]
fn test_expansion_text() {
    let expanded = Expansion::Expanded("A cat sleeping".to_string());
    assert!(expanded.is_expanded());
    assert_eq!(expanded.text(), "A cat sleeping");
    assert!(!Expansion::Original("a cat".to_string()).is_expanded());
}

#[test]
fn test_class_selection_uses_first_match() {
    assert_eq!(select_class("A Tiger chasing a zebra"), 292);
    assert_eq!(select_class("a dog and a cat"), 207);
    assert_eq!(select_class("something abstract"), 207);
}

#[test]
fn test_captions_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("captions.srt");

    tokio_test::block_on(write_captions("hello", Duration::from_secs(5), &path)).unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "1\n00:00:00,000 --> 00:00:05,000\nhello\n\n"
    );
}

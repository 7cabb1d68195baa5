use ai_shorts::{models::prompt::Prompt, utils, AppConfig, AppState};
use anyhow::Result;

/// Run the generation pipeline once, outside the server.
///
/// Usage: render_prompt <prompt words...>
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    utils::logging::init_logging()?;

    let raw = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let prompt = Prompt::parse(Some(&raw)).map_err(|e| anyhow::anyhow!("{e}. Usage: render_prompt <prompt>"))?;

    let config = AppConfig::load()?;
    let state = AppState::new(config)?;

    println!("Rendering {:?} ...", prompt.as_str());
    let video = state.pipeline.generate(&prompt).await?;

    println!("✅ Image backend: {}", video.image_backend);
    if video.expansion.is_expanded() {
        println!("📝 Expanded prompt: {}", video.expansion.text());
    }
    println!("🎞️ {}", video.video_path.display());

    Ok(())
}

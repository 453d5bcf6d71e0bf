//! Example: Run Grounding DINO on an image
//!
//! Uploads the image as an NVCF asset, submits a detection request, polls
//! until the result is ready and prints where the annotated image landed.
//!
//! Usage:
//!   cargo run --example detect_image -- <image.jpg|png> "<prompt>"
//!
//! Prerequisites:
//!   - .env file with NVIDIA_API_KEY

use nim_vision::app_state::AppState;
use nim_vision::config::AppConfig;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let mut args = env::args().skip(1);
    let (Some(path), Some(prompt)) = (args.next(), args.next()) else {
        eprintln!("usage: detect_image <image> <prompt>");
        std::process::exit(2);
    };

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config)?;

    let image = std::fs::read(&path)?;
    let format = image::guess_format(&image)?;

    println!("🔍 Detecting \"{}\" in {}", prompt, path);
    let outcome = state
        .detection
        .detect(image, format.to_mime_type(), &prompt, &config.output_dir)
        .await?;

    println!("✅ Job {} {}", outcome.job_id, outcome.status);
    println!("🖼️  {}", outcome.image_path.display());

    Ok(())
}

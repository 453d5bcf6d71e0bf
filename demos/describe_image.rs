//! Example: Ask NeVA-22B about an image
//!
//! Usage:
//!   cargo run --example describe_image -- <image> "<question>"
//!
//! Prerequisites:
//!   - .env file with NVIDIA_API_KEY

use base64::Engine;
use nim_vision::app_state::AppState;
use nim_vision::config::AppConfig;
use nim_vision::models::description::{Description, DescriptionQuery};
use std::env;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let mut args = env::args().skip(1);
    let (Some(path), Some(question)) = (args.next(), args.next()) else {
        eprintln!("usage: describe_image <image> <question>");
        std::process::exit(2);
    };

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config)?;

    let image = std::fs::read(&path)?;
    let query = DescriptionQuery::new(
        base64::engine::general_purpose::STANDARD.encode(&image),
        question,
    );

    // Ctrl-C stops a long stream instead of waiting for the model to finish.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    println!("🤖 Asking NeVA-22B...\n");
    match state.description.describe(&query, &cancel).await? {
        Description::Accumulated { text } => println!("{}", text),
        Description::RawDocument { document } => {
            println!("{}", serde_json::to_string_pretty(&document)?)
        }
    }

    Ok(())
}

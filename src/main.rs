//! Motorik CLI - start the performance engine

use clap::Parser;
use motorik::clock::Tempo;
use motorik::engine::Engine;
use motorik::render::{LogRenderer, OscRenderer, Renderer};
use motorik::server::OscListener;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "motorik")]
#[command(about = "Phase-locked techno performance machine", long_about = None)]
struct Cli {
    /// Tempo of the live set in beats per minute
    #[arg(short, long, default_value = "100")]
    bpm: f32,

    /// UDP port for incoming OSC control messages
    #[arg(short, long, default_value = "4560")]
    port: u16,

    /// Renderer OSC target (host:port); omit to log triggers instead
    #[arg(short, long)]
    renderer: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let renderer: Arc<dyn Renderer> = match &cli.renderer {
        Some(target) => {
            info!("rendering to {target}");
            Arc::new(OscRenderer::new(target)?)
        }
        None => Arc::new(LogRenderer),
    };

    let engine = Engine::start(Tempo::new(cli.bpm), renderer);
    let listener = OscListener::bind(cli.port, engine.topic_publishers())?;
    tokio::spawn(listener.run());

    // The loop set runs until the process dies; there is no per-loop stop.
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}

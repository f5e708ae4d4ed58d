//! Minimal live voice session from the terminal.
//!
//! Usage:
//! ```sh
//! GEMINI_API_KEY=... cargo run --example voice_demo
//! ```
//! Speak into the default microphone; responses play on the default
//! output device. Ctrl-C to quit.

use anyhow::Context;
use nexus_live::live::{LiveSession, SessionEvent};
use nexus_live::network::LiveConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nexus_live::utils::logging::init_logging();

    let api_key = std::env::var("GEMINI_API_KEY")
        .context("set GEMINI_API_KEY to your API key")?;

    let mut session = LiveSession::new(LiveConfig::new());

    session
        .connect(&api_key, |event| match event {
            SessionEvent::Connected => println!("connected, start talking"),
            SessionEvent::Interrupted => println!("(interrupted)"),
            SessionEvent::TurnComplete => println!("(turn complete)"),
            SessionEvent::Closed => println!("session closed"),
            SessionEvent::Error { message } => eprintln!("session error: {message}"),
        })
        .await
        .context("failed to start voice session")?;

    tokio::signal::ctrl_c().await?;

    session.disconnect().await?;
    Ok(())
}

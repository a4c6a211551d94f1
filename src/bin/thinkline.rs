//! Interactive chat client for OpenAI-compatible servers.
//!
//! Reasoning text (between `<think>` and `</think>` by default) is shown in
//! purple and the answer in blue.
//!
//! # Usage
//!
//! ```bash
//! # Model and server from the environment
//! MODEL_NAME=qwen3-8b OPENAI_BASE_URL=http://localhost:8000/v3 thinkline
//!
//! # A model that starts answering with reasoning and may omit <think>
//! REASONING_MODEL=True thinkline --model deepseek-r1
//!
//! # Disable colors (useful for piping output)
//! thinkline --no-color
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use thinkline::Client;
use thinkline::chat::{
    BANNER, ChatArgs, ChatConfig, ChatSession, GOODBYE, PlainTextRenderer, Renderer,
    RustylineReader, repl,
};

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("thinkline=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main entry point for the thinkline application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("thinkline [OPTIONS]");
    let config = match ChatConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    init_tracing(config.debug);
    debug!(?config, "starting");

    let use_color = config.use_color;
    let client = Client::with_options(None, config.base_url.clone(), None)?;
    let mut session = ChatSession::new(client, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);

    match session.check_server().await {
        Ok(outcome) => debug!(?outcome, "server reachable"),
        Err(err) => {
            eprintln!("Connecting to server failed: {err}");
            std::process::exit(1);
        }
    }

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut reader = RustylineReader::new()?;
    println!("{BANNER}");

    match repl::run(&mut session, &mut reader, &mut renderer, &interrupted).await {
        Ok(reason) => {
            debug!(?reason, "chat loop ended");
            println!("{GOODBYE}");
            Ok(())
        }
        Err(err) => {
            renderer.print_error(&err.to_string());
            println!("{GOODBYE}");
            std::process::exit(1);
        }
    }
}

//! crease - terminal chat client for a local Ollama server

mod config;
mod terminal;
mod transcript;
mod utils;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crease_ai::{OllamaProvider, model_matches};
use crease_chat::{
    ExchangeController, FallbackNotices, InputAffordance, OllamaTransport, RenderSink,
    StreamOutcome, SubmitOutcome,
};
use terminal::Terminal;
use transcript::HtmlTranscript;

/// crease - chat with a local Ollama model
#[derive(Parser, Debug)]
#[command(name = "crease")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: cricket-coach)
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server address (default: http://localhost:11434)
    #[arg(short = 'u', long)]
    base_url: Option<String>,

    /// Send a single message and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Wait for the whole reply instead of streaming it
    #[arg(long)]
    no_stream: bool,

    /// Keep an HTML transcript of the conversation
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// List models installed on the server
    #[arg(long)]
    models: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("crease=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // CLI args take precedence over the config file
    let cfg = config::Config::load();
    let base_url = args
        .base_url
        .unwrap_or_else(|| cfg.base_url().to_string());
    let model = args.model.unwrap_or_else(|| cfg.model().to_string());
    let stream = !args.no_stream && cfg.stream();
    let transcript = args.transcript.or(cfg.transcript.clone());

    let provider = OllamaProvider::new(base_url);

    if args.models {
        return list_models(&provider, &model).await;
    }

    tracing::debug!(
        "Using {} at {} (streaming: {})",
        model,
        provider.base_url(),
        stream
    );

    let transport = OllamaTransport::new(provider.clone(), &model).with_streaming(stream);

    let terminal = match args.command {
        Some(_) => Arc::new(Terminal::stdout()),
        None => Arc::new(Terminal::stdout().with_prompt("> ")),
    };

    let mut sinks: Vec<Arc<dyn RenderSink>> = vec![terminal.clone()];
    if let Some(path) = transcript {
        eprintln!("Writing transcript to {}", path.display());
        sinks.push(Arc::new(HtmlTranscript::new(path)));
    }

    let controller =
        ExchangeController::new(Arc::new(transport), Arc::new(sinks), terminal.clone())
            .with_notices(FallbackNotices::for_model(&model));

    spawn_interrupt_handler(controller.clone());

    if let Some(command) = args.command {
        return run_command(&controller, &command).await;
    }

    run_interactive(&controller, terminal, &provider, &model, cfg.max_input_chars()).await
}

/// Ctrl-C aborts the exchange in flight, or exits when there is none
fn spawn_interrupt_handler(controller: ExchangeController) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !controller.abort() {
                println!();
                std::process::exit(130);
            }
        }
    });
}

async fn run_command(controller: &ExchangeController, command: &str) -> anyhow::Result<()> {
    println!("crease> {}", command);
    println!();

    match controller.submit(command).await {
        SubmitOutcome::Finished(StreamOutcome::Failed(reason)) => {
            anyhow::bail!("Exchange failed: {}", reason)
        }
        SubmitOutcome::Rejected(reason) => anyhow::bail!("Nothing sent ({:?})", reason),
        SubmitOutcome::Finished(_) => Ok(()),
    }
}

async fn run_interactive(
    controller: &ExchangeController,
    terminal: Arc<Terminal<std::io::Stdout>>,
    provider: &OllamaProvider,
    model: &str,
    max_input_chars: usize,
) -> anyhow::Result<()> {
    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("crease ({}) at {}", model, provider.base_url());
        eprintln!("Type /quit to exit, Ctrl-C to stop a reply.");
    }

    match provider.has_model(model).await {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("Warning: model {} is not installed on the server.", model);
            eprintln!("Try: ollama pull {}", model);
        }
        Err(e) => tracing::debug!("Could not check installed models: {}", e),
    }

    terminal.focus();
    terminal.scroll_to_latest();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input == "/quit" || input == "/exit" {
            break;
        }

        let message = utils::truncate_chars(input, max_input_chars);
        if message.len() < input.len() {
            eprintln!("[Message cut to {} characters]", max_input_chars);
        }

        if let SubmitOutcome::Rejected(_) = controller.submit(message).await {
            terminal.focus();
            terminal.scroll_to_latest();
        }
    }

    Ok(())
}

async fn list_models(provider: &OllamaProvider, current: &str) -> anyhow::Result<()> {
    let models = provider
        .list_models()
        .await
        .with_context(|| format!("Could not list models at {}", provider.base_url()))?;

    if models.is_empty() {
        println!("No models installed.");
        println!("Try: ollama pull {}", current);
        return Ok(());
    }

    println!("Models at {}:\n", provider.base_url());
    for model in &models {
        let marker = if model_matches(&model.name, current) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<40} {:>10}",
            marker,
            model.name,
            utils::format_size(model.size)
        );
    }

    Ok(())
}

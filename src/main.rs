//! CNET - Line-based arithmetic protocol client
//!
//! Issues ADD/SUB/MUL/DIV requests to a CNET server over a persistent
//! TCP connection and prints the server's responses.

mod config;
mod protocol;
mod transport;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use protocol::{Request, Response, Status, Wire};
use transport::{Transport, TransportConfig};

/// How long the CLI waits for a server response before giving up.
/// The protocol itself carries no timeouts; this is caller policy.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// CNET - Arithmetic protocol client
#[derive(Parser)]
#[command(name = "cnet")]
#[command(author = "CNET Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Send arithmetic requests to a CNET server", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Server address to connect to (overrides config)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Server port (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single request and print the response
    Eval {
        /// Operation to perform (ADD, SUB, MUL or DIV)
        operation: String,

        /// First operand
        operand1: String,

        /// Second operand
        operand2: String,
    },

    /// Interactive session: one `OPERATION OPERAND1 OPERAND2` line per request
    Shell,

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,

        /// Output path for generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default().unwrap_or_default()
    };

    let host = cli.server.clone().unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);

    match cli.command {
        Commands::Eval {
            operation,
            operand1,
            operand2,
        } => {
            let request = Request::new(&operation, &operand1, &operand2)
                .context("invalid request")?;

            let (transport, mut inbound) = open_transport(&config, &host, port).await?;
            let response = exchange(&transport, &request, &mut inbound).await?;
            print_response(&response);
            transport.close().await?;
        }

        Commands::Shell => {
            let (transport, mut inbound) = open_transport(&config, &host, port).await?;
            run_shell(&transport, &mut inbound).await?;
            transport.close().await?;
        }

        Commands::Config { generate, output } => {
            if generate {
                let sample = config::generate_sample_config();
                if let Some(path) = output {
                    std::fs::write(&path, sample)?;
                    println!("Sample configuration written to {}", path.display());
                } else {
                    println!("{}", sample);
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

async fn open_transport(
    config: &Config,
    host: &str,
    port: u16,
) -> anyhow::Result<(Transport, mpsc::Receiver<String>)> {
    let transport = Transport::new(TransportConfig {
        connect_timeout_ms: config.server.connect_timeout_ms,
        ..Default::default()
    });
    let inbound = transport.subscribe().await;
    transport
        .open_hostname(host, port)
        .await
        .with_context(|| format!("failed to connect to {}:{}", host, port))?;
    Ok((transport, inbound))
}

/// One request/response exchange over an open transport.
async fn exchange(
    transport: &Transport,
    request: &Request,
    inbound: &mut mpsc::Receiver<String>,
) -> anyhow::Result<Response> {
    transport.send(&request.encode()).await?;

    let text = tokio::time::timeout(RESPONSE_TIMEOUT, inbound.recv())
        .await
        .context("timed out waiting for a response")?
        .context("connection closed before a response arrived")?;

    Response::decode(&text).context("could not decode server response")
}

fn print_response(response: &Response) {
    match response.status() {
        Status::Ok => println!("{}", response.result()),
        Status::Error => println!("ERROR: {}", response.message()),
    }
}

async fn run_shell(
    transport: &Transport,
    inbound: &mut mpsc::Receiver<String>,
) -> anyhow::Result<()> {
    println!("cnet shell - enter: OPERATION OPERAND1 OPERAND2 (exit to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            println!("expected: OPERATION OPERAND1 OPERAND2");
            continue;
        }

        match Request::new(parts[0], parts[1], parts[2]) {
            Ok(request) => match exchange(transport, &request, inbound).await {
                Ok(response) => print_response(&response),
                Err(e) => {
                    tracing::error!("Exchange failed: {:#}", e);
                    break;
                }
            },
            Err(e) => println!("invalid request: {}", e),
        }
    }

    Ok(())
}

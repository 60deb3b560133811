use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use patrimonio::api::{self, Calculator};
use patrimonio::config::AppConfig;
use patrimonio::error::Result;
use patrimonio::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "patrimonio",
    about = "Italian wealth-management calculators: IVAFE/IVIE, loss harvesting, rebalancing and advisory comparators",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one calculator over a JSON payload and print the result
    Compute(ComputeArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ComputeArgs {
    #[arg(value_enum)]
    calculator: Calculator,
    /// JSON payload file, `-` for stdin
    #[arg(long, default_value = "-")]
    input: PathBuf,
    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "patrimonio failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            let addr = config.server.socket_addr()?;
            api::run_http_server(addr).await?;
        }
        Command::Compute(args) => {
            let body = read_input(&args.input)?;
            let result = api::evaluate_json(args.calculator, &body)?;
            tracing::info!(calculator = args.calculator.name(), "calculation complete");
            let rendered = if args.pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{rendered}");
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        return Ok(body);
    }
    Ok(std::fs::read_to_string(path)?)
}

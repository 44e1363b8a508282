use anyhow::{Context, Result};
use clap::Parser;
use ropenet_core::boundary::BoundaryServer;
use ropenet_core::config::Config;
use ropenet_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use ropenet_core::metrics::init_metrics;
use ropenet_core::StoreHandle;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

mod demo;

#[derive(Parser, Debug)]
#[command(name = "ropenet")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Read configuration from a TOML file instead of the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Serve the boundary API
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// List the built-in instances
    Instances,
    /// Run a scripted session and print the resulting snapshot
    Demo {
        /// Instance to run on; defaults to the configured one
        #[arg(short, long)]
        instance: Option<String>,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::from_env()?,
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(&args)?;

    // Parse log level
    let log_config = LogConfig::try_from(&config.logging).unwrap_or_else(|e| {
        eprintln!("{e}, using 'info'");
        LogConfig::new(LogLevel::Info).json_format(config.logging.json_format)
    });
    init_logging_with_config(log_config)?;
    init_metrics();

    info!("ropenet started");

    match args.command {
        Some(Command::Serve { bind }) => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            config.validate()?;
            let handle = StoreHandle::from_config(&config)?;
            BoundaryServer::new(handle, config.server.clone()).run().await?;
        }
        Some(Command::Instances) => {
            let handle = StoreHandle::from_config(&config)?;
            for instance in handle.read(|store| store.instances()).await {
                println!("{}\t{}\t{}", instance.id, instance.name, instance.description);
            }
        }
        Some(Command::Demo { instance }) => {
            config.validate()?;
            let handle = StoreHandle::from_config(&config)?;
            let snapshot = demo::run(&handle, instance.as_deref()).await?;
            handle.teardown().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => {
            warn!("No command specified. Use --help for usage information.");
        }
    }

    info!("ropenet finished");

    Ok(())
}

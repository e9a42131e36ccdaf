use anyhow::Result;
use chatrelay::config::Config;
use chatrelay::{app, backend, gateway, logging};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(version)]
#[command(about = "Terminal chat client and proxy gateway for a language-model backend", long_about = None)]
struct Cli {
    /// Config file (default: ~/.chatrelay/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the proxy gateway
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
        /// Backend base URL (overrides BACKEND_URL)
        #[arg(long)]
        backend_url: Option<String>,
    },
    /// Run the reference backend
    Backend {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
        /// Completion model name
        #[arg(long)]
        model: Option<String>,
    },
    /// Open the terminal chat client
    Chat {
        /// Gateway base URL (overrides GATEWAY_URL)
        #[arg(long)]
        gateway_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind, backend_url } => {
            logging::init_stderr();
            if let Some(bind) = bind {
                config.gateway.bind = bind;
            }
            if let Some(url) = backend_url {
                config.gateway.backend_url = url;
            }
            gateway::serve(config.gateway).await
        }
        Commands::Backend { bind, model } => {
            logging::init_stderr();
            if let Some(bind) = bind {
                config.backend.bind = bind;
            }
            if let Some(model) = model {
                config.backend.model = model;
            }
            backend::serve(config.backend).await
        }
        Commands::Chat { gateway_url } => {
            // the terminal belongs to the UI, so logs go to a file
            logging::init_file(&Config::home_dir()?.join("chat.log"))?;
            if let Some(url) = gateway_url {
                config.client.gateway_url = url;
            }
            app::run(config.client).await
        }
    }
}

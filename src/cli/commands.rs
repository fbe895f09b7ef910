//! CLI command definitions and handlers

use clap::Subcommand;

/// Commands for the darija gateway
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Listen port (default: 8000)
        #[arg(short, long, default_value_t = 8000)]
        port: u16,

        /// Enable debug mode
        #[arg(long)]
        debug: bool,
    },

    /// Print the canonical form of a piece of text
    ///
    /// Useful when tuning the romanization override table: two inputs with
    /// the same canonical form share a cache entry.
    Canon {
        /// Raw input text
        text: String,
    },
}

/// Handle the serve command
pub async fn handle_serve(host: String, port: u16, debug: bool) -> anyhow::Result<()> {
    use crate::core::config::GatewayConfig;
    use crate::core::service::GatewayService;
    use crate::server::api::run_server;
    use tracing::info;

    if debug {
        std::env::set_var("RUST_LOG", "debug");
    }

    let config = GatewayConfig::from_env()?;
    let service = GatewayService::from_config(config)?;

    info!("Starting HTTP server on {}:{}", host, port);
    println!("🚀 Gateway starting on http://{}:{}", host, port);

    run_server(service, host, port).await?;

    Ok(())
}

/// Handle the canon command
pub fn handle_canon(text: String) -> anyhow::Result<()> {
    use crate::core::normalize::{canonicalize, normalize};

    println!("normalized: {}", normalize(&text));
    println!("canonical:  {}", canonicalize(&text));

    Ok(())
}

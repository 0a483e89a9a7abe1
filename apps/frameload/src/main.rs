//! # frameload
//!
//! Frame-sliced asset loading from the command line.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                apps/frameload (THE BINARY)             │
//! │                                                        │
//! │  ┌───────────┐   ┌────────────┐   ┌────────────────┐   │
//! │  │   CLI     │   │  Manifest  │   │  Frame driver  │   │
//! │  │  (clap)   │   │   (toml)   │   │    (tokio)     │   │
//! │  └─────┬─────┘   └─────┬──────┘   └───────┬────────┘   │
//! │        └───────────────┼──────────────────┘            │
//! │                        ▼                               │
//! │               ┌────────────────┐                       │
//! │               │ frameload-core │                       │
//! │               │  (THE ENGINE)  │                       │
//! │               └────────────────┘                       │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! frameload init -o assets.toml
//! frameload check -m assets.toml
//! frameload run -m assets.toml --fps 30
//! frameload run -m assets.toml --quick --json-mode
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = cli::Cli::parse();

    // FRAMELOAD_LOG_FORMAT=json switches to machine-parseable logs.
    let log_format = std::env::var("FRAMELOAD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "frameload=debug,frameload_core=debug"
    } else {
        "frameload=info,frameload_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  frameload v{}
  gather . process . clean
"#,
        env!("CARGO_PKG_VERSION")
    );
}

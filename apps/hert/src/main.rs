//! # hert - Entity Reference Tag Tool
//!
//! The main binary for the HERT subsystem.
//!
//! This application provides:
//! - Tag operations: encode, decode
//! - Store operations: add, import, query, stats, clear
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              apps/hert (THE BINARY)          │
//! │                                              │
//! │        ┌─────────────┐   ┌──────────┐        │
//! │        │    CLI      │   │  Config  │        │
//! │        │   (clap)    │   │  (toml)  │        │
//! │        └──────┬──────┘   └────┬─────┘        │
//! │               └───────┬───────┘              │
//! │                       ▼                      │
//! │               ┌───────────────┐              │
//! │               │   hert-core   │              │
//! │               │  (THE LOGIC)  │              │
//! │               └───────────────┘              │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Encode a mention into a tag token
//! hert encode --eid 4102 --document-path /library/faith.docx \
//!     --content-hash abc123 --paragraph 14 --token-start 823 --token-length 4
//!
//! # Append it to the store and inspect the result
//! hert add --eid 4102 ...
//! hert query --entity 4102 --decode
//! hert stats
//! ```

mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing. HERT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("HERT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose { "hert=debug" } else { "hert=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the hert startup banner.
fn print_banner() {
    println!(
        "  hert v{} — entity reference tags\n",
        env!("CARGO_PKG_VERSION")
    );
}

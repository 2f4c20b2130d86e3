//! # hert CLI Module
//!
//! This module implements the CLI interface for hert.
//!
//! ## Available Commands
//!
//! - `encode` - Encode a mention into a `HERTv1:` token
//! - `decode` - Decode a token and show its fields
//! - `add` - Encode a mention and append it to the store
//! - `import` - Bulk-append tokens from a file
//! - `query` - Look up stored references by entity and/or document
//! - `stats` - Show aggregate store statistics
//! - `clear` - Delete every stored reference

mod commands;

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use hert_core::HertError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// hert - Hierarchical Entity Reference Tags
///
/// Compact, versioned tags that pin one mention of a canonical entity to a
/// precise location inside a fingerprinted document.
#[derive(Parser, Debug)]
#[command(name = "hert")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the reference store file
    #[arg(short = 'S', long, global = true)]
    pub store: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Mention description shared by `encode` and `add`.
#[derive(Args, Debug)]
pub struct MentionArgs {
    /// Canonical entity ID
    #[arg(short, long)]
    pub eid: u64,

    /// Alias ID, when the mention matched via a surface form
    #[arg(short, long)]
    pub aid: Option<u64>,

    /// Sense path levels, comma-separated (e.g. "2,1")
    #[arg(long, value_delimiter = ',')]
    pub sp: Option<Vec<u64>>,

    /// Path of the containing document
    #[arg(short = 'p', long)]
    pub document_path: String,

    /// Content hash of the document
    #[arg(short = 'H', long)]
    pub content_hash: String,

    /// Document version
    #[arg(long, default_value = "1")]
    pub doc_version: u32,

    /// Section index within the document
    #[arg(long)]
    pub section: Option<u64>,

    /// Chapter index within the document
    #[arg(long)]
    pub chapter: Option<u64>,

    /// Paragraph index within the document
    #[arg(long)]
    pub paragraph: u64,

    /// First token of the mention span
    #[arg(long)]
    pub token_start: u64,

    /// Token count of the mention span
    #[arg(long)]
    pub token_length: u64,

    /// Extraction confidence in [0.0, 1.0]
    #[arg(long, default_value = "1.0")]
    pub confidence: f64,

    /// Extraction model version (metadata)
    #[arg(long)]
    pub model_version: Option<u64>,

    /// Extractor ID (metadata)
    #[arg(long)]
    pub extractor_id: Option<u64>,

    /// Extraction timestamp, seconds since epoch (metadata)
    #[arg(long)]
    pub timestamp: Option<u64>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a mention into a HERTv1 token
    Encode {
        #[command(flatten)]
        mention: MentionArgs,

        /// Also print the human-readable rendering
        #[arg(short, long)]
        readable: bool,
    },

    /// Decode a HERTv1 token and show its fields
    Decode {
        /// The token, including the "HERTv1:" prefix
        token: String,

        /// Print the compact human-readable rendering only
        #[arg(short, long)]
        readable: bool,
    },

    /// Encode a mention and append it to the store
    Add {
        #[command(flatten)]
        mention: MentionArgs,
    },

    /// Bulk-append tokens from a file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Input format (text = one token per line, json = array of tokens)
        #[arg(short = 't', long, default_value = "text")]
        format: String,
    },

    /// Look up stored references
    Query {
        /// Entity ID to match
        #[arg(long)]
        entity: Option<u64>,

        /// Document ID to match (decimal DID)
        #[arg(long)]
        document: Option<u64>,

        /// Decode matches into the human-readable form
        #[arg(short, long)]
        decode: bool,
    },

    /// Show aggregate store statistics
    Stats,

    /// Delete every stored reference
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), HertError> {
    let config = Config::load(cli.config.as_deref())?;
    let store_path = config.store_path(cli.store.as_deref());
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Encode { mention, readable }) => {
            cmd_encode(&mention, readable || config.output.readable, json_mode)
        }
        Some(Commands::Decode { token, readable }) => {
            cmd_decode(&token, readable || config.output.readable, json_mode)
        }
        Some(Commands::Add { mention }) => cmd_add(&store_path, &mention, json_mode),
        Some(Commands::Import { input, format }) => {
            cmd_import(&store_path, &input, &format, json_mode)
        }
        Some(Commands::Query {
            entity,
            document,
            decode,
        }) => cmd_query(&store_path, entity, document, decode, json_mode),
        Some(Commands::Clear { yes }) => cmd_clear(&store_path, yes),
        // No subcommand - show stats by default
        Some(Commands::Stats) | None => cmd_stats(&store_path, json_mode),
    }
}

//! CLI interface for artifact-store.
//!
//! Provides command-line argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line interface for artifact-store.
#[derive(Parser)]
#[command(name = "artifact-store")]
#[command(author, version, about = "Local artifact storage service", long_about = None)]
pub struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Store root directory (overrides the configured root).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service.
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind (defaults to the configured host).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to the configured port).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Store a local file as an artifact.
    Upload {
        /// Path of the file to upload.
        path: PathBuf,

        /// Artifact name (defaults to the file's own name).
        #[arg(short, long)]
        name: Option<String>,

        /// Content type recorded in the metadata.
        #[arg(short = 't', long)]
        content_type: Option<String>,
    },

    /// List all artifacts, newest first.
    List {
        /// Print the listing as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Fetch an artifact's content by filename.
    Download {
        /// Artifact filename (e.g., "report.pdf").
        filename: String,

        /// Write to this path instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete an artifact by filename.
    Delete {
        /// Artifact filename.
        filename: String,
    },
}

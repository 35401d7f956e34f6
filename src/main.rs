use std::io::Write;
#[cfg(feature = "server")]
use std::path::Path;

use anyhow::Context;
use artifact_store::cli::{Cli, Commands};
use artifact_store::commands;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8, default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new(default_level),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "server")]
    let default_level = if matches!(cli.command, Some(Commands::Serve { .. })) {
        "info"
    } else {
        "warn"
    };
    #[cfg(not(feature = "server"))]
    let default_level = "warn";

    init_logging(cli.verbose, default_level);

    let root = cli.root.as_deref();

    match cli.command {
        #[cfg(feature = "server")]
        Some(Commands::Serve { host, port }) => {
            let mut config = artifact_store::config::Config::load()?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let store_root = root.map_or_else(|| config.storage_root(), Path::to_path_buf);
            let store = commands::open_store(Some(&store_root))?;

            tokio::runtime::Runtime::new()?
                .block_on(artifact_store::server::serve(store, &config.server))
        }
        Some(Commands::Upload {
            path,
            name,
            content_type,
        }) => {
            let store = commands::open_store(root)?;
            let response =
                commands::upload_file(&store, &path, name.as_deref(), content_type.as_deref())?;
            println!(
                "Uploaded {} ({} bytes) to {}",
                response.receipt.filename, response.receipt.size, response.receipt.storage_path
            );
            Ok(())
        }
        Some(Commands::List { json }) => {
            let store = commands::open_store(root)?;
            let list = commands::list(&store)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print!("{}", commands::format_listing(&list));
            }
            Ok(())
        }
        Some(Commands::Download { filename, output }) => {
            let store = commands::open_store(root)?;
            let content = commands::download(&store, &filename)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &content)
                        .with_context(|| format!("Cannot write {}", path.display()))?;
                    eprintln!("Saved {filename} to {}", path.display());
                }
                None => std::io::stdout().write_all(&content)?,
            }
            Ok(())
        }
        Some(Commands::Delete { filename }) => {
            let store = commands::open_store(root)?;
            let response = commands::delete(&store, &filename)?;
            println!("{}: {}", response.message, response.filename);
            Ok(())
        }
        None => {
            Cli::parse_from(["artifact-store", "--help"]);
            Ok(())
        }
    }
}

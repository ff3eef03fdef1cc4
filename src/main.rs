use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

use symgraph::builder::export_project;
use symgraph::config::{get_config_path, load_config, save_config};

/// Symbol dependency graphs from language-server data.
#[derive(Parser)]
#[command(name = "symgraph", about = "Export a symbol dependency graph as GXL")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration for a project
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Language server executable
        #[arg(short, long)]
        server: Option<String>,
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Build the symbol graph and write it as a GXL document
    Export {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Output file (default: the configured output, relative to the project)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "symgraph=debug" } else { "symgraph=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> symgraph::errors::Result<()> {
    match cli.command {
        Commands::Init {
            path,
            server,
            force,
        } => {
            let project_path = resolve_path(path);
            let config_path = get_config_path(&project_path);
            if config_path.exists() && !force {
                println!(
                    "Configuration already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
                return Ok(());
            }
            let mut config = load_config(&project_path).unwrap_or_default();
            if let Some(server) = server {
                config.server_command = server;
            }
            save_config(&project_path, &config)?;
            println!("Wrote configuration to {}", config_path.display());
        }
        Commands::Export { path, output } => {
            let project_path = resolve_path(path);
            let result = export_project(&project_path, output).await?;
            println!(
                "Exported {} files: {} nodes, {} edges to {} in {}ms",
                result.file_count,
                result.node_count,
                result.edge_count,
                result.output.display(),
                result.duration_ms
            );
            if result.dangling_count > 0 {
                println!("  {} dangling edge endpoints (see log)", result.dangling_count);
            }
        }
    }
    Ok(())
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

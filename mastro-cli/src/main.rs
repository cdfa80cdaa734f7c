use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mastro", version, about = "Mastro CLI")]
struct Cli {
    /// Log lifecycle details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the directives in HTML fragments and list their owners.
    Check {
        /// HTML files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Parse a `data-bind` value and print the descriptors.
    Parse {
        directive: String,
        /// Parse as a `data-on<event>` value instead
        #[arg(long)]
        event: bool,
    },
    /// Render an HTML fragment file inside a full document.
    Render {
        input: PathBuf,
        /// Page title (default: the file name)
        #[arg(long)]
        title: Option<String>,
        /// Write chunks as they are produced
        #[arg(long)]
        stream: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();

    let mut stdout = io::stdout().lock();
    match cli.command {
        Commands::Check { files } => {
            let files: Vec<_> = files.iter().map(PathBuf::as_path).collect();
            let invalid = mastro_cli::check_cmd(&files, &mut stdout)?;
            if invalid > 0 {
                bail!("{invalid} invalid directive(s)");
            }
        }
        Commands::Parse { directive, event } => {
            mastro_cli::parse_cmd(&directive, event, &mut stdout)?
        }
        Commands::Render {
            input,
            title,
            stream,
        } => mastro_cli::render_cmd(&input, title.as_deref(), stream, &mut stdout)?,
    }
    Ok(())
}

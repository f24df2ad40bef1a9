//! Kuba index query inspector
//!
//! Operator tool for looking at index queries on the wire.
//!
//! # CLI Commands
//!
//! - `inspect` - Decode raw query bytes (file or stdin) in both decode modes
//! - `cardinality` - Encode a term query carrying a cardinality directive
//! - `check-config` - Validate a configuration file
//!
//! # Configuration
//!
//! Read from `--config`, then the `KUBA_QUERY_CONFIG` environment variable,
//! then defaults. Environment overrides apply in every case.

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kuba_index_query::config::Config;
use kuba_index_query::query::{with_metadata, MetadataDirective, Query};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "query_inspect", version, about = "Inspect Kuba index queries")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode raw query bytes and print both decode views
    Inspect {
        /// File holding the encoded query (stdin if omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Encode `term(field, value)` with a cardinality directive
    Cardinality {
        /// Tag name
        #[arg(long)]
        field: String,
        /// Tag value
        #[arg(long)]
        value: String,
        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate the configuration and exit
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> kuba_index_query::Result<Config> {
    let path = path
        .cloned()
        .or_else(|| std::env::var("KUBA_QUERY_CONFIG").ok().map(PathBuf::from));

    match path {
        Some(path) => Config::from_file_with_env(path),
        None => Ok(Config::from_env()),
    }
}

fn read_input(file: Option<&PathBuf>) -> std::io::Result<Vec<u8>> {
    match file {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(&config.logging.log_level)?)
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;
    let codec = config.codec.codec();

    match cli.command {
        Command::Inspect { file } => {
            let bytes = read_input(file.as_ref())?;
            debug!(bytes = bytes.len(), "Read encoded query");

            let normal = codec.decode(&bytes)?;
            let (aware, metadata) = codec.decode_with_metadata(&bytes)?;

            println!("query:          {}", normal);
            println!("metadata query: {}", aware);
            if metadata.is_empty() {
                println!("metadata:       (none)");
            } else {
                println!("metadata:       {}", metadata.join(", "));
            }
        },
        Command::Cardinality { field, value, out } => {
            let query = with_metadata(
                Query::term(field.into_bytes(), value.into_bytes()),
                [MetadataDirective::Cardinality],
            );
            let bytes = codec.encode(&query)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    info!(path = %path.display(), bytes = bytes.len(), "Wrote encoded query");
                },
                None => std::io::stdout().write_all(&bytes)?,
            }
        },
        Command::CheckConfig => {
            println!("Configuration OK");
            println!("{}", toml::to_string_pretty(&config)?);
        },
    }

    Ok(())
}

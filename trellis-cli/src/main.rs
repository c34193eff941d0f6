//! Trellis CLI

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use trellis_config::{build_router, load_config, Config};
use trellis_router::RouteSummary;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Trellis route tables", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "warn", env = "TRELLIS_LOG")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every route in match order
    Routes {
        /// Path to configuration file
        #[arg(short, long, default_value = "trellis.yaml")]
        config: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "trellis.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Routes { config, format } => {
            let config = load(&config, cli.log_level)?;
            let router = build_router(&config).context("Failed to build routes")?;
            let routes = router.summaries();

            match format {
                OutputFormat::Table => print_table(&routes),
                OutputFormat::Json => {
                    let rows: Vec<_> = routes
                        .iter()
                        .map(|route| {
                            serde_json::json!({
                                "methods": route.methods,
                                "pattern": route.pattern,
                                "handler": route.handler,
                                "middleware": route.middleware,
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
            }
            Ok(())
        }

        Commands::Validate { config: path } => {
            let config = match load(&path, cli.log_level) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("✗ Configuration validation failed: {e:#}");
                    std::process::exit(1);
                }
            };

            match build_router(&config) {
                Ok(router) => {
                    println!("✓ Configuration is valid");
                    println!("  App: {}", config.app.name);
                    println!("  Routes: {}", router.len());
                    println!("  Controllers: {}", router.handler_identifiers().len());
                    Ok(())
                }
                Err(e) => {
                    eprintln!("✗ Route table is invalid: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Trellis");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

/// Load the configuration, then set up logging from its observability section
fn load(path: &Path, level: tracing::Level) -> Result<Config> {
    let config = load_config(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    init_tracing(level, &config.observability.logging.format)?;
    tracing::debug!(config = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Log to stderr so `routes --format json` stays parseable
fn init_tracing(level: tracing::Level, format: &str) -> Result<()> {
    let level = level.as_str().to_ascii_lowercase();
    trellis_runtime::telemetry::init_with_writer(&level, format, std::io::stderr)
        .context("Failed to initialise logging")
}

fn print_table(routes: &[RouteSummary]) {
    let rows: Vec<[String; 4]> = routes
        .iter()
        .map(|route| {
            [
                route.methods.join(","),
                route.pattern.clone(),
                route.handler.clone(),
                route.middleware.join(","),
            ]
        })
        .collect();

    let headers = ["METHODS", "PATTERN", "HANDLER", "MIDDLEWARE"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    println!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {}",
        headers[0],
        headers[1],
        headers[2],
        headers[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    );
    for row in &rows {
        println!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
    }
}

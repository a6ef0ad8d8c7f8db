use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use countylake_config::RuntimeConfig;
use countylake_server::{init_tracing, run_with_config, ConfigSource};
use countylake_writer::{read_gold, run_pipeline, PipelineContext};
use std::path::PathBuf;
use tracing::info;

mod view;

/// Bronze → silver → gold ETL for county housing, school and special-education data
#[derive(Parser)]
#[command(name = "countylake")]
#[command(version)]
#[command(about = "Bronze → silver → gold ETL for county housing, school and special-education data", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP trigger
    Serve {
        /// HTTP listen port (overrides config file)
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },
    /// Run the pipeline once and print the run summary
    Run {
        /// Partition to process, YYYY-MM-DD (defaults to INGEST_DATE or today)
        #[arg(long, value_name = "DATE")]
        ingest_date: Option<String>,
    },
    /// Print the gold table of a partition and its highlights
    View {
        #[arg(long, value_name = "DATE")]
        ingest_date: Option<String>,

        /// Number of rows to print
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RuntimeConfig::load_from_file_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RuntimeConfig::load().context("Failed to load configuration")?,
    };

    init_tracing(&config.server);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli, config))
}

async fn async_main(cli: Cli, mut config: RuntimeConfig) -> Result<()> {
    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.listen_addr = format!("0.0.0.0:{}", port);
            }
            let source = ConfigSource::Environment { path: cli.config };
            run_with_config(config, source).await
        }
        Command::Run { ingest_date } => {
            apply_ingest_date(&mut config, ingest_date)?;
            let ctx = PipelineContext::from_config(&config)?;
            let summary = run_pipeline(&ctx).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Command::View { ingest_date, limit } => {
            apply_ingest_date(&mut config, ingest_date)?;
            let ctx = PipelineContext::from_config(&config)?;
            info!(ingest_date = %ctx.ingest_date, "Reading gold table");
            let batch = read_gold(ctx.store.as_ref(), &ctx.files, &ctx.ingest_date).await?;
            println!("{}", view::render(&batch, limit)?);
            Ok(())
        }
    }
}

fn apply_ingest_date(config: &mut RuntimeConfig, ingest_date: Option<String>) -> Result<()> {
    if let Some(date) = ingest_date {
        config.pipeline.ingest_date = Some(date);
        config.validate()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["countylake", "--config", "lake.toml", "serve", "-p", "8080"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("lake.toml")));
        assert!(matches!(cli.command, Command::Serve { port: Some(8080) }));

        let cli = Cli::try_parse_from(["countylake", "view", "--ingest-date", "2024-01-01", "-n", "3"])
            .unwrap();
        match cli.command {
            Command::View { ingest_date, limit } => {
                assert_eq!(ingest_date.as_deref(), Some("2024-01-01"));
                assert_eq!(limit, 3);
            }
            _ => panic!("expected view"),
        }
    }

    #[test]
    fn test_cli_ingest_date_override_is_validated() {
        let mut config = RuntimeConfig::default();
        assert!(apply_ingest_date(&mut config, Some("2024-13-01".to_string())).is_err());
        apply_ingest_date(&mut config, Some("2024-01-01".to_string())).unwrap();
        assert_eq!(config.pipeline.ingest_date.as_deref(), Some("2024-01-01"));
    }
}

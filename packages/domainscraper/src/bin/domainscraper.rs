//! Command line interface for running getters and exporting their results.
//!
//! Tables and `list` output go to stdout, logs to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use domainscraper_core::{
    build_registry, export,
    report::{markdown_table, result_rows},
    Config,
};
use getter_engine::{GetterRegistry, ResultStore, RunResult, Runner, SqliteStore};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "domainscraper")]
#[command(about = "Collect domain names of public sector organisations")]
struct Cli {
    /// Database location, overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all registered getters
    List,

    /// Run getters and persist their results
    #[command(subcommand)]
    Run(RunCommand),

    /// Manage the results database
    #[command(subcommand)]
    Db(DbCommand),

    /// Export persisted results
    #[command(subcommand)]
    Export(ExportCommand),
}

#[derive(Subcommand)]
enum RunCommand {
    /// Run every getter
    All,

    /// Run the named getters, in the order given
    Getters { names: Vec<String> },

    /// Run the getters that are due
    Due,
}

#[derive(Subcommand)]
enum DbCommand {
    /// Create the tables
    Create,

    /// Remove getters that no longer exist and records that went stale
    Clean,

    /// Remove everything
    Clear,
}

#[derive(Subcommand)]
enum ExportCommand {
    /// One CSV row per record
    Csv { path: PathBuf },

    /// A JSON array of records
    Json { path: PathBuf },

    /// A results README with the report per getter
    Readme { path: PathBuf },
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,domainscraper=debug,domainscraper_core=debug,getter_engine=debug,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_database_url(cli.database_url);
    let registry = build_registry(&config).context("Failed to register getters")?;

    match cli.command {
        Commands::List => cmd_list(&registry),
        Commands::Run(command) => {
            let runner = connect(&config, registry).await?;
            cmd_run(&runner, command).await
        }
        Commands::Db(command) => {
            let runner = connect(&config, registry).await?;
            cmd_db(&runner, command).await
        }
        Commands::Export(command) => {
            let runner = connect(&config, registry).await?;
            cmd_export(runner.store(), command).await
        }
    }
}

async fn connect(config: &Config, registry: GetterRegistry) -> Result<Runner<SqliteStore>> {
    tracing::debug!(url = %config.database_url, "connecting to database");
    let store = SqliteStore::connect(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;

    let runner = Runner::new(registry, store);
    runner
        .create_schema()
        .await
        .context("Failed to create tables")?;
    Ok(runner)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_list(registry: &GetterRegistry) -> Result<()> {
    for name in registry.names() {
        println!("{}", name);
    }
    Ok(())
}

async fn cmd_run(runner: &Runner<SqliteStore>, command: RunCommand) -> Result<()> {
    let results = match command {
        RunCommand::All => runner.run_all().await?,
        RunCommand::Getters { names } => {
            if names.is_empty() {
                return Ok(());
            }
            runner.run_named(names.as_slice()).await?
        }
        RunCommand::Due => runner.run_due().await?,
    };

    print_results(&results);
    Ok(())
}

fn print_results(results: &[RunResult]) {
    println!("{}", markdown_table(&result_rows(results)));

    let failed = results.iter().filter(|r| !r.success()).count();
    let summary = format!(
        "{} getters run, {} succeeded, {} failed",
        results.len(),
        results.len() - failed,
        failed
    );
    if failed == 0 {
        eprintln!("{}", summary.bright_green().bold());
    } else {
        eprintln!("{}", summary.bright_yellow().bold());
    }
}

async fn cmd_db(runner: &Runner<SqliteStore>, command: DbCommand) -> Result<()> {
    match command {
        DbCommand::Create => {
            runner
                .create_schema()
                .await
                .context("Failed to create tables")?;
            eprintln!("{}", "Tables created".bright_green().bold());
        }
        DbCommand::Clean => {
            let report = runner.clean().await.context("Failed to clean database")?;
            for name in &report.removed_jobs {
                eprintln!("Removed getter {}", name.bright_yellow());
            }
            eprintln!(
                "{}",
                format!(
                    "Removed {} getters and {} stale records",
                    report.removed_jobs.len(),
                    report.removed_records
                )
                .bright_green()
                .bold()
            );
        }
        DbCommand::Clear => {
            runner.clear().await.context("Failed to clear database")?;
            eprintln!("{}", "Database cleared".bright_green().bold());
        }
    }
    Ok(())
}

async fn cmd_export(store: &SqliteStore, command: ExportCommand) -> Result<()> {
    match command {
        ExportCommand::Csv { path } => {
            let records = store.records().await.context("Failed to read records")?;
            export::export_csv(&path, &records)?;
            eprintln!("Exported {} records to {}", records.len(), path.display());
        }
        ExportCommand::Json { path } => {
            let records = store.records().await.context("Failed to read records")?;
            export::export_json(&path, &records)?;
            eprintln!("Exported {} records to {}", records.len(), path.display());
        }
        ExportCommand::Readme { path } => {
            let jobs = store.job_infos().await.context("Failed to read getters")?;
            export::export_readme(&path, &jobs)?;
            eprintln!("Wrote report of {} getters to {}", jobs.len(), path.display());
        }
    }
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aoe4_ledger::api::{build_router, state::AppState};
use aoe4_ledger::calculate;
use aoe4_ledger::config::AppConfig;
use aoe4_ledger::models::{AnalysisResult, NamedStat};
use aoe4_ledger::sync::HistorySync;

#[derive(Parser)]
#[command(name = "aoe4-ledger")]
#[command(about = "Age of Empires IV match history sync and player statistics")]
#[command(version)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Refresh and analyze one player from the command line
    Analyze {
        /// aoe4world profile id
        profile_id: i64,

        /// Rows shown per ally/opponent table
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn print_table(title: &str, rows: &[NamedStat], top: usize) {
    println!();
    println!("{}", title);
    if rows.is_empty() {
        println!("  (none)");
        return;
    }
    for row in rows.iter().take(top) {
        println!(
            "  {:<24} {:>4} games  {:>4}W {:>4}L",
            row.name, row.stat.games, row.stat.wins, row.stat.losses
        );
    }
}

fn print_summary(profile_id: i64, result: &AnalysisResult, top: usize) {
    let totals = &result.match_stats;
    println!(
        "Player {}: {} matches, {} wins, {} losses ({:.1}%)",
        profile_id, totals.total, totals.wins, totals.losses, totals.win_rate
    );

    if !result.civ_stats.is_empty() {
        println!();
        println!("Civilizations");
        for (civ, stat) in result.civ_stats.iter() {
            println!(
                "  {:<24} {:>4} games  {:>5.1}%",
                civ, stat.total, stat.win_rate
            );
        }
    }

    print_table("Top opponents", &result.opponents, top);
    print_table("Top allies", &result.allies, top);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting aoe4-ledger v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            config.validate()?;

            let sync = HistorySync::from_config(&config).await?;
            let state = AppState {
                sync: Arc::new(sync),
                cors_origin: config.cors_origin.clone(),
            };
            let app = build_router(state);

            let addr = format!("{}:{}", config.host, config.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Analyze {
            profile_id,
            top,
            json,
        } => {
            let sync = HistorySync::from_config(&config).await?;
            let outcome = sync.refresh(profile_id).await?;
            tracing::info!(
                "Refreshed player {}: {} fetched, {} total",
                profile_id,
                outcome.report.fetched,
                outcome.report.total
            );

            let result = calculate::analyze(&outcome.history, profile_id);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(profile_id, &result, top);
            }
        }
    }

    Ok(())
}

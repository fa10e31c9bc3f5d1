use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

use vol_desk_core::errors::EngineError;
use vol_desk_core::ticket::{Bias, TradeConstraints};
use vol_desk_core::ConfigLoader;
use vol_desk_engine::TradeEngine;
use vol_desk_signals::{DemoPortfolio, DemoSignalSource};

#[derive(Parser)]
#[command(name = "vol-desk")]
#[command(about = "Trade-ticket decision engine demo driver", long_about = None)]
struct Cli {
    /// Config file path (falls back to config/VolDesk.toml + VOL_DESK_* env)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate tickets for an underlying and print them as JSON
    Generate {
        /// Underlying ticker
        #[arg(short, long, default_value = "SPY")]
        underlying: String,
        /// Directional bias: bullish, bearish, or neutral
        #[arg(short, long, default_value = "neutral")]
        bias: String,
        /// Target days to expiry
        #[arg(long, default_value_t = 30)]
        dte: i64,
        /// Worst-case loss budget per structure (per share)
        #[arg(long, default_value_t = 5.0)]
        max_premium: f64,
        /// Maximum tickets to return
        #[arg(long, default_value_t = 3)]
        max_tickets: usize,
    },
    /// Walk a full generate -> approve/reject -> audit cycle on demo data
    Demo {
        /// Underlying ticker
        #[arg(short, long, default_value = "SPY")]
        underlying: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let engine = TradeEngine::new(DemoSignalSource, DemoPortfolio, config);

    match cli.command {
        Commands::Generate {
            underlying,
            bias,
            dte,
            max_premium,
            max_tickets,
        } => {
            let bias: Bias = bias.parse()?;
            let constraints = TradeConstraints {
                bias,
                dte_target: dte,
                max_premium: Decimal::try_from(max_premium)?,
                max_tickets,
            };
            let tickets = engine.generate(&underlying, &constraints).await?;
            println!("{}", serde_json::to_string_pretty(&tickets)?);
        }
        Commands::Demo { underlying } => {
            run_demo(&engine, &underlying).await?;
        }
    }

    Ok(())
}

/// Generates tickets, approves the best one (or rejects it when gates
/// block), and prints the resulting audit trail.
async fn run_demo(
    engine: &TradeEngine<DemoSignalSource, DemoPortfolio>,
    underlying: &str,
) -> Result<()> {
    let constraints =
        TradeEngine::<DemoSignalSource, DemoPortfolio>::default_constraints(Bias::Neutral);
    let tickets = engine.generate(underlying, &constraints).await?;

    if tickets.is_empty() {
        println!("no structures survived the premium budget for {underlying}");
        return Ok(());
    }

    println!("proposed {} ticket(s) for {underlying}:", tickets.len());
    for ticket in &tickets {
        println!(
            "  {} {} exp {} credit/debit {} max_loss {} pop {:.0}% rank {:.3}",
            ticket.id,
            ticket.strategy,
            ticket.expiry,
            ticket.credit_or_debit,
            ticket.max_loss,
            ticket.pop_estimate * 100.0,
            ticket.score_breakdown.rank,
        );
    }

    let best = &tickets[0];
    resolve_best(engine, best.id).await?;

    println!("audit log:");
    for entry in engine.audit_log() {
        println!(
            "  {} {} {} by {}{}",
            entry.timestamp.to_rfc3339(),
            entry.ticket_id,
            entry.action,
            entry.actor,
            entry
                .reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

async fn resolve_best(
    engine: &TradeEngine<DemoSignalSource, DemoPortfolio>,
    ticket_id: Uuid,
) -> Result<()> {
    match engine.approve(ticket_id, "demo").await {
        Ok(outcome) => {
            println!("approved {} -> {:?}", ticket_id, outcome.ticket().state);
        }
        Err(EngineError::GateBlocked { reasons }) => {
            println!("approval blocked: {}", reasons.join("; "));
            engine
                .reject(ticket_id, "demo: gates blocked approval", "demo")
                .await?;
            println!("rejected {ticket_id} instead");
        }
        Err(other) => return Err(other.into()),
    }
    Ok(())
}

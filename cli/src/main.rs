//! Debt Payoff CLI
//!
//! Command-line front end for the payoff engine:
//! - `plan`: simulate one strategy for a request file
//! - `compare`: snowball vs. avalanche for a request file
//! - `replay`: push a ledger of balance changes through the engine and show
//!   the milestones and notifications it produces

use clap::{Parser, Subcommand};
use debt_payoff_core::core::money::format_cents;
use debt_payoff_core::notifications::RecordingDispatcher;
use debt_payoff_core::{
    compare, simulate, ChangeType, ConfigError, DebtEngine, EngineConfig, EngineError, NewDebt,
    PayoffPlan, PlanRequest, Strategy, StrategyComparison, SystemClock, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "debt-payoff")]
#[command(about = "Debt payoff planning and milestone tracking")]
#[command(version)]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a payoff plan
    Plan {
        /// Plan request file (JSON)
        #[arg(long)]
        input: PathBuf,

        /// snowball or avalanche (overrides the file)
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Extra monthly payment in cents (overrides the file)
        #[arg(long)]
        extra: Option<i64>,
    },

    /// Compare snowball and avalanche
    Compare {
        /// Plan request file (JSON)
        #[arg(long)]
        input: PathBuf,

        /// Extra monthly payment in cents (overrides the file)
        #[arg(long)]
        extra: Option<i64>,
    },

    /// Apply a ledger of balance changes and report milestones
    Replay {
        /// Ledger file (JSON)
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One balance change in a replay ledger
#[derive(Debug, Deserialize)]
struct LedgerChange {
    debt_id: String,
    change_type: ChangeType,
    amount: i64,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Ledger {
    debts: Vec<NewDebt>,
    #[serde(default)]
    changes: Vec<LedgerChange>,
}

#[derive(Debug, Serialize)]
struct PlanOutput<'a> {
    #[serde(flatten)]
    plan: &'a PayoffPlan,
    fingerprint: String,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match &cli.command {
        Commands::Plan {
            input,
            strategy,
            extra,
        } => handle_plan(&cli, input, *strategy, *extra),
        Commands::Compare { input, extra } => handle_compare(&cli, input, *extra),
        Commands::Replay { input } => handle_replay(&cli, input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn handle_plan(
    cli: &Cli,
    input: &Path,
    strategy: Option<Strategy>,
    extra: Option<i64>,
) -> Result<(), CliError> {
    let request: PlanRequest = read_json(input)?;
    let strategy = strategy.or(request.strategy).unwrap_or(Strategy::Snowball);
    let extra = extra.unwrap_or(request.extra_payment);

    let plan = simulate(&request.debts, extra, strategy)?;
    let fingerprint = plan.fingerprint()?;
    log::debug!("plan fingerprint {}", fingerprint);

    if cli.json {
        let output = PlanOutput {
            plan: &plan,
            fingerprint,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_plan(&plan);
        println!("Fingerprint: {}", fingerprint);
    }
    Ok(())
}

fn handle_compare(cli: &Cli, input: &Path, extra: Option<i64>) -> Result<(), CliError> {
    let request: PlanRequest = read_json(input)?;
    let extra = extra.unwrap_or(request.extra_payment);
    let cmp = compare(&request.debts, extra)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&cmp)?);
    } else {
        print_comparison(&cmp);
    }
    Ok(())
}

fn handle_replay(cli: &Cli, input: &Path) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let ledger: Ledger = read_json(input)?;

    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = DebtEngine::in_memory(config, dispatcher.clone(), Arc::new(SystemClock))?;

    let mut owners = Vec::new();
    for debt in ledger.debts {
        if !owners.contains(&debt.owner_id) {
            owners.push(debt.owner_id.clone());
        }
        engine.create_debt(debt)?;
    }
    for change in ledger.changes {
        engine.record_change(&change.debt_id, change.amount, change.change_type, change.notes)?;
    }

    // Catch anything the inline path left behind
    if let Err(e) = engine.monitor().run_now() {
        log::warn!("final milestone scan failed: {}", e);
    }

    let mut milestones = Vec::new();
    let mut debts = Vec::new();
    for owner in &owners {
        milestones.extend(engine.milestones(owner)?);
        debts.extend(engine.debts_for_user(owner)?);
    }
    let notifications = dispatcher.delivered();

    if cli.json {
        let output = serde_json::json!({
            "debts": debts,
            "milestones": milestones,
            "notifications": notifications,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{:<16} {:>12} {:>12}  {}", "Debt", "Balance", "Original", "State");
    for debt in &debts {
        println!(
            "{:<16} {:>12} {:>12}  {:?}",
            debt.id(),
            format_cents(debt.balance()),
            format_cents(debt.original_balance()),
            debt.state()
        );
    }
    println!();
    if milestones.is_empty() {
        println!("No milestones earned");
    }
    for record in &milestones {
        println!(
            "{}: {} (debt {}, {})",
            record.user_id,
            record.milestone_type,
            record.debt_id,
            record.earned_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!("Notifications delivered: {}", notifications.len());
    Ok(())
}

fn print_plan(plan: &PayoffPlan) {
    println!("Strategy:       {}", plan.strategy);
    println!("Total months:   {}", plan.total_months);
    println!("Total interest: {}", format_cents(plan.total_interest));
    println!("Total paid:     {}", format_cents(plan.total_payments));
    if plan.exceeds_horizon {
        println!("Warning: not paid off within {} months", plan.total_months);
    }
    println!();
    println!("{:<4} {:<16} {:>8} {:>12} {:>12}", "#", "Debt", "Months", "Interest", "Paid");
    for (i, payoff) in plan.payoff_order.iter().enumerate() {
        let months = payoff
            .months_to_payoff
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<16} {:>8} {:>12} {:>12}",
            i + 1,
            payoff.debt_id,
            months,
            format_cents(payoff.total_interest),
            format_cents(payoff.total_paid)
        );
    }
}

fn print_comparison(cmp: &StrategyComparison) {
    println!("{:<12} {:>8} {:>14}", "Strategy", "Months", "Interest");
    for plan in [&cmp.snowball, &cmp.avalanche] {
        println!(
            "{:<12} {:>8} {:>14}",
            plan.strategy.as_str(),
            plan.total_months,
            format_cents(plan.total_interest)
        );
    }
    println!();
    println!(
        "Avalanche saves {} months and {} in interest ({} is cheaper)",
        cmp.months_saved,
        format_cents(cmp.interest_saved),
        cmp.cheaper()
    );
}

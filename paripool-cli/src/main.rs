//! # Paripool CLI
//!
//! Command-line interface for pooled-wager pari-mutuel markets.
//!
//! Drives one in-memory token ledger and one market registry, persisted
//! between invocations as a JSON state file. Amounts are integer base
//! units (6 decimals: 1_000_000 = 1 unit).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use paripool_core::market::format_timestamp;
use paripool_core::{EscrowLedger, InMemoryLedger, Market, MarketRegistry, Side};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "paripool")]
#[command(about = "Pooled-wager pari-mutuel settlement engine")]
#[command(version)]
struct Cli {
    /// Path to the JSON state file
    #[arg(long, global = true, default_value = "paripool.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh ledger and registry state file
    Init {
        /// Administrator identity
        #[arg(long, default_value = "admin")]
        admin: String,
        /// Ledger identity markets will be bound to
        #[arg(long, default_value = "tokens")]
        ledger: String,
    },
    /// Mint tokens to an account
    Fund {
        account: String,
        amount: u128,
    },
    /// Authorize a market's escrow account to draw from an account
    Approve {
        account: String,
        /// Market id
        market: u16,
        amount: u128,
    },
    /// Create a new market (administrator)
    CreateMarket,
    /// Place a bet on a market
    Bet {
        /// Market id
        market: u16,
        /// Betting account
        account: String,
        /// Team numeral (1 or 2)
        team: u8,
        amount: u128,
    },
    /// Declare the winning team (administrator)
    Declare {
        market: u16,
        /// Team numeral (1 or 2)
        team: u8,
    },
    /// Claim a winner's payout
    Claim {
        market: u16,
        account: String,
    },
    /// Suspend betting on a market (administrator)
    Pause { market: u16 },
    /// Reopen betting on a market (administrator)
    Unpause { market: u16 },
    /// Sweep a market's escrow to the administrator (crisis recovery)
    Emergency { market: u16 },
    /// Show one market, or all markets when no id is given
    Status { market: Option<u16> },
    /// Show an account balance
    Balance { account: String },
}

/// Everything the CLI persists between invocations.
#[derive(Serialize, Deserialize)]
struct EngineState {
    ledger: InMemoryLedger,
    registry: MarketRegistry,
}

fn load_state(path: &PathBuf) -> Result<EngineState> {
    let raw = fs::read_to_string(path).with_context(|| {
        format!("no state file at {} (run `paripool init` first)", path.display())
    })?;
    serde_json::from_str(&raw).with_context(|| format!("corrupt state file {}", path.display()))
}

fn save_state(path: &PathBuf, state: &EngineState) -> Result<()> {
    let raw = serde_json::to_string_pretty(state)?;
    fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn print_market(market: &Market) {
    println!("{}", "═".repeat(50).bright_black());
    println!("{}: {}", "Market".yellow().bold(), market.id());
    println!("{}: {}", "Escrow account".yellow().bold(), market.account());
    println!("{}: {}", "Status".yellow().bold(), market.status().cyan());
    println!("{}: {}", "Pool A".yellow().bold(), market.pool_a());
    println!("{}: {}", "Pool B".yellow().bold(), market.pool_b());
    println!(
        "{}: {}",
        "Created".yellow().bold(),
        format_timestamp(market.created_at())
    );
    if let Some(resolved_at) = market.resolved_at() {
        println!(
            "{}: {}",
            "Resolved".yellow().bold(),
            format_timestamp(resolved_at)
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { admin, ledger } => {
            let state = EngineState {
                ledger: InMemoryLedger::new(ledger.clone()),
                registry: MarketRegistry::new("registry", admin.clone()),
            };
            save_state(&cli.state, &state)?;
            println!("{}", "State initialized".green().bold());
            println!("{}: {}", "Administrator".yellow().bold(), admin);
            println!("{}: {}", "Ledger".yellow().bold(), ledger);
            println!("{}: {}", "State file".yellow().bold(), cli.state.display());
        }

        Commands::Fund { account, amount } => {
            let mut state = load_state(&cli.state)?;
            state.ledger.mint(&account, amount);
            save_state(&cli.state, &state)?;
            println!(
                "{} {} -> {} (balance {})",
                "Funded".green().bold(),
                amount,
                account,
                state.ledger.balance_of(&account)
            );
        }

        Commands::Approve {
            account,
            market,
            amount,
        } => {
            let mut state = load_state(&cli.state)?;
            let escrow_account = state.registry.market(market)?.account().to_string();
            state.ledger.approve(&account, &escrow_account, amount);
            save_state(&cli.state, &state)?;
            println!(
                "{} {} may draw up to {} from {}",
                "Approved".green().bold(),
                escrow_account,
                amount,
                account
            );
        }

        Commands::CreateMarket => {
            let mut state = load_state(&cli.state)?;
            let caller = state.registry.administrator().to_string();
            let ledger_id = state.ledger.ledger_id().to_string();
            let id = state.registry.create_market(&caller, &ledger_id)?;
            save_state(&cli.state, &state)?;
            println!("{}", "Market created".green().bold());
            print_market(state.registry.market(id)?);
        }

        Commands::Bet {
            market,
            account,
            team,
            amount,
        } => {
            let mut state = load_state(&cli.state)?;
            let pool = state
                .registry
                .market_mut(market)?
                .place_bet(&mut state.ledger, &account, team, amount)?;
            save_state(&cli.state, &state)?;
            let side = Side::from_team(team)?;
            println!(
                "{} {} staked {} on team {} (pool {} now {})",
                "Bet placed".green().bold(),
                account,
                amount,
                team,
                side,
                pool
            );
        }

        Commands::Declare { market, team } => {
            let mut state = load_state(&cli.state)?;
            let caller = state.registry.administrator().to_string();
            state
                .registry
                .market_mut(market)?
                .declare_result(&mut state.ledger, &caller, team)?;
            save_state(&cli.state, &state)?;
            println!(
                "{} team {} wins market {}",
                "Result declared".green().bold(),
                team,
                market
            );
            print_market(state.registry.market(market)?);
        }

        Commands::Claim { market, account } => {
            let mut state = load_state(&cli.state)?;
            let payout = state
                .registry
                .market_mut(market)?
                .claim_reward(&mut state.ledger, &account)?;
            save_state(&cli.state, &state)?;
            println!(
                "{} {} received {} (balance {})",
                "Reward claimed".green().bold(),
                account,
                payout,
                state.ledger.balance_of(&account)
            );
        }

        Commands::Pause { market } => {
            let mut state = load_state(&cli.state)?;
            let caller = state.registry.administrator().to_string();
            state.registry.market_mut(market)?.pause(&caller)?;
            save_state(&cli.state, &state)?;
            println!("{} market {}", "Paused".yellow().bold(), market);
        }

        Commands::Unpause { market } => {
            let mut state = load_state(&cli.state)?;
            let caller = state.registry.administrator().to_string();
            state.registry.market_mut(market)?.unpause(&caller)?;
            save_state(&cli.state, &state)?;
            println!("{} market {}", "Unpaused".green().bold(), market);
        }

        Commands::Emergency { market } => {
            let mut state = load_state(&cli.state)?;
            let caller = state.registry.administrator().to_string();
            let swept = state
                .registry
                .emergency_withdraw(&mut state.ledger, &caller, market)?;
            save_state(&cli.state, &state)?;
            println!(
                "{} swept {} from market {} to the administrator",
                "Emergency withdrawal".red().bold(),
                swept,
                market
            );
        }

        Commands::Status { market } => {
            let state = load_state(&cli.state)?;
            match market {
                Some(id) => print_market(state.registry.market(id)?),
                None => {
                    println!(
                        "{} ({} markets)",
                        "Registry".green().bold(),
                        state.registry.market_count()
                    );
                    for market in state.registry.markets() {
                        print_market(market);
                    }
                }
            }
        }

        Commands::Balance { account } => {
            let state = load_state(&cli.state)?;
            println!(
                "{}: {}",
                account.yellow().bold(),
                state.ledger.balance_of(&account)
            );
        }
    }

    Ok(())
}

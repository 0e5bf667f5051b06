//! # Duello CLI
//!
//! Command-line interface for creating, funding and settling moneyline markets
//! against a local JSON state file.

mod config;
mod state;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use duello_core::{
    utils::{format_timestamp, format_units, parse_units, unix_now, usd_to_native, PriceReading},
    Address, Call, Market, Side, Token, Vault,
};
use std::path::PathBuf;

use crate::config::Config;
use crate::state::World;

#[derive(Parser)]
#[command(name = "duello")]
#[command(about = "Escrowed moneyline markets settled by an optimistic result oracle")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "duello.toml")]
    config: PathBuf,
    /// State file (overrides the configured one)
    #[arg(long, global = true)]
    state: Option<PathBuf>,
    /// Unix time to execute at (defaults to the wall clock)
    #[arg(long, global = true)]
    now: Option<u64>,
    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh state file
    Init {
        /// Registry owner
        #[arg(long)]
        owner: Address,
        /// Oracle arbiter
        #[arg(long)]
        arbiter: Address,
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },
    /// Credit an account with test funds
    Fund {
        account: Address,
        /// Decimal amount, e.g. 1.5
        amount: String,
        #[arg(long, default_value = "native")]
        token: Token,
    },
    /// Show an account balance
    Balance {
        account: Address,
        #[arg(long, default_value = "native")]
        token: Token,
    },
    /// Create a new market (registry owner only)
    CreateMarket {
        #[arg(long)]
        from: Address,
        #[arg(long, default_value = "native")]
        token: Token,
        /// Event start (unix timestamp); deposits close here
        #[arg(long)]
        start: u64,
        /// Deadline after which anyone may void (unix timestamp)
        #[arg(long)]
        end: Option<u64>,
        /// Oracle event id; random if omitted
        #[arg(long)]
        event_id: Option<String>,
    },
    /// List all markets
    Markets,
    /// Show market information
    Info { market: Address },
    /// Stake on a side
    Deposit {
        market: Address,
        #[arg(long)]
        from: Address,
        #[arg(long)]
        side: Side,
        /// Decimal amount, e.g. 0.25
        amount: String,
    },
    /// Lock a market once its event has started
    Lock {
        market: Address,
        #[arg(long)]
        from: Address,
    },
    /// Resolve a locked market (market owner only)
    Resolve {
        market: Address,
        #[arg(long)]
        from: Address,
        #[arg(long)]
        side: Side,
        #[arg(long, requires = "score_b")]
        score_a: Option<u32>,
        #[arg(long, requires = "score_a")]
        score_b: Option<u32>,
    },
    /// Void a locked market (market owner only)
    Void {
        market: Address,
        #[arg(long)]
        from: Address,
    },
    /// Void a market whose end time has passed
    VoidAfterEnd {
        market: Address,
        #[arg(long)]
        from: Address,
    },
    /// Settle a locked market from the oracle's final result
    ResolveFromOracle {
        market: Address,
        #[arg(long)]
        from: Address,
    },
    /// Withdraw a payout or refund
    Claim {
        market: Address,
        #[arg(long)]
        from: Address,
    },
    /// Hand the registry to a new owner
    TransferOwnership {
        #[arg(long)]
        from: Address,
        new_owner: Address,
    },
    /// Propose an event outcome with a bond
    Propose {
        event_id: String,
        #[arg(long)]
        from: Address,
        #[arg(long)]
        side: Side,
        /// Decimal bond amount
        bond: String,
    },
    /// Dispute a pending proposal with a counter-bond
    Dispute {
        event_id: String,
        #[arg(long)]
        from: Address,
        /// Decimal bond amount
        bond: String,
    },
    /// Finalize an undisputed proposal after its window
    Finalize {
        event_id: String,
        #[arg(long)]
        from: Address,
    },
    /// Settle a disputed event (arbiter only); omit --side to void
    Arbitrate {
        event_id: String,
        #[arg(long)]
        from: Address,
        #[arg(long)]
        side: Option<Side>,
    },
    /// Show the oracle result for an event
    Result { event_id: String },
    /// Convert a USD amount into native units at a given price
    Convert {
        /// USD amount, decimal
        usd: String,
        /// USD per native unit, decimal
        #[arg(long)]
        price: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    config.logging.init();

    let state_path = cli.state.clone().unwrap_or_else(|| config.state_file.clone());
    let now = cli.now.unwrap_or_else(unix_now);
    tracing::debug!(state = %state_path.display(), now, "Starting duello");

    match cli.command {
        Commands::Init {
            owner,
            arbiter,
            force,
        } => {
            if state_path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    state_path.display()
                );
            }
            let params = config.oracle.params()?;
            let world = World::new(owner, arbiter, params);
            world.save(&state_path).await?;

            println!("{}", "Initialised duello state".green().bold());
            println!("{}", "═".repeat(50).bright_black());
            println!("{}: {}", "State file".yellow().bold(), state_path.display());
            println!("{}: {}", "Registry".yellow().bold(), world.registry.address());
            println!("{}: {}", "Registry owner".yellow().bold(), owner);
            println!("{}: {}", "Oracle".yellow().bold(), world.oracle.address());
            println!("{}: {}", "Arbiter".yellow().bold(), arbiter);
            println!("{}: {}", "Min bond".yellow().bold(), format_units(params.min_bond));
            println!(
                "{}: {}s",
                "Dispute window".yellow().bold(),
                params.dispute_window
            );
        }

        Commands::Fund {
            account,
            amount,
            token,
        } => {
            let mut world = World::load(&state_path).await?;
            let amount = parse_units(&amount)?;
            world.vault.mint(token, account, amount)?;
            world.save(&state_path).await?;
            println!(
                "{}: {} {} → {}",
                "Funded".green().bold(),
                format_units(amount).cyan(),
                token,
                account
            );
        }

        Commands::Balance { account, token } => {
            let world = World::load(&state_path).await?;
            let balance = world.vault.balance_of(token, account);
            println!(
                "{}: {} {}",
                "Balance".green().bold(),
                format_units(balance).cyan(),
                token
            );
        }

        Commands::CreateMarket {
            from,
            token,
            start,
            end,
            event_id,
        } => {
            let mut world = World::load(&state_path).await?;
            let market =
                world
                    .registry
                    .create_market(&Call::new(from, now), token, start, end, event_id)?;
            world.save(&state_path).await?;

            println!("{}", "Market Created Successfully!".green().bold());
            print_market(world.registry.market(&market)?, now);
        }

        Commands::Markets => {
            let world = World::load(&state_path).await?;
            if world.registry.all_markets().is_empty() {
                println!("{}", "No markets yet.".yellow());
            }
            for market in world.registry.markets() {
                println!(
                    "{}  {}  {}  {}",
                    market.address().to_string().cyan(),
                    market.event_id(),
                    format_timestamp(market.start_time()),
                    market.status_line(now).yellow()
                );
            }
        }

        Commands::Info { market } => {
            let world = World::load(&state_path).await?;
            print_market(world.registry.market(&market)?, now);
        }

        Commands::Deposit {
            market,
            from,
            side,
            amount,
        } => {
            let mut world = World::load(&state_path).await?;
            let amount = parse_units(&amount)?;
            let World {
                registry, vault, ..
            } = &mut world;
            registry
                .market_mut(&market)?
                .deposit(&Call::new(from, now), side, amount, vault)?;
            world.save(&state_path).await?;
            println!(
                "{}: {} on side {}",
                "Deposited".green().bold(),
                format_units(amount).cyan(),
                side.to_string().yellow()
            );
        }

        Commands::Lock { market, from } => {
            let mut world = World::load(&state_path).await?;
            world
                .registry
                .market_mut(&market)?
                .lock(&Call::new(from, now))?;
            world.save(&state_path).await?;
            println!("{}", "Market locked".green().bold());
        }

        Commands::Resolve {
            market,
            from,
            side,
            score_a,
            score_b,
        } => {
            confirm(cli.yes, &format!("Resolve {market} with side {side} winning?"))?;
            let mut world = World::load(&state_path).await?;
            let target = world.registry.market_mut(&market)?;
            let call = Call::new(from, now);
            match (score_a, score_b) {
                (Some(a), Some(b)) => target.resolve_with_scores(&call, side, a, b)?,
                _ => target.resolve(&call, side)?,
            }
            world.save(&state_path).await?;
            println!("{}: side {} won", "Resolved".green().bold(), side);
        }

        Commands::Void { market, from } => {
            confirm(cli.yes, &format!("Void {market} and refund every staker?"))?;
            let mut world = World::load(&state_path).await?;
            world
                .registry
                .market_mut(&market)?
                .void_by_owner(&Call::new(from, now))?;
            world.save(&state_path).await?;
            println!("{}", "Market voided".green().bold());
        }

        Commands::VoidAfterEnd { market, from } => {
            let mut world = World::load(&state_path).await?;
            world
                .registry
                .market_mut(&market)?
                .void_after_end(&Call::new(from, now))?;
            world.save(&state_path).await?;
            println!("{}", "Market voided after end time".green().bold());
        }

        Commands::ResolveFromOracle { market, from } => {
            let mut world = World::load(&state_path).await?;
            let World {
                registry, oracle, ..
            } = &mut world;
            let target = registry.market_mut(&market)?;
            target.resolve_from_oracle(&Call::new(from, now), &*oracle)?;
            let line = target.status_line(now);
            world.save(&state_path).await?;
            println!("{}: {}", "Settled from oracle".green().bold(), line);
        }

        Commands::Claim { market, from } => {
            let mut world = World::load(&state_path).await?;
            let World {
                registry, vault, ..
            } = &mut world;
            let paid = registry
                .market_mut(&market)?
                .claim(&Call::new(from, now), vault)?;
            world.save(&state_path).await?;
            println!("{}: {}", "Claimed".green().bold(), format_units(paid).cyan());
        }

        Commands::TransferOwnership { from, new_owner } => {
            confirm(cli.yes, &format!("Transfer registry ownership to {new_owner}?"))?;
            let mut world = World::load(&state_path).await?;
            world
                .registry
                .transfer_ownership(&Call::new(from, now), new_owner)?;
            world.save(&state_path).await?;
            println!("{}: {}", "New registry owner".green().bold(), new_owner);
        }

        Commands::Propose {
            event_id,
            from,
            side,
            bond,
        } => {
            let mut world = World::load(&state_path).await?;
            let bond = parse_units(&bond)?;
            let World { oracle, vault, .. } = &mut world;
            oracle.propose(&Call::new(from, now), &event_id, side, bond, vault)?;
            let deadline = oracle.deadline(&event_id);
            world.save(&state_path).await?;
            println!(
                "{}: side {} for {}",
                "Proposed".green().bold(),
                side.to_string().yellow(),
                event_id.cyan()
            );
            if let Some(deadline) = deadline {
                println!("{}: {}", "Disputable until".yellow().bold(), format_timestamp(deadline));
            }
        }

        Commands::Dispute {
            event_id,
            from,
            bond,
        } => {
            let mut world = World::load(&state_path).await?;
            let bond = parse_units(&bond)?;
            let World { oracle, vault, .. } = &mut world;
            oracle.dispute(&Call::new(from, now), &event_id, bond, vault)?;
            world.save(&state_path).await?;
            println!("{}: {}", "Disputed".green().bold(), event_id.cyan());
        }

        Commands::Finalize { event_id, from } => {
            let mut world = World::load(&state_path).await?;
            let World { oracle, vault, .. } = &mut world;
            let outcome = oracle.finalize(&Call::new(from, now), &event_id, vault)?;
            world.save(&state_path).await?;
            println!(
                "{}: {} → side {}",
                "Finalized".green().bold(),
                event_id.cyan(),
                outcome
            );
        }

        Commands::Arbitrate {
            event_id,
            from,
            side,
        } => {
            let prompt = match side {
                Some(side) => format!("Settle dispute on {event_id} for side {side}?"),
                None => format!("Void {event_id} and refund both bonds?"),
            };
            confirm(cli.yes, &prompt)?;
            let mut world = World::load(&state_path).await?;
            let World { oracle, vault, .. } = &mut world;
            oracle.arbitrate(&Call::new(from, now), &event_id, side, vault)?;
            world.save(&state_path).await?;
            println!("{}: {}", "Arbitrated".green().bold(), event_id.cyan());
        }

        Commands::Result { event_id } => {
            let world = World::load(&state_path).await?;
            let (status, outcome) = world.oracle.result_of(&event_id);
            println!("{}: {}", "Event".yellow().bold(), event_id.cyan());
            println!("{}: {}", "Status".yellow().bold(), status);
            match outcome {
                Some(side) => println!("{}: side {}", "Outcome".yellow().bold(), side),
                None => println!("{}: -", "Outcome".yellow().bold()),
            }
            if let Some(deadline) = world.oracle.deadline(&event_id) {
                println!("{}: {}", "Window closes".yellow().bold(), format_timestamp(deadline));
            }
        }

        Commands::Convert { usd, price } => {
            let usd = parse_units(&usd)?;
            let price = PriceReading::new(parse_units(&price)?, now);
            let native = usd_to_native(usd, &price).context("Conversion failed")?;
            println!(
                "{}: {} USD = {} native",
                "Conversion".green().bold(),
                format_units(usd).cyan(),
                format_units(native).yellow()
            );
        }
    }

    Ok(())
}

/// Print the full view of a market.
fn print_market(market: &Market, now: u64) {
    println!("{}", "═".repeat(50).bright_black());
    println!("{}: {}", "Market".yellow().bold(), market.address().to_string().cyan());
    println!("{}: {}", "Event".yellow().bold(), market.event_id());
    println!("{}: {}", "Token".yellow().bold(), market.token());
    println!("{}: {}", "Owner".yellow().bold(), market.owner());
    println!("{}: {}", "Start".yellow().bold(), format_timestamp(market.start_time()));
    match market.end_time() {
        Some(end) => println!("{}: {}", "End".yellow().bold(), format_timestamp(end)),
        None => println!("{}: -", "End".yellow().bold()),
    }
    println!("{}: {}", "State".yellow().bold(), market.state());
    for side in Side::ALL {
        let total = match side {
            Side::A => market.total_a(),
            Side::B => market.total_b(),
        };
        let odds = market
            .odds(side)
            .map(|o| format!("{o:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}: {} (odds {})",
            format!("Side {side}").yellow().bold(),
            format_units(total),
            odds
        );
    }
    if let Some(side) = market.winning_side() {
        println!("{}: side {}", "Winner".yellow().bold(), side);
    }
    if let (Some(a), Some(b)) = (market.score_a(), market.score_b()) {
        println!("{}: {} - {}", "Score".yellow().bold(), a, b);
    }
    println!("{}: {}", "Escrowed".yellow().bold(), format_units(market.escrowed()));
    println!("{}: {}", "Status".cyan().bold(), market.status_line(now));
    println!("{}", "═".repeat(50).bright_black());
}

/// Ask before an irreversible owner action unless `--yes` was given.
fn confirm(skip: bool, prompt: &str) -> Result<()> {
    if skip {
        return Ok(());
    }
    let confirmed = inquire::Confirm::new(prompt)
        .with_default(false)
        .prompt()
        .context("Confirmation prompt failed; pass --yes to skip it")?;
    if !confirmed {
        bail!("Aborted");
    }
    Ok(())
}

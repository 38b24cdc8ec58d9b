//! Swapper - Uniswap V3 swap client
//!
//! Run with: cargo run -- <command>
//!
//! Examples:
//!   cargo run -- quote --from WETH --to USDC --amount 1.5
//!   cargo run -- slippage set 0.8
//!   echo -e "1\n1.5\n2" | cargo run -- watch --from WETH --to USDC

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swapper::chains::{find_chain, swap_contracts, SupportedChain, DEFAULT_CHAIN, SUPPORTED_CHAINS};
use swapper::config::{Config, ExecutionMode};
use swapper::quote::{
    verify_endpoint, PoolCache, Quote, QuoteFetcher, QuoteRequest, QuoteScheduler, QuoteState,
    UniswapV3Reader,
};
use swapper::settings::SettingsStore;
use swapper::slippage::{parse_slippage, SLIPPAGE_PRESETS};
use swapper::swap::{
    ensure_balance, Erc20Reader, ExecutionResult, SwapExecutor, SwapFlow, SwapOutcome, TokenState,
    TokenTransactions, TransactionSender,
};
use swapper::tokens::{token_for_chain, tokens_for_chain, Token};
use swapper::units::{format_number, format_token_amount, parse_token_amount, to_token_units_f64};
use swapper::DexError;

#[derive(Parser)]
#[command(name = "swapper")]
#[command(version, about = "Uniswap V3 swap client with best-pool quoting and slippage protection")]
struct Cli {
    /// Load runtime configuration from a TOML file instead of the environment
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported networks
    Chains,

    /// List tokens on the active network
    Tokens,

    /// Switch the active network
    Network {
        /// Chain id (1, 10, 137, 8453, 42161)
        chain_id: u64,
    },

    /// Show or change slippage settings
    Slippage {
        #[command(subcommand)]
        action: Option<SlippageAction>,
    },

    /// Quote an exact-input swap
    Quote(PairArgs),

    /// Quote, build and submit an exact-input swap
    Swap {
        #[command(flatten)]
        pair: PairArgs,

        /// Seconds until the swap expires (max 300)
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Read amounts from stdin and keep the quote up to date
    Watch {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Wrap native currency into WETH
    Wrap { amount: String },

    /// Unwrap WETH into native currency
    Unwrap { amount: String },
}

#[derive(clap::Args)]
struct PairArgs {
    /// Input token symbol
    #[arg(long)]
    from: String,

    /// Output token symbol
    #[arg(long)]
    to: String,

    /// Input amount in whole tokens
    #[arg(long)]
    amount: String,
}

#[derive(Subcommand)]
enum SlippageAction {
    /// Current settings
    Show,
    /// Set the manual tolerance in percent
    Set { value: String },
    /// Toggle protected (auto) mode
    Protected { state: Toggle },
    /// List presets
    Presets,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!("{}", style(" 🦄 SWAPPER - Uniswap V3 Swap Client").cyan().bold());
    println!(
        "{}",
        style("    Best-Pool Quotes | Slippage Protection | exactInputSingle").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            // The key never lives in the file
            dotenvy::dotenv().ok();
            config.private_key = std::env::var("PRIVATE_KEY").ok().filter(|k| !k.is_empty());
            config
        }
        None => Config::from_env()?,
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file");
        return Err(e);
    }

    Ok(config)
}

fn build_fetcher(config: &Config, chain: SupportedChain) -> Result<Arc<QuoteFetcher>> {
    let contracts = swap_contracts(chain.id)?;
    let reader = Arc::new(
        UniswapV3Reader::new(config.rpc_url_for(chain.id).to_string(), contracts)
            .with_simulation_timeout(config.simulation_timeout()),
    );
    Ok(Arc::new(QuoteFetcher::new(
        reader.clone(),
        reader,
        PoolCache::new(config.pool_cache_ttl()),
    )))
}

fn resolve_pair(from: &str, to: &str, chain: SupportedChain) -> Result<(Token, Token)> {
    let token_in = token_for_chain(from, chain.id)?;
    let token_out = token_for_chain(to, chain.id)?;
    if token_in.address == token_out.address {
        return Err(eyre!("Input and output token must differ"));
    }
    Ok((token_in, token_out))
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());
    Ok(spinner)
}

fn print_quote(quote: &Quote, token_in: &Token, token_out: &Token) {
    let amount_in = to_token_units_f64(quote.amount_in, token_in.decimals);
    let amount_out = to_token_units_f64(quote.amount_out, token_out.decimals);

    println!(
        "{} {} {} → {} {}",
        style("✓").green(),
        format_number(amount_in, 6),
        token_in.symbol,
        style(format_number(amount_out, 6)).bold(),
        token_out.symbol
    );
    if amount_in > 0.0 {
        println!(
            "  Rate:  1 {} = {} {}",
            token_in.symbol,
            format_number(amount_out / amount_in, 6),
            token_out.symbol
        );
    }
    println!("  Pool:  {:?} (fee {})", quote.pool, quote.fee);
    println!(
        "  Pools: {} simulated, {} failed",
        quote.pools_considered, quote.failed_simulations
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("swapper=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    print_banner();

    let config = load_config(cli.config.as_deref())?;
    let fallback_chain = find_chain(config.chain_id).unwrap_or(DEFAULT_CHAIN);
    let mut store = SettingsStore::load_with_default_chain(&config.state_path, fallback_chain);
    let chain = store.active_chain();

    match cli.command {
        Commands::Chains => {
            for c in SUPPORTED_CHAINS {
                let marker = if c.id == chain.id { style("●").green() } else { style("○").dim() };
                println!("{} {:<10} {:>6}  {:<5} {}", marker, c.name, c.id, c.symbol, c.explorer);
            }
        }

        Commands::Tokens => {
            println!("Tokens on {}:", style(chain).bold());
            for token in tokens_for_chain(chain.id) {
                println!("  {:<5} {:?} ({} decimals)", token.symbol, token.address, token.decimals);
            }
        }

        Commands::Network { chain_id } => {
            let chain = store.set_active_chain(chain_id)?;
            println!("{} Active network: {}", style("✓").green(), style(chain).bold());
        }

        Commands::Slippage { action } => match action.unwrap_or(SlippageAction::Show) {
            SlippageAction::Show => {
                let settings = store.slippage();
                println!("  Slippage:       {}%", settings.slippage);
                println!(
                    "  Protected mode: {}",
                    if settings.protected_mode { "✓ On" } else { "✗ Off" }
                );
            }
            SlippageAction::Set { value } => {
                let (parsed, check) = parse_slippage(&value);
                let slippage = match parsed {
                    Some(slippage) if check.valid => slippage,
                    _ => {
                        if let Some(warning) = check.warning {
                            println!("{} {}", style("✗").red(), warning);
                        }
                        return Err(DexError::InvalidSlippage(parsed.unwrap_or(f64::NAN)).into());
                    }
                };

                let check = store.set_slippage(slippage)?;
                println!("{} Slippage set to {}%", style("✓").green(), slippage);
                if let Some(warning) = check.warning {
                    println!("{}", style(warning).yellow());
                }
            }
            SlippageAction::Protected { state } => {
                let enabled = matches!(state, Toggle::On);
                store.set_protected_mode(enabled)?;
                println!(
                    "{} Protected mode {}",
                    style("✓").green(),
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            SlippageAction::Presets => {
                for preset in SLIPPAGE_PRESETS {
                    println!("  {:<5} {}", preset.label, preset.description);
                }
            }
        },

        Commands::Quote(args) => {
            let (token_in, token_out) = resolve_pair(&args.from, &args.to, chain)?;
            let amount_in = parse_token_amount(&args.amount, token_in.decimals)?;
            let fetcher = build_fetcher(&config, chain)?;
            verify_endpoint(config.rpc_url_for(chain.id), chain).await?;

            let progress = spinner(&format!("Quoting {} → {} on {}...", token_in, token_out, chain.name))?;
            let result = fetcher
                .quote(&QuoteRequest {
                    token_in: token_in.clone(),
                    token_out: token_out.clone(),
                    amount_in,
                })
                .await;
            progress.finish_and_clear();

            match result {
                Ok(quote) => print_quote(&quote, &token_in, &token_out),
                Err(DexError::NoRoute { .. }) => {
                    println!("{} No path found for this token pair", style("✗").yellow());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Swap { pair, deadline_secs } => {
            config.print_summary();
            println!();

            let (token_in, token_out) = resolve_pair(&pair.from, &pair.to, chain)?;
            let amount_in = parse_token_amount(&pair.amount, token_in.decimals)?;
            let contracts = swap_contracts(chain.id)?;
            verify_endpoint(config.rpc_url_for(chain.id), chain).await?;
            let executor = SwapExecutor::from_config(&config, chain.id)?;

            let recipient = config
                .recipient
                .or_else(|| executor.sender())
                .ok_or_else(|| eyre!("Set RECIPIENT or PRIVATE_KEY to choose who receives the output"))?;
            let deadline = deadline_secs
                .map(|secs| chrono::Utc::now().timestamp().max(0) as u64 + secs);

            let mut flow = SwapFlow::new(
                build_fetcher(&config, chain)?,
                Arc::new(Erc20Reader::new(config.rpc_url_for(chain.id).to_string())),
                Box::new(executor),
                contracts.router,
            );

            let request = QuoteRequest {
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                amount_in,
            };
            let progress = spinner(&format!("Swapping {} → {} on {}...", token_in, token_out, chain.name))?;
            let outcome = flow.run(&request, &store.slippage(), recipient, deadline).await;
            progress.finish_and_clear();

            match outcome? {
                SwapOutcome::NoRoute => {
                    println!("{} No path found for this token pair", style("✗").yellow());
                }
                SwapOutcome::DryRun { quote, slippage, swap, approval_needed } => {
                    print_quote(&quote, &token_in, &token_out);
                    println!("  Slippage:   {}%", slippage);
                    println!(
                        "  Min out:    {} {}",
                        format_token_amount(swap.minimum_output, token_out.decimals),
                        token_out.symbol
                    );
                    println!("  Deadline:   {}", swap.deadline);
                    println!("  Router:     {:?}", swap.router);
                    println!("  Calldata:   0x{}", hex::encode(&swap.calldata));
                    match approval_needed {
                        Some(true) => println!("  Approval:   required before swapping"),
                        Some(false) => println!("  Approval:   allowance sufficient"),
                        None => println!("  Approval:   unknown (no wallet)"),
                    }
                    println!("{}", style("📋 DRY RUN - nothing was sent").yellow());
                }
                SwapOutcome::Confirmed { quote, swap, tx_hash, block, .. } => {
                    print_quote(&quote, &token_in, &token_out);
                    println!(
                        "  Min out:    {} {}",
                        format_token_amount(swap.minimum_output, token_out.decimals),
                        token_out.symbol
                    );
                    println!(
                        "{} Swap confirmed in block {}",
                        style("✅").green(),
                        block.map(|b| b.to_string()).unwrap_or_else(|| "?".into())
                    );
                    println!("  {}", chain.tx_url(tx_hash));
                }
                SwapOutcome::Failed { stage, tx_hash, reason } => {
                    println!("{} Transaction failed during {}", style("✗").red(), stage);
                    if let Some(hash) = tx_hash {
                        println!("  {}", chain.tx_url(hash));
                    }
                    return Err(DexError::Submission(reason).into());
                }
            }
        }

        Commands::Watch { from, to } => {
            let (token_in, token_out) = resolve_pair(&from, &to, chain)?;
            let scheduler = QuoteScheduler::new(build_fetcher(&config, chain)?, config.quote_debounce());
            verify_endpoint(config.rpc_url_for(chain.id), chain).await?;

            println!(
                "Enter {} amounts, one per line (empty line clears, Ctrl-D exits)",
                token_in.symbol
            );

            let mut rx = scheduler.subscribe();
            let (printer_in, printer_out) = (token_in.clone(), token_out.clone());
            let printer = tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let state = rx.borrow_and_update().clone();
                    print_state(&state, &printer_in, &printer_out);
                }
            });

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut last = None;
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                let request = if line.is_empty() {
                    None
                } else {
                    match parse_token_amount(line, token_in.decimals) {
                        Ok(amount_in) => Some(QuoteRequest {
                            token_in: token_in.clone(),
                            token_out: token_out.clone(),
                            amount_in,
                        }),
                        Err(e) => {
                            warn!("{}", e);
                            continue;
                        }
                    }
                };
                last = Some(scheduler.request(request).1);
            }

            if let Some(handle) = last {
                handle.await?;
            }
            printer.abort();
            info!("Watch finished after {} requests", scheduler.latest_seq());
        }

        Commands::Wrap { amount } => {
            let weth = token_for_chain("WETH", chain.id)?;
            let amount = parse_token_amount(&amount, weth.decimals)?;
            verify_endpoint(config.rpc_url_for(chain.id), chain).await?;
            let executor = SwapExecutor::from_config(&config, chain.id)?;
            let owner = executor.sender().or(config.recipient).ok_or_else(|| eyre!("Set PRIVATE_KEY or RECIPIENT"))?;

            if executor.mode() == ExecutionMode::Live {
                let balance = Erc20Reader::new(config.rpc_url_for(chain.id).to_string()).native_balance(owner).await?;
                ensure_balance(chain.symbol, 18, balance, amount)?;
            }

            let result = executor.execute("wrap", TokenTransactions::wrap(&weth, owner, amount)).await?;
            print_execution(&result, chain);
        }

        Commands::Unwrap { amount } => {
            let weth = token_for_chain("WETH", chain.id)?;
            let amount = parse_token_amount(&amount, weth.decimals)?;
            verify_endpoint(config.rpc_url_for(chain.id), chain).await?;
            let executor = SwapExecutor::from_config(&config, chain.id)?;
            let owner = executor.sender().or(config.recipient).ok_or_else(|| eyre!("Set PRIVATE_KEY or RECIPIENT"))?;

            if executor.mode() == ExecutionMode::Live {
                let balance = Erc20Reader::new(config.rpc_url_for(chain.id).to_string()).balance_of(&weth, owner).await?;
                ensure_balance(weth.symbol, weth.decimals, balance, amount)?;
            }

            let result = executor.execute("unwrap", TokenTransactions::unwrap(&weth, owner, amount)).await?;
            print_execution(&result, chain);
        }
    }

    Ok(())
}

fn print_state(state: &QuoteState, token_in: &Token, token_out: &Token) {
    match state {
        QuoteState::Idle => println!("{}", style("  -").dim()),
        QuoteState::Quoting { seq } => println!("{} #{} quoting...", style("…").cyan(), seq),
        QuoteState::Quoted { quote, .. } => print_quote(quote, token_in, token_out),
        QuoteState::NoRoute { seq } => {
            println!("{} #{} No path found for this token pair", style("✗").yellow(), seq)
        }
        QuoteState::Failed { seq, error } => println!("{} #{} {}", style("✗").red(), seq, error),
    }
}

fn print_execution(result: &ExecutionResult, chain: SupportedChain) {
    match result {
        ExecutionResult::DryRun { to, value, calldata_len } => {
            println!(
                "{} Would send {} wei to {:?} ({} bytes calldata)",
                style("📋").yellow(),
                value,
                to,
                calldata_len
            );
        }
        ExecutionResult::Confirmed { tx_hash, block } => {
            println!("{} Confirmed in block {:?}", style("✅").green(), block);
            println!("  {}", chain.tx_url(tx_hash));
        }
        ExecutionResult::Failed { tx_hash, reason } => {
            println!("{} Failed: {}", style("✗").red(), reason);
            if let Some(hash) = tx_hash {
                println!("  {}", chain.tx_url(hash));
            }
        }
    }
}

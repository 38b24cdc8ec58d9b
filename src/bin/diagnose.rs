//! Diagnostic tool - Check connectivity and contract deployment
//!
//! Run with: cargo run --bin diagnose

use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder};
use eyre::Result;
use std::env;

use swapper::chains::{contract_addresses, find_chain, DEFAULT_CHAIN};
use swapper::config::Config;
use swapper::settings::SettingsStore;

#[tokio::main]
async fn main() -> Result<()> {
    println!("🔍 SWAPPER DIAGNOSTIC CHECK\n");

    let config = Config::from_env()?;

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("EXECUTION_MODE", "dry_run", "Are transactions sent?"),
        ("CHAIN_ID", "1", "Network used when nothing is persisted"),
        ("STATE_PATH", "./swapper-state.json", "Persisted slippage and network"),
        ("QUOTE_DEBOUNCE_MS", "500", "Quiet period before quoting"),
        ("SIMULATION_TIMEOUT_MS", "5000", "Per-pool quoter timeout"),
        ("RECEIPT_TIMEOUT_SECS", "120", "Wait for confirmation"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    let rpc = &config.rpc_url;
    let rpc_display = if rpc.len() > 50 {
        format!("{}...{}", &rpc[..30], &rpc[rpc.len() - 15..])
    } else {
        rpc.clone()
    };
    println!("  RPC_URL: {}", rpc_display);
    println!("  PRIVATE_KEY: {}", if config.private_key.is_some() { "✅ Set" } else { "❌ Not set" });
    println!("  RECIPIENT:   {}", if config.recipient.is_some() { "✅ Set" } else { "➖ Signer address" });

    if let Err(e) = config.validate() {
        println!("\n  ⚠️  {}", e);
    }

    let fallback = find_chain(config.chain_id).unwrap_or(DEFAULT_CHAIN);
    let store = SettingsStore::load_with_default_chain(&config.state_path, fallback);
    let chain = store.active_chain();
    let slippage = store.slippage();

    println!("\n═══════════════════════════════════════════════════");
    println!("                  PERSISTED STATE                   ");
    println!("═══════════════════════════════════════════════════\n");

    println!("  Active network: {}", chain);
    println!("  Slippage:       {}%", slippage.slippage);
    println!("  Protected mode: {}", if slippage.protected_mode { "on" } else { "off" });

    println!("\n═══════════════════════════════════════════════════");
    println!("                  RPC CONNECTIVITY                  ");
    println!("═══════════════════════════════════════════════════\n");

    let endpoint = config.rpc_url_for(chain.id);
    if endpoint != config.rpc_url {
        println!("  Endpoint:     RPC_URL_{}", chain.id);
    }
    let provider = ProviderBuilder::new().connect_http(endpoint.parse()?);

    match provider.get_chain_id().await {
        Ok(id) if id == chain.id => println!("  Chain ID:     ✅ {}", id),
        Ok(id) => {
            println!("  Chain ID:     ❌ RPC is on chain {} but the active network is {}", id, chain);
            println!(
                "     → Set RPC_URL_{} to a {} endpoint or run `swapper network {}`",
                chain.id, chain.name, id
            );
        }
        Err(e) => {
            println!("  Chain ID:     ❌ {}", e);
            println!("\n❌ RPC unreachable, skipping contract checks\n");
            return Ok(());
        }
    }

    match provider.get_block_number().await {
        Ok(block) => println!("  Latest block: ✅ {}", block),
        Err(e) => println!("  Latest block: ❌ {}", e),
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                  DEX CONTRACTS                     ");
    println!("═══════════════════════════════════════════════════\n");

    let contracts = contract_addresses(chain.id)?;
    if !contracts.v1_interfaces {
        println!("  ⚠️  Router/quoter here are not SwapRouter / Quoter V1, quoting and swapping are disabled\n");
    }
    let targets: [(&str, Address); 4] = [
        ("Factory", contracts.factory),
        ("Quoter", contracts.quoter),
        ("SwapRouter", contracts.router),
        ("UniversalRouter", contracts.universal_router),
    ];

    for (name, address) in targets {
        match provider.get_code_at(address).await {
            Ok(code) if !code.is_empty() => {
                println!("  {:<16} ✅ {:?} ({} bytes)", name, address, code.len())
            }
            Ok(_) => println!("  {:<16} ❌ {:?} has no code", name, address),
            Err(e) => println!("  {:<16} ❌ {}", name, e),
        }
    }

    println!("\n✅ Diagnostic complete!\n");
    Ok(())
}

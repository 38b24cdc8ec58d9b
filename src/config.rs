//! Runtime configuration for the swapper
//!
//! Network endpoint, signing key and timing knobs. User preferences
//! (slippage, active chain) live in the settings store instead.

use alloy_primitives::Address;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::chains::{is_supported, ETHEREUM, SUPPORTED_CHAINS};
use crate::swap::MAX_DEADLINE_SECS;

// ============================================
// EXECUTION MODE
// ============================================

/// Whether transactions are actually sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Quote and build transactions, print them, never send
    DryRun,

    /// Sign with PRIVATE_KEY and send
    /// CAUTION: This uses real funds!
    Live,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::DryRun
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::DryRun => write!(f, "DRY_RUN"),
            ExecutionMode::Live => write!(f, "LIVE"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dry_run" | "dryrun" => Ok(ExecutionMode::DryRun),
            "live" => Ok(ExecutionMode::Live),
            other => Err(eyre::eyre!("Unknown EXECUTION_MODE '{}' (expected dry_run or live)", other)),
        }
    }
}

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // ========== Network ==========
    /// JSON-RPC endpoint used for chains without their own entry
    pub rpc_url: String,

    /// Per-chain endpoints (`RPC_URL_<CHAIN_ID>`), keyed by chain id
    #[serde(default)]
    pub chain_rpc_urls: BTreeMap<String, String>,

    /// Chain used when nothing is persisted yet
    pub chain_id: u64,

    // ========== Persistence ==========
    /// Settings file (slippage, active chain)
    pub state_path: String,

    // ========== Execution ==========
    pub execution_mode: ExecutionMode,

    /// Signing key for live mode. Never written to disk.
    #[serde(skip_serializing, default)]
    pub private_key: Option<String>,

    /// Swap output recipient; defaults to the signer address
    pub recipient: Option<Address>,

    // ========== Timing ==========
    /// Quiet period before a changed input is quoted
    pub quote_debounce_ms: u64,

    pub pool_cache_ttl_secs: u64,

    /// Per-pool quoter call limit
    pub simulation_timeout_ms: u64,

    pub receipt_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            rpc_url: env::var("RPC_URL").unwrap_or(defaults.rpc_url),
            chain_rpc_urls: SUPPORTED_CHAINS
                .iter()
                .filter_map(|chain| {
                    env::var(format!("RPC_URL_{}", chain.id))
                        .ok()
                        .filter(|url| !url.is_empty())
                        .map(|url| (chain.id.to_string(), url))
                })
                .collect(),
            chain_id: parse_chain_id(env::var("CHAIN_ID").ok())?,

            state_path: env::var("STATE_PATH").unwrap_or(defaults.state_path),

            execution_mode: match env::var("EXECUTION_MODE") {
                Ok(mode) => mode.parse()?,
                Err(_) => ExecutionMode::DryRun,
            },
            private_key: env::var("PRIVATE_KEY").ok().filter(|k| !k.is_empty()),
            recipient: parse_recipient(env::var("RECIPIENT").ok())?,

            quote_debounce_ms: env::var("QUOTE_DEBOUNCE_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(defaults.quote_debounce_ms),
            pool_cache_ttl_secs: env::var("POOL_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap_or(defaults.pool_cache_ttl_secs),
            simulation_timeout_ms: env::var("SIMULATION_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(defaults.simulation_timeout_ms),
            receipt_timeout_secs: env::var("RECEIPT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(defaults.receipt_timeout_secs),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file (without the private key)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Endpoint for `chain_id`, falling back to `rpc_url`
    pub fn rpc_url_for(&self, chain_id: u64) -> &str {
        self.chain_rpc_urls
            .get(&chain_id.to_string())
            .map(String::as_str)
            .unwrap_or(&self.rpc_url)
    }

    pub fn quote_debounce(&self) -> Duration {
        Duration::from_millis(self.quote_debounce_ms)
    }

    pub fn pool_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.pool_cache_ttl_secs)
    }

    pub fn simulation_timeout(&self) -> Duration {
        Duration::from_millis(self.simulation_timeout_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() || self.rpc_url.contains("YOUR_API_KEY") {
            return Err(eyre::eyre!("Invalid RPC_URL - please set a valid endpoint"));
        }

        if !is_supported(self.chain_id) {
            return Err(eyre::eyre!("CHAIN_ID {} is not a supported chain", self.chain_id));
        }

        if self.execution_mode == ExecutionMode::Live && self.private_key.is_none() {
            return Err(eyre::eyre!("Live mode requires PRIVATE_KEY"));
        }

        if self.simulation_timeout_ms == 0 || self.receipt_timeout_secs == 0 {
            return Err(eyre::eyre!("Timeouts must be greater than zero"));
        }

        // A swap deadline is at most MAX_DEADLINE_SECS away
        if self.receipt_timeout_secs > MAX_DEADLINE_SECS {
            return Err(eyre::eyre!(
                "RECEIPT_TIMEOUT_SECS must be at most {} (got {})",
                MAX_DEADLINE_SECS,
                self.receipt_timeout_secs
            ));
        }

        for (chain_id, url) in &self.chain_rpc_urls {
            let supported = chain_id.parse::<u64>().map(is_supported).unwrap_or(false);
            if !supported || url.is_empty() {
                return Err(eyre::eyre!("Invalid RPC_URL_{} entry", chain_id));
            }
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║                 SWAPPER - CONFIGURATION                    ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Execution Mode:    {:^40} ║", self.execution_mode);
        println!("║ Default Chain:     {:^40} ║", self.chain_id);
        println!("║ Chain Endpoints:   {:^40} ║",
            if self.chain_rpc_urls.is_empty() {
                "RPC_URL only".to_string()
            } else {
                self.chain_rpc_urls.keys().cloned().collect::<Vec<_>>().join(", ")
            }
        );
        println!("║ State File:        {:^40} ║", self.state_path);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ WALLET                                                     ║");
        println!("║ • Signer Key:      {:^40} ║",
            if self.private_key.is_some() { "✓ Configured" } else { "✗ Not Set" }
        );
        println!("║ • Recipient:       {:^40} ║",
            self.recipient.map(|a| format!("{:?}", a)).unwrap_or_else(|| "signer".to_string())
        );
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ TIMING                                                     ║");
        println!("║ • Quote Debounce:  {:>37} ms ║", self.quote_debounce_ms);
        println!("║ • Pool Cache TTL:  {:>38} s ║", self.pool_cache_ttl_secs);
        println!("║ • Quote Timeout:   {:>37} ms ║", self.simulation_timeout_ms);
        println!("║ • Receipt Timeout: {:>38} s ║", self.receipt_timeout_secs);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

/// Unset means Ethereum; set but not a number is an error
fn parse_chain_id(raw: Option<String>) -> Result<u64> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(ETHEREUM),
        Some(value) => value
            .parse()
            .map_err(|_| eyre::eyre!("CHAIN_ID '{}' is not a chain id", value)),
    }
}

/// Unset means "send to the signer"; set but malformed is an error
fn parse_recipient(raw: Option<String>) -> Result<Option<Address>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Address::from_str(value)
            .map(Some)
            .map_err(|e| eyre::eyre!("RECIPIENT '{}' is not an address: {}", value, e)),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "https://eth.llamarpc.com".to_string(),
            chain_rpc_urls: BTreeMap::new(),
            chain_id: ETHEREUM,
            state_path: "./swapper-state.json".to_string(),
            execution_mode: ExecutionMode::DryRun,
            private_key: None,
            recipient: None,
            quote_debounce_ms: 500,
            pool_cache_ttl_secs: 600,
            simulation_timeout_ms: 5_000,
            receipt_timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.execution_mode, ExecutionMode::DryRun);
        assert_eq!(config.quote_debounce(), Duration::from_millis(500));
        assert_eq!(config.pool_cache_ttl(), Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_live_mode_requires_key() {
        let mut config = Config {
            execution_mode: ExecutionMode::Live,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.private_key = Some("0x01".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_chain_rejected() {
        let config = Config {
            chain_id: 56,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_execution_mode_parsing() {
        assert_eq!("live".parse::<ExecutionMode>().unwrap(), ExecutionMode::Live);
        assert_eq!("DRY_RUN".parse::<ExecutionMode>().unwrap(), ExecutionMode::DryRun);
        assert!("production".parse::<ExecutionMode>().is_err());
        assert_eq!(ExecutionMode::Live.to_string(), "LIVE");
    }

    #[test]
    fn test_toml_round_trip_omits_private_key() {
        let mut config = Config {
            private_key: Some("secret".into()),
            recipient: Some(Address::repeat_byte(7)),
            ..Config::default()
        };
        config
            .chain_rpc_urls
            .insert("8453".into(), "https://mainnet.base.org".into());
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("swapper.toml");
        config.save_to_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("secret"));

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.private_key, None);
        assert_eq!(loaded.recipient, config.recipient);
        assert_eq!(loaded.execution_mode, ExecutionMode::DryRun);
        assert_eq!(loaded.rpc_url_for(8453), "https://mainnet.base.org");
    }

    #[test]
    fn test_malformed_recipient_is_an_error() {
        assert!(parse_recipient(Some("0xNOT_AN_ADDRESS".into())).is_err());
        assert!(parse_recipient(Some("0x1234".into())).is_err());
        assert_eq!(parse_recipient(None).unwrap(), None);
        assert_eq!(parse_recipient(Some(" ".into())).unwrap(), None);
        assert_eq!(
            parse_recipient(Some("0x0707070707070707070707070707070707070707".into())).unwrap(),
            Some(Address::repeat_byte(7))
        );
    }

    #[test]
    fn test_from_env_rejects_mistyped_recipient() {
        // Only test touching RECIPIENT
        env::set_var("RECIPIENT", "0xNOT_AN_ADDRESS");
        let result = Config::from_env();
        env::remove_var("RECIPIENT");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("RECIPIENT"));
    }

    #[test]
    fn test_malformed_chain_id_is_an_error() {
        assert!(parse_chain_id(Some("abc".into())).is_err());
        assert!(parse_chain_id(Some("-1".into())).is_err());
        assert_eq!(parse_chain_id(None).unwrap(), ETHEREUM);
        assert_eq!(parse_chain_id(Some("8453".into())).unwrap(), 8453);
    }

    #[test]
    fn test_rpc_url_per_chain() {
        let mut config = Config::default();
        config
            .chain_rpc_urls
            .insert("10".into(), "https://mainnet.optimism.io".into());

        assert_eq!(config.rpc_url_for(10), "https://mainnet.optimism.io");
        assert_eq!(config.rpc_url_for(8453), config.rpc_url);
        assert!(config.validate().is_ok());

        config.chain_rpc_urls.insert("56".into(), "https://bsc".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_receipt_timeout_bounded_by_swap_deadline() {
        let mut config = Config {
            receipt_timeout_secs: MAX_DEADLINE_SECS,
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        config.receipt_timeout_secs = MAX_DEADLINE_SECS + 1;
        assert!(config.validate().is_err());
    }
}

//! Persisted client state
//!
//! A small key-value JSON file standing in for browser local storage.
//! Loaded once at start, rewritten whole after every change.
//!
//! Keys:
//! - `dex-slippage-settings` → `{ "slippage": 0.5, "protectedMode": false }`
//! - `activeChain` → chain id

use eyre::Result;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::chains::{find_chain, SupportedChain, DEFAULT_CHAIN};
use crate::error::DexResult;
use crate::slippage::{validate_slippage, SlippageCheck, SlippageSettings};

pub const SLIPPAGE_KEY: &str = "dex-slippage-settings";
pub const ACTIVE_CHAIN_KEY: &str = "activeChain";

/// In-memory view of the persisted state plus the file it lives in
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    slippage: SlippageSettings,
    active_chain: SupportedChain,
}

impl SettingsStore {
    /// Load from disk. Missing file or bad entries fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        Self::load_with_default_chain(path, DEFAULT_CHAIN)
    }

    /// Load, using `default_chain` when no valid chain is stored
    pub fn load_with_default_chain<P: AsRef<Path>>(path: P, default_chain: SupportedChain) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            path,
            slippage: SlippageSettings::default(),
            active_chain: default_chain,
        };

        let entries = match fs::read_to_string(&store.path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring unreadable settings file {:?}: {}", store.path, e);
                    return store;
                }
            },
            Err(_) => {
                debug!("No settings file at {:?}, using defaults", store.path);
                return store;
            }
        };

        if let Some(value) = entries.get(SLIPPAGE_KEY) {
            store.slippage = parse_slippage_entry(value);
        }

        if let Some(value) = entries.get(ACTIVE_CHAIN_KEY) {
            match value.as_u64().and_then(find_chain) {
                Some(chain) => store.active_chain = chain,
                None => warn!("Stored chain {} is not supported, using {}", value, default_chain),
            }
        }

        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slippage(&self) -> SlippageSettings {
        self.slippage
    }

    pub fn active_chain(&self) -> SupportedChain {
        self.active_chain
    }

    /// Validate, apply and persist a manual slippage
    pub fn set_slippage(&mut self, slippage: f64) -> Result<SlippageCheck> {
        let mut next = self.clone();
        let check = next.slippage.set_slippage(slippage)?;
        self.commit(next)?;
        Ok(check)
    }

    pub fn set_protected_mode(&mut self, enabled: bool) -> Result<()> {
        let mut next = self.clone();
        next.slippage.set_protected_mode(enabled);
        self.commit(next)
    }

    /// Switch network; unsupported ids are rejected and nothing is saved
    pub fn set_active_chain(&mut self, chain_id: u64) -> Result<SupportedChain> {
        let mut next = self.clone();
        next.active_chain = resolve_chain(chain_id)?;
        self.commit(next)?;
        Ok(self.active_chain)
    }

    /// Memory only follows disk: `next` replaces `self` once it is written
    fn commit(&mut self, next: SettingsStore) -> Result<()> {
        next.save()?;
        *self = next;
        Ok(())
    }

    /// Write the whole store back to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut entries = Map::new();
        entries.insert(SLIPPAGE_KEY.to_string(), serde_json::to_value(self.slippage)?);
        entries.insert(ACTIVE_CHAIN_KEY.to_string(), Value::from(self.active_chain.id));

        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

fn resolve_chain(chain_id: u64) -> DexResult<SupportedChain> {
    find_chain(chain_id).ok_or(crate::error::DexError::UnsupportedChain(chain_id))
}

/// Field-wise: a wrong-typed field keeps its default, the rest still loads
fn parse_slippage_entry(value: &Value) -> SlippageSettings {
    let mut settings = SlippageSettings::default();

    match value.get("slippage").and_then(Value::as_f64) {
        Some(slippage) if validate_slippage(slippage).valid => settings.slippage = slippage,
        Some(slippage) => warn!("Stored slippage {} is out of range, using default", slippage),
        None => {}
    }

    if let Some(protected) = value.get("protectedMode").and_then(Value::as_bool) {
        settings.protected_mode = protected;
    }

    settings
}

//! Supported networks and Uniswap V3 contract addresses per chain
//!
//! Lookups by unknown chain id fail with `DexError::UnsupportedChain`.

use alloy_primitives::{Address, address};

use crate::error::{DexError, DexResult};

// ============================================
// SUPPORTED CHAINS
// ============================================

/// A network the client can quote and swap on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedChain {
    pub id: u64,
    pub name: &'static str,
    /// Native gas token symbol
    pub symbol: &'static str,
    pub explorer: &'static str,
}

pub const ETHEREUM: u64 = 1;
pub const OPTIMISM: u64 = 10;
pub const POLYGON: u64 = 137;
pub const BASE: u64 = 8453;
pub const ARBITRUM: u64 = 42161;

pub const SUPPORTED_CHAINS: [SupportedChain; 5] = [
    SupportedChain {
        id: ETHEREUM,
        name: "Ethereum",
        symbol: "ETH",
        explorer: "https://etherscan.io",
    },
    SupportedChain {
        id: POLYGON,
        name: "Polygon",
        symbol: "MATIC",
        explorer: "https://polygonscan.com",
    },
    SupportedChain {
        id: OPTIMISM,
        name: "Optimism",
        symbol: "ETH",
        explorer: "https://optimistic.etherscan.io",
    },
    SupportedChain {
        id: ARBITRUM,
        name: "Arbitrum",
        symbol: "ETH",
        explorer: "https://arbiscan.io",
    },
    SupportedChain {
        id: BASE,
        name: "Base",
        symbol: "ETH",
        explorer: "https://basescan.org",
    },
];

pub const DEFAULT_CHAIN: SupportedChain = SUPPORTED_CHAINS[0];

impl SupportedChain {
    /// Explorer link for a transaction hash
    pub fn tx_url(&self, tx_hash: impl std::fmt::Display) -> String {
        format!("{}/tx/{}", self.explorer, tx_hash)
    }
}

impl std::fmt::Display for SupportedChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

pub fn find_chain(chain_id: u64) -> Option<SupportedChain> {
    SUPPORTED_CHAINS.iter().copied().find(|c| c.id == chain_id)
}

pub fn is_supported(chain_id: u64) -> bool {
    find_chain(chain_id).is_some()
}

/// The endpoint must serve the network the user selected
pub fn ensure_endpoint_chain(endpoint_chain_id: u64, active: SupportedChain) -> DexResult<()> {
    if endpoint_chain_id != active.id {
        return Err(DexError::ChainMismatch {
            expected: active.id,
            actual: endpoint_chain_id,
        });
    }
    Ok(())
}

// ============================================
// DEX CONTRACTS
// ============================================

/// The four Uniswap V3 contracts the client talks to on one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DexContracts {
    /// SwapRouter (exactInputSingle)
    pub router: Address,
    /// Universal Router V1.2
    pub universal_router: Address,
    pub factory: Address,
    /// Quoter (V1 ABI on the L1-style deployments)
    pub quoter: Address,
    /// `router` speaks SwapRouter `exactInputSingle` and `quoter` the V1
    /// `quoteExactInputSingle`. False on Base, whose entries are the
    /// Universal Router and a QuoterV2.
    pub v1_interfaces: bool,
}

impl DexContracts {
    /// Fail unless quoting and swapping can use the V1 ABIs
    pub fn require_v1(self, chain_id: u64) -> DexResult<Self> {
        if !self.v1_interfaces {
            return Err(DexError::IncompatibleContracts(chain_id));
        }
        Ok(self)
    }
}

/// SwapRouter, factory and quoter share one address on these chains
const CANONICAL_ROUTER: Address = address!("E592427A0AEce92De3Edee1F18E0157C05861564");
const CANONICAL_FACTORY: Address = address!("1F98431c8aD98523631AE4a59f267346ea31F984");
const CANONICAL_QUOTER: Address = address!("b27308f9F90D607463bb33eA1BeBb41C27CE5AB6");

/// Contracts for quoting and `exactInputSingle` swaps on `chain_id`
pub fn swap_contracts(chain_id: u64) -> DexResult<DexContracts> {
    contract_addresses(chain_id)?.require_v1(chain_id)
}

/// Resolve DEX contract addresses for a chain
pub fn contract_addresses(chain_id: u64) -> DexResult<DexContracts> {
    let contracts = match chain_id {
        ETHEREUM => DexContracts {
            router: CANONICAL_ROUTER,
            universal_router: address!("3fC91A3afd70395Cd496C647d5a6CC9D4B2b7FAD"),
            factory: CANONICAL_FACTORY,
            quoter: CANONICAL_QUOTER,
            v1_interfaces: true,
        },
        OPTIMISM => DexContracts {
            router: CANONICAL_ROUTER,
            universal_router: address!("Cb1355ff08Ab38bBCE60111F1bb2B784bE25D7e8"),
            factory: CANONICAL_FACTORY,
            quoter: CANONICAL_QUOTER,
            v1_interfaces: true,
        },
        POLYGON => DexContracts {
            router: CANONICAL_ROUTER,
            universal_router: address!("4C60051384bd2d3C01bfc845Cf5F4b44bcbE9de5"),
            factory: CANONICAL_FACTORY,
            quoter: CANONICAL_QUOTER,
            v1_interfaces: true,
        },
        ARBITRUM => DexContracts {
            router: CANONICAL_ROUTER,
            universal_router: address!("5E325eDA8064b456f4781070C0738d849c824258"),
            factory: CANONICAL_FACTORY,
            quoter: CANONICAL_QUOTER,
            v1_interfaces: true,
        },
        BASE => DexContracts {
            router: address!("3fC91A3afd70395Cd496C647d5a6CC9D4B2b7FAD"),
            universal_router: address!("3fC91A3afd70395Cd496C647d5a6CC9D4B2b7FAD"),
            factory: address!("33128a8fC17869897dcE68Ed026d694621f6FDfD"),
            quoter: address!("3d4e44Eb1374240CE5F1B871ab261CD16335B76a"),
            v1_interfaces: false,
        },
        other => return Err(DexError::UnsupportedChain(other)),
    };

    Ok(contracts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_chain_has_contracts() {
        for chain in SUPPORTED_CHAINS {
            assert!(contract_addresses(chain.id).is_ok(), "{}", chain);
        }
    }

    #[test]
    fn test_unknown_chain_is_config_error() {
        let err = contract_addresses(5).unwrap_err();
        assert_eq!(err, DexError::UnsupportedChain(5));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_base_uses_own_factory() {
        let base = contract_addresses(BASE).unwrap();
        let mainnet = contract_addresses(ETHEREUM).unwrap();
        assert_ne!(base.factory, mainnet.factory);
        assert_eq!(mainnet.router, contract_addresses(ARBITRUM).unwrap().router);
    }

    #[test]
    fn test_base_is_not_swappable_with_v1_abis() {
        assert!(contract_addresses(BASE).is_ok());
        let err = swap_contracts(BASE).unwrap_err();
        assert_eq!(err, DexError::IncompatibleContracts(BASE));
        assert!(err.is_configuration());

        for chain in [ETHEREUM, OPTIMISM, POLYGON, ARBITRUM] {
            assert_eq!(swap_contracts(chain).unwrap().router, CANONICAL_ROUTER);
        }
    }

    #[test]
    fn test_endpoint_chain_must_match_active() {
        let base = find_chain(BASE).unwrap();
        assert!(ensure_endpoint_chain(BASE, base).is_ok());

        let err = ensure_endpoint_chain(ETHEREUM, base).unwrap_err();
        assert_eq!(
            err,
            DexError::ChainMismatch {
                expected: BASE,
                actual: ETHEREUM,
            }
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_find_chain() {
        assert_eq!(find_chain(137).map(|c| c.name), Some("Polygon"));
        assert!(!is_supported(56));
        assert_eq!(DEFAULT_CHAIN.id, ETHEREUM);
        assert_eq!(
            DEFAULT_CHAIN.tx_url("0xabc"),
            "https://etherscan.io/tx/0xabc"
        );
    }
}

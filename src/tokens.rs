//! Token registry
//!
//! Each token is configured once with its per-chain contract addresses and
//! resolved into a concrete `Token` for the active chain at lookup time.

use alloy_primitives::{Address, address};

use crate::chains::{ARBITRUM, BASE, ETHEREUM, OPTIMISM, POLYGON};
use crate::error::{DexError, DexResult};

/// A token resolved for one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
    pub image: &'static str,
    pub chain_id: u64,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Multichain token configuration
#[derive(Debug, Clone, Copy)]
pub struct TokenConfig {
    /// Registry key (lowercase)
    pub key: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub image: &'static str,
    pub addresses: &'static [(u64, Address)],
}

impl TokenConfig {
    /// Resolve for a chain. Chains without a deployment fall back to the
    /// Ethereum address.
    pub fn for_chain(&self, chain_id: u64) -> Token {
        let address = self
            .address_on(chain_id)
            .or_else(|| self.address_on(ETHEREUM))
            .unwrap_or(Address::ZERO);

        Token {
            symbol: self.symbol,
            address,
            decimals: self.decimals,
            image: self.image,
            chain_id,
        }
    }

    pub fn address_on(&self, chain_id: u64) -> Option<Address> {
        self.addresses
            .iter()
            .find(|(id, _)| *id == chain_id)
            .map(|(_, addr)| *addr)
    }
}

// ============================================
// REGISTRY
// ============================================

pub const WETH: TokenConfig = TokenConfig {
    key: "weth",
    symbol: "WETH",
    decimals: 18,
    image: "https://assets.coingecko.com/coins/images/2518/standard/weth.png?1696503332",
    addresses: &[
        (ETHEREUM, address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")),
        (OPTIMISM, address!("4200000000000000000000000000000000000006")),
        (POLYGON, address!("7ceB23fD6bC0adD59E62ac25578270cFf1b9f619")),
        (BASE, address!("4200000000000000000000000000000000000006")),
        (ARBITRUM, address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1")),
    ],
};

pub const WBTC: TokenConfig = TokenConfig {
    key: "wbtc",
    symbol: "WBTC",
    decimals: 8,
    image: "/native-token-icons/wbtc.svg",
    addresses: &[
        (ETHEREUM, address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599")),
        (OPTIMISM, address!("68f180fcce6836688e9084f035309e29bf0a2095")),
        (POLYGON, address!("1bfd67037b42cf73acf2047067bd4f2c47d9bfd6")),
        (BASE, address!("0555E30da8f98308EdB960aa94C0Db47230d2B9c")),
        (ARBITRUM, address!("2f2a2543B76A4166549F7aaB2e75Bef0aefC5B0f")),
    ],
};

pub const USDC: TokenConfig = TokenConfig {
    key: "usdc",
    symbol: "USDC",
    decimals: 6,
    image: "https://assets.coingecko.com/coins/images/6319/standard/usdc.png?1696506694",
    addresses: &[
        (ETHEREUM, address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")),
        (OPTIMISM, address!("0b2C639c533813f4Aa9D7837CAf62653d097Ff85")),
        (POLYGON, address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359")),
        (BASE, address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913")),
        (ARBITRUM, address!("af88d065e77c8cC2239327C5EDb3A432268e5831")),
    ],
};

pub const USDT: TokenConfig = TokenConfig {
    key: "usdt",
    symbol: "USDT",
    decimals: 6,
    image: "https://assets.coingecko.com/coins/images/325/standard/Tether.png?1696501661",
    addresses: &[
        (ETHEREUM, address!("dac17f958d2ee523a2206206994597c13d831ec7")),
        (OPTIMISM, address!("94b008aA00579c1307B0EF2c499aD98a8ce58e58")),
        (POLYGON, address!("c2132D05D31c914a87C6611C10748AEb04B58e8F")),
        (BASE, address!("fde4C96c8593536E31F229EA8f37b2ADa2699bb2")),
        (ARBITRUM, address!("Fd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9")),
    ],
};

pub const TOKENS: [TokenConfig; 4] = [WETH, WBTC, USDC, USDT];

/// Find a token config by registry key or symbol (case-insensitive)
pub fn find_token(name: &str) -> DexResult<&'static TokenConfig> {
    TOKENS
        .iter()
        .find(|t| t.key.eq_ignore_ascii_case(name) || t.symbol.eq_ignore_ascii_case(name))
        .ok_or_else(|| DexError::UnknownToken(name.to_string()))
}

/// Resolve a token by key or symbol for a chain
pub fn token_for_chain(name: &str, chain_id: u64) -> DexResult<Token> {
    find_token(name).map(|config| config.for_chain(chain_id))
}

/// All registry tokens resolved for a chain
pub fn tokens_for_chain(chain_id: u64) -> Vec<Token> {
    TOKENS.iter().map(|t| t.for_chain(chain_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(find_token("usdc").unwrap().symbol, "USDC");
        assert_eq!(find_token("WeTh").unwrap().decimals, 18);
        assert!(matches!(find_token("DOGE"), Err(DexError::UnknownToken(_))));
    }

    #[test]
    fn test_resolves_per_chain_address() {
        let base_weth = token_for_chain("weth", BASE).unwrap();
        let op_weth = token_for_chain("weth", OPTIMISM).unwrap();
        let eth_weth = token_for_chain("weth", ETHEREUM).unwrap();

        assert_eq!(base_weth.address, op_weth.address);
        assert_ne!(base_weth.address, eth_weth.address);
        assert_eq!(base_weth.chain_id, BASE);
    }

    #[test]
    fn test_unknown_chain_falls_back_to_mainnet() {
        let usdt = token_for_chain("usdt", 56).unwrap();
        assert_eq!(usdt.address, USDT.address_on(ETHEREUM).unwrap());
    }

    #[test]
    fn test_every_token_on_every_chain() {
        for chain in crate::chains::SUPPORTED_CHAINS {
            for token in tokens_for_chain(chain.id) {
                assert_ne!(token.address, Address::ZERO);
                assert_eq!(TOKENS.iter().filter(|t| t.symbol == token.symbol).count(), 1);
            }
        }
    }
}

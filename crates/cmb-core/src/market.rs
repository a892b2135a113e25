use async_trait::async_trait;

use crate::Result;

/// One symbol-search hit from the market-data backend.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolHit {
    pub address: String,
    pub symbol: Option<String>,
    pub name: Option<String>,
}

/// Live market figures for a token address (all USD).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarketStats {
    pub price: f64,
    pub market_cap: f64,
    pub liquidity: f64,
    pub volume_24h: f64,
}

/// Hexagonal port for token market data (Birdeye today).
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Search tokens by symbol or name. Best matches first.
    async fn search_symbol(&self, query: &str) -> Result<Vec<SymbolHit>>;

    /// Fetch market figures for `address`. `Ok(None)` when the backend knows nothing about it.
    async fn token_stats(&self, address: &str) -> Result<Option<MarketStats>>;
}

/// Per-request market view of a token. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenSnapshot {
    pub identifier: String,
    pub address: Option<String>,
    pub price_usd: f64,
    pub market_cap_usd: f64,
    pub liquidity_usd: f64,
    pub volume_24h_usd: f64,
    pub found: bool,
}

impl TokenSnapshot {
    /// Zeroed snapshot flagged as "no data found".
    pub fn missing(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            address: None,
            price_usd: 0.0,
            market_cap_usd: 0.0,
            liquidity_usd: 0.0,
            volume_24h_usd: 0.0,
            found: false,
        }
    }

    pub fn from_stats(identifier: impl Into<String>, address: String, stats: MarketStats) -> Self {
        Self {
            identifier: identifier.into(),
            address: Some(address),
            price_usd: stats.price,
            market_cap_usd: stats.market_cap,
            liquidity_usd: stats.liquidity,
            volume_24h_usd: stats.volume_24h,
            found: true,
        }
    }
}

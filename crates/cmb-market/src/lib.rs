//! Birdeye market-data adapter.
//!
//! Two endpoints are used:
//! - `GET /defi/v3/search` to resolve a ticker symbol to token addresses
//! - `GET /defi/token_overview` for price, market cap, liquidity and 24h volume

use std::time::Duration;

use async_trait::async_trait;
use cmb_core::{
    errors::Error,
    market::{MarketDataPort, MarketStats, SymbolHit},
    Result,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct BirdeyeClient {
    base_url: String,
    api_key: String,
    chain: String,
    http: reqwest::Client,
}

impl BirdeyeClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        chain: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Market(format!("birdeye http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            chain: chain.into(),
            http,
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("x-chain", &self.chain)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Market(format!("birdeye request error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Market(format!("birdeye read error: {e}")))?;
        if !status.is_success() {
            return Err(Error::Market(format!(
                "birdeye {path} failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataPort for BirdeyeClient {
    async fn search_symbol(&self, symbol: &str) -> Result<Vec<SymbolHit>> {
        let body = self
            .get_json(
                "/defi/v3/search",
                &[
                    ("chain", self.chain.as_str()),
                    ("keyword", symbol),
                    ("target", "token"),
                    ("sort_by", "volume_24h_usd"),
                    ("sort_type", "desc"),
                ],
            )
            .await?;
        let hits = parse_search(&body)?;
        debug!(symbol, hits = hits.len(), "birdeye search");
        Ok(hits)
    }

    async fn token_stats(&self, address: &str) -> Result<Option<MarketStats>> {
        let body = self
            .get_json("/defi/token_overview", &[("address", address)])
            .await?;
        parse_overview(&body)
    }
}

/// Response envelope shared by every Birdeye endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    data: Option<T>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    result: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    address: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Overview {
    price: Option<f64>,
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
    mc: Option<f64>,
    liquidity: Option<f64>,
    #[serde(rename = "v24hUSD")]
    volume_24h_usd: Option<f64>,
}

/// Flatten `data.items[*].result[*]` into hits, keeping Birdeye's ordering.
fn parse_search(body: &str) -> Result<Vec<SymbolHit>> {
    let env: Envelope<SearchData> = serde_json::from_str(body)?;
    if !env.success {
        return Ok(Vec::new());
    }
    let Some(data) = env.data else {
        return Ok(Vec::new());
    };

    Ok(data
        .items
        .into_iter()
        .flat_map(|item| item.result)
        .filter_map(|r| {
            let address = r.address.filter(|a| !a.trim().is_empty())?;
            Some(SymbolHit {
                address,
                symbol: r.symbol,
                name: r.name,
            })
        })
        .collect())
}

/// `None` when Birdeye has no data for the address.
fn parse_overview(body: &str) -> Result<Option<MarketStats>> {
    let env: Envelope<Overview> = serde_json::from_str(body)?;
    if !env.success {
        return Ok(None);
    }
    Ok(env.data.map(|o| MarketStats {
        price: o.price.unwrap_or_default(),
        market_cap: o.market_cap.or(o.mc).unwrap_or_default(),
        liquidity: o.liquidity.unwrap_or_default(),
        volume_24h: o.volume_24h_usd.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_flattens_items_in_order() {
        let body = json!({
            "success": true,
            "data": {
                "items": [
                    {
                        "type": "token",
                        "result": [
                            {"address": "AAA", "symbol": "STUCK", "name": "Stuck"},
                            {"address": "BBB", "symbol": "STUCK", "name": null}
                        ]
                    },
                    {"type": "market", "result": [{"address": "CCC"}]}
                ]
            }
        })
        .to_string();

        let hits = parse_search(&body).unwrap();
        let addrs: Vec<_> = hits.iter().map(|h| h.address.as_str()).collect();
        assert_eq!(addrs, vec!["AAA", "BBB", "CCC"]);
        assert_eq!(hits[0].name.as_deref(), Some("Stuck"));
        assert_eq!(hits[1].name, None);
    }

    #[test]
    fn search_without_data_is_empty() {
        let body = json!({"success": true, "data": null}).to_string();
        assert!(parse_search(&body).unwrap().is_empty());

        let body = json!({"success": false, "message": "Unauthorized"}).to_string();
        assert!(parse_search(&body).unwrap().is_empty());

        let body = json!({"success": true, "data": {"items": [{"result": [{"symbol": "X"}]}]}})
            .to_string();
        assert!(parse_search(&body).unwrap().is_empty());
    }

    #[test]
    fn overview_reads_stats() {
        let body = json!({
            "success": true,
            "data": {
                "address": "AAA",
                "price": 0.0123,
                "marketCap": 1_200_000.0,
                "liquidity": 45_000.5,
                "v24hUSD": 9_876.0
            }
        })
        .to_string();

        let stats = parse_overview(&body).unwrap().unwrap();
        assert_eq!(stats.price, 0.0123);
        assert_eq!(stats.market_cap, 1_200_000.0);
        assert_eq!(stats.liquidity, 45_000.5);
        assert_eq!(stats.volume_24h, 9_876.0);
    }

    #[test]
    fn overview_falls_back_to_mc_and_zeroes() {
        let body = json!({"success": true, "data": {"mc": 500.0, "price": null}}).to_string();
        let stats = parse_overview(&body).unwrap().unwrap();
        assert_eq!(stats.market_cap, 500.0);
        assert_eq!(stats.price, 0.0);
    }

    #[test]
    fn overview_missing_data_is_none() {
        let body = json!({"success": true, "data": null}).to_string();
        assert_eq!(parse_overview(&body).unwrap(), None);

        let body = json!({"success": false, "data": {"price": 1.0}}).to_string();
        assert_eq!(parse_overview(&body).unwrap(), None);
    }

    #[test]
    fn malformed_body_is_json_error() {
        assert!(matches!(parse_overview("not json"), Err(Error::Json(_))));
    }
}

//! Ticker enrichment: market snapshot + generated meme breakdown.

use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    formatting::render_snapshot,
    market::{MarketDataPort, MarketStats, TokenSnapshot},
    model::{generate_with_timeout, GenerationError, GenerationPort, GenerationSettings},
    prompts::{Fallback, ProjectFacts},
    ticker::{TickerQuery, TokenIdent},
    Result,
};

/// What the ticker path produced before rendering.
#[derive(Clone, Debug)]
pub struct TickerReport {
    pub snapshot: TokenSnapshot,
    pub analysis: std::result::Result<String, GenerationError>,
}

pub struct TickerEnricher {
    market: Arc<dyn MarketDataPort>,
    generator: Arc<dyn GenerationPort>,
    settings: GenerationSettings,
    timeout: Duration,
    facts: ProjectFacts,
}

impl TickerEnricher {
    pub fn new(
        market: Arc<dyn MarketDataPort>,
        generator: Arc<dyn GenerationPort>,
        settings: GenerationSettings,
        timeout: Duration,
        facts: ProjectFacts,
    ) -> Self {
        Self {
            market,
            generator,
            settings,
            timeout,
            facts,
        }
    }

    /// Market lookup and breakdown generation run concurrently; neither waits on the other.
    pub async fn enrich(&self, query: &TickerQuery) -> TickerReport {
        let (snapshot, analysis) = tokio::join!(self.snapshot(query), self.analyze(query));
        TickerReport { snapshot, analysis }
    }

    /// Never fails: any backend problem degrades to a "no data found" snapshot.
    pub async fn snapshot(&self, query: &TickerQuery) -> TokenSnapshot {
        let label = query.display();
        match self.lookup(&query.ident).await {
            Ok(Some((address, stats))) => TokenSnapshot::from_stats(label, address, stats),
            Ok(None) => {
                debug!(token = %label, "no market data");
                TokenSnapshot::missing(label)
            }
            Err(e) => {
                warn!(token = %label, error = %e, "market data lookup failed");
                TokenSnapshot::missing(label)
            }
        }
    }

    async fn lookup(
        &self,
        ident: &TokenIdent,
    ) -> Result<Option<(String, MarketStats)>> {
        let Some(address) = self.resolve_address(ident).await? else {
            return Ok(None);
        };
        let stats = self.market.token_stats(&address).await?;
        Ok(stats.map(|s| (address, s)))
    }

    /// Addresses are used as-is; symbols resolve to the first search hit.
    async fn resolve_address(&self, ident: &TokenIdent) -> Result<Option<String>> {
        match ident {
            TokenIdent::Address(a) => Ok(Some(a.clone())),
            TokenIdent::Symbol(s) => {
                let hits = self.market.search_symbol(s).await?;
                Ok(hits.into_iter().next().map(|h| h.address))
            }
        }
    }

    pub async fn analyze(&self, query: &TickerQuery) -> std::result::Result<String, GenerationError> {
        let req = self.settings.request(
            self.facts.analyst_persona(),
            self.facts.ticker_prompt(&query.display()),
        );
        generate_with_timeout(self.generator.as_ref(), req, self.timeout).await
    }

    /// One message: the breakdown (or a fallback) followed by the market block.
    pub fn render(&self, report: &TickerReport) -> String {
        let head = match &report.analysis {
            Ok(text) => text.clone(),
            Err(e) if e.is_timeout() => self.facts.fallback(Fallback::TickerTimeout),
            Err(_) => self.facts.fallback(Fallback::TickerFailure),
        };
        format!("{head}\n\n{}", render_snapshot(&report.snapshot))
    }
}

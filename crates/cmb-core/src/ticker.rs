//! Ticker-intent detection.
//!
//! A message asks for a token analysis when it contains an intent keyword and a
//! token identifier: either a `$SYMBOL` word or a base58 address-shaped word.

use regex::Regex;

pub const DEFAULT_TICKER_KEYWORDS: &[&str] = &[
    "analyze",
    "analyse",
    "check",
    "vibe",
    "thoughts on",
    "opinion on",
];

/// The identifier a user asked about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenIdent {
    /// Uppercased symbol without the `$` prefix.
    Symbol(String),
    /// Address exactly as written.
    Address(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickerQuery {
    pub ident: TokenIdent,
    /// The keyword that signalled intent.
    pub keyword: String,
}

impl TickerQuery {
    /// How the token is shown back to the user (`$SYMBOL` or the address).
    pub fn display(&self) -> String {
        match &self.ident {
            TokenIdent::Symbol(s) => format!("${s}"),
            TokenIdent::Address(a) => a.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TickerDetector {
    keywords: Vec<String>,
    symbol_re: Regex,
    address_re: Regex,
}

impl Default for TickerDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_TICKER_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        )
    }
}

impl TickerDetector {
    pub fn new(keywords: Vec<String>) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            keywords,
            symbol_re: Regex::new(r"(?:^|\s)\$([A-Za-z][A-Za-z0-9_]{0,19})\b").expect("valid regex"),
            address_re: Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{44,45}\b").expect("valid regex"),
        }
    }

    /// Returns the query when `text` carries both an intent keyword and an identifier.
    pub fn detect(&self, text: &str) -> Option<TickerQuery> {
        let lowered = text.to_lowercase();
        let keyword = self.keywords.iter().find(|k| lowered.contains(k.as_str()))?;
        let ident = self.extract_ident(text)?;
        Some(TickerQuery {
            ident,
            keyword: keyword.clone(),
        })
    }

    /// Address-shaped words (base58, 44 to 45 chars) win over symbols; otherwise the first `$SYMBOL`.
    pub fn extract_ident(&self, text: &str) -> Option<TokenIdent> {
        if let Some(m) = self.address_re.find(text) {
            return Some(TokenIdent::Address(m.as_str().to_string()));
        }
        self.symbol_re
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| TokenIdent::Symbol(m.as_str().to_uppercase()))
    }
}

use crate::market::TokenSnapshot;

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Compact USD amount: `$1.23B`, `$45.6M`, `$7.8K`, `$12.34`, `$0.00001234`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "$0".to_string();
    }
    match value {
        v if v >= 1e9 => format!("${:.2}B", v / 1e9),
        v if v >= 1e6 => format!("${:.2}M", v / 1e6),
        v if v >= 1e3 => format!("${:.2}K", v / 1e3),
        v if v >= 1.0 => format!("${v:.2}"),
        // Sub-dollar prices: keep four significant digits.
        v => {
            let digits = (-v.log10()).floor() as usize + 4;
            format!("${v:.digits$}")
        }
    }
}

pub const NO_DATA_TEXT: &str = "No market data found";

/// Plain-text market block appended to a ticker analysis.
pub fn render_snapshot(snap: &TokenSnapshot) -> String {
    if !snap.found {
        return format!("📉 {NO_DATA_TEXT} for {}.", snap.identifier);
    }

    let mut out = format!("📊 {} market data\n", snap.identifier);
    if let Some(addr) = &snap.address {
        out.push_str(&format!("Address: {addr}\n"));
    }
    out.push_str(&format!("Price: {}\n", format_usd(snap.price_usd)));
    out.push_str(&format!("Market cap: {}\n", format_usd(snap.market_cap_usd)));
    out.push_str(&format!("Liquidity: {}\n", format_usd(snap.liquidity_usd)));
    out.push_str(&format!("24h volume: {}", format_usd(snap.volume_24h_usd)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketStats;

    #[test]
    fn escapes_html() {
        assert_eq!(escape_html("<b>&\"x\""), "&lt;b&gt;&amp;&quot;x&quot;");
    }

    #[test]
    fn formats_usd_ranges() {
        assert_eq!(format_usd(2_500_000_000.0), "$2.50B");
        assert_eq!(format_usd(45_600_000.0), "$45.60M");
        assert_eq!(format_usd(7_800.0), "$7.80K");
        assert_eq!(format_usd(12.346), "$12.35");
        assert_eq!(format_usd(0.5), "$0.5000");
        assert_eq!(format_usd(0.00001234), "$0.00001234");
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(f64::NAN), "$0");
    }

    #[test]
    fn renders_missing_snapshot() {
        let s = render_snapshot(&TokenSnapshot::missing("$FAKE"));
        assert!(s.contains(NO_DATA_TEXT));
        assert!(s.contains("$FAKE"));
    }

    #[test]
    fn renders_found_snapshot() {
        let s = render_snapshot(&TokenSnapshot::from_stats(
            "$STUCK",
            "addr".to_string(),
            MarketStats {
                price: 0.0012,
                market_cap: 1_200_000.0,
                liquidity: 80_000.0,
                volume_24h: 15_000.0,
            },
        ));
        assert!(s.contains("Market cap: $1.20M"));
        assert!(s.contains("Liquidity: $80.00K"));
        assert!(s.contains("24h volume: $15.00K"));
        assert!(s.contains("Price: $0.001200"));
        assert!(!s.contains(NO_DATA_TEXT));
    }
}

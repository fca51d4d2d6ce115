//! Token Table and Unit Conversion
//!
//! Tokens accepted by the remote privacy pool and conversions between
//! smallest units (lamports for SOL) and human decimal amounts.

/// Native network token
pub const NATIVE_TOKEN: &str = "SOL";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Largest smallest-unit amount that converts to a decimal amount without
/// losing precision (2^53)
pub const MAX_EXACT_AMOUNT: u64 = 1 << 53;

/// A pool-supported token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: &'static str,
    pub decimals: u32,
}

/// Tokens supported by the remote pool
pub const SUPPORTED_TOKENS: &[Token] = &[
    Token { symbol: "SOL", decimals: 9 },
    Token { symbol: "USDC", decimals: 6 },
    Token { symbol: "USD1", decimals: 6 },
    Token { symbol: "RADR", decimals: 9 },
    Token { symbol: "ORE", decimals: 11 },
    Token { symbol: "BONK", decimals: 5 },
    Token { symbol: "ZEC", decimals: 8 },
];

/// Look up a token by symbol (case-insensitive)
pub fn find_token(symbol: &str) -> Option<&'static Token> {
    let symbol = symbol.trim();
    SUPPORTED_TOKENS
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

/// Comma-separated list for error messages, e.g. "SOL, USDC, ..."
pub fn supported_symbols() -> String {
    SUPPORTED_TOKENS
        .iter()
        .map(|t| t.symbol)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Token {
    fn scale(&self) -> f64 {
        10f64.powi(self.decimals as i32)
    }

    /// Smallest units to a human decimal amount (1_500_000_000 lamports -> 1.5).
    /// Exact only up to [`MAX_EXACT_AMOUNT`].
    pub fn from_smallest_unit(&self, amount: u64) -> f64 {
        amount as f64 / self.scale()
    }

    /// Human decimal amount to smallest units, rounded
    pub fn to_smallest_unit(&self, amount: f64) -> u64 {
        (amount * self.scale()).round() as u64
    }

    /// e.g. "1.500000000 SOL"
    pub fn format(&self, amount: u64) -> String {
        format!(
            "{:.*} {}",
            self.decimals as usize,
            self.from_smallest_unit(amount),
            self.symbol
        )
    }
}

/// Parse an integer amount in smallest units, tolerating `_` and `,` separators
pub fn parse_amount(s: &str) -> Option<u64> {
    s.trim().replace([',', '_'], "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(find_token("SOL").unwrap().decimals, 9);
        assert_eq!(find_token("usdc").unwrap().symbol, "USDC");
        assert!(find_token("DOGE").is_none());
        assert!(supported_symbols().starts_with("SOL, USDC"));
    }

    #[test]
    fn test_sol_conversion() {
        let sol = find_token(NATIVE_TOKEN).unwrap();
        assert_eq!(sol.from_smallest_unit(LAMPORTS_PER_SOL), 1.0);
        assert_eq!(sol.from_smallest_unit(1_500_000_000), 1.5);
        assert_eq!(sol.from_smallest_unit(1), 0.000000001);
        assert_eq!(sol.to_smallest_unit(0.25), 250_000_000);
        assert_eq!(
            sol.to_smallest_unit(sol.from_smallest_unit(MAX_EXACT_AMOUNT)),
            MAX_EXACT_AMOUNT
        );
    }

    #[test]
    fn test_format() {
        let usdc = find_token("USDC").unwrap();
        assert_eq!(usdc.format(1_250_000), "1.250000 USDC");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000"), Some(1000));
        assert_eq!(parse_amount("1,000,000"), Some(1_000_000));
        assert_eq!(parse_amount("1_000_000"), Some(1_000_000));
        assert_eq!(parse_amount("  42  "), Some(42));
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("invalid"), None);
    }
}

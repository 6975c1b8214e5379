//! Shared broker types: symbols, positions, accounts, orders, signals.

use std::fmt;

/// Ticker symbol, normalized to trimmed uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Build a symbol from a provider string. Returns `None` if it is blank.
    pub fn try_new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    /// Build a symbol from a literal.
    ///
    /// # Panics
    ///
    /// Panics if `raw` is blank or contains whitespace.
    #[track_caller]
    pub fn new(raw: &str) -> Self {
        match Self::try_new(raw) {
            Some(sym) => sym,
            None => panic!("invalid symbol: {raw:?}"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Direction of an open position as reported by the brokerage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionSide {
    Long,
    Short,
    /// Anything the feed reports that is neither long nor short.
    Flat,
}

impl PositionSide {
    /// Parse a raw feed value. Unknown values map to `Flat`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "long" => PositionSide::Long,
            "short" => PositionSide::Short,
            _ => PositionSide::Flat,
        }
    }

    /// Side of the order that closes a position on this side.
    pub fn closing_side(self) -> Option<BrokerSide> {
        match self {
            PositionSide::Long => Some(BrokerSide::Sell),
            PositionSide::Short => Some(BrokerSide::Buy),
            PositionSide::Flat => None,
        }
    }

    /// Side of the order that opens a position on this side.
    pub fn opening_side(self) -> Option<BrokerSide> {
        match self {
            PositionSide::Long => Some(BrokerSide::Buy),
            PositionSide::Short => Some(BrokerSide::Sell),
            PositionSide::Flat => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PositionSide::Long => "long",
            PositionSide::Short => "short",
            PositionSide::Flat => "flat",
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broker-level open position. Quantity is always the absolute share count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub symbol: Symbol,
    pub side: PositionSide,
    pub quantity: u64,
}

/// Account summary from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub equity_cents: i64,
    pub cash_cents: i64,
    pub buying_power_cents: i64,
}

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerSide {
    Buy,
    Sell,
}

impl BrokerSide {
    pub fn as_str(self) -> &'static str {
        match self {
            BrokerSide::Buy => "buy",
            BrokerSide::Sell => "sell",
        }
    }
}

impl fmt::Display for BrokerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type. Only market orders are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerOrderType {
    Market,
}

impl BrokerOrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            BrokerOrderType::Market => "market",
        }
    }
}

/// How long an order stays working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    /// Active until filled or explicitly canceled.
    GoodTillCanceled,
}

impl TimeInForce {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeInForce::GoodTillCanceled => "gtc",
        }
    }
}

/// Order to submit to a broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerOrder {
    pub symbol: Symbol,
    pub side: BrokerSide,
    pub quantity: u64,
    pub order_type: BrokerOrderType,
    pub time_in_force: TimeInForce,
}

impl BrokerOrder {
    /// A good-till-canceled market order. Returns `None` for a zero quantity.
    pub fn market(symbol: Symbol, side: BrokerSide, quantity: u64) -> Option<Self> {
        if quantity == 0 {
            return None;
        }
        Some(Self {
            symbol,
            side,
            quantity,
            order_type: BrokerOrderType::Market,
            time_in_force: TimeInForce::GoodTillCanceled,
        })
    }
}

/// Brokerage acknowledgment of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: String,
    pub status: String,
}

/// Target portfolio published by the signal provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet {
    pub long_symbols: Vec<Symbol>,
    pub short_symbols: Vec<Symbol>,
}

impl SignalSet {
    /// Symbols of one side of the book.
    pub fn side(&self, side: PositionSide) -> &[Symbol] {
        match side {
            PositionSide::Long => &self.long_symbols,
            PositionSide::Short => &self.short_symbols,
            PositionSide::Flat => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.long_symbols.is_empty() && self.short_symbols.is_empty()
    }
}

/// Quoted price in micro-dollars (1e-6 USD).
///
/// `Price(180_004_000)` is $180.004. Quotes keep sub-cent precision so sizing
/// divides by the price actually quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Price(pub i64);

impl Price {
    pub const MICROS_PER_DOLLAR: i64 = 1_000_000;
    pub const MICROS_PER_CENT: i64 = 10_000;

    pub const fn from_cents(cents: i64) -> Self {
        Price(cents * Self::MICROS_PER_CENT)
    }

    /// Parse a quoted dollar amount. Digits past the sixth decimal round up,
    /// float noise below that is ignored. `None` unless finite and positive.
    pub fn from_dollars(dollars: f64) -> Option<Self> {
        if !dollars.is_finite() || dollars <= 0.0 {
            return None;
        }
        let scaled = dollars * Self::MICROS_PER_DOLLAR as f64;
        if scaled >= i64::MAX as f64 {
            return None;
        }
        let noise = (scaled * 4.0 * f64::EPSILON).max(1e-6);
        let micros = (scaled - noise).ceil().max(1.0);
        Some(Price(micros as i64))
    }

    pub fn micros(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 as f64 / Self::MICROS_PER_DOLLAR as f64;
        if self.0 % Self::MICROS_PER_CENT == 0 {
            write!(f, "${dollars:.2}")
        } else {
            write!(f, "${dollars:.6}")
        }
    }
}

/// Convert a decimal dollar amount to cents, rounding to the nearest cent.
pub fn dollars_to_cents(dollars: f64) -> Option<i64> {
    if !dollars.is_finite() {
        return None;
    }
    let cents = (dollars * 100.0).round();
    if cents.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_normalizes() {
        assert_eq!(Symbol::new(" aapl ").as_str(), "AAPL");
        assert!(Symbol::try_new("").is_none());
        assert!(Symbol::try_new("   ").is_none());
        assert!(Symbol::try_new("BRK B").is_none());
    }

    #[test]
    fn position_side_parsing() {
        assert_eq!(PositionSide::parse("long"), PositionSide::Long);
        assert_eq!(PositionSide::parse("SHORT"), PositionSide::Short);
        assert_eq!(PositionSide::parse("flat"), PositionSide::Flat);
        assert_eq!(PositionSide::parse(""), PositionSide::Flat);
    }

    #[test]
    fn closing_side_is_opposite() {
        assert_eq!(PositionSide::Long.closing_side(), Some(BrokerSide::Sell));
        assert_eq!(PositionSide::Short.closing_side(), Some(BrokerSide::Buy));
        assert_eq!(PositionSide::Flat.closing_side(), None);
    }

    #[test]
    fn opening_side_matches_leg() {
        assert_eq!(PositionSide::Long.opening_side(), Some(BrokerSide::Buy));
        assert_eq!(PositionSide::Short.opening_side(), Some(BrokerSide::Sell));
    }

    #[test]
    fn market_order_rejects_zero() {
        assert!(BrokerOrder::market(Symbol::new("AAPL"), BrokerSide::Buy, 0).is_none());
        let order = BrokerOrder::market(Symbol::new("AAPL"), BrokerSide::Buy, 3).unwrap();
        assert_eq!(order.order_type, BrokerOrderType::Market);
        assert_eq!(order.time_in_force, TimeInForce::GoodTillCanceled);
    }

    #[test]
    fn dollars_round_to_cents() {
        assert_eq!(dollars_to_cents(180.0), Some(180_00));
        assert_eq!(dollars_to_cents(0.1), Some(10));
        assert_eq!(dollars_to_cents(-2.5), Some(-250));
        assert_eq!(dollars_to_cents(f64::NAN), None);
    }

    #[test]
    fn price_keeps_sub_cent_digits() {
        assert_eq!(Price::from_dollars(180.0), Some(Price::from_cents(180_00)));
        assert_eq!(Price::from_dollars(180.004), Some(Price(180_004_000)));
        assert_eq!(Price::from_dollars(0.004), Some(Price(4_000)));
        assert_eq!(Price::from_dollars(0.29), Some(Price(290_000)));
    }

    #[test]
    fn price_rounds_up_past_micros() {
        // Never quote cheaper than the provider did
        assert_eq!(Price::from_dollars(1.0000001), Some(Price(1_000_001)));
        assert_eq!(Price::from_dollars(0.0000001), Some(Price(1)));
    }

    #[test]
    fn price_rejects_non_positive() {
        assert_eq!(Price::from_dollars(0.0), None);
        assert_eq!(Price::from_dollars(-1.5), None);
        assert_eq!(Price::from_dollars(f64::NAN), None);
        assert_eq!(Price::from_dollars(f64::INFINITY), None);
    }

    #[test]
    fn price_display() {
        assert_eq!(format!("{}", Price::from_cents(180_00)), "$180.00");
        assert_eq!(format!("{}", Price(4_000)), "$0.004000");
    }
}

//! Snapshots as published by the collaborators, and their parsed forms.
//!
//! Snapshots carry the wire encoding (`"60%"`, `"40 AXA"`). Parsing always
//! returns a new value and never touches the snapshot it reads from.

use std::collections::BTreeMap;

use crate::error::AllocationError;
use crate::types::{AccountId, Percent, Price, Quantities, Quantity};

/// Latest percentage-per-account mapping, values encoded as `"NN[.n]%"`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SplitSnapshot(BTreeMap<AccountId, String>);

impl SplitSnapshot {
    pub fn new() -> Self {
        SplitSnapshot(BTreeMap::new())
    }

    pub fn insert(&mut self, account: impl Into<AccountId>, percentage: impl Into<String>) {
        self.0.insert(account.into(), percentage.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &str)> {
        self.0.iter().map(|(a, p)| (a, p.as_str()))
    }

    /// Parse every percentage. Fails on the first malformed entry.
    pub fn parse(&self) -> Result<Split, AllocationError> {
        let weights = self
            .0
            .iter()
            .map(|(account, raw)| {
                raw.parse::<Percent>()
                    .map(|pct| (account.clone(), pct))
                    .map_err(|e| AllocationError::parse(format!("{account}: {}", e.reason())))
            })
            .collect::<Result<BTreeMap<_, _>, AllocationError>>()?;
        Ok(Split { weights })
    }
}

impl<A: Into<AccountId>, P: Into<String>> FromIterator<(A, P)> for SplitSnapshot {
    fn from_iter<I: IntoIterator<Item = (A, P)>>(iter: I) -> Self {
        SplitSnapshot(iter.into_iter().map(|(a, p)| (a.into(), p.into())).collect())
    }
}

/// Parsed split: account to percentage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Split {
    weights: BTreeMap<AccountId, Percent>,
}

impl Split {
    pub fn get(&self, account: &str) -> Option<Percent> {
        self.weights.get(account).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, Percent)> {
        self.weights.iter().map(|(a, &p)| (a, p))
    }

    /// Sum of all percentages. Splits are expected, not required, to total 100.
    pub fn total_percent(&self) -> f64 {
        self.weights.values().map(|p| p.value()).sum()
    }
}

/// Latest trade fill as published by the fill feeder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillSnapshot {
    #[cfg_attr(feature = "serde", serde(alias = "stock_ticker"))]
    pub ticker: String,
    pub price: String,
    pub quantity: Quantity,
}

impl FillSnapshot {
    pub fn new(ticker: impl Into<String>, price: impl Into<String>, quantity: Quantity) -> Self {
        FillSnapshot {
            ticker: ticker.into(),
            price: price.into(),
            quantity,
        }
    }

    /// Validate the fill: non-empty ticker, positive quantity, decimal price.
    pub fn parse(&self) -> Result<Fill, AllocationError> {
        let ticker = self.ticker.trim();
        if ticker.is_empty() || ticker.contains(char::is_whitespace) {
            return Err(AllocationError::parse(format!(
                "fill ticker {:?} must be a single non-empty word",
                self.ticker
            )));
        }
        if self.quantity == 0 {
            return Err(AllocationError::parse(format!(
                "fill quantity for {ticker} must be greater than zero"
            )));
        }
        let price = self.price.parse::<Price>()?;
        Ok(Fill {
            ticker: ticker.to_string(),
            price,
            quantity: self.quantity,
        })
    }
}

/// A validated fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fill {
    ticker: String,
    price: Price,
    quantity: Quantity,
}

impl Fill {
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }
}

/// Last recorded positions for one ticker, values encoded as `"<quantity> <ticker>"`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PreviousPositionSnapshot(BTreeMap<AccountId, String>);

impl PreviousPositionSnapshot {
    pub fn new() -> Self {
        PreviousPositionSnapshot(BTreeMap::new())
    }

    pub fn insert(&mut self, account: impl Into<AccountId>, position: impl Into<String>) {
        self.0.insert(account.into(), position.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &str)> {
        self.0.iter().map(|(a, p)| (a, p.as_str()))
    }

    /// Parse into quantities, checking every entry is tagged with `ticker`.
    ///
    /// The positions together must fit in a [`Quantity`].
    pub fn parse(&self, ticker: &str) -> Result<Quantities, AllocationError> {
        let quantities = self
            .0
            .iter()
            .map(|(account, raw)| {
                parse_position(raw, ticker)
                    .map(|qty| (account.clone(), qty))
                    .map_err(|e| AllocationError::parse(format!("{account}: {}", e.reason())))
            })
            .collect::<Result<Quantities, AllocationError>>()?;
        if quantities.checked_total().is_none() {
            return Err(AllocationError::parse(format!(
                "positions in {ticker} add up to more than {}",
                Quantity::MAX
            )));
        }
        Ok(quantities)
    }
}

impl<A: Into<AccountId>, P: Into<String>> FromIterator<(A, P)> for PreviousPositionSnapshot {
    fn from_iter<I: IntoIterator<Item = (A, P)>>(iter: I) -> Self {
        PreviousPositionSnapshot(iter.into_iter().map(|(a, p)| (a.into(), p.into())).collect())
    }
}

/// Parse `"<quantity> <ticker>"`.
fn parse_position(raw: &str, ticker: &str) -> Result<Quantity, AllocationError> {
    let mut parts = raw.split_whitespace();
    let (Some(qty), Some(tag), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AllocationError::parse(format!(
            "position {raw:?} is not of the form \"<quantity> <ticker>\""
        )));
    };
    let qty: Quantity = qty.parse().map_err(|_| {
        AllocationError::parse(format!("position {raw:?} has a non-integer quantity"))
    })?;
    if tag != ticker {
        return Err(AllocationError::parse(format!(
            "position {raw:?} is tagged {tag}, expected {ticker}"
        )));
    }
    Ok(qty)
}

/// Encode a quantity in the position wire form.
pub fn encode_position(quantity: Quantity, ticker: &str) -> String {
    format!("{quantity} {ticker}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_parses_all_entries() {
        let snap: SplitSnapshot = [("A", "60%"), ("B", "40%")].into_iter().collect();
        let split = snap.parse().unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split.get("A").unwrap().value(), 60.0);
        assert_eq!(split.total_percent(), 100.0);
    }

    #[test]
    fn split_error_names_the_account() {
        let snap: SplitSnapshot = [("A", "60%"), ("B", "forty")].into_iter().collect();
        let err = snap.parse().unwrap_err();
        assert!(matches!(err, AllocationError::Parse(_)));
        assert!(err.reason().starts_with("B:"));
    }

    #[test]
    fn empty_split_is_valid() {
        assert!(SplitSnapshot::new().parse().unwrap().is_empty());
    }

    #[test]
    fn fill_parse() {
        let fill = FillSnapshot::new("AXA", "0.42$", 100).parse().unwrap();
        assert_eq!(fill.ticker(), "AXA");
        assert_eq!(fill.price(), Price(42));
        assert_eq!(fill.quantity(), 100);
    }

    #[test]
    fn fill_rejects_zero_quantity_and_blank_ticker() {
        assert!(FillSnapshot::new("AXA", "1$", 0).parse().is_err());
        assert!(FillSnapshot::new("  ", "1$", 5).parse().is_err());
        assert!(FillSnapshot::new("AXA", "n/a", 5).parse().is_err());
    }

    #[test]
    fn previous_parse_returns_new_mapping() {
        let snap: PreviousPositionSnapshot =
            [("A", "40 AXA"), ("B", "30 AXA")].into_iter().collect();
        let before = snap.clone();
        let parsed = snap.parse("AXA").unwrap();
        assert_eq!(parsed.get("A"), Some(40));
        assert_eq!(parsed.total(), 70);
        assert_eq!(snap, before);
    }

    #[test]
    fn previous_rejects_malformed_positions() {
        let bad = [
            ("A", "forty AXA"),
            ("A", "40"),
            ("A", "-3 AXA"),
            ("A", "40 AXA extra"),
            ("A", "40 KRUK"),
        ];
        for entry in bad {
            let snap: PreviousPositionSnapshot = [entry].into_iter().collect();
            assert!(snap.parse("AXA").is_err(), "{entry:?} should not parse");
        }
    }

    #[test]
    fn encode_position_format() {
        assert_eq!(encode_position(60, "X"), "60 X");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn fill_accepts_stock_ticker_alias() {
        let json = r#"{"stock_ticker":"11BIT","price":"0.57$","quantity":12}"#;
        let fill: FillSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(fill.ticker, "11BIT");
        assert_eq!(fill.quantity, 12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn split_snapshot_from_json() {
        let snap: SplitSnapshot = serde_json::from_str(r#"{"B":"40%","A":"60%"}"#).unwrap();
        let accounts: Vec<&str> = snap.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(accounts, ["A", "B"]);
    }
}

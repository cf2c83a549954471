//! Core types: AccountId, Percent, Price, Quantity, Quantities

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AllocationError;

/// Number of shares held or traded. Never negative.
pub type Quantity = u64;

/// Opaque account identifier, unique within a cycle.
///
/// Ordering is plain lexicographic string order, so `account10` sorts
/// before `account2`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        AccountId(id)
    }
}

impl Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Share of an asset's total quantity an account should hold, in `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Percent(f64);

impl Percent {
    /// Create a percentage, rejecting values outside `0..=100` and non-finite values.
    pub fn new(value: f64) -> Result<Self, AllocationError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(AllocationError::parse(format!(
                "percentage {value} is outside 0..=100"
            )));
        }
        Ok(Percent(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// This percentage of `total`, rounded to the nearest integer.
    ///
    /// Ties round half away from zero (`f64::round`), so 2.5 becomes 3.
    pub fn share_of(self, total: Quantity) -> Quantity {
        (total as f64 * self.0 / 100.0).round() as Quantity
    }
}

/// Parses the wire form `"NN[.n]%"`. The `%` suffix is mandatory.
impl FromStr for Percent {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s.trim().strip_suffix('%').ok_or_else(|| {
            AllocationError::parse(format!("percentage {s:?} is missing the '%' suffix"))
        })?;
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(AllocationError::parse(format!(
                "percentage {s:?} is not a decimal number"
            )));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| AllocationError::parse(format!("percentage {s:?} is not a decimal number")))?;
        Percent::new(value)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Fill price in cents.
///
/// Carried for bookkeeping only; allocation never looks at it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Price = Price(0);
}

/// Accepts `"0.42"`, `"0.42$"` and `"$0.42"`. Sub-cent digits are rounded.
impl FromStr for Price {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed
            .strip_suffix('$')
            .or_else(|| trimmed.strip_prefix('$'))
            .unwrap_or(trimmed);
        let value: f64 = number
            .parse()
            .map_err(|_| AllocationError::parse(format!("price {s:?} is not a decimal number")))?;
        if !value.is_finite() || value < 0.0 {
            return Err(AllocationError::parse(format!(
                "price {s:?} must be a non-negative amount"
            )));
        }
        Ok(Price((value * 100.0).round() as i64))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = (self.0 % 100).abs();
        if self.0 < 0 {
            write!(f, "-${}.{:02}", dollars.abs(), cents)
        } else {
            write!(f, "${}.{:02}", dollars, cents)
        }
    }
}

/// Per-account quantities, ordered by account.
///
/// Used for previous positions, fair-share targets, and deltas alike.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Quantities(BTreeMap<AccountId, Quantity>);

impl Quantities {
    pub fn new() -> Self {
        Quantities(BTreeMap::new())
    }

    pub fn insert(&mut self, account: impl Into<AccountId>, quantity: Quantity) {
        self.0.insert(account.into(), quantity);
    }

    pub fn get(&self, account: &str) -> Option<Quantity> {
        self.0.get(account).copied()
    }

    pub fn contains(&self, account: &str) -> bool {
        self.0.contains_key(account)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all quantities, saturating at `Quantity::MAX`.
    pub fn total(&self) -> Quantity {
        self.0.values().fold(0, |acc, &q| acc.saturating_add(q))
    }

    /// Sum of all quantities, or `None` if it does not fit in a `Quantity`.
    pub fn checked_total(&self) -> Option<Quantity> {
        self.0.values().try_fold(0, |acc: Quantity, &q| acc.checked_add(q))
    }

    /// Largest single quantity, or 0 when empty.
    pub fn max_quantity(&self) -> Quantity {
        self.0.values().copied().max().unwrap_or(0)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, Quantity)> {
        self.0.iter().map(|(a, &q)| (a, q))
    }
}

impl<A: Into<AccountId>> FromIterator<(A, Quantity)> for Quantities {
    fn from_iter<I: IntoIterator<Item = (A, Quantity)>>(iter: I) -> Self {
        Quantities(iter.into_iter().map(|(a, q)| (a.into(), q)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_ordering_is_lexicographic() {
        assert!(AccountId::from("account10") < AccountId::from("account2"));
        assert!(AccountId::from("A") < AccountId::from("B"));
    }

    #[test]
    fn percent_parses_whole_and_fractional() {
        assert_eq!("60%".parse::<Percent>().unwrap().value(), 60.0);
        assert_eq!("12.5%".parse::<Percent>().unwrap().value(), 12.5);
        assert_eq!(" 0% ".parse::<Percent>().unwrap().value(), 0.0);
    }

    #[test]
    fn percent_rejects_missing_suffix() {
        let err = "60".parse::<Percent>().unwrap_err();
        assert!(err.reason().contains("'%'"));
    }

    #[test]
    fn percent_rejects_garbage() {
        assert!("%".parse::<Percent>().is_err());
        assert!("abc%".parse::<Percent>().is_err());
        assert!("-5%".parse::<Percent>().is_err());
        assert!("1.2.3%".parse::<Percent>().is_err());
        assert!("101%".parse::<Percent>().is_err());
    }

    #[test]
    fn percent_display() {
        assert_eq!(Percent::new(60.0).unwrap().to_string(), "60%");
        assert_eq!(Percent::new(12.5).unwrap().to_string(), "12.5%");
    }

    #[test]
    fn share_rounds_half_away_from_zero() {
        let half = Percent::new(50.0).unwrap();
        assert_eq!(half.share_of(5), 3); // 2.5 -> 3
        assert_eq!(half.share_of(4), 2);
        assert_eq!(Percent::new(33.0).unwrap().share_of(10), 3); // 3.3 -> 3
        assert_eq!(Percent::new(0.0).unwrap().share_of(1_000), 0);
        assert_eq!(Percent::new(100.0).unwrap().share_of(1_000), 1_000);
    }

    #[test]
    fn price_parsing() {
        assert_eq!("0.42$".parse::<Price>().unwrap(), Price(42));
        assert_eq!("$101.5".parse::<Price>().unwrap(), Price(10150));
        assert_eq!("7".parse::<Price>().unwrap(), Price(700));
        assert!("free".parse::<Price>().is_err());
        assert!("-1.00$".parse::<Price>().is_err());
    }

    #[test]
    fn price_display() {
        assert_eq!(format!("{}", Price(10050)), "$100.50");
        assert_eq!(format!("{}", Price(5)), "$0.05");
        assert_eq!(format!("{}", Price(-250)), "-$2.50");
    }

    #[test]
    fn quantities_total_near_max() {
        let q: Quantities = [("A", u64::MAX), ("B", 1)].into_iter().collect();
        assert_eq!(q.checked_total(), None);
        assert_eq!(q.total(), u64::MAX);

        let q: Quantities = [("A", u64::MAX - 1), ("B", 1)].into_iter().collect();
        assert_eq!(q.checked_total(), Some(u64::MAX));
    }

    #[test]
    fn quantities_total_and_lookup() {
        let q: Quantities = [("A", 40), ("B", 30), ("C", 30)].into_iter().collect();
        assert_eq!(q.total(), 100);
        assert_eq!(q.checked_total(), Some(100));
        assert_eq!(q.get("B"), Some(30));
        assert_eq!(q.get("Z"), None);
        assert_eq!(q.max_quantity(), 40);
        let order: Vec<&str> = q.accounts().map(AccountId::as_str).collect();
        assert_eq!(order, ["A", "B", "C"]);
    }
}

//! Final, ticker-tagged positions.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::AllocationError;
use crate::snapshot::{PreviousPositionSnapshot, encode_position};
use crate::types::{AccountId, Quantities, Quantity};

/// New per-account position for one ticker, ordered by account id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinalPosition {
    ticker: String,
    quantities: Quantities,
}

impl FinalPosition {
    pub fn new(ticker: impl Into<String>, quantities: Quantities) -> Self {
        FinalPosition {
            ticker: ticker.into(),
            quantities,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn quantities(&self) -> &Quantities {
        &self.quantities
    }

    pub fn get(&self, account: &str) -> Option<Quantity> {
        self.quantities.get(account)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Total quantity across all accounts.
    pub fn total(&self) -> Quantity {
        self.quantities.total()
    }

    /// Wire form: account to `"<quantity> <ticker>"`, ascending by account.
    pub fn encode(&self) -> BTreeMap<AccountId, String> {
        self.quantities
            .iter()
            .map(|(account, qty)| (account.clone(), encode_position(qty, &self.ticker)))
            .collect()
    }

    /// The snapshot a position sink hands back on the next cycle.
    pub fn to_previous(&self) -> PreviousPositionSnapshot {
        self.encode().into_iter().collect()
    }
}

impl fmt::Display for FinalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (account, qty)) in self.quantities.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{account}: {qty} {}", self.ticker)?;
        }
        write!(f, "}}")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FinalPosition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.quantities.len()))?;
        for (account, qty) in self.quantities.iter() {
            map.serialize_entry(account.as_str(), &encode_position(qty, &self.ticker))?;
        }
        map.end()
    }
}

/// Combine frozen and adjusted accounts into the final position.
///
/// Frozen accounts keep their previous quantity; adjusted accounts get
/// previous + delta. Accounts absent from `previous` start from 0.
pub fn merge(
    frozen: &Quantities,
    adjusted: &Quantities,
    previous: &Quantities,
    ticker: &str,
) -> Result<FinalPosition, AllocationError> {
    let held = |account: &AccountId| previous.get(account.as_str()).unwrap_or(0);

    let quantities = frozen
        .accounts()
        .map(|account| Ok((account.clone(), held(account))))
        .chain(adjusted.iter().map(|(account, delta)| {
            held(account)
                .checked_add(delta)
                .map(|qty| (account.clone(), qty))
                .ok_or_else(|| {
                    AllocationError::inconsistent(format!(
                        "{account}: adding {delta} overflows its position"
                    ))
                })
        }))
        .collect::<Result<Quantities, AllocationError>>()?;

    Ok(FinalPosition::new(ticker, quantities))
}

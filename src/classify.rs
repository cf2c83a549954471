//! Frozen versus adjustable accounts.

use std::collections::BTreeSet;

use crate::types::{AccountId, Quantities};

/// Disjoint partition of the cycle's accounts.
///
/// `frozen` maps each frozen account to its unchanged previous quantity,
/// `deltas` maps each adjustable account to the (positive) quantity it is owed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub frozen: Quantities,
    pub deltas: Quantities,
}

impl Classification {
    pub fn is_frozen(&self, account: &str) -> bool {
        self.frozen.contains(account)
    }

    pub fn is_adjustable(&self, account: &str) -> bool {
        self.deltas.contains(account)
    }

    /// Number of classified accounts.
    pub fn len(&self) -> usize {
        self.frozen.len() + self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frozen.is_empty() && self.deltas.is_empty()
    }
}

/// Split accounts into frozen and adjustable by comparing targets with previous holdings.
///
/// Covers every account that appears in either map. A missing previous
/// quantity counts as 0 and a missing target counts as 0, so an account that
/// left the split is frozen and a newly split account is adjustable.
/// `target == previous` is frozen.
pub fn classify(previous: &Quantities, targets: &Quantities) -> Classification {
    let accounts: BTreeSet<&AccountId> = previous.accounts().chain(targets.accounts()).collect();

    let mut result = Classification::default();
    for account in accounts {
        let held = previous.get(account.as_str()).unwrap_or(0);
        let target = targets.get(account.as_str()).unwrap_or(0);
        if target <= held {
            result.frozen.insert(account.clone(), held);
        } else {
            result.deltas.insert(account.clone(), target - held);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(entries: &[(&str, u64)]) -> Quantities {
        entries.iter().copied().collect()
    }

    #[test]
    fn steady_state_partition() {
        let previous = q(&[("A", 40), ("B", 30), ("C", 30)]);
        let targets = q(&[("A", 75), ("B", 45), ("C", 30)]);
        let c = classify(&previous, &targets);
        assert_eq!(c.deltas, q(&[("A", 35), ("B", 15)]));
        assert_eq!(c.frozen, q(&[("C", 30)]));
    }

    #[test]
    fn equality_is_frozen() {
        let c = classify(&q(&[("A", 10)]), &q(&[("A", 10)]));
        assert!(c.is_frozen("A"));
        assert!(!c.is_adjustable("A"));
    }

    #[test]
    fn overallocated_account_keeps_previous() {
        let c = classify(&q(&[("A", 90)]), &q(&[("A", 60)]));
        assert_eq!(c.frozen.get("A"), Some(90));
    }

    #[test]
    fn account_dropped_from_split_is_frozen() {
        let c = classify(&q(&[("A", 10), ("Z", 5)]), &q(&[("A", 20)]));
        assert_eq!(c.frozen.get("Z"), Some(5));
        assert_eq!(c.deltas.get("A"), Some(10));
    }

    #[test]
    fn new_account_is_adjustable() {
        let c = classify(&q(&[("A", 10)]), &q(&[("A", 10), ("N", 7)]));
        assert_eq!(c.deltas.get("N"), Some(7));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn new_account_with_zero_target_is_frozen_at_zero() {
        let c = classify(&q(&[("A", 10)]), &q(&[("A", 12), ("N", 0)]));
        assert_eq!(c.frozen.get("N"), Some(0));
    }

    #[test]
    fn every_previous_account_lands_exactly_once() {
        let previous = q(&[("A", 1), ("B", 50), ("C", 0), ("D", 20)]);
        let targets = q(&[("A", 5), ("B", 10), ("C", 0), ("D", 40)]);
        let c = classify(&previous, &targets);
        for account in previous.accounts() {
            let a = account.as_str();
            assert!(c.is_frozen(a) ^ c.is_adjustable(a), "{a} misclassified");
        }
    }
}

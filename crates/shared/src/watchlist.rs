use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of coin ids the user starred.
///
/// Membership only: display order always follows the coin list. Ids are not
/// checked against the current list, a stale id simply never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    ids: BTreeSet<String>,
}

impl Watchlist {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Watchlist {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, coin_id: &str) -> bool {
        self.ids.contains(coin_id)
    }

    /// Returns false when the id was already present.
    pub fn insert(&mut self, coin_id: &str) -> bool {
        self.ids.insert(coin_id.to_string())
    }

    /// Returns false when the id was not present.
    pub fn remove(&mut self, coin_id: &str) -> bool {
        self.ids.remove(coin_id)
    }

    /// Flips membership and returns whether the id is now watched.
    pub fn toggle(&mut self, coin_id: &str) -> bool {
        if self.remove(coin_id) {
            false
        } else {
            self.insert(coin_id);
            true
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_membership() {
        let mut watchlist = Watchlist::default();

        assert!(watchlist.toggle("bitcoin"));
        assert!(watchlist.contains("bitcoin"));
        assert!(!watchlist.toggle("bitcoin"));
        assert!(!watchlist.contains("bitcoin"));
        assert!(watchlist.is_empty());
    }

    #[test]
    fn test_double_insert_keeps_single_entry() {
        let mut watchlist = Watchlist::default();

        assert!(watchlist.insert("solana"));
        assert!(!watchlist.insert("solana"));
        assert_eq!(watchlist.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut watchlist = Watchlist::from_ids(["ethereum"]);
        assert!(!watchlist.remove("dogecoin"));
        assert_eq!(watchlist.len(), 1);
    }

    #[test]
    fn test_serializes_as_json_array() {
        let watchlist = Watchlist::from_ids(["solana", "bitcoin", "solana"]);
        let json = serde_json::to_string(&watchlist).unwrap();
        assert_eq!(json, r#"["bitcoin","solana"]"#);

        let parsed: Watchlist = serde_json::from_str(r#"["cardano","cardano"]"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed.contains("cardano"));
    }
}

//! Per-account currency totals: Mystic Coins from the material storage and
//! Laurels from the wallet, summed across the session's usable accounts.

use super::ApiProxyService;
use crate::session::SessionStateService;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const MATERIALS_PATH: &str = "v2/account/materials";
pub const WALLET_PATH: &str = "v2/account/wallet";
pub const MYSTIC_COIN_ITEM_ID: u64 = 19976;
pub const LAUREL_CURRENCY_ID: u64 = 3;

#[derive(Debug, Deserialize)]
struct MaterialSlot {
    id: u64,
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct WalletEntry {
    id: u64,
    #[serde(default)]
    value: u64,
}

/// One account's result. `None` marks a request that failed for this account;
/// an item missing from a successful response counts as zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountTotals {
    pub account_id: String,
    pub display_name: String,
    pub mystic_coins: Option<u64>,
    pub laurels: Option<u64>,
}

/// Sums over every account whose requests succeeded. Accounts are listed in
/// display-name order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CurrencyTotals {
    pub mystic_coins: u64,
    pub laurels: u64,
    pub accounts: Vec<AccountTotals>,
}

impl CurrencyTotals {
    #[must_use]
    pub fn from_accounts(accounts: Vec<AccountTotals>) -> Self {
        Self {
            mystic_coins: accounts.iter().filter_map(|a| a.mystic_coins).sum(),
            laurels: accounts.iter().filter_map(|a| a.laurels).sum(),
            accounts,
        }
    }
}

fn mystic_coins(materials: &[MaterialSlot]) -> u64 {
    materials
        .iter()
        .find(|slot| slot.id == MYSTIC_COIN_ITEM_ID)
        .map_or(0, |slot| slot.count)
}

fn laurels(wallet: &[WalletEntry]) -> u64 {
    wallet
        .iter()
        .find(|entry| entry.id == LAUREL_CURRENCY_ID)
        .map_or(0, |entry| entry.value)
}

impl ApiProxyService {
    /// Queries materials and wallet for each selected account of a fresh
    /// session; an empty selection means every usable account. Unknown or
    /// unusable account ids are skipped. A failing account never aborts the
    /// others.
    pub async fn query_currency_totals(
        &self,
        session: &SessionStateService,
        selected: &[String],
    ) -> CurrencyTotals {
        let Some(snapshot) = session.fresh_session().await else {
            debug!("no session, nothing to query");
            return CurrencyTotals::default();
        };

        let accounts: Vec<(String, String, String)> = snapshot
            .usable_accounts()
            .into_iter()
            .filter(|(id, _)| selected.is_empty() || selected.iter().any(|s| s.as_str() == *id))
            .filter_map(|(id, token)| {
                token
                    .token_value
                    .clone()
                    .map(|value| (id.to_string(), token.display_name.clone(), value))
            })
            .collect();

        let no_query = BTreeMap::new();
        let results = join_all(accounts.into_iter().map(|(account_id, display_name, token)| {
            let no_query = &no_query;
            async move {
                let (materials, wallet) = tokio::join!(
                    self.get_json::<Vec<MaterialSlot>>(MATERIALS_PATH, no_query, Some(token.as_str())),
                    self.get_json::<Vec<WalletEntry>>(WALLET_PATH, no_query, Some(token.as_str())),
                );

                let mystic_coins = materials
                    .map(|slots| mystic_coins(&slots))
                    .map_err(|err| warn!("materials for {} failed: {}", account_id, err))
                    .ok();
                let laurels = wallet
                    .map(|entries| laurels(&entries))
                    .map_err(|err| warn!("wallet for {} failed: {}", account_id, err))
                    .ok();

                AccountTotals {
                    account_id,
                    display_name,
                    mystic_coins,
                    laurels,
                }
            }
        }))
        .await;

        CurrencyTotals::from_accounts(results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(name: &str, mystic_coins: Option<u64>, laurels: Option<u64>) -> AccountTotals {
        AccountTotals {
            account_id: name.to_lowercase(),
            display_name: name.to_string(),
            mystic_coins,
            laurels,
        }
    }

    #[test]
    fn finds_mystic_coins_and_laurels() {
        let materials: Vec<MaterialSlot> = serde_json::from_str(
            r#"[{"id":12134,"category":5,"count":250},{"id":19976,"category":5,"count":42}]"#,
        )
        .unwrap();
        let wallet: Vec<WalletEntry> =
            serde_json::from_str(r#"[{"id":1,"value":100},{"id":3,"value":17}]"#).unwrap();

        assert_eq!(mystic_coins(&materials), 42);
        assert_eq!(laurels(&wallet), 17);
    }

    #[test]
    fn missing_items_count_as_zero() {
        assert_eq!(mystic_coins(&[]), 0);
        assert_eq!(laurels(&[WalletEntry { id: 1, value: 5 }]), 0);
    }

    #[test]
    fn totals_skip_failed_accounts() {
        let totals = CurrencyTotals::from_accounts(vec![
            account("Main", Some(10), Some(3)),
            account("Alt", None, Some(4)),
            account("Mule", Some(5), None),
        ]);

        assert_eq!(totals.mystic_coins, 15);
        assert_eq!(totals.laurels, 7);
        assert_eq!(totals.accounts.len(), 3);
        assert_eq!(totals.accounts[1].mystic_coins, None);
    }
}

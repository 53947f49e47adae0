//! Session snapshot returned by `GET /api/authinfo`. The wire names follow the
//! session endpoint; the Rust names describe what the fields mean. Token values
//! are credentials and are redacted from `Debug` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

/// Per-account credential record. A record with `error_tag` set is unusable;
/// the token may be absent while the error is present.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountToken {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub token_value: Option<String>,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_tag: Option<String>,
}

impl AccountToken {
    /// True when the record carries a token and no error.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.error_tag.is_none() && self.token_value.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for AccountToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountToken")
            .field("display_name", &self.display_name)
            .field("token_value", &self.token_value.as_ref().map(|_| "[REDACTED]"))
            .field("error_tag", &self.error_tag)
            .finish()
    }
}

/// One immutable view of the session. Published snapshots are shared behind an
/// `Arc` and never mutated; a new fetch always yields a new snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(rename = "sub")]
    pub subject_id: String,
    #[serde(rename = "gw2ApiPermissions", default)]
    pub granted_permissions: Vec<String>,
    #[serde(rename = "gw2ApiTokens", default)]
    pub account_tokens: HashMap<String, AccountToken>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

/// Order-independent view used for semantic equality.
#[derive(PartialEq, Eq)]
struct Normalized<'a> {
    subject_id: &'a str,
    expires_at_millis: i64,
    permissions: BTreeSet<&'a str>,
    tokens: BTreeMap<&'a str, &'a AccountToken>,
}

impl SessionSnapshot {
    fn normalized(&self) -> Normalized<'_> {
        Normalized {
            subject_id: &self.subject_id,
            expires_at_millis: self.expires_at.timestamp_millis(),
            permissions: self
                .granted_permissions
                .iter()
                .map(String::as_str)
                .collect(),
            tokens: self
                .account_tokens
                .iter()
                .map(|(id, token)| (id.as_str(), token))
                .collect(),
        }
    }

    /// True once `now` is past `expires_at`; the snapshot must be re-fetched.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.granted_permissions.iter().any(|p| p == permission)
    }

    /// Token value for an account, if the account exists and carries one.
    #[must_use]
    pub fn token_for(&self, account_id: &str) -> Option<&str> {
        self.account_tokens
            .get(account_id)
            .and_then(|token| token.token_value.as_deref())
    }

    /// Accounts with a usable token, sorted by display name.
    #[must_use]
    pub fn usable_accounts(&self) -> Vec<(&str, &AccountToken)> {
        let mut accounts: Vec<_> = self
            .account_tokens
            .iter()
            .filter(|(_, token)| token.is_usable())
            .map(|(id, token)| (id.as_str(), token))
            .collect();
        accounts.sort_by(|a, b| {
            a.1.display_name
                .cmp(&b.1.display_name)
                .then_with(|| a.0.cmp(b.0))
        });
        accounts
    }

    /// Accounts flagged with an error, sorted by account id.
    #[must_use]
    pub fn invalid_accounts(&self) -> Vec<(&str, &AccountToken)> {
        let mut accounts: Vec<_> = self
            .account_tokens
            .iter()
            .filter(|(_, token)| token.error_tag.is_some())
            .map(|(id, token)| (id.as_str(), token))
            .collect();
        accounts.sort_by(|a, b| a.0.cmp(b.0));
        accounts
    }
}

/// Semantic equality: same subject, same expiry to the millisecond, same
/// permissions as a set, and the same token records per account id.
impl PartialEq for SessionSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for SessionSnapshot {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token(name: &str, value: Option<&str>, error: Option<&str>) -> AccountToken {
        AccountToken {
            display_name: name.to_string(),
            token_value: value.map(str::to_string),
            error_tag: error.map(str::to_string),
        }
    }

    fn expiry() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).single().unwrap_or_default()
    }

    fn snapshot(
        permissions: &[&str],
        tokens: &[(&str, AccountToken)],
        expires_at: DateTime<Utc>,
    ) -> SessionSnapshot {
        SessionSnapshot {
            subject_id: "u1".to_string(),
            granted_permissions: permissions.iter().map(|p| (*p).to_string()).collect(),
            account_tokens: tokens
                .iter()
                .map(|(id, t)| ((*id).to_string(), t.clone()))
                .collect(),
            expires_at,
        }
    }

    #[test]
    fn equal_regardless_of_insertion_order() {
        let a = snapshot(
            &["account", "wallet"],
            &[
                ("a1", token("Main", Some("tok"), None)),
                ("a2", token("Alt", None, Some("invalid"))),
            ],
            expiry(),
        );
        let b = snapshot(
            &["wallet", "account"],
            &[
                ("a2", token("Alt", None, Some("invalid"))),
                ("a1", token("Main", Some("tok"), None)),
            ],
            expiry(),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn expiry_compared_to_the_millisecond() {
        let a = snapshot(&["account"], &[], expiry());
        let b = snapshot(
            &["account"],
            &[],
            expiry() + chrono::Duration::microseconds(500),
        );
        let c = snapshot(&["account"], &[], expiry() + chrono::Duration::milliseconds(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn permissions_must_match_as_sets() {
        let a = snapshot(&["account"], &[], expiry());
        let b = snapshot(&["account", "wallet"], &[], expiry());
        assert_ne!(a, b);
        assert_ne!(b, a);
    }

    #[test]
    fn token_fields_and_keys_must_match() {
        let base = snapshot(&[], &[("a1", token("Main", Some("tok"), None))], expiry());
        let renamed = snapshot(&[], &[("a1", token("Other", Some("tok"), None))], expiry());
        let new_token = snapshot(&[], &[("a1", token("Main", Some("tok2"), None))], expiry());
        let errored = snapshot(
            &[],
            &[("a1", token("Main", Some("tok"), Some("expired")))],
            expiry(),
        );
        let extra = snapshot(
            &[],
            &[
                ("a1", token("Main", Some("tok"), None)),
                ("a2", token("Alt", Some("tok"), None)),
            ],
            expiry(),
        );
        let other_key = snapshot(&[], &[("b1", token("Main", Some("tok"), None))], expiry());

        for other in [&renamed, &new_token, &errored, &extra, &other_key] {
            assert_ne!(&base, other);
            assert_ne!(other, &base);
        }
    }

    #[test]
    fn subject_must_match() {
        let a = snapshot(&[], &[], expiry());
        let mut b = a.clone();
        b.subject_id = "u2".to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn deserializes_wire_names() {
        let json = r#"{
            "sub": "u1",
            "gw2ApiPermissions": ["account"],
            "gw2ApiTokens": {
                "a1": {"name": "Main", "token": "tok"},
                "a2": {"name": "Alt", "error": "invalid"}
            },
            "expiresAt": "2023-11-14T22:13:20.123Z"
        }"#;
        let parsed: SessionSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.subject_id, "u1");
        assert!(parsed.has_permission("account"));
        assert_eq!(parsed.token_for("a1"), Some("tok"));
        assert_eq!(parsed.token_for("a2"), None);
        assert_eq!(parsed.expires_at, expiry());
    }

    #[test]
    fn usable_and_invalid_accounts_are_split() {
        let s = snapshot(
            &[],
            &[
                ("a1", token("Zeta", Some("tok1"), None)),
                ("a2", token("Alpha", Some("tok2"), None)),
                ("a3", token("Broken", None, Some("invalid"))),
            ],
            expiry(),
        );
        let usable: Vec<_> = s.usable_accounts().into_iter().map(|(id, _)| id).collect();
        assert_eq!(usable, vec!["a2", "a1"]);
        let invalid: Vec<_> = s.invalid_accounts().into_iter().map(|(id, _)| id).collect();
        assert_eq!(invalid, vec!["a3"]);
    }

    #[test]
    fn expiry_check() {
        let s = snapshot(&[], &[], expiry());
        assert!(!s.is_expired_at(expiry()));
        assert!(s.is_expired_at(expiry() + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn debug_redacts_token_values() {
        let t = token("Main", Some("secret-token"), None);
        let rendered = format!("{t:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}

use crate::{
    cli::globals::GlobalArgs,
    session::{Session, SessionSnapshot},
};
use anyhow::Result;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub keep_alive: Option<Duration>,
    pub count: Option<usize>,
}

/// Print the session, then every change while keep-alive runs.
/// # Errors
/// Returns an error if the session client cannot be built or output fails.
pub async fn execute(args: Args) -> Result<()> {
    debug!("{:?}", args);

    let service = args.globals.session_service()?;
    let mut stream = service.observe_session(true);
    let _keep_alive = args
        .keep_alive
        .map(|interval| service.start_keep_alive(interval));

    // Without keep-alive there is only the initial value to wait for.
    let limit = match (args.keep_alive, args.count) {
        (_, Some(count)) => Some(count),
        (None, None) => Some(1),
        (Some(_), None) => None,
    };

    let mut printed = 0_usize;
    while limit.map_or(true, |limit| printed < limit) {
        let next = tokio::select! {
            next = stream.next() => next,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                break;
            }
        };

        let Some(session) = next else {
            break;
        };

        println!("{}", serde_json::to_string_pretty(&summary(&session))?);
        printed += 1;
    }

    Ok(())
}

/// Printable view of a session; token values never appear.
fn summary(session: &Session) -> Value {
    session
        .as_deref()
        .map_or_else(|| json!({ "authenticated": false }), snapshot_summary)
}

fn snapshot_summary(snapshot: &SessionSnapshot) -> Value {
    let mut permissions = snapshot.granted_permissions.clone();
    permissions.sort();

    let accounts: Vec<Value> = snapshot
        .usable_accounts()
        .into_iter()
        .map(|(id, token)| json!({ "id": id, "name": token.display_name }))
        .collect();

    let invalid: Vec<Value> = snapshot
        .invalid_accounts()
        .into_iter()
        .map(|(id, token)| {
            json!({ "id": id, "name": token.display_name, "error": token.error_tag })
        })
        .collect();

    json!({
        "authenticated": true,
        "sub": snapshot.subject_id,
        "expiresAt": snapshot.expires_at.to_rfc3339(),
        "permissions": permissions,
        "accounts": accounts,
        "invalidAccounts": invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AccountToken;
    use chrono::{TimeZone, Utc};
    use std::{collections::HashMap, sync::Arc};

    fn snapshot() -> SessionSnapshot {
        let mut tokens = HashMap::new();
        tokens.insert(
            "a2".to_string(),
            AccountToken {
                display_name: "Zeta".to_string(),
                token_value: Some("secret-2".to_string()),
                error_tag: None,
            },
        );
        tokens.insert(
            "a1".to_string(),
            AccountToken {
                display_name: "Alpha".to_string(),
                token_value: Some("secret-1".to_string()),
                error_tag: None,
            },
        );
        tokens.insert(
            "a3".to_string(),
            AccountToken {
                display_name: "Broken".to_string(),
                token_value: None,
                error_tag: Some("invalid".to_string()),
            },
        );

        SessionSnapshot {
            subject_id: "u1".to_string(),
            granted_permissions: vec!["wallet".to_string(), "account".to_string()],
            account_tokens: tokens,
            expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).single().unwrap_or_default(),
        }
    }

    #[test]
    fn absent_session_summary() {
        assert_eq!(summary(&None), json!({ "authenticated": false }));
    }

    #[test]
    fn summary_sorts_and_redacts() {
        let value = summary(&Some(Arc::new(snapshot())));

        assert_eq!(value["sub"], "u1");
        assert_eq!(value["permissions"], json!(["account", "wallet"]));
        assert_eq!(value["accounts"][0]["name"], "Alpha");
        assert_eq!(value["accounts"][1]["name"], "Zeta");
        assert_eq!(value["invalidAccounts"][0]["id"], "a3");
        assert_eq!(value["invalidAccounts"][0]["error"], "invalid");

        let rendered = value.to_string();
        assert!(!rendered.contains("secret-1"));
        assert!(!rendered.contains("secret-2"));
    }
}

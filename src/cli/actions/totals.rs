use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub accounts: Vec<String>,
}

/// Print Mystic Coin and Laurel totals as JSON. Accounts whose requests failed
/// are listed with `null` amounts.
/// # Errors
/// Returns an error if the HTTP clients cannot be built.
pub async fn execute(args: Args) -> Result<()> {
    debug!(accounts = ?args.accounts, "querying currency totals");

    let session = args.globals.session_service()?;
    let proxy = args.globals.proxy_service()?;

    let totals = proxy.query_currency_totals(&session, &args.accounts).await;
    if totals.accounts.is_empty() {
        warn!("no usable accounts in the current session");
    }

    let text = serde_json::to_string_pretty(&totals).context("failed to encode totals")?;
    println!("{text}");

    Ok(())
}

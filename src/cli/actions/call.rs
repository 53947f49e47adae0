use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub account: Option<String>,
    pub token: Option<SecretString>,
}

/// Call the API and print the rendered response. API failures are part of the
/// printed text, not errors.
/// # Errors
/// Returns an error if the HTTP clients cannot be built.
pub async fn execute(args: Args) -> Result<()> {
    debug!(path = %args.path, account = ?args.account, "calling api");

    let proxy = args.globals.proxy_service()?;

    let text = match (&args.account, &args.token) {
        (Some(account), _) => {
            let session = args.globals.session_service()?;
            proxy
                .call_api_for_account(&session, account, &args.path, &args.params)
                .await
        }
        (None, Some(token)) => {
            proxy
                .call_api(&args.path, &args.params, Some(token.expose_secret()))
                .await
        }
        (None, None) => proxy.call_api(&args.path, &args.params, None).await,
    };

    println!("{text}");

    Ok(())
}

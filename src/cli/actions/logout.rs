use crate::cli::globals::GlobalArgs;
use anyhow::{bail, Context, Result};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub redirect: Option<String>,
}

/// End the session on the session endpoint.
/// # Errors
/// Returns an error if the endpoint rejects the logout or cannot be reached.
pub async fn execute(args: Args) -> Result<()> {
    debug!("{:?}", args);

    let service = args.globals.session_service()?;
    let cleared = service
        .logout(args.redirect)
        .await
        .context("logout task failed")?;

    if !cleared {
        bail!("logout was not accepted by {}", args.globals.session_url);
    }

    info!("logged out");
    println!("logged out");

    Ok(())
}

use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub set_enabled: Option<bool>,
}

fn describe(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

/// Print or change the background refresh setting of the session endpoint.
/// # Errors
/// Returns an error if the endpoint cannot be reached or rejects the request.
pub async fn execute(args: Args) -> Result<()> {
    debug!("{:?}", args);

    let service = args.globals.session_service()?;

    match args.set_enabled {
        Some(true) => service
            .enable_background_refresh()
            .await
            .context("failed to enable background refresh")?,
        Some(false) => service
            .disable_background_refresh()
            .await
            .context("failed to disable background refresh")?,
        None => {}
    }

    let enabled = match args.set_enabled {
        Some(enabled) => enabled,
        None => service
            .background_refresh_status()
            .await
            .context("failed to read background refresh status")?,
    };

    println!("background refresh {}", describe(enabled));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_both_states() {
        assert_eq!(describe(true), "enabled");
        assert_eq!(describe(false), "disabled");
    }
}

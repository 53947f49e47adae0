use crate::cli::actions::{background_refresh, call, logout, session, totals, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Session(args) => session::execute(args).await,
        Action::Logout(args) => logout::execute(args).await,
        Action::Call(args) => call::execute(args).await,
        Action::BackgroundRefresh(args) => background_refresh::execute(args).await,
        Action::Totals(args) => totals::execute(args).await,
    }
}

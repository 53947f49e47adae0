pub mod background_refresh;
pub mod call;
pub mod logout;
pub mod session;
pub mod totals;

// Internal "interpreter" for `Action`.
mod run;

#[derive(Debug)]
pub enum Action {
    Session(session::Args),
    Logout(logout::Args),
    Call(call::Args),
    BackgroundRefresh(background_refresh::Args),
    Totals(totals::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

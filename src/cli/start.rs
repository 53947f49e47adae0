use crate::cli::{
    actions::Action,
    commands::{self, ARG_LOG_FORMAT, ARG_VERBOSITY},
    dispatch,
    telemetry::{self, LogFormat},
};
use anyhow::Result;
use clap::ArgMatches;

/// Logging settings read from the root command.
fn log_settings(matches: &ArgMatches) -> Result<(tracing::Level, LogFormat)> {
    let verbosity = matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0);
    let format = matches
        .get_one::<String>(ARG_LOG_FORMAT)
        .map(|value| value.parse::<LogFormat>())
        .transpose()?
        .unwrap_or_default();

    Ok((telemetry::level_for(verbosity), format))
}

/// Parse arguments and resolve the action. Endpoint settings are validated
/// before logging is installed, so a bad URL fails without side effects.
///
/// # Errors
///
/// Returns an error if settings are invalid or telemetry initialization fails
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let action = dispatch::handler(&matches)?;

    let (level, format) = log_settings(&matches)?;
    telemetry::init(level, format)?;

    Ok(action)
}

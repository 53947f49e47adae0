pub mod api;
pub mod session;

use crate::cli::telemetry::LogFormat;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        PossibleValuesParser, TypedValueParser, ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_TIMEOUT_MS: &str = "timeout-ms";
pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_FORMAT: &str = "log-format";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// `AUTHLINK_LOG_LEVEL` names map onto the same count `-v` flags produce.
fn log_level_parser() -> ValueParser {
    ValueParser::new(
        PossibleValuesParser::new(LOG_LEVELS)
            .map(|level| {
                LOG_LEVELS
                    .iter()
                    .position(|l| *l == level)
                    .and_then(|index| u8::try_from(index).ok())
                    .unwrap_or(0)
            }),
    )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authlink")
        .about("Session state synchronization and API proxy client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_TIMEOUT_MS)
                .long(ARG_TIMEOUT_MS)
                .help("HTTP request timeout in milliseconds (default: 10000)")
                .env("AUTHLINK_TIMEOUT_MS")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    let command = command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Log more: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
                .env("AUTHLINK_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(log_level_parser()),
        )
        .arg(
            Arg::new(ARG_LOG_FORMAT)
                .long(ARG_LOG_FORMAT)
                .help("Log output format on stderr")
                .env("AUTHLINK_LOG_FORMAT")
                .default_value(LogFormat::Pretty.as_str())
                .global(true)
                .value_parser([LogFormat::Pretty.as_str(), LogFormat::Json.as_str()]),
        );

    let command = session::with_args(command);
    api::with_args(command)
}

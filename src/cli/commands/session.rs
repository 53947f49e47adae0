use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

pub const ARG_SESSION_URL: &str = "session-url";
pub const ARG_SESSION_COOKIE: &str = "session-cookie";

pub const CMD_SESSION: &str = "session";
pub const ARG_KEEP_ALIVE_SECONDS: &str = "keep-alive-seconds";
pub const ARG_COUNT: &str = "count";

pub const CMD_LOGOUT: &str = "logout";
pub const ARG_REDIRECT: &str = "redirect";
pub const ARG_NO_REDIRECT: &str = "no-redirect";

pub const CMD_BACKGROUND_REFRESH: &str = "background-refresh";
pub const ARG_ENABLE: &str = "enable";
pub const ARG_DISABLE: &str = "disable";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_URL)
                .long(ARG_SESSION_URL)
                .help("Base URL of the session endpoint (serves /api/authinfo and /logout)")
                .env("AUTHLINK_SESSION_URL")
                .default_value("http://localhost:8080")
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE)
                .long(ARG_SESSION_COOKIE)
                .help("Cookie header sent to the session endpoint, example: SESSION=abc123")
                .env("AUTHLINK_SESSION_COOKIE")
                .hide_env_values(true)
                .global(true),
        )
        .subcommand(
            Command::new(CMD_SESSION)
                .about("Print the current session and, with keep-alive, every change")
                .arg(
                    Arg::new(ARG_KEEP_ALIVE_SECONDS)
                        .long(ARG_KEEP_ALIVE_SECONDS)
                        .short('k')
                        .help("Re-fetch the session every N seconds and print changes")
                        .env("AUTHLINK_KEEP_ALIVE_SECONDS")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new(ARG_COUNT)
                        .long(ARG_COUNT)
                        .short('n')
                        .help("Stop after printing N session values")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new(CMD_LOGOUT)
                .about("End the session on the session endpoint")
                .arg(
                    Arg::new(ARG_REDIRECT)
                        .long(ARG_REDIRECT)
                        .help("Navigation target after a successful logout")
                        .default_value(crate::session::DEFAULT_REDIRECT),
                )
                .arg(
                    Arg::new(ARG_NO_REDIRECT)
                        .long(ARG_NO_REDIRECT)
                        .help("Do not navigate after logout")
                        .action(ArgAction::SetTrue)
                        .conflicts_with(ARG_REDIRECT),
                ),
        )
        .subcommand(
            Command::new(CMD_BACKGROUND_REFRESH)
                .about("Show or change server-side background refresh of the session")
                .arg(
                    Arg::new(ARG_ENABLE)
                        .long(ARG_ENABLE)
                        .help("Turn background refresh on")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new(ARG_DISABLE)
                        .long(ARG_DISABLE)
                        .help("Turn background refresh off")
                        .action(ArgAction::SetTrue)
                        .conflicts_with(ARG_ENABLE),
                ),
        )
}

/// Session endpoint settings shared by every subcommand.
#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub cookie: Option<SecretString>,
}

impl Options {
    /// # Errors
    /// Returns an error if the session URL is missing or not an http(s) URL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_SESSION_URL)
            .and_then(|value| normalize_value(value))
            .context("missing required argument: --session-url")?;
        validate_base_url(&url).context("invalid AUTHLINK_SESSION_URL")?;

        let cookie = matches
            .get_one::<String>(ARG_SESSION_COOKIE)
            .and_then(|value| normalize_value(value))
            .map(SecretString::from);

        Ok(Self { url, cookie })
    }
}

#[derive(Debug)]
pub struct SessionOptions {
    pub keep_alive: Option<Duration>,
    pub count: Option<usize>,
}

impl SessionOptions {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            keep_alive: matches
                .get_one::<u64>(ARG_KEEP_ALIVE_SECONDS)
                .map(|seconds| Duration::from_secs(*seconds)),
            count: matches.get_one::<usize>(ARG_COUNT).copied(),
        }
    }
}

#[derive(Debug)]
pub struct LogoutOptions {
    pub redirect: Option<String>,
}

impl LogoutOptions {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let redirect = if matches.get_flag(ARG_NO_REDIRECT) {
            None
        } else {
            matches.get_one::<String>(ARG_REDIRECT).cloned()
        };

        Self { redirect }
    }
}

/// `None` only reads the current setting.
#[derive(Debug)]
pub struct BackgroundRefreshOptions {
    pub set_enabled: Option<bool>,
}

impl BackgroundRefreshOptions {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let set_enabled = if matches.get_flag(ARG_ENABLE) {
            Some(true)
        } else if matches.get_flag(ARG_DISABLE) {
            Some(false)
        } else {
            None
        };

        Self { set_enabled }
    }
}

/// Trims a value and treats blank input as unset.
#[must_use]
pub fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Accepts only absolute http(s) URLs with a host.
///
/// # Errors
/// Returns an error describing why the URL was rejected.
pub fn validate_base_url(value: &str) -> Result<()> {
    let url = Url::parse(value)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(anyhow!("unsupported scheme {scheme}")),
    }

    if url.host().is_none() {
        return Err(anyhow!("no host specified"));
    }

    Ok(())
}

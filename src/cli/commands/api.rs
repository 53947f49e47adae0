use super::session::{normalize_value, validate_base_url};
use crate::proxy::{collect_params, QueryParam, DEFAULT_API_BASE_URL};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;
use std::collections::BTreeMap;

pub const ARG_API_URL: &str = "api-url";

pub const CMD_CALL: &str = "call";
pub const ARG_PATH: &str = "path";
pub const ARG_QUERY: &str = "query";
pub const ARG_ACCOUNT: &str = "account";
pub const ARG_TOKEN: &str = "token";

pub const CMD_TOTALS: &str = "totals";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base origin of the third-party API")
                .env("AUTHLINK_API_URL")
                .default_value(DEFAULT_API_BASE_URL)
                .global(true),
        )
        .subcommand(
            Command::new(CMD_CALL)
                .about("Call the third-party API and print status, headers and body")
                .arg(
                    Arg::new(ARG_PATH)
                        .help("Resource path, example: v2/account/wallet")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_QUERY)
                        .long(ARG_QUERY)
                        .short('q')
                        .help("Query parameter as name=value, may be repeated")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new(ARG_ACCOUNT)
                        .long(ARG_ACCOUNT)
                        .short('a')
                        .help("Account id whose token is taken from the current session"),
                )
                .arg(
                    Arg::new(ARG_TOKEN)
                        .long(ARG_TOKEN)
                        .help("Explicit access token")
                        .env("AUTHLINK_ACCESS_TOKEN")
                        .hide_env_values(true)
                        .conflicts_with(ARG_ACCOUNT),
                ),
        )
        .subcommand(
            Command::new(CMD_TOTALS)
                .about("Sum Mystic Coins and Laurels across the session's accounts")
                .arg(
                    Arg::new(ARG_ACCOUNT)
                        .long(ARG_ACCOUNT)
                        .short('a')
                        .help("Account id to include, may be repeated (default: all usable)")
                        .action(ArgAction::Append),
                ),
        )
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
}

impl Options {
    /// # Errors
    /// Returns an error if the API URL is missing or not an http(s) URL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_API_URL)
            .and_then(|value| normalize_value(value))
            .context("missing required argument: --api-url")?;
        validate_base_url(&url).context("invalid AUTHLINK_API_URL")?;

        Ok(Self { url })
    }
}

#[derive(Debug)]
pub struct CallOptions {
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub account: Option<String>,
    pub token: Option<SecretString>,
}

impl CallOptions {
    /// # Errors
    /// Returns an error if the path is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let path = matches
            .get_one::<String>(ARG_PATH)
            .cloned()
            .context("missing required argument: <path>")?;

        let entries = matches
            .get_many::<String>(ARG_QUERY)
            .into_iter()
            .flatten()
            .flat_map(|raw| raw.parse::<QueryParam>());

        Ok(Self {
            path,
            params: collect_params(entries),
            account: matches
                .get_one::<String>(ARG_ACCOUNT)
                .and_then(|value| normalize_value(value)),
            token: matches
                .get_one::<String>(ARG_TOKEN)
                .and_then(|value| normalize_value(value))
                .map(SecretString::from),
        })
    }
}

#[derive(Debug)]
pub struct TotalsOptions {
    pub accounts: Vec<String>,
}

impl TotalsOptions {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let accounts = matches
            .get_many::<String>(ARG_ACCOUNT)
            .into_iter()
            .flatten()
            .filter_map(|value| normalize_value(value))
            .collect();

        Self { accounts }
    }
}

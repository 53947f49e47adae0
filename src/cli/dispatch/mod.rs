//! Maps validated CLI arguments to an action.

use crate::cli::actions::{
    background_refresh, call, logout, session as session_action, totals, Action,
};
use crate::cli::commands::{api, session, ARG_TIMEOUT_MS};
use crate::cli::globals::GlobalArgs;
use crate::http::DEFAULT_TIMEOUT_MS;
use anyhow::{bail, Result};
use std::time::Duration;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let session_opts = session::Options::parse(matches)?;
    let api_opts = api::Options::parse(matches)?;
    let timeout_ms = matches
        .get_one::<u64>(ARG_TIMEOUT_MS)
        .copied()
        .unwrap_or(DEFAULT_TIMEOUT_MS);

    let mut globals = GlobalArgs::new(
        session_opts.url,
        api_opts.url,
        Duration::from_millis(timeout_ms),
    );
    globals.set_session_cookie(session_opts.cookie);

    match matches.subcommand() {
        Some((session::CMD_SESSION, sub)) => {
            let options = session::SessionOptions::parse(sub);
            Ok(Action::Session(session_action::Args {
                globals,
                keep_alive: options.keep_alive,
                count: options.count,
            }))
        }
        Some((session::CMD_LOGOUT, sub)) => {
            let options = session::LogoutOptions::parse(sub);
            Ok(Action::Logout(logout::Args {
                globals,
                redirect: options.redirect,
            }))
        }
        Some((api::CMD_CALL, sub)) => {
            let options = api::CallOptions::parse(sub)?;
            Ok(Action::Call(call::Args {
                globals,
                path: options.path,
                params: options.params,
                account: options.account,
                token: options.token,
            }))
        }
        Some((session::CMD_BACKGROUND_REFRESH, sub)) => {
            let options = session::BackgroundRefreshOptions::parse(sub);
            Ok(Action::BackgroundRefresh(background_refresh::Args {
                globals,
                set_enabled: options.set_enabled,
            }))
        }
        Some((api::CMD_TOTALS, sub)) => {
            let options = api::TotalsOptions::parse(sub);
            Ok(Action::Totals(totals::Args {
                globals,
                accounts: options.accounts,
            }))
        }
        Some((name, _)) => bail!("unknown subcommand: {name}"),
        None => bail!("missing subcommand"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn clean_env() -> [(&'static str, Option<&'static str>); 6] {
        [
            ("AUTHLINK_SESSION_URL", None),
            ("AUTHLINK_SESSION_COOKIE", None),
            ("AUTHLINK_API_URL", None),
            ("AUTHLINK_TIMEOUT_MS", None),
            ("AUTHLINK_ACCESS_TOKEN", None),
            ("AUTHLINK_KEEP_ALIVE_SECONDS", None),
        ]
    }

    #[test]
    fn session_action_carries_globals() {
        temp_env::with_vars(clean_env(), || {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "authlink",
                "--timeout-ms",
                "1500",
                "--session-cookie",
                "SESSION=abc",
                "session",
                "-k",
                "30",
                "-n",
                "3",
            ]);

            match handler(&matches) {
                Ok(Action::Session(args)) => {
                    assert_eq!(args.globals.session_url, "http://localhost:8080");
                    assert_eq!(args.globals.timeout, Duration::from_millis(1500));
                    assert_eq!(
                        args.globals
                            .session_cookie
                            .as_ref()
                            .map(|c| c.expose_secret().to_string()),
                        Some("SESSION=abc".to_string())
                    );
                    assert_eq!(args.keep_alive, Some(Duration::from_secs(30)));
                    assert_eq!(args.count, Some(3));
                }
                other => panic!("unexpected dispatch result: {other:?}"),
            }
        });
    }

    #[test]
    fn timeout_defaults_when_unset() {
        temp_env::with_vars(clean_env(), || {
            let matches =
                crate::cli::commands::new().get_matches_from(vec!["authlink", "session"]);

            match handler(&matches) {
                Ok(Action::Session(args)) => {
                    assert_eq!(
                        args.globals.timeout,
                        Duration::from_millis(DEFAULT_TIMEOUT_MS)
                    );
                    assert!(args.keep_alive.is_none());
                }
                other => panic!("unexpected dispatch result: {other:?}"),
            }
        });
    }

    #[test]
    fn logout_action_defaults_to_root_redirect() {
        temp_env::with_vars(clean_env(), || {
            let matches =
                crate::cli::commands::new().get_matches_from(vec!["authlink", "logout"]);

            match handler(&matches) {
                Ok(Action::Logout(args)) => assert_eq!(args.redirect.as_deref(), Some("/")),
                other => panic!("unexpected dispatch result: {other:?}"),
            }
        });
    }

    #[test]
    fn call_action_with_token() {
        temp_env::with_vars(clean_env(), || {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "authlink",
                "call",
                "v2/account",
                "--token",
                "tok-1",
                "-q",
                "access_token=ignored",
            ]);

            match handler(&matches) {
                Ok(Action::Call(args)) => {
                    assert_eq!(args.path, "v2/account");
                    assert_eq!(
                        args.token.as_ref().map(|t| t.expose_secret().to_string()),
                        Some("tok-1".to_string())
                    );
                    assert!(args.account.is_none());
                    assert_eq!(
                        args.params.get("access_token").map(String::as_str),
                        Some("ignored")
                    );
                }
                other => panic!("unexpected dispatch result: {other:?}"),
            }
        });
    }

    #[test]
    fn background_refresh_action_reads_flags() {
        temp_env::with_vars(clean_env(), || {
            let matches = crate::cli::commands::new()
                .get_matches_from(vec!["authlink", "background-refresh", "--disable"]);

            match handler(&matches) {
                Ok(Action::BackgroundRefresh(args)) => {
                    assert_eq!(args.set_enabled, Some(false));
                }
                other => panic!("unexpected dispatch result: {other:?}"),
            }
        });
    }

    #[test]
    fn totals_action_defaults_to_all_accounts() {
        temp_env::with_vars(clean_env(), || {
            let matches =
                crate::cli::commands::new().get_matches_from(vec!["authlink", "totals"]);

            match handler(&matches) {
                Ok(Action::Totals(args)) => assert!(args.accounts.is_empty()),
                other => panic!("unexpected dispatch result: {other:?}"),
            }
        });
    }

    #[test]
    fn invalid_session_url_is_rejected() {
        temp_env::with_vars(clean_env(), || {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "authlink",
                "--session-url",
                "ftp://example.com",
                "session",
            ]);

            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err.to_string().contains("invalid AUTHLINK_SESSION_URL"));
            }
        });
    }

    #[test]
    fn blank_api_url_is_rejected() {
        temp_env::with_vars(clean_env(), || {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "authlink",
                "--api-url",
                "  ",
                "session",
            ]);

            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err.to_string().contains("missing required argument: --api-url"));
            }
        });
    }
}

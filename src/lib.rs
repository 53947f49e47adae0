//! # Authlink (session synchronization and API proxy client)
//!
//! `authlink` keeps one authoritative view of the signed-in user's session and
//! lets unrelated consumers share it without issuing duplicate requests. It also
//! proxies calls to a third-party public API on behalf of the user, injecting the
//! per-account access token and rendering the raw response for inspection.
//!
//! ## Session State
//!
//! [`session::SessionStateService`] fetches `GET /api/authinfo` from the session
//! endpoint and publishes the result on a replay-of-1 stream.
//!
//! - **Baseline:** The first resolution is always published, even when it is
//!   `absent` (no session).
//! - **Deduplication:** Later resolutions are only published when they differ
//!   semantically from the held value, so keep-alive polling does not churn
//!   subscribers.
//! - **Failures:** Network errors, non-2xx statuses and malformed bodies resolve to
//!   `absent`. Nothing surfaces to consumers as an error.
//!
//! ## API Proxy
//!
//! [`proxy::ApiProxyService`] issues a single `GET` against the third-party API
//! and folds success, HTTP errors and transport failures into the same
//! `Status / Headers / Body` text block.
//!
//! Token values and session cookies are credentials; callers must never log them.

pub mod cli;
pub mod error;
pub mod http;
pub mod proxy;
pub mod session;

pub use error::Error;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}

//! Diagnostic rendering of a proxied response. The layout is fixed:
//!
//! ```text
//! Status: <code>
//!
//! Headers:
//! <name>: <value1>; <value2>
//!
//! Body:
//! <body or transport error>
//! ```

use reqwest::{header::HeaderMap, Response};
use std::fmt::Write;

/// Everything the renderer needs from one proxied call. A transport failure has
/// status `0`, no headers and only an error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(String, Vec<String>)>,
    pub body: Option<String>,
    pub error: Option<String>,
}

impl ProxyResponse {
    /// Captures status, headers and body. Non-2xx responses are captured the
    /// same way as successes.
    pub async fn capture(response: Response) -> Self {
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        match response.text().await {
            Ok(body) => Self {
                status,
                headers,
                body: Some(body),
                error: None,
            },
            Err(err) => Self {
                status,
                headers,
                body: None,
                error: Some(err.without_url().to_string()),
            },
        }
    }

    #[must_use]
    pub fn transport_failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Groups header values by name, keeping the order in which the transport
/// exposes the names.
#[must_use]
pub fn collect_headers(headers: &HeaderMap) -> Vec<(String, Vec<String>)> {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect();
            (name.as_str().to_string(), values)
        })
        .collect()
}

#[must_use]
pub fn render(response: &ProxyResponse) -> String {
    let mut text = format!("Status: {}\n\nHeaders:\n", response.status);

    for (name, values) in &response.headers {
        // Writing into a String cannot fail.
        let _ = writeln!(text, "{}: {}", name, values.join("; "));
    }

    text.push_str("\nBody:\n");

    if let Some(body) = &response.body {
        text.push_str(body);
    } else if let Some(error) = &response.error {
        text.push_str(error);
    }

    text
}

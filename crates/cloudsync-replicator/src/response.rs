//! Captured HTTP responses.
//!
//! Every Cloud Sync call reads its response fully into a [`RawResponse`]
//! before interpreting it, so that failures can carry the exact endpoint,
//! status, headers and body back to the caller.

use std::fmt;

/// A fully-read HTTP response, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// `METHOD url` of the request that produced this response.
    pub endpoint: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    /// Drain a `reqwest::Response` into memory.
    pub async fn read(
        method: &reqwest::Method,
        response: reqwest::Response,
    ) -> Result<Self, reqwest::Error> {
        let endpoint = format!("{method} {}", response.url());
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(Self {
            endpoint,
            status,
            headers,
            body,
        })
    }

    /// Parse the body as JSON, if it is JSON at all.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Emit the response through `tracing` when response logging is enabled.
    pub(crate) fn log(&self, enabled: bool) {
        if enabled {
            tracing::info!(
                endpoint = %self.endpoint,
                status = self.status,
                headers = ?self.headers,
                body = %self.body,
                "API response"
            );
        }
    }
}

impl fmt::Display for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "API Response: {}", self.endpoint)?;
        writeln!(f, "Status Code: {}", self.status)?;
        write!(f, "Headers: {{")?;
        for (i, (name, value)) in self.headers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")?;
        if !self.body.is_empty() {
            write!(f, "\nBody: {}", self.body)?;
        }
        Ok(())
    }
}

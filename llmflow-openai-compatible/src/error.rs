//! Request-construction and response error helpers specific to this
//! adapter; the error taxonomy itself lives in `llmflow_provider::error`.

use std::collections::HashMap;

use llmflow_provider::error::ProviderError;
use llmflow_provider_utils::http_error::{HttpErrorContext, map_http_error};

/// Maps a non-success `reqwest::Response` into a [`ProviderError::ApiCall`],
/// reading the body before constructing the error so the message carries
/// whatever diagnostic text the provider sent back.
pub async fn map_error_response(url: &str, response: reqwest::Response) -> ProviderError {
    let status_code = response.status().as_u16();
    let headers: HashMap<String, String> =
        response.headers().iter().filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string()))).collect();
    let body = response.text().await.unwrap_or_default();
    map_http_error(HttpErrorContext { url, status_code, headers: &headers, body })
}


//! Base64 and `data:` URL helpers for [`llmflow_provider::message::ImageRef`]
//! and [`llmflow_provider::message::FileRef`].
//!
//! Grounded on `ai-sdk-provider-utils/src/message/content_parts/image.rs`'s
//! `DataContent`/`ImagePart` split between inline data and a remote `Url`,
//! with the base64 encode/decode surface (`DataContent::base64`/
//! `to_bytes`) pulled out as free functions operating on the universal
//! `ImageRef`/`FileRef` types instead of a provider-utils-local content
//! enum, since `llmflow-provider` already owns those shapes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use llmflow_provider::message::{FileRef, ImageRef};

/// Error decoding or constructing inline data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
    #[error("data URL is missing the comma separating header from payload")]
    MissingComma,
    #[error("data URL must start with \"data:\"")]
    NotADataUrl,
}

/// Encodes raw bytes as a base64 string.
pub fn encode_base64(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decodes a base64 string into raw bytes.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, DataUrlError> {
    BASE64.decode(encoded).map_err(|e| DataUrlError::InvalidBase64(e.to_string()))
}

/// Builds a `data:<mime>;base64,<payload>` URL string from raw bytes.
pub fn build_data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", encode_base64(data))
}

/// Parses a `data:<mime>;base64,<payload>` URL into its mime type and
/// decoded bytes.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::NotADataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingComma)?;
    let mime_type = header.strip_suffix(";base64").unwrap_or(header).to_string();
    let mime_type = if mime_type.is_empty() { "text/plain".to_string() } else { mime_type };
    let bytes = decode_base64(payload)?;
    Ok((mime_type, bytes))
}

/// Resolves an [`ImageRef`] to raw bytes and a best-effort mime type,
/// decoding a `data:` URL in `url` or inline `data` as needed. Returns
/// `None` for a plain remote `https://` URL, which the caller must fetch
/// itself — this crate has no HTTP client of its own.
pub fn resolve_image_inline_data(image: &ImageRef) -> Result<Option<(String, Vec<u8>)>, DataUrlError> {
    if let Some(data) = &image.data {
        let mime = image.mime_type.clone().unwrap_or_else(|| "application/octet-stream".to_string());
        return Ok(Some((mime, data.clone())));
    }
    if let Some(url) = &image.url {
        if url.starts_with("data:") {
            return parse_data_url(url).map(Some);
        }
    }
    Ok(None)
}

/// Same as [`resolve_image_inline_data`] but for [`FileRef`].
pub fn resolve_file_inline_data(file: &FileRef) -> Result<Option<(String, Vec<u8>)>, DataUrlError> {
    if let Some(data) = &file.data {
        let mime = file.mime_type.clone().unwrap_or_else(|| "application/octet-stream".to_string());
        return Ok(Some((mime, data.clone())));
    }
    if let Some(url) = &file.url {
        if url.starts_with("data:") {
            return parse_data_url(url).map(Some);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_data_url() {
        let url = build_data_url("image/png", &[0x89, 0x50, 0x4e, 0x47]);
        let (mime, bytes) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn rejects_urls_without_the_data_scheme() {
        assert_eq!(parse_data_url("https://example.com/a.png"), Err(DataUrlError::NotADataUrl));
    }

    #[test]
    fn resolves_inline_image_bytes_over_remote_url() {
        let image = ImageRef { url: None, data: Some(vec![1, 2, 3]), mime_type: Some("image/jpeg".into()) };
        let (mime, bytes) = resolve_image_inline_data(&image).unwrap().unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn remote_url_without_data_scheme_resolves_to_none() {
        let image = ImageRef { url: Some("https://example.com/a.png".into()), data: None, mime_type: None };
        assert_eq!(resolve_image_inline_data(&image).unwrap(), None);
    }
}

//! `data:<mime>;base64,<payload>` strings, the way frames travel inside JSON.

use {
    crate::*,
    base64::{Engine as _, engine::general_purpose::STANDARD},
};

pub const JPEG_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a data URL into its mime type and decoded payload.
///
/// A string without the `data:` header is taken as bare base64 with no mime
/// type; the backend answers in either form.
pub fn parse_data_url(value: &str) -> Result<(Option<String>, Vec<u8>), ImageError> {
    let value = value.trim();
    let Some(rest) = value.strip_prefix("data:") else {
        return Ok((None, STANDARD.decode(value)?));
    };
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::Decode("data URL without payload".to_string()))?;
    let Some(mime) = header.strip_suffix(";base64") else {
        return Err(ImageError::Decode(format!(
            "data URL is not base64 encoded: {header}"
        )));
    };
    let mime = if mime.is_empty() {
        None
    } else {
        Some(mime.to_string())
    };
    Ok((mime, STANDARD.decode(payload)?))
}

/// Decoded payload of a data URL or bare base64 string.
pub fn from_data_url(value: &str) -> Result<Vec<u8>, ImageError> {
    parse_data_url(value).map(|(_, bytes)| bytes)
}

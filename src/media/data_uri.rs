use base64::{Engine as _, engine::general_purpose};
use image::RgbaImage;

use crate::error::StreamError;

/// Decodes a processed-image payload into pixels.
///
/// Accepts `data:<mime>;base64,<data>` URIs as well as bare base64.
pub fn decode_data_uri(payload: &str) -> Result<RgbaImage, StreamError> {
    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| StreamError::InvalidDataUri("missing ',' separator".to_string()))?;
            if !meta.split(';').any(|param| param.eq_ignore_ascii_case("base64")) {
                return Err(StreamError::InvalidDataUri(format!(
                    "unsupported encoding in '{}'",
                    meta
                )));
            }
            data
        }
        None => payload,
    };

    let bytes = general_purpose::STANDARD.decode(encoded.trim())?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

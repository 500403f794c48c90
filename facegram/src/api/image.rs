use anyhow::{Context, Result};
use base64::Engine as _;

/// Decoded image attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn size_label(&self) -> String {
        let len = self.bytes.len();
        if len >= 1024 * 1024 {
            format!("{:.1} MB", len as f64 / (1024.0 * 1024.0))
        } else if len >= 1024 {
            format!("{:.1} KB", len as f64 / 1024.0)
        } else {
            format!("{} B", len)
        }
    }
}

/// Decode `data:<mime>;base64,<payload>`. A bare base64 payload is accepted
/// and reported as `application/octet-stream`.
pub fn decode_data_url(raw: &str) -> Result<ImageData> {
    let raw = raw.trim();
    let (mime, payload) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .context("data URL has no payload separator")?;
            let mime = meta
                .strip_suffix(";base64")
                .with_context(|| format!("data URL is not base64 encoded: {}", meta))?;
            (mime.to_string(), payload)
        }
        None => ("application/octet-stream".to_string(), raw),
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("failed to decode image base64")?;
    Ok(ImageData { mime, bytes })
}

//! Image data URIs for icons, splashes, emojis and event covers

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cord_core::DomainError;

/// Raw image bytes with their MIME type
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    mime: String,
    bytes: Vec<u8>,
}

impl ImageData {
    /// Wrap image bytes; the MIME type is sniffed when not given.
    ///
    /// # Errors
    /// Returns an error for empty data or when the format cannot be detected
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, mime: Option<&str>) -> Result<Self, DomainError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(DomainError::FieldEmpty { field: "image" });
        }
        let mime = match mime {
            Some(mime) => mime.to_string(),
            None => Self::sniff(&bytes)
                .ok_or_else(|| DomainError::invalid("image", "unknown image format"))?
                .to_string(),
        };
        Ok(Self { mime, bytes })
    }

    /// Detect png, jpeg, gif and webp from their magic numbers
    pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some("image/png")
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some("image/jpeg")
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some("image/gif")
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some("image/webp")
        } else {
            None
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:{mime};base64,{data}`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl From<&ImageData> for serde_json::Value {
    fn from(image: &ImageData) -> Self {
        serde_json::Value::String(image.to_data_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageData::sniff(PNG), Some("image/png"));
        assert_eq!(ImageData::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(ImageData::sniff(b"GIF89a...."), Some("image/gif"));
        assert_eq!(ImageData::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(ImageData::sniff(b"hello"), None);
    }

    #[test]
    fn test_data_uri() {
        let image = ImageData::from_bytes(b"GIF89a".to_vec(), None).unwrap();
        assert_eq!(image.mime(), "image/gif");
        assert_eq!(image.to_data_uri(), "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn test_explicit_mime_wins() {
        let image = ImageData::from_bytes(PNG, Some("image/x-custom")).unwrap();
        assert_eq!(image.mime(), "image/x-custom");
    }

    #[test]
    fn test_rejects_unknown_and_empty() {
        assert_eq!(
            ImageData::from_bytes(Vec::new(), None).unwrap_err(),
            DomainError::FieldEmpty { field: "image" }
        );
        assert_eq!(
            ImageData::from_bytes(b"plain text".to_vec(), None).unwrap_err().code(),
            "INVALID_VALUE"
        );
    }
}

//! 上传图片的解码与格式识别。

use data_encoding::BASE64;

use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

/// 已解码且格式可识别的图片。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ImageData {
    /// 解码标准 base64 文本，允许带 `data:image/...;base64,` 前缀。
    pub fn decode_base64(encoded: &str) -> Result<Self, DomainError> {
        let payload = match encoded.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => encoded,
        };
        let bytes = BASE64
            .decode(payload.trim().as_bytes())
            .map_err(|_| DomainError::ImageDecode)?;
        let format = ImageFormat::sniff(&bytes).ok_or(DomainError::ImageDecode)?;
        Ok(Self { bytes, format })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_with_data_url_prefix() {
        let raw = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let encoded = format!("data:image/png;base64,{}", BASE64.encode(&raw));
        let image = ImageData::decode_base64(&encoded).unwrap();
        assert_eq!(image.format(), ImageFormat::Png);
        assert_eq!(image.as_bytes(), &raw);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let encoded = BASE64.encode(b"plain text");
        assert_eq!(
            ImageData::decode_base64(&encoded),
            Err(DomainError::ImageDecode)
        );
        assert_eq!(
            ImageData::decode_base64("%%%"),
            Err(DomainError::ImageDecode)
        );
    }
}

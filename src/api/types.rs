use serde::{Deserialize, Serialize};
use std::path::Path;

/// Body of `POST /api/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// An image file ready to be sent as a multipart part
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read an image from disk, keeping its file name
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self { filename, bytes })
    }

    /// MIME type guessed from the file extension
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// Single image upload with its placement
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file: ImageFile,
    pub display_order: i32,
    pub is_main_image: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(ImageFile::new("front.JPG", vec![]).mime_type(), "image/jpeg");
        assert_eq!(ImageFile::new("plan.png", vec![]).mime_type(), "image/png");
        assert_eq!(
            ImageFile::new("notes", vec![]).mime_type(),
            "application/octet-stream"
        );
    }
}

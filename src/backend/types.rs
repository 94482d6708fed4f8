use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Other(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl UploadResponse {
    // Anything that isn't explicitly an image is served back as a stream.
    pub fn media_kind(&self) -> MediaKind {
        match self.kind.as_deref() {
            Some("image") => MediaKind::Image,
            Some(other) => MediaKind::Other(other.to_string()),
            None => MediaKind::Other(String::new()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessedImageResponse {
    #[serde(default)]
    pub image: Option<String>,
}

impl ProcessedImageResponse {
    pub fn into_payload(self) -> Option<String> {
        self.image.filter(|image| !image.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AppError::FileRead {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn mime_type(&self) -> &'static str {
        let extension = Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("mp4") => "video/mp4",
            Some("avi") => "video/x-msvideo",
            Some("mov") => "video/quicktime",
            Some("webm") => "video/webm",
            _ => "application/octet-stream",
        }
    }
}

//! アップロード画像の準備
//!
//! ファイルを読み込み、画像形式を判定してMIMEタイプを付与する。

use crate::error::{XrayScanError, Result};
use image::ImageFormat;
use std::path::Path;

/// 解析APIに送る画像
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// 画像ファイルを読み込む
    ///
    /// 画像として認識できないファイルは `ImageLoad` エラー。
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(XrayScanError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let mime_type = detect_mime_type(&bytes).ok_or_else(|| {
            XrayScanError::ImageLoad(format!("対応していない画像形式です: {}", path.display()))
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        tracing::debug!(file = %file_name, mime_type, size = bytes.len(), "画像を読み込み");

        Ok(Self::new(file_name, mime_type, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 先頭バイトから画像形式を判定
pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let mime = match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Gif => "image/gif",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_detect_mime_type() {
        assert_eq!(detect_mime_type(PNG_HEADER), Some("image/png"));
        assert_eq!(detect_mime_type(JPEG_HEADER), Some("image/jpeg"));
        assert_eq!(detect_mime_type(b"hello world"), None);
    }

    #[test]
    fn test_from_path_reads_image() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("chest.png");
        std::fs::write(&path, PNG_HEADER).unwrap();

        let upload = ImageUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "chest.png");
        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(upload.len(), PNG_HEADER.len());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = ImageUpload::from_path(Path::new("/nonexistent/scan.png")).unwrap_err();
        assert!(matches!(err, XrayScanError::FileNotFound(_)));
    }

    #[test]
    fn test_from_path_rejects_non_image() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();

        let err = ImageUpload::from_path(&path).unwrap_err();
        assert!(matches!(err, XrayScanError::ImageLoad(_)));
    }
}

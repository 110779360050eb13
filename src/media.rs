//! Media hosting sink for product and variant images

use async_trait::async_trait;
use image::ImageReader;
use std::io::Cursor;
use std::path::PathBuf;
use uuid::Uuid;
use crate::domain::aggregates::ProductImage;
use crate::editor::ImageFile;

const FOLDER: &str = "products";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("{file} is not a readable image: {reason}")]
    Unreadable { file: String, reason: String },
    #[error("media host I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("media host rejected the upload: {0}")]
    Rejected(String),
}

/// Stores raw image files and hands back public references.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file: &ImageFile) -> Result<ProductImage, MediaError>;
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Writes uploads below a local directory that is served statically.
#[derive(Debug, Clone)]
pub struct LocalMediaHost {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaHost {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self { root: root.into(), base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn root(&self) -> &PathBuf { &self.root }
}

#[async_trait]
impl MediaHost for LocalMediaHost {
    async fn upload(&self, file: &ImageFile) -> Result<ProductImage, MediaError> {
        let unreadable = |reason: String| MediaError::Unreadable { file: file.file_name.clone(), reason };
        let reader = ImageReader::new(Cursor::new(file.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| unreadable(e.to_string()))?;
        let format = reader.format().ok_or_else(|| unreadable("unknown image format".into()))?;
        let (width, height) = reader.into_dimensions().map_err(|e| unreadable(e.to_string()))?;
        let ext = format.extensions_str().first().copied().unwrap_or("img");

        let id = Uuid::now_v7();
        let dir = self.root.join(FOLDER);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(format!("{}.{}", id, ext)), &file.bytes).await?;

        let public_id = format!("{}/{}", FOLDER, id);
        tracing::debug!(%public_id, width, height, bytes = file.bytes.len(), "Stored image");
        Ok(ProductImage {
            secure_url: format!("{}/{}.{}", self.base_url, public_id, ext),
            public_id,
            width,
            height,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let Some(stem) = public_id.strip_prefix(FOLDER).and_then(|s| s.strip_prefix('/')) else {
            return Err(MediaError::Rejected(format!("unknown public id {}", public_id)));
        };
        let dir = self.root.join(FOLDER);
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(stem) {
                tokio::fs::remove_file(&path).await?;
                tracing::debug!(%public_id, "Deleted image");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> ImageFile {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height))
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        ImageFile::new("shot.png", "image/png", buf.into_inner())
    }

    #[tokio::test]
    async fn test_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let host = LocalMediaHost::new(dir.path(), "https://cdn.test/media/");
        let img = host.upload(&png(3, 2)).await.unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert!(img.public_id.starts_with("products/"));
        assert!(img.secure_url.starts_with("https://cdn.test/media/products/") && img.secure_url.ends_with(".png"));
        assert_eq!(std::fs::read_dir(dir.path().join("products")).unwrap().count(), 1);

        host.delete(&img.public_id).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path().join("products")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let host = LocalMediaHost::new(dir.path(), "/media");
        let err = host.upload(&ImageFile::new("notes.txt", "text/plain", b"hello".to_vec())).await.unwrap_err();
        assert!(matches!(err, MediaError::Unreadable { .. }));
        assert!(host.delete("elsewhere/abc").await.is_err());
    }
}

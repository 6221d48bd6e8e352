//! Local photo storage for visit documentation.
//!
//! Uploads are validated (image MIME type, 5 MB cap), written under a
//! `visit-photos/` subdirectory with a generated name, and served back
//! through the static `/photos` route. The returned public URL is what
//! gets recorded on the visit log.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Upload size cap, matching the client-side limit.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const SUBDIR: &str = "visit-photos";

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("Image must be less than 5MB")]
    TooLarge { size: usize },

    #[error("File must be an image")]
    NotAnImage,

    #[error("Failed to store photo: {0}")]
    Io(#[from] std::io::Error),
}

/// A photo accepted into the store.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub file_name: String,
    pub path: PathBuf,
    pub public_url: String,
    pub size: usize,
}

pub struct PhotoStore {
    root: PathBuf,
    public_base: String,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    /// Directory served by the static photos route.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and persist one uploaded photo.
    ///
    /// The MIME type comes from the upload's declared content type,
    /// falling back to a guess from the original file name.
    pub async fn save(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<StoredPhoto, PhotoError> {
        if data.len() > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge { size: data.len() });
        }

        let mime = match content_type {
            Some(ct) => ct.to_string(),
            None => mime_guess::from_path(original_name)
                .first_or_octet_stream()
                .to_string(),
        };
        if !mime.starts_with("image/") {
            return Err(PhotoError::NotAnImage);
        }

        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        let dir = self.root.join(SUBDIR);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&file_name);
        tokio::fs::write(&path, data).await?;

        tracing::debug!(file = %file_name, size = data.len(), "Stored visit photo");

        Ok(StoredPhoto {
            public_url: format!("{}/photos/{SUBDIR}/{file_name}", self.public_base),
            file_name,
            path,
            size: data.len(),
        })
    }
}

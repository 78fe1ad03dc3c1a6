//! Photo files on disk.
//!
//! Every upload is written to its own freshly named file under the photo
//! directory. The [`PhotoRef`] handed back is the file name; it is opaque to
//! callers and only turned back into a path here.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::{PhotoRef, PhotoUpload};

const MAX_EXTENSION_LEN: usize = 8;
const MAX_NAME_ATTEMPTS: usize = 4;

/// Verify that a reference maps to a single file name inside the base
/// directory. Prevents path traversal through a hand-edited inventory file.
fn ensure_within(base: &Path, token: &str) -> Result<PathBuf> {
    let mut components = Path::new(token).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if !token.contains(['/', '\\']) => {
            Ok(base.join(name))
        }
        _ => Err(StoreError::InvalidReference(token.to_string())),
    }
}

/// Extension to keep from the client's filename, if it looks sane.
fn extension_of(file_name: Option<&str>) -> Option<String> {
    let ext = Path::new(file_name?).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    base_path: PathBuf,
}

impl PhotoStore {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;

        info!(path = %base_path.display(), "Photo store initialized");

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write an upload to a new file and return its reference.
    ///
    /// Content type and size are not checked.
    pub async fn save(&self, upload: &PhotoUpload) -> Result<PhotoRef> {
        let ext = extension_of(upload.file_name.as_deref());

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = match &ext {
                Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
                None => Uuid::new_v4().to_string(),
            };
            let path = self.base_path.join(&name);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_all(&mut file, &upload.data).await {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(e.into());
            }

            debug!(
                reference = %name,
                field = %upload.field_name,
                size = upload.data.len(),
                "Stored photo"
            );
            return Ok(PhotoRef::new(name));
        }

        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not find a free photo file name",
        )))
    }

    /// Map a reference to the file it points at.
    pub async fn resolve(&self, reference: &PhotoRef) -> Result<PathBuf> {
        let path = ensure_within(&self.base_path, reference.token())?;

        if !fs::try_exists(&path).await? {
            return Err(StoreError::PhotoNotFound(reference.to_string()));
        }

        Ok(path)
    }

    pub async fn read(&self, reference: &PhotoRef) -> Result<Vec<u8>> {
        let path = self.resolve(reference).await?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::PhotoNotFound(reference.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(reference = %reference, size = data.len(), "Read photo");
        Ok(data)
    }

    /// Remove the file behind a reference. Already-absent files are fine.
    pub async fn delete(&self, reference: &PhotoRef) -> Result<()> {
        let path = ensure_within(&self.base_path, reference.token())?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(reference = %reference, "Deleted photo");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(reference = %reference, "Photo already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn content_type(reference: &PhotoRef) -> &'static str {
        let ext = Path::new(reference.token())
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

async fn write_all(file: &mut fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

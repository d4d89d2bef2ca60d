pub mod error;

use std::path::PathBuf;

use axum::async_trait;
use chrono::Utc;
use derive_more::Constructor;
use log::info;
use serde::Deserialize;

use self::error::{Result, StorageServiceError};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Deserialize)]
pub struct UploadSettings {
    /// Folder uploaded files are written to
    pub dir: String,
    /// URL prefix under which `dir` is served
    pub public_base_url: String,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    ///
    /// Stores `bytes` at `<folder>/<owner>/<timestamp>_<file_name>` and
    /// returns the public URL of the stored file
    ///
    async fn upload(&self, folder: &str, owner: &str, file_name: &str, bytes: &[u8]) -> Result<String>;
}

#[derive(Constructor)]
pub struct FsStorageService {
    settings: UploadSettings,
}

#[async_trait]
impl StorageService for FsStorageService {
    async fn upload(&self, folder: &str, owner: &str, file_name: &str, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(StorageServiceError::EmptyFile);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(StorageServiceError::FileTooLarge(MAX_UPLOAD_BYTES));
        }
        for segment in [folder, owner, file_name] {
            if !is_safe_segment(segment) {
                return Err(StorageServiceError::InvalidFileName(segment.to_string()));
            }
        }

        let stored_name = format!("{}_{}", Utc::now().timestamp_millis(), file_name);

        let mut path = PathBuf::from(&self.settings.dir);
        path.push(folder);
        path.push(owner);
        tokio::fs::create_dir_all(&path).await?;
        path.push(&stored_name);
        tokio::fs::write(&path, bytes).await?;
        info!("Stored {} bytes at {}", bytes.len(), path.display());

        Ok(format!(
            "{}/{}/{}/{}",
            self.settings.public_base_url.trim_end_matches('/'), folder, owner, stored_name
        ))
    }
}

///
/// Path segments may only contain ASCII alphanumerics, `-`, `_` and `.`,
/// and may not be a relative path component
///
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

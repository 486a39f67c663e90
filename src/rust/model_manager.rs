use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};
use log;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{file_type} file not found at {path} and no download URL is configured")]
    NotDownloaded { file_type: String, path: String },
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {url} failed with status {status}")]
    BadStatus { url: String, status: reqwest::StatusCode },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed for {0}")]
    VerificationFailed(String),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// One file the classifier needs at startup, with an optional source and checksum.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    /// Human readable kind, used in logs and errors ("model", "tokenizer")
    pub file_type: String,
    pub path: PathBuf,
    pub url: Option<String>,
    /// Lowercase hex SHA-256 of the expected file contents
    pub sha256: Option<String>,
}

impl ModelArtifact {
    pub fn new(file_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            file_type: file_type.into(),
            path: path.into(),
            url: None,
            sha256: None,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url.filter(|u| !u.is_empty());
        self
    }

    pub fn with_sha256(mut self, sha256: Option<String>) -> Self {
        self.sha256 = sha256.filter(|h| !h.is_empty()).map(|h| h.to_lowercase());
        self
    }
}

/// Makes sure model artifacts exist on disk before the classifier loads them.
#[derive(Clone, Default)]
pub struct ModelManager {
    client: reqwest::Client,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `client` for downloads instead of a default one.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            download_lock: Arc::default(),
        }
    }

    pub fn is_downloaded(&self, artifact: &ModelArtifact) -> bool {
        let exists = artifact.path.exists();
        log::info!("{} path: {:?} (exists: {})", artifact.file_type, artifact.path, exists);
        exists
    }

    /// Returns `Ok(true)` if the file exists and matches the configured hash.
    /// Without a configured hash, existence is enough.
    pub fn verify(&self, artifact: &ModelArtifact) -> Result<bool, ModelError> {
        if !artifact.path.exists() {
            return Ok(false);
        }
        match &artifact.sha256 {
            Some(expected) => self.verify_file(&artifact.path, expected),
            None => Ok(true),
        }
    }

    /// Ensures that an artifact is present and verified.
    /// If it doesn't exist, or fails verification, it is downloaded when a URL is configured.
    pub async fn ensure_available(&self, artifact: &ModelArtifact) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        if self.is_downloaded(artifact) {
            if self.verify(artifact)? {
                log::info!("Existing {} file verified successfully", artifact.file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", artifact.file_type);
        }

        let url = match &artifact.url {
            Some(url) => url,
            None if artifact.path.exists() => {
                return Err(ModelError::VerificationFailed(artifact.path.display().to_string()));
            }
            None => {
                return Err(ModelError::NotDownloaded {
                    file_type: artifact.file_type.clone(),
                    path: artifact.path.display().to_string(),
                });
            }
        };

        self.download_and_verify_file(url, &artifact.path, artifact.sha256.as_deref(), &artifact.file_type)
            .await
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        log::info!("Verifying file: {:?}", path);
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        Ok(hash == expected_hash)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        log::info!("Download response status: {}", status);
        if !status.is_success() {
            return Err(ModelError::BadStatus {
                url: url.to_string(),
                status,
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = sha256_hex(&bytes);
        if let Some(expected) = expected_hash {
            if hash != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        } else {
            log::warn!("No checksum configured for {} file, calculated {}", file_type, hash);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        log::info!("Writing {} bytes to {:?}", bytes.len(), path);
        fs::write(path, &bytes)?;

        if let Some(expected) = expected_hash {
            if !self.verify_file(path, expected)? {
                return Err(ModelError::VerificationFailed(path.display().to_string()));
            }
        }

        log::info!("{} file downloaded successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, artifact: &ModelArtifact) -> Result<(), ModelError> {
        if artifact.path.exists() {
            log::info!("Removing {} file at {:?}", artifact.file_type, artifact.path);
            fs::remove_file(&artifact.path)?;
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

//! Data storage and persistence
//!
//! Nothing stored here is read back by the pipeline.

pub mod ledger;


pub use ledger::FeedbackLedger;

use crate::types::RawPost;
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Receives payloads the extractor could not parse
#[async_trait]
pub trait ErrorSink: Send + Sync {
    /// Record a malformed payload. Never fails; problems are only logged.
    async fn record_malformed(&self, payload: &RawPost, reason: &str);
}

/// Writes each malformed payload to `error_tweet_{timestamp}.json`
pub struct FileErrorSink {
    dir: PathBuf,
}

impl FileErrorSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(stamp: &str, attempt: u32) -> String {
        match attempt {
            0 => format!("error_tweet_{}.json", stamp),
            n => format!("error_tweet_{}_{}.json", stamp, n),
        }
    }

    /// Never overwrites: a name taken within the same second gets a suffix
    async fn write(&self, payload: &RawPost) -> crate::error::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(payload)?;
        let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();

        let mut attempt = 0;
        loop {
            let path = self.dir.join(Self::file_name(&stamp, attempt));
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match opened {
                Ok(mut file) => {
                    file.write_all(&body).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl ErrorSink for FileErrorSink {
    async fn record_malformed(&self, payload: &RawPost, reason: &str) {
        match self.write(payload).await {
            Ok(path) => tracing::warn!("Malformed post ({}), saved to {}", reason, path.display()),
            Err(e) => tracing::warn!("Malformed post ({}), could not save payload: {}", reason, e),
        }
    }
}

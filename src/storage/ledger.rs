//! Append-only CSV of reaction-labeled post texts

use crate::error::Result;
use crate::types::SentimentLabel;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub struct FeedbackLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FeedbackLedger {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `(text, label)` row, creating the file and its parents on demand
    pub async fn append(&self, text: &str, label: SentimentLabel) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let row = format!("{},{}\n", csv_field(&single_line(text)), label.ledger_value());
        file.write_all(row.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Labeled post as {} in {}", label, self.path.display());
        Ok(())
    }
}

/// Newlines become spaces so every example stays on one row
pub fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ")
}

/// RFC 4180 quoting
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

//! Append-only log of queries forwarded to an administrator.
//!
//! The log is a single JSON array, rewritten on every append so it stays
//! readable by hand. A missing file or one that is not a JSON array starts
//! a fresh array; any other read failure leaves the file untouched.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::faq::FaqId;

/// One escalated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub user_query: String,
    /// Local time, ISO-8601 to the second.
    pub timestamp: String,
    pub similarity: f64,
    pub best_faq_id: Option<FaqId>,
}

impl EscalationRecord {
    /// Record `user_query`, stamped with the current local time.
    pub fn now(user_query: impl Into<String>, similarity: f64, best_faq_id: Option<FaqId>) -> Self {
        Self {
            user_query: user_query.into(),
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            similarity,
            best_faq_id,
        }
    }
}

/// File-backed escalation log. Appends are serialized.
#[derive(Debug)]
pub struct EscalationLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl EscalationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records currently in the log.
    pub async fn records(&self) -> Result<Vec<EscalationRecord>> {
        read_records(&self.path).await
    }

    /// Append `record` and rewrite the file.
    pub async fn record(&self, record: EscalationRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = read_records(&self.path).await?;
        info!(
            name: "escalation.recorded",
            query = %record.user_query,
            similarity = record.similarity,
            "Query escalated to admin"
        );
        records.push(record);

        let json = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

async fn read_records(path: &Path) -> Result<Vec<EscalationRecord>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let text = String::from_utf8(raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Escalation log corrupt, starting fresh");
        Vec::new()
    }))
}

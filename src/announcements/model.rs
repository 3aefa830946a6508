use chrono::{DateTime, Utc};
use serde::Serialize;

/// One corporate disclosure, projected onto the fixed field set downstream
/// consumers depend on. Immutable once parsed.
#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementRecord {
    /// Canonical symbol of the disclosing company.
    pub symbol: String,
    /// Subject line of the disclosure.
    pub subject: String,
    /// URL of the attached filing document.
    #[serde(rename = "attachmentUrl")]
    pub attachment_url: String,
    /// Industry classification as the source reports it.
    pub industry: String,
    /// Free-text body of the attachment summary.
    #[serde(rename = "attachmentText")]
    pub attachment_text: String,
    /// Human-readable attachment size (e.g. `"1.2 MB"`).
    #[serde(rename = "fileSizeLabel")]
    pub file_size_label: String,
    /// Exchange-recorded disclosure time.
    #[serde(rename = "broadcastTimestamp")]
    pub broadcast_timestamp: DateTime<Utc>,
}

impl AnnouncementRecord {
    /// Identity for deduplication: the same filing can surface more than
    /// once in the upstream feed.
    #[must_use]
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.symbol, &self.attachment_url)
    }
}

//! Minimal serde mapping of the corporate-announcements payload, plus the
//! source's date-time text format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Kolkata;
use serde::Deserialize;

use super::model::AnnouncementRecord;

/// Raw announcement object as the endpoint returns it. Everything is
/// optional; the feed is not shy about omitting fields.
#[derive(Debug, Deserialize)]
pub(crate) struct RawAnnouncement {
    #[serde(default)]
    pub(crate) symbol: Option<String>,
    #[serde(default)]
    pub(crate) desc: Option<String>,
    #[serde(rename = "attchmntFile", default)]
    pub(crate) attachment_file: Option<String>,
    #[serde(rename = "smIndustry", default)]
    pub(crate) industry: Option<String>,
    #[serde(rename = "attchmntText", default)]
    pub(crate) attachment_text: Option<String>,
    #[serde(rename = "fileSize", default)]
    pub(crate) file_size: Option<String>,
    #[serde(default)]
    pub(crate) exchdisstime: Option<String>,
}

impl RawAnnouncement {
    /// Projects onto the public record, or `None` when the broadcast time is
    /// missing or unparseable (such rows cannot be window-filtered and are
    /// dropped, matching the source's behavior).
    pub(crate) fn into_record(self) -> Option<AnnouncementRecord> {
        let broadcast_timestamp = parse_broadcast(self.exchdisstime.as_deref()?)?;
        Some(AnnouncementRecord {
            symbol: self.symbol.unwrap_or_default(),
            subject: self.desc.unwrap_or_default(),
            attachment_url: self.attachment_file.unwrap_or_default(),
            industry: self.industry.unwrap_or_default(),
            attachment_text: self.attachment_text.unwrap_or_default(),
            file_size_label: self.file_size.unwrap_or_default(),
            broadcast_timestamp,
        })
    }
}

/// Parses the source's `DD-Mon-YYYY HH:MM:SS` broadcast format, tolerating a
/// minute-precision and a date-only variant. Times are IST wall clock.
pub(crate) fn parse_broadcast(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let naive = NaiveDateTime::parse_from_str(s, "%d-%b-%Y %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%d-%b-%Y %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%d-%b-%Y")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Kolkata
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_primary_format() {
        let ts = parse_broadcast("18-Jun-2025 19:08:25").unwrap();
        let ist = ts.with_timezone(&Kolkata);
        assert_eq!(
            (ist.year(), ist.month(), ist.day()),
            (2025, 6, 18),
            "calendar date must survive the round trip"
        );
    }

    #[test]
    fn tolerates_alternate_formats() {
        assert!(parse_broadcast("18-Jun-2025 19:08").is_some());
        assert!(parse_broadcast("18-Jun-2025").is_some());
        assert!(parse_broadcast(" 18-Jun-2025 19:08:25 ").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_broadcast("").is_none());
        assert!(parse_broadcast("2025-06-18T19:08:25Z").is_none());
        assert!(parse_broadcast("18-Juin-2025 19:08:25").is_none());
    }

    #[test]
    fn record_without_timestamp_is_dropped() {
        let raw: RawAnnouncement = serde_json::from_str(r#"{"symbol":"X"}"#).unwrap();
        assert!(raw.into_record().is_none());
    }
}

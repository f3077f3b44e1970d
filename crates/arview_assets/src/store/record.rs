use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identifier of a stored model.  Derived from the creation time in
/// milliseconds, bumped on collision, so ids sort by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub u64);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModelId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ModelId)
    }
}

/// Persistent metadata for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub id: ModelId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `builtin:*`, `blob:<id>`, a URL or a path.  Empty while an upload is
    /// in flight.
    #[serde(default)]
    pub file_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub file_size: u64,
}

impl ModelRecord {
    /// The record exists but its file has not been written yet.
    pub fn is_pending(&self) -> bool {
        self.file_reference.is_empty()
    }

    /// Human-readable size, e.g. `"1.50 MB"`.
    pub fn display_size(&self) -> String {
        format_bytes(self.file_size)
    }
}

/// Fields supplied when creating a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewModel {
    pub name: String,
    pub description: Option<String>,
    pub file_reference: String,
    pub thumbnail: Option<String>,
    pub file_size: u64,
}

impl NewModel {
    pub fn new(name: impl Into<String>, file_reference: impl Into<String>, file_size: u64) -> Self {
        Self {
            name: name.into(),
            file_reference: file_reference.into(),
            file_size,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub file_reference: Option<String>,
    pub thumbnail: Option<Option<String>>,
    pub file_size: Option<u64>,
}

impl ModelPatch {
    pub(crate) fn apply(self, record: &mut ModelRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(reference) = self.file_reference {
            record.file_reference = reference;
        }
        if let Some(thumbnail) = self.thumbnail {
            record.thumbnail = thumbnail;
        }
        if let Some(size) = self.file_size {
            record.file_size = size;
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ModelRecord {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        ModelRecord {
            id: ModelId(1_700_000_000_000),
            name: "Chair".into(),
            description: None,
            file_reference: "blob:1700000000000".into(),
            thumbnail: None,
            created_at: now,
            updated_at: now,
            file_size: 1536,
        }
    }

    #[test]
    fn serialises_rfc3339_camel_case() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(json.contains("\"createdAt\":\"2023-11-14T22:13:20Z\""), "{json}");
        assert!(json.contains("\"fileReference\""));
        assert!(!json.contains("description"));
        let back: ModelRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record());
    }

    #[test]
    fn patch_touches_only_given_fields() {
        let mut r = record();
        ModelPatch {
            description: Some(Some("oak".into())),
            ..Default::default()
        }
        .apply(&mut r);
        assert_eq!(r.name, "Chair");
        assert_eq!(r.description.as_deref(), Some("oak"));
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.50 MB");
    }
}

//! Tracker model representing a fleet vehicle device

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Deserialize an opaque identifier that the API may send as a number or a string
fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Encode an opaque identifier for a request body, preferring the numeric form
fn opaque_id_to_json(id: &str) -> Value {
    match id.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(id),
    }
}

/// Unique identifier for a tracker (Navixy tracker ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackerId(#[serde(deserialize_with = "deserialize_opaque_id")] pub String);

impl TrackerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// JSON form used in request payloads (numeric when the id is numeric)
    pub fn to_json(&self) -> Value {
        opaque_id_to_json(&self.0)
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TrackerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TrackerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for TrackerId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

/// Unique identifier for a geofence zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(#[serde(deserialize_with = "deserialize_opaque_id")] pub String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ZoneId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A tracker in the fleet roster
///
/// Identity is the id; the label is best-effort decoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: TrackerId,
    pub label: Option<String>,
}

impl Tracker {
    pub fn new(id: impl Into<TrackerId>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for display, falling back to `#<id>` when the tracker has none
    pub fn display_label(&self) -> String {
        match self.label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("#{}", self.id),
        }
    }
}

/// A geofence zone configured in the tracking account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub label: String,
}

impl Zone {
    pub fn new(id: impl Into<ZoneId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_id_accepts_numbers_and_strings() {
        let numeric: TrackerId = serde_json::from_str("12345").unwrap();
        let text: TrackerId = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(numeric.as_str(), "12345");
        assert_eq!(text.as_str(), "abc-1");
    }

    #[test]
    fn test_tracker_id_json_prefers_numbers() {
        assert_eq!(TrackerId::new("42").to_json(), serde_json::json!(42));
        assert_eq!(TrackerId::new("dev-7").to_json(), serde_json::json!("dev-7"));
    }

    #[test]
    fn test_display_label_fallback() {
        assert_eq!(Tracker::new("7").with_label("Truck 7").display_label(), "Truck 7");
        assert_eq!(Tracker::new("7").display_label(), "#7");
        assert_eq!(Tracker::new("7").with_label("   ").display_label(), "#7");
    }
}

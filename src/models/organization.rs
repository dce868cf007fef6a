//! Organization models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Mission;

/// An organization that serves one or more missions.
///
/// `website` and `description` are part of the merge key and stored as empty
/// strings when absent; they read back as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An organization with the missions it is associated with.
///
/// Unfiltered listings carry every mission the organization FILLS. Listings
/// filtered by a mission carry only the FILLS missions on a path that reaches
/// the filter mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationWithMissions {
    #[serde(flatten)]
    pub organization: Organization,
    pub missions: Vec<Mission>,
}

/// Input for registering an organization under an existing mission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub mission_name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewOrganization {
    /// Merge-key value for an optional property.
    pub(crate) fn key_value(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("")
    }
}

pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Accepts RFC 3339 strings; anything else (legacy temporal values, garbage)
/// reads as `None`.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_optional_fields_read_as_none() {
        let org: Organization = serde_json::from_value(json!({
            "id": 7,
            "name": "Ocean Cleanup",
            "website": "",
            "description": null,
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(org.website, None);
        assert_eq!(org.description, None);
        assert!(org.created_at.is_some());
    }

    #[test]
    fn test_missing_timestamp_is_tolerated() {
        let org: Organization = serde_json::from_value(json!({
            "id": 1,
            "name": "Legacy Org",
            "website": "https://legacy.example",
            "created_at": {"epochSeconds": 0}
        }))
        .unwrap();

        assert_eq!(org.website.as_deref(), Some("https://legacy.example"));
        assert_eq!(org.created_at, None);
    }
}

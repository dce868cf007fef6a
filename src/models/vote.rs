//! Vote models.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::models::organization::{blank_as_none, lenient_timestamp};

/// A rating a user gave an organization, read from a VOTED edge.
///
/// Older votes carry `mission` and `needs` instead of `how_fills_mission`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    #[serde(deserialize_with = "normalize_rating")]
    pub rating: i64,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub how_fills_mission: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub mission: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub needs: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for casting a vote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewVote {
    pub organization_id: i64,
    pub rating: i64,
    #[serde(default)]
    pub how_fills_mission: String,
    pub email: String,
    #[serde(default)]
    pub newsletter: bool,
}

/// Reads a rating stored as an integer, a float, or a numeric string.
fn normalize_rating<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    rating_from_json(&value)
        .ok_or_else(|| de::Error::custom(format!("rating is not numeric: {}", value)))
}

fn rating_from_json(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

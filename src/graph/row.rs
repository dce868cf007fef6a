//! Row and streaming types for query results.

use crate::error::AppError;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::pin::Pin;

/// Parameters for Cypher queries.
///
/// A map of parameter names to JSON values that can be passed to queries.
pub type Params = HashMap<String, JsonValue>;

/// A stream of rows from a query result.
pub type RowStream<'a> = Pin<Box<dyn Stream<Item = Result<Row, AppError>> + Send + 'a>>;

/// A single row from a query result.
///
/// Column values are held as JSON, with typed extraction via [`Row::get`].
/// Repositories project nodes into maps in their RETURN clauses so that every
/// backend hands back plain scalars, lists and maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    data: HashMap<String, JsonValue>,
}

impl Row {
    /// Creates a new row from a map of column names to values.
    pub fn new(data: HashMap<String, JsonValue>) -> Self {
        Self { data }
    }

    /// Gets a value from the row by column name, deserializing to the requested type.
    ///
    /// ```ignore
    /// let name: String = row.get("name")?;
    /// let sub_missions: i64 = row.get("sub_missions")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, AppError> {
        self.data
            .get(key)
            .ok_or_else(|| AppError::Internal(format!("column not found: {}", key)))
            .and_then(|v| {
                serde_json::from_value(v.clone()).map_err(|e| {
                    AppError::Internal(format!("failed to deserialize '{}': {}", key, e))
                })
            })
    }

    /// Gets a value from the row, returning `None` if the key is missing or null.
    ///
    /// Still returns an error if the key exists but deserialization fails.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.data.get(key) {
            Some(v) if v.is_null() => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| AppError::Internal(format!("failed to deserialize '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    /// Deserializes the whole row, treating columns as struct fields.
    ///
    /// ```ignore
    /// let organization: Organization = row.to()?;
    /// ```
    pub fn to<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let object: serde_json::Map<String, JsonValue> = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(JsonValue::Object(object))
            .map_err(|e| AppError::Internal(format!("failed to deserialize row: {}", e)))
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<HashMap<String, JsonValue>> for Row {
    fn from(data: HashMap<String, JsonValue>) -> Self {
        Self::new(data)
    }
}

impl<const N: usize> From<[(&str, JsonValue); N]> for Row {
    fn from(columns: [(&str, JsonValue); N]) -> Self {
        Self::new(
            columns
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_get_string() {
        let row = Row::from([("name", json!("Save Earth"))]);
        let name: String = row.get("name").unwrap();
        assert_eq!(name, "Save Earth");
    }

    #[test]
    fn test_row_get_missing_key() {
        let row = Row::default();
        let result: Result<String, _> = row.get("missing");
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_row_get_opt_null() {
        let row = Row::from([("next_mission", JsonValue::Null)]);
        let next: Option<String> = row.get_opt("next_mission").unwrap();
        assert_eq!(next, None);
    }

    #[test]
    fn test_row_get_opt_wrong_type_is_error() {
        let row = Row::from([("rating", json!("not a number"))]);
        let rating: Result<Option<i64>, _> = row.get_opt("rating");
        assert!(rating.is_err());
    }

    #[test]
    fn test_row_to_struct() {
        #[derive(serde::Deserialize)]
        struct Named {
            id: i64,
            name: String,
        }

        let row = Row::from([("id", json!(3)), ("name", json!("Reduce CO2")), ("extra", json!([]))]);
        let named: Named = row.to().unwrap();
        assert_eq!(named.id, 3);
        assert_eq!(named.name, "Reduce CO2");
    }

    #[test]
    fn test_row_len() {
        let row = Row::from([("a", json!(1)), ("b", json!(2))]);
        assert_eq!(row.len(), 2);
        assert!(!row.is_empty());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Column holding the server-assigned row id.
pub const ROW_ID_KEY: &str = "_id";

/// A dynamic SeaTable row: column name to JSON value.
///
/// Column names are whatever the table defines; nothing is validated
/// client-side. Link and multiple-select columns arrive as arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Row(pub HashMap<String, JsonValue>);

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Set a column value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a column value.
    pub fn get_value(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Check if a column exists.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Get a typed value from a column, returning None if missing or wrong type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The server-assigned `_id`, present once the row is persisted.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ROW_ID_KEY).and_then(|v| v.as_str())
    }
}

impl Deref for Row {
    type Target = HashMap<String, JsonValue>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Row {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self(map)
    }
}

impl<K: Into<String>, V: Into<JsonValue>, const N: usize> From<[(K, V); N]> for Row {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl From<HashMap<String, JsonValue>> for Row {
    fn from(map: HashMap<String, JsonValue>) -> Self {
        Self(map)
    }
}

/// Build a [`Row`] from `(column, value)` pairs.
///
/// # Examples
/// ```
/// use seatable_client_core::row;
/// let row = row![("Name", "name1"), ("age", 20)];
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::new()
    };
    ($(($key:expr, $val:expr)),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $(
            row.set($key, serde_json::json!($val));
        )+
        row
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_set_get() {
        let mut row = Row::new();
        row.set("Name", "name1").set("age", 20);
        assert_eq!(row.get_value("Name"), Some(&json!("name1")));
        assert!(row.contains("age"));
        assert!(!row.contains("missing"));
    }

    #[test]
    fn row_macro() {
        let row = row![("Name", "name1"), ("age", 20), ("done", true)];
        assert_eq!(row.len(), 3);
        assert_eq!(row.get_as::<i64>("age"), Some(20));
        assert_eq!(row.get_as::<bool>("done"), Some(true));
        assert_eq!(row.get_as::<String>("age"), None);
    }

    #[test]
    fn row_id_only_when_string() {
        let row = row![("_id", "Qtf7xPmoRaiFyQPO1aENTjb")];
        assert_eq!(row.id(), Some("Qtf7xPmoRaiFyQPO1aENTjb"));

        let unsaved = row![("Name", "x")];
        assert_eq!(unsaved.id(), None);

        let numeric = row![("_id", 7)];
        assert_eq!(numeric.id(), None);
    }

    #[test]
    fn row_serializes_as_plain_object() {
        let row = row![("Name", "name1")];
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value, json!({"Name": "name1"}));

        let back: Row = serde_json::from_value(json!({"_id": "abc", "age": null})).unwrap();
        assert_eq!(back.id(), Some("abc"));
        assert_eq!(back.get_value("age"), Some(&JsonValue::Null));
    }
}

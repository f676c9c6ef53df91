use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use seatable_client_core::Row;

/// Decoded reply of the token exchange (`app-access-token`).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub app_name: Option<String>,
    pub access_token: String,
    pub dtable_uuid: String,
    pub dtable_server: String,
    #[serde(default)]
    pub dtable_socket: Option<String>,
    #[serde(default)]
    pub dtable_db: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<i64>,
    #[serde(default)]
    pub dtable_name: Option<String>,
}

/// Schema of a base: its tables with their columns and views.
///
/// Fields the client does not model are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

impl Metadata {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Look up a table by its `_id`.
    pub fn table_by_id(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub editable: Option<bool>,
    /// Type-specific settings (options of a single select, format of a number...).
    #[serde(default)]
    pub data: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

/// Where `insert_row` places the new row relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowInsertPosition {
    Above,
    #[default]
    Below,
}

impl RowInsertPosition {
    pub fn as_str(&self) -> &str {
        match self {
            RowInsertPosition::Above => "insert_above",
            RowInsertPosition::Below => "insert_below",
        }
    }
}

impl fmt::Display for RowInsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a batch update.
#[derive(Debug, Clone, Serialize)]
pub struct RowUpdate {
    pub row_id: String,
    pub row: Row,
}

impl RowUpdate {
    pub fn new(row_id: impl Into<String>, row: Row) -> Self {
        Self {
            row_id: row_id.into(),
            row,
        }
    }
}

// ─── Response envelopes ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct MetadataResponse {
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RowsResponse {
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ColumnsResponse {
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewsResponse {
    #[serde(default)]
    pub views: Vec<View>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteRowsResponse {
    #[serde(default)]
    pub deleted_rows: Option<u64>,
    #[serde(default)]
    pub success: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub results: Vec<Row>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_info_deserialization() {
        let info: AuthInfo = serde_json::from_value(json!({
            "app_name": "test",
            "access_token": "eyJhbGciOi",
            "dtable_uuid": "e5b2a5a6-8e1a-4a5c-9a50-1c5bda8bb3c3",
            "dtable_server": "https://cloud.seatable.io/dtable-server/",
            "dtable_socket": "https://cloud.seatable.io/",
            "dtable_db": "https://cloud.seatable.io/dtable-db/",
            "workspace_id": 42,
            "dtable_name": "Demo"
        }))
        .unwrap();
        assert_eq!(info.access_token, "eyJhbGciOi");
        assert_eq!(info.workspace_id, Some(42));
        assert_eq!(info.dtable_db.as_deref(), Some("https://cloud.seatable.io/dtable-db/"));
    }

    #[test]
    fn auth_info_requires_access_token() {
        let result: Result<AuthInfo, _> = serde_json::from_value(json!({
            "dtable_uuid": "x",
            "dtable_server": "https://cloud.seatable.io/dtable-server/"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn metadata_lookup_and_extra_fields() {
        let metadata: Metadata = serde_json::from_value(json!({
            "version": 3,
            "tables": [{
                "_id": "0000",
                "name": "Table3",
                "is_header_locked": false,
                "columns": [
                    {"key": "0000", "name": "Name", "type": "text", "width": 200},
                    {"key": "a1b2", "name": "age", "type": "number", "data": {"format": "number"}}
                ],
                "views": [{"_id": "0000", "name": "Default View", "type": "table"}]
            }]
        }))
        .unwrap();

        assert_eq!(metadata.extra.get("version"), Some(&json!(3)));
        let table = metadata.table("Table3").unwrap();
        assert_eq!(table.id, "0000");
        assert_eq!(table.extra.get("is_header_locked"), Some(&json!(false)));
        assert_eq!(table.column("age").unwrap().column_type, "number");
        assert_eq!(table.views[0].name, "Default View");
        assert!(metadata.table("Missing").is_none());
        assert_eq!(metadata.table_by_id("0000").unwrap().name, "Table3");
    }

    #[test]
    fn insert_position_wire_values() {
        assert_eq!(RowInsertPosition::Above.to_string(), "insert_above");
        assert_eq!(RowInsertPosition::default().as_str(), "insert_below");
    }

    #[test]
    fn row_update_serialization() {
        let mut row = Row::new();
        row.set("age", 10);
        let update = RowUpdate::new("abc", row);
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"row_id": "abc", "row": {"age": 10}})
        );
    }
}

use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use seatable_client_core::{Row, SeaTableError, SeaTableResult};

use crate::base::Base;
use crate::types::{
    Column, ColumnsResponse, Metadata, MetadataResponse, QueryResponse, Table, View, ViewsResponse,
};

/// Schema, table management and SQL.
impl Base {
    /// Fetch the base's tables with their columns and views.
    pub async fn get_metadata(&self) -> SeaTableResult<Metadata> {
        let url = self.dtable_endpoint("metadata/")?;
        debug!("Fetching metadata");

        let resp = self
            .http()
            .get(url)
            .header(AUTHORIZATION, self.access_header()?)
            .send()
            .await?;
        let body: MetadataResponse = self.handle_response(resp).await?;
        Ok(body.metadata)
    }

    /// List the columns of a table, in the order of `view_name` if given.
    pub async fn list_columns(
        &self,
        table_name: &str,
        view_name: Option<&str>,
    ) -> SeaTableResult<Vec<Column>> {
        let url = self.dtable_endpoint("columns/")?;
        let mut query = vec![("table_name", table_name)];
        if let Some(view) = view_name {
            query.push(("view_name", view));
        }

        let resp = self
            .http()
            .get(url)
            .header(AUTHORIZATION, self.access_header()?)
            .query(&query)
            .send()
            .await?;
        let body: ColumnsResponse = self.handle_response(resp).await?;
        Ok(body.columns)
    }

    /// List the views of a table.
    pub async fn list_views(&self, table_name: &str) -> SeaTableResult<Vec<View>> {
        let url = self.dtable_endpoint("views/")?;
        let resp = self
            .http()
            .get(url)
            .header(AUTHORIZATION, self.access_header()?)
            .query(&[("table_name", table_name)])
            .send()
            .await?;
        let body: ViewsResponse = self.handle_response(resp).await?;
        Ok(body.views)
    }

    /// Create an empty table.
    pub async fn add_table(&self, table_name: &str) -> SeaTableResult<Table> {
        let url = self.dtable_endpoint("tables/")?;
        debug!(table = table_name, "Adding table");

        let resp = self
            .http()
            .post(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&json!({ "table_name": table_name }))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Rename a table. Returns the server's reply.
    pub async fn rename_table(
        &self,
        table_name: &str,
        new_name: &str,
    ) -> SeaTableResult<JsonValue> {
        let url = self.dtable_endpoint("tables/")?;
        debug!(table = table_name, new_name, "Renaming table");

        let resp = self
            .http()
            .put(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&json!({
                "table_name": table_name,
                "new_table_name": new_name,
            }))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Delete a table and all of its rows.
    pub async fn delete_table(&self, table_name: &str) -> SeaTableResult<()> {
        let url = self.dtable_endpoint("tables/")?;
        debug!(table = table_name, "Deleting table");

        let resp = self
            .http()
            .delete(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&json!({ "table_name": table_name }))
            .send()
            .await?;
        self.handle_empty_response(resp).await
    }

    /// Run a SQL `SELECT` (or DML statement) against the base.
    ///
    /// With `convert_keys` the result rows are keyed by column name instead of
    /// column key.
    ///
    /// # Errors
    /// * [`SeaTableError::Api`] if the statement is rejected, including a
    ///   2xx reply that reports `success: false`.
    pub async fn query(&self, sql: &str, convert_keys: bool) -> SeaTableResult<Vec<Row>> {
        let uuid = self.session()?.info.dtable_uuid.clone();
        let url = self.dtable_db_endpoint(&format!("query/{}/", uuid))?;
        debug!(sql, convert_keys, "Running SQL query");

        let resp = self
            .http()
            .post(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&json!({
                "sql": sql,
                "convert_keys": convert_keys,
            }))
            .send()
            .await?;
        let status = resp.status().as_u16();
        let reply: QueryResponse = self.handle_response(resp).await?;
        if reply.success == Some(false) {
            return Err(SeaTableError::Api {
                status,
                message: reply
                    .error_message
                    .unwrap_or_else(|| "query failed".to_string()),
            });
        }
        Ok(reply.results)
    }
}

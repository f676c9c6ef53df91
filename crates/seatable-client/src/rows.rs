use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use seatable_client_core::{Row, SeaTableError, SeaTableResult};

use crate::base::Base;
use crate::types::{DeleteRowsResponse, RowInsertPosition, RowUpdate, RowsResponse};

/// Row operations. All of them require a prior [`Base::auth`].
impl Base {
    /// List the rows of a table, optionally restricted to one view.
    pub async fn list_rows(
        &self,
        table_name: &str,
        view_name: Option<&str>,
    ) -> SeaTableResult<Vec<Row>> {
        let url = self.dtable_endpoint("rows/")?;
        let mut query = vec![("table_name", table_name)];
        if let Some(view) = view_name {
            query.push(("view_name", view));
        }
        debug!(table = table_name, view = ?view_name, "Listing rows");

        let resp = self
            .http()
            .get(url)
            .header(AUTHORIZATION, self.access_header()?)
            .query(&query)
            .send()
            .await?;
        let body: RowsResponse = self.handle_response(resp).await?;
        Ok(body.rows)
    }

    /// Fetch one row by id.
    pub async fn get_row(&self, table_name: &str, row_id: &str) -> SeaTableResult<Row> {
        let url = self.dtable_endpoint(&format!("rows/{}/", row_id))?;
        debug!(table = table_name, row_id, "Fetching row");

        let resp = self
            .http()
            .get(url)
            .header(AUTHORIZATION, self.access_header()?)
            .query(&[("table_name", table_name)])
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Append a row at the end of a table.
    ///
    /// Returns the stored row, including the server-assigned `_id`.
    ///
    /// # Errors
    /// * [`SeaTableError::Api`] if the table does not exist or the row is rejected.
    /// * [`SeaTableError::MalformedResponse`] if the reply carries no `_id`.
    pub async fn append_row(&self, table_name: &str, row: Row) -> SeaTableResult<Row> {
        debug!(table = table_name, columns = row.len(), "Appending row");
        let body = json!({
            "table_name": table_name,
            "row": row,
        });
        self.create_row(body).await
    }

    /// Insert a row next to `anchor_row_id`.
    pub async fn insert_row(
        &self,
        table_name: &str,
        row: Row,
        anchor_row_id: &str,
        position: RowInsertPosition,
    ) -> SeaTableResult<Row> {
        let body = json!({
            "table_name": table_name,
            "row": row,
            "anchor_row_id": anchor_row_id,
            "row_insert_position": position.as_str(),
        });
        debug!(table = table_name, anchor = anchor_row_id, %position, "Inserting row");
        self.create_row(body).await
    }

    async fn create_row(&self, body: JsonValue) -> SeaTableResult<Row> {
        let url = self.dtable_endpoint("rows/")?;
        let resp = self
            .http()
            .post(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&body)
            .send()
            .await?;
        let row: Row = self.handle_response(resp).await?;
        if row.id().is_none() {
            return Err(SeaTableError::malformed("created row has no _id"));
        }
        Ok(row)
    }

    /// Update some columns of an existing row.
    ///
    /// Columns absent from `row` keep their values. Returns the server's
    /// reply as a mapping (normally `{"success": true}`).
    pub async fn update_row(
        &self,
        table_name: &str,
        row_id: &str,
        row: Row,
    ) -> SeaTableResult<Row> {
        let url = self.dtable_endpoint("rows/")?;
        let body = json!({
            "table_name": table_name,
            "row_id": row_id,
            "row": row,
        });
        debug!(table = table_name, row_id, "Updating row");

        let resp = self
            .http()
            .put(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Delete one row.
    ///
    /// Deleting a row that does not exist is an error, so a second delete of
    /// the same id fails.
    pub async fn delete_row(&self, table_name: &str, row_id: &str) -> SeaTableResult<bool> {
        let url = self.dtable_endpoint("rows/")?;
        let body = json!({
            "table_name": table_name,
            "row_id": row_id,
        });
        debug!(table = table_name, row_id, "Deleting row");

        let resp = self
            .http()
            .delete(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let reply: DeleteRowsResponse = self.handle_response(resp).await?;
        match (reply.deleted_rows, reply.success) {
            (Some(n), _) if n > 0 => Ok(true),
            (None, Some(true)) => Ok(true),
            _ => Err(SeaTableError::Api {
                status,
                message: format!("row {} not found in table {}", row_id, table_name),
            }),
        }
    }

    /// Append several rows in one request.
    pub async fn batch_append_rows(
        &self,
        table_name: &str,
        rows: Vec<Row>,
    ) -> SeaTableResult<JsonValue> {
        let url = self.dtable_endpoint("batch-append-rows/")?;
        debug!(table = table_name, count = rows.len(), "Batch appending rows");
        let body = json!({
            "table_name": table_name,
            "rows": rows,
        });

        let resp = self
            .http()
            .post(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Update several rows in one request.
    pub async fn batch_update_rows(
        &self,
        table_name: &str,
        updates: Vec<RowUpdate>,
    ) -> SeaTableResult<JsonValue> {
        let url = self.dtable_endpoint("batch-update-rows/")?;
        debug!(table = table_name, count = updates.len(), "Batch updating rows");
        let body = json!({
            "table_name": table_name,
            "updates": updates,
        });

        let resp = self
            .http()
            .put(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Delete several rows in one request. Returns the number deleted.
    pub async fn batch_delete_rows(
        &self,
        table_name: &str,
        row_ids: &[&str],
    ) -> SeaTableResult<u64> {
        let url = self.dtable_endpoint("batch-delete-rows/")?;
        debug!(table = table_name, count = row_ids.len(), "Batch deleting rows");
        let body = json!({
            "table_name": table_name,
            "row_ids": row_ids,
        });

        let resp = self
            .http()
            .delete(url)
            .header(AUTHORIZATION, self.access_header()?)
            .json(&body)
            .send()
            .await?;
        let reply: DeleteRowsResponse = self.handle_response(resp).await?;
        Ok(reply.deleted_rows.unwrap_or(0))
    }
}

//! Rows example: metadata, append, update, read back, delete.
//!
//! Run with: cargo run --example rows -p seatable-client
//!
//! Requires `SEATABLE_SERVER_URL` and `SEATABLE_API_TOKEN`, and a table
//! `Table3` with a text column `Name` and a number column `age`.

use seatable_client::prelude::*;
use tracing_subscriber::EnvFilter;

const TABLE: &str = "Table3";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = BaseConfig::from_env()?;
    let mut base = Base::from_config(config)?;
    base.auth(true).await?;

    // ── Metadata ──
    println!("=== Tables ===");
    let metadata = base.get_metadata().await?;
    for table in &metadata.tables {
        println!("  {} ({} columns, {} views)", table.name, table.columns.len(), table.views.len());
    }

    // ── Append ──
    println!("\n=== Append row ===");
    let row = base
        .append_row(TABLE, row![("Name", "name1"), ("age", 20)])
        .await?;
    let id = row
        .id()
        .ok_or("server returned a row without _id")?
        .to_string();
    println!("  Appended {}", id);

    // ── Update ──
    println!("\n=== Update row ===");
    base.update_row(TABLE, &id, row![("Name", "name2"), ("age", 10)])
        .await?;
    let current = base.get_row(TABLE, &id).await?;
    println!("  Now: {:?}", current.get_value("age"));

    // ── Query ──
    println!("\n=== SQL ===");
    match base
        .query(&format!("select Name, age from {} limit 5", TABLE), true)
        .await
    {
        Ok(rows) => println!("  {} rows", rows.len()),
        Err(e) => println!("  SQL unavailable: {}", e),
    }

    // ── Delete ──
    println!("\n=== Delete row ===");
    base.delete_row(TABLE, &id).await?;
    println!("  Deleted {}", id);

    if let Err(e) = base.update_row(TABLE, &id, row![("age", 1)]).await {
        println!("  Updating the deleted row fails as expected: {}", e);
    }

    Ok(())
}

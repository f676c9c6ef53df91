//! Upload example: push a local file and an in-memory buffer into the base's assets.
//!
//! Run with: cargo run --example upload -p seatable-client -- <path-to-file>
//!
//! Requires `SEATABLE_SERVER_URL` and `SEATABLE_API_TOKEN` (an API token, not
//! a temporary browser token).

use std::io::Cursor;

use seatable_client::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = BaseConfig::from_env()?;
    let mut base = Base::from_config(config)?;
    base.auth(false).await?;

    if let Some(path) = std::env::args().nth(1) {
        println!("=== Upload local file ===");
        let uploaded = base
            .upload_local_file(&path, None, "", FileType::File, false)
            .await?;
        println!("  {} ({} bytes) -> {}", uploaded.name, uploaded.size, uploaded.url);
    }

    println!("\n=== Upload bytes ===");
    let first = base
        .upload_bytes_file(
            "hello.md",
            Cursor::new(b"hello world".to_vec()),
            "",
            FileType::File,
            false,
        )
        .await?;
    println!("  {}", first.url);

    // Same content without replace: the server stores a second copy.
    let second = base
        .upload_bytes_file(
            "hello.md",
            Cursor::new(b"hello world".to_vec()),
            "",
            FileType::File,
            false,
        )
        .await?;
    println!("  {}", second.url);

    // With replace the first upload is overwritten in place.
    let replaced = base
        .upload_bytes_file(
            "hello.md",
            Cursor::new(b"hello again".to_vec()),
            "",
            FileType::File,
            true,
        )
        .await?;
    println!("  {} (replaced)", replaced.url);

    Ok(())
}

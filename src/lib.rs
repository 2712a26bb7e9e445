//! httpsql - a typed, deduplicated and cached client for HTTP SQL endpoints.
//!
//! ```no_run
//! use httpsql::config::ClientOptions;
//! use httpsql::db::Database;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> httpsql::error::Result<()> {
//! let options = ClientOptions::new("http://localhost:9999")
//!     .with_cache_ttl(Duration::from_secs(5));
//! let db = Database::connect(options).await?;
//!
//! db.each("SELECT id, name FROM users", |row| {
//!     println!("{} {}", row["id"], row["name"]);
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

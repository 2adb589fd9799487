//! # Shopdesk API client
//!
//! REST client for the service-shop backend.
//!
//! ## Example
//!
//! ```no_run
//! use shopdesk_api::{ApiClient, ApiRequest, Transport, decode_page};
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Deserialize)]
//! struct Customer {
//!     id: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new("http://localhost:5000/api", Duration::from_secs(10))?
//!         .with_token("secret");
//!
//!     let body = client.execute(ApiRequest::get("customers")).await?;
//!     let page = decode_page::<Customer>(body, "customers")?;
//!     println!("{} customers", page.items.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - One request per call, no retries, no caching
//! - Bearer-token authentication
//! - Uniform `{ data }` / `{ success, data }` envelope decoding
//! - Query filters that omit unset keys

pub mod client;
pub mod envelope;
pub mod error;
pub mod query;
pub mod transport;

// Re-export main types for convenience
pub use client::ApiClient;
pub use envelope::{Page, Pagination, decode_confirmation, decode_data, decode_page, unwrap_envelope};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use query::Query;
pub use transport::{ApiRequest, Method, Transport};

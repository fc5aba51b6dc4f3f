//! Ops Manager API interaction module
//!
//! This module provides the core functionality for talking to the Ops Manager
//! API: UAA authentication, the HTTP client, staged products and available
//! products.
//!
//! # Module Structure
//!
//! - [`auth`] - UAA token acquisition and caching
//! - [`client`] - Main client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`staged`] - Staged product metadata used by the export engine
//! - [`available`] - Uploading, listing and deleting product binaries
//!
//! # Example
//!
//! ```ignore
//! use om::opsman::{Grant, HttpSettings, OpsmanClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let grant = Grant::Password { username: "admin".into(), password: "secret".into() };
//!     let client = OpsmanClient::new("https://opsman.example.com", grant, &HttpSettings::default())?;
//!     let products = client.get("api/v0/staged/products").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod available;
pub mod client;
pub mod http;
pub mod staged;

pub use auth::Grant;
pub use available::{AvailableProductsService, ProductInfo, UploadProductInput};
pub use client::OpsmanClient;
pub use http::HttpSettings;

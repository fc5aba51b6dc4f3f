//! Configuration export engine
//!
//! Renders a staged product's live configuration into a template that can be
//! re-applied to another Ops Manager.
//!
//! # Module Structure
//!
//! - [`metadata`] - The read operations the engine needs from Ops Manager
//! - [`model`] - Source document and export document shapes
//! - [`properties`] - Keeps the configurable properties
//! - [`resources`] - Resolves per-job resource config against best-fit values
//! - [`networks`] - Copies network and AZ bindings
//! - [`assembler`] - Fetches, normalizes, renders and writes
//!
//! # Example
//!
//! ```ignore
//! use om::export::{export_config, Destination};
//!
//! async fn example(client: &om::opsman::OpsmanClient) -> anyhow::Result<()> {
//!     export_config(client, "cf", &Destination::Stdout).await?;
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod metadata;
pub mod model;
pub mod networks;
pub mod properties;
pub mod resources;

pub use assembler::{assemble, export_config, export_product, render, write_rendered, Destination};
pub use metadata::{ProductMetadata, StagedProduct};
pub use model::{ExportDocument, Instances};

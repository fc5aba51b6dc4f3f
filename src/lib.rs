//! Ops Manager command line client
//!
//! Manages products staged in Ops Manager and exports a staged product's
//! configuration as a re-appliable YAML template.

pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod opsman;

pub use error::{ApiError, Document, ExportError};

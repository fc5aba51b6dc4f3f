//! Error types
//!
//! [`ApiError`] covers everything that can go wrong talking to Ops Manager.
//! [`ExportError`] is what the export engine reports; it always names the
//! document that failed so the user knows which endpoint to look at.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the Ops Manager API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("could not make api request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid target url {0:?}")]
    InvalidTarget(String),

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// HTTP status code for protocol errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The source documents an export is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    StagedProducts,
    Properties,
    Resources,
    NetworksAndAzs,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Document::StagedProducts => "staged products",
            Document::Properties => "properties",
            Document::Resources => "resources",
            Document::NetworksAndAzs => "networks and azs",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("product {name:?} is ambiguous, matching installations: {candidates}")]
    AmbiguousProduct { name: String, candidates: String },

    #[error("could not fetch {document}: {source}")]
    Fetch {
        document: Document,
        #[source]
        source: ApiError,
    },

    #[error("could not decode {document} document: {source}")]
    Decode {
        document: Document,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed property identifier {0:?}")]
    MalformedIdentifier(String),

    #[error("job {job} has no value or best fit for {field}")]
    UnresolvedResource { job: String, field: &'static str },

    #[error("could not render export document: {0}")]
    Render(#[from] serde_yaml::Error),

    #[error("could not write export to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Wrap an API failure with the document that was being fetched.
    ///
    /// A body that arrived but could not be parsed is a decode failure of
    /// that document, not a fetch failure.
    pub fn fetch(document: Document) -> impl FnOnce(ApiError) -> ExportError {
        move |source| match source {
            ApiError::Decode { source, .. } => ExportError::Decode { document, source },
            source => ExportError::Fetch { document, source },
        }
    }

    /// Wrap a schema violation with the document that was being decoded
    pub fn decode(document: Document) -> impl FnOnce(serde_json::Error) -> ExportError {
        move |source| ExportError::Decode { document, source }
    }
}

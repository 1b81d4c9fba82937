//! Error type shared by item construction, dispatch and rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by caller-supplied collaborators such as email transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure the pipeline can raise. None of them are retried.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A file or image item was built from a path that does not exist.
    #[error("source file does not exist: {}", .0.display())]
    MissingSource(PathBuf),

    /// The explicit extension disagrees with the one implied by the source name.
    #[error("explicit extension `.{explicit}` conflicts with `.{implied}` implied by `{source_name}`")]
    ExtensionConflict {
        /// Extension passed by the caller
        explicit: String,
        /// Extension taken from the source name
        implied: String,
        /// File name the implied extension came from
        source_name: String,
    },

    /// A table row does not have one cell per column.
    #[error("row `{label}` has {found} cells but the table has {expected} columns")]
    RaggedRow {
        /// Index label of the offending row
        label: String,
        /// Number of data columns
        expected: usize,
        /// Number of cells supplied
        found: usize,
    },

    /// Delimited-text parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The active renderer has no routine for this item variant.
    #[error("unhandled report item variant `{variant}` for item `{item}` in the {renderer} renderer")]
    UnhandledVariant {
        /// Variant name, or the widget component name for custom widgets
        variant: String,
        /// Item name
        item: String,
        /// Renderer that rejected the item
        renderer: &'static str,
    },

    /// A graph output mode string was neither `line` nor `stacked`.
    #[error("unknown graph mode `{0}` (expected `line` or `stacked`)")]
    UnknownGraphMode(String),

    /// A run directory or copy target already exists.
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding failure while writing a chart.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The chart backend could not draw.
    #[error("chart drawing failed: {0}")]
    Plot(String),

    /// A figure, table or widget payload could not be serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delivery was attempted without an email transport.
    #[error("no email transport configured; supply an EmailTransport to send reports")]
    NoTransport,

    /// The injected email transport failed.
    #[error("email transport failed: {0}")]
    Transport(#[source] BoxError),
}

impl ReportError {
    /// Wrap a transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

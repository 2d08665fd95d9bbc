//! Error type shared by every engine component.

use thiserror::Error;

/// Everything that can stop a chart view from reaching its `Ready` state.
///
/// Missing cells are *not* errors: they travel through the pipeline as the
/// non-finite [`MISSING`](crate::models::MISSING) sentinel.
#[derive(Debug, Error)]
pub enum ChartError {
    /// No row survived date parsing (or a specialised file had no usable rows).
    #[error("no valid rows after parsing {0} (check the source file)")]
    NoValidRows(String),

    /// A column the view depends on is absent from the header.
    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    /// The boundary file parsed as JSON but is not a usable feature collection.
    #[error("malformed boundary file: {0}")]
    Geo(String),

    /// Network or filesystem failure while loading a source.
    #[error("failed to load {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The drawing backend refused a primitive.
    #[error("render failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, ChartError>;

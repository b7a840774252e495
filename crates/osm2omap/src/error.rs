use std::path::PathBuf;

/// Failures that stop a conversion before any feature is processed.
///
/// Problems with individual features are never errors; they are counted in
/// [`crate::document::ConversionStats`] and the feature is skipped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("input is not a GeoJSON feature collection: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

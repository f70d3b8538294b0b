use crate::ItemKey;

/// Result type alias for grid operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by [`crate::GridView`] and [`crate::DataSource`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A key passed to an edit (or used as a reference position) is not in the collection.
    #[error("item key {key} not found")]
    NotFound { key: ItemKey },

    /// An index-based request fell outside `[0, count)`.
    #[error("index {index} out of range (count {count})")]
    OutOfRange { index: usize, count: usize },

    /// The view was torn down with [`crate::GridView::dispose`].
    #[error("grid view has been disposed")]
    Disposed,

    /// The data source rejected or failed the request.
    #[error("data source error: {0}")]
    Source(String),
}

impl Error {
    /// Wraps a failure reported by the data source.
    pub fn source_error(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    pub(crate) fn out_of_range(index: usize, count: usize) -> Self {
        Self::OutOfRange { index, count }
    }
}

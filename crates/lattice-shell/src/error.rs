//! Error types for Lattice Shell collections.
//!
//! Every error here is a caller contract violation. They are returned before
//! any state changes and are never logged-and-swallowed.

/// Result type alias for collection operations.
pub type CollectionResult<T> = std::result::Result<T, CollectionError>;

/// Errors that can occur when driving an [`ElementCollection`](crate::ElementCollection).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// The backing store was already assigned, explicitly or by first use.
    #[error("backing store of collection '{collection}' can only be set once")]
    BackingAlreadySet {
        /// Name of the collection that rejected the assignment.
        collection: String,
    },

    /// Change notifications were already paused.
    #[error("change notifications of collection '{collection}' are already paused")]
    AlreadyPaused {
        /// Name of the collection that rejected the pause.
        collection: String,
    },
}

impl CollectionError {
    /// Create a backing-already-set error.
    pub fn backing_already_set(collection: impl Into<String>) -> Self {
        Self::BackingAlreadySet {
            collection: collection.into(),
        }
    }

    /// Create an already-paused error.
    pub fn already_paused(collection: impl Into<String>) -> Self {
        Self::AlreadyPaused {
            collection: collection.into(),
        }
    }
}

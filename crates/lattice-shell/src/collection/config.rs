//! Collection configuration and builder.

use crate::element::ElementRef;
use crate::error::CollectionResult;

use super::filtered::ElementCollection;
use super::observable::ObservableList;

/// Default initial capacity of the pending-notification queue.
pub const DEFAULT_PENDING_CAPACITY: usize = 8;

/// Configuration for an [`ElementCollection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Name used to label trace events and errors of this collection.
    pub name: String,
    /// Initial capacity reserved for notifications queued while paused.
    pub pending_capacity: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: "shell-elements".to_string(),
            pending_capacity: DEFAULT_PENDING_CAPACITY,
        }
    }
}

impl CollectionConfig {
    /// Create a new configuration with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating element collections with custom configuration.
///
/// # Example
///
/// ```
/// use lattice_shell::{CollectionBuilder, ObservableList};
///
/// let items = CollectionBuilder::new()
///     .name("flyout-items")
///     .pending_capacity(32)
///     .backing(ObservableList::new())
///     .build()
///     .unwrap();
/// assert_eq!(items.name(), "flyout-items");
/// ```
#[derive(Debug, Default)]
pub struct CollectionBuilder {
    config: CollectionConfig,
    backing: Option<ObservableList<ElementRef>>,
}

impl CollectionBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collection name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the initial capacity of the pending-notification queue.
    pub fn pending_capacity(mut self, capacity: usize) -> Self {
        self.config.pending_capacity = capacity;
        self
    }

    /// Supply the backing store instead of letting the collection create one.
    pub fn backing(mut self, backing: ObservableList<ElementRef>) -> Self {
        self.backing = Some(backing);
        self
    }

    /// Build the collection.
    pub fn build(self) -> CollectionResult<ElementCollection> {
        let collection = ElementCollection::with_config(self.config);
        if let Some(backing) = self.backing {
            collection.set_backing(backing)?;
        }
        Ok(collection)
    }
}

//! Observable ordered sequence.
//!
//! `ObservableList<T>` is a plain `Vec<T>` that announces every structural
//! change through its [`changed`](ObservableList::changed) signal. Element
//! collections use one for the authoritative backing sequence and one for
//! the derived visible subset.

use parking_lot::RwLock;

use lattice_shell_core::Signal;

use super::change::CollectionChange;

/// An ordered sequence with change notification.
///
/// The write lock is always released before `changed` is emitted, so slots
/// are free to read (or mutate) the list again.
///
/// # Example
///
/// ```
/// use lattice_shell::{ChangeAction, ObservableList};
///
/// let list = ObservableList::new();
/// list.changed().connect(|change| {
///     assert_eq!(change.action(), ChangeAction::Add);
/// });
/// list.push("Home");
/// assert_eq!(list.items(), vec!["Home"]);
/// ```
pub struct ObservableList<T> {
    items: RwLock<Vec<T>>,
    changed: Signal<CollectionChange<T>>,
}

impl<T: Clone + Send + Sync + 'static> ObservableList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Creates a list seeded with `items`. Nothing is emitted.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            changed: Signal::new(),
        }
    }

    /// Emitted after every structural change.
    pub fn changed(&self) -> &Signal<CollectionChange<T>> {
        &self.changed
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Returns a clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    /// Returns a snapshot of all items.
    pub fn items(&self) -> Vec<T> {
        self.items.read().clone()
    }

    /// Reads the items through a closure without cloning them.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[T]) -> R,
    {
        f(&self.items.read())
    }

    /// Index of the first item matching `predicate`.
    pub fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.read().iter().position(predicate)
    }

    /// Appends an item to the end of the list.
    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.items.write();
            items.push(item.clone());
            items.len() - 1
        };
        self.changed.emit(CollectionChange::added(index, vec![item]));
    }

    /// Inserts an item at `index`, clamped to the end of the list.
    ///
    /// Returns the index the item actually landed at.
    pub fn insert(&self, index: usize, item: T) -> usize {
        let index = {
            let mut items = self.items.write();
            let index = index.min(items.len());
            items.insert(index, item.clone());
            index
        };
        self.changed.emit(CollectionChange::added(index, vec![item]));
        index
    }

    /// Removes and returns the item at `index`, or `None` if out of range.
    pub fn remove_at(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.items.write();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.changed
            .emit(CollectionChange::removed(index, vec![removed.clone()]));
        Some(removed)
    }

    /// Replaces the item at `index`, returning the old one.
    pub fn replace(&self, index: usize, item: T) -> Option<T> {
        let old = {
            let mut items = self.items.write();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, item.clone())
        };
        self.changed
            .emit(CollectionChange::replaced(index, item, old.clone()));
        Some(old)
    }

    /// Removes all items, emitting a single `Reset`.
    pub fn clear(&self) -> Vec<T> {
        let old = std::mem::take(&mut *self.items.write());
        self.changed.emit(CollectionChange::reset(old.clone()));
        old
    }

    /// Removes all items without emitting anything.
    ///
    /// The caller is responsible for publishing whatever synthetic
    /// notification describes the change.
    pub fn clear_silently(&self) -> Vec<T> {
        self.changed.set_blocked(true);
        let old = self.clear();
        self.changed.set_blocked(false);
        old
    }
}

impl<T: Clone + Send + Sync + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableList")
            .field("len", &self.items.read().len())
            .field("changed", &self.changed)
            .finish()
    }
}

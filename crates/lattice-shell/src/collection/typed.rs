//! Strongly-typed view over an element collection.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::element::{ElementRef, ShellElement};

use super::filtered::ElementCollection;

/// A typed projection of an [`ElementCollection`].
///
/// Every operation forwards to the untyped collection, so visibility
/// filtering, cascading and notifications behave exactly the same. Reads
/// project stored elements back to `T`; elements of another concrete type
/// (inserted through the untyped handle) are skipped by snapshot reads and
/// yield `None` from indexed reads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lattice_shell::{ElementBase, ShellElement, TypedElementCollection};
///
/// struct Tab {
///     base: ElementBase,
///     title: &'static str,
/// }
///
/// impl ShellElement for Tab {
///     fn element_base(&self) -> &ElementBase { &self.base }
///     fn is_always_visible(&self) -> bool { true }
/// }
///
/// let tabs = TypedElementCollection::<Tab>::new();
/// tabs.add(Arc::new(Tab { base: ElementBase::new(), title: "Home" }));
/// assert_eq!(tabs.get(0).map(|tab| tab.title), Some("Home"));
/// ```
pub struct TypedElementCollection<T: ShellElement> {
    inner: ElementCollection,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ShellElement> TypedElementCollection<T> {
    /// Create an empty typed collection.
    pub fn new() -> Self {
        Self::from_untyped(ElementCollection::new())
    }

    /// Create an empty typed collection with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self::from_untyped(ElementCollection::with_name(name))
    }

    /// Wrap an existing untyped collection.
    pub fn from_untyped(inner: ElementCollection) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// The untyped collection, e.g. to hand out from [`ShellElement::group`].
    pub fn as_untyped(&self) -> &ElementCollection {
        &self.inner
    }

    fn project(element: ElementRef) -> Option<Arc<T>> {
        element.into_any_arc().downcast::<T>().ok()
    }

    /// Append an element.
    pub fn add(&self, element: Arc<T>) {
        self.inner.add(element);
    }

    /// Insert an element at `index`, clamped to the end.
    pub fn insert(&self, index: usize, element: Arc<T>) -> usize {
        self.inner.insert(index, element)
    }

    /// Remove the first occurrence of `element`.
    pub fn remove(&self, element: &T) -> bool {
        self.inner.remove(element)
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&self, index: usize) -> Option<Arc<T>> {
        self.inner.remove_at(index).and_then(Self::project)
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn replace(&self, index: usize, element: Arc<T>) -> Option<Arc<T>> {
        self.inner.replace(index, element).and_then(Self::project)
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.inner.get(index).and_then(Self::project)
    }

    /// Index of the first occurrence of `element`.
    pub fn index_of(&self, element: &T) -> Option<usize> {
        self.inner.index_of(element)
    }

    /// Whether `element` is a member.
    pub fn contains(&self, element: &T) -> bool {
        self.inner.contains(element)
    }

    /// Remove every element as one atomic change.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of the elements.
    pub fn items(&self) -> Vec<Arc<T>> {
        self.inner.iter().filter_map(Self::project).collect()
    }

    /// Snapshot of the visible elements.
    pub fn visible_items(&self) -> Vec<Arc<T>> {
        self.inner
            .visible_items()
            .into_iter()
            .filter_map(Self::project)
            .collect()
    }
}

impl<T: ShellElement> Clone for TypedElementCollection<T> {
    fn clone(&self) -> Self {
        Self::from_untyped(self.inner.clone())
    }
}

impl<T: ShellElement> Default for TypedElementCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ShellElement> std::ops::Deref for TypedElementCollection<T> {
    type Target = ElementCollection;

    fn deref(&self) -> &ElementCollection {
        &self.inner
    }
}

impl<T: ShellElement> fmt::Debug for TypedElementCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedElementCollection")
            .field("element_type", &std::any::type_name::<T>())
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementBase;

    struct Tab {
        base: ElementBase,
        title: &'static str,
    }

    impl ShellElement for Tab {
        fn element_base(&self) -> &ElementBase {
            &self.base
        }

        fn is_always_visible(&self) -> bool {
            true
        }
    }

    struct Other(ElementBase);

    impl ShellElement for Other {
        fn element_base(&self) -> &ElementBase {
            &self.0
        }

        fn is_always_visible(&self) -> bool {
            true
        }
    }

    fn tab(title: &'static str) -> Arc<Tab> {
        Arc::new(Tab {
            base: ElementBase::new(),
            title,
        })
    }

    #[test]
    fn test_typed_round_trip() {
        let tabs = TypedElementCollection::<Tab>::with_name("tabs");
        let home = tab("Home");
        tabs.add(home.clone());
        tabs.insert(0, tab("Start"));

        let titles: Vec<_> = tabs.items().iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Start", "Home"]);
        assert_eq!(tabs.index_of(&home), Some(1));
        assert!(tabs.contains(&home));
        assert_eq!(tabs.visible_items().len(), 2);

        assert!(tabs.remove(&home));
        assert!(!tabs.remove(&home));
        assert_eq!(tabs.len(), 1);
    }

    #[test]
    fn test_foreign_elements_are_skipped() {
        let tabs = TypedElementCollection::<Tab>::new();
        tabs.add(tab("Home"));
        tabs.as_untyped().add(Arc::new(Other(ElementBase::new())));

        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs.items().len(), 1);
        assert!(tabs.get(1).is_none());
        assert_eq!(tabs.visible_len(), 2);
    }

    #[test]
    fn test_clone_shares_state() {
        let tabs = TypedElementCollection::<Tab>::new();
        let other = tabs.clone();
        tabs.add(tab("Home"));
        assert_eq!(other.len(), 1);
        assert!(tabs.ptr_eq(other.as_untyped()));
    }
}

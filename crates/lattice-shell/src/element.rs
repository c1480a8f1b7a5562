//! The element contract consumed by navigation collections.
//!
//! Collections never know the concrete navigation types they hold. They see
//! elements through [`ShellElement`], which exposes exactly what visibility
//! filtering needs:
//!
//! - a stable identity ([`ElementId`])
//! - a non-owning back-reference to the structural parent ([`ParentLink`])
//! - whether the element is a group hosting a nested collection
//! - whether the element always counts as visible (a menu entry)
//!
//! Concrete elements usually embed an [`ElementBase`], the same way objects
//! embed an `ObjectBase` elsewhere in Lattice.
//!
//! # Example
//!
//! ```
//! use lattice_shell::{ElementBase, ElementCollection, ShellElement};
//!
//! struct Section {
//!     base: ElementBase,
//!     contents: ElementCollection,
//! }
//!
//! impl ShellElement for Section {
//!     fn element_base(&self) -> &ElementBase {
//!         &self.base
//!     }
//!
//!     fn group(&self) -> Option<ElementCollection> {
//!         Some(self.contents.clone())
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lattice_shell_core::Signal;
use parking_lot::RwLock;

use crate::collection::ElementCollection;

/// A unique identifier for a navigation element.
///
/// Identifiers are allocated from a process-wide counter and never reused.
/// Collections compare elements by identifier, and parent back-references
/// are stored as identifiers rather than pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

/// Global counter for generating unique element IDs.
static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

impl ElementId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value of this element ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Non-owning reference from an element to its structural parent.
///
/// The parent is recorded by [`ElementId`] only. Assigning a parent emits
/// [`parent_set`](Self::parent_set), which collections use to repair
/// visibility when wiring happens after insertion.
pub struct ParentLink {
    parent: RwLock<Option<ElementId>>,
    parent_set: Signal<ElementId>,
}

impl ParentLink {
    /// Create an unassigned link.
    pub fn new() -> Self {
        Self {
            parent: RwLock::new(None),
            parent_set: Signal::new(),
        }
    }

    /// The current parent, if one has been assigned.
    pub fn parent(&self) -> Option<ElementId> {
        *self.parent.read()
    }

    /// Assign the parent.
    ///
    /// Emits `parent_set` only when the value actually changes.
    pub fn set(&self, parent: ElementId) {
        let previous = self.parent.write().replace(parent);
        if previous == Some(parent) {
            return;
        }
        tracing::debug!(target: "lattice_shell::element", %parent, ?previous, "parent assigned");
        self.parent_set.emit(parent);
    }

    /// Forget the parent, returning the previous one. Emits nothing.
    pub fn clear(&self) -> Option<ElementId> {
        self.parent.write().take()
    }

    /// Emitted with the new parent ID whenever a parent is assigned.
    pub fn parent_set(&self) -> &Signal<ElementId> {
        &self.parent_set
    }
}

impl Default for ParentLink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("parent", &self.parent())
            .finish()
    }
}

/// Identity and parent link shared by every element implementation.
#[derive(Debug)]
pub struct ElementBase {
    id: ElementId,
    parent: ParentLink,
}

impl ElementBase {
    /// Create a base with a freshly allocated ID and no parent.
    pub fn new() -> Self {
        Self {
            id: ElementId::next(),
            parent: ParentLink::new(),
        }
    }

    /// This element's ID.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// This element's parent link.
    pub fn parent_link(&self) -> &ParentLink {
        &self.parent
    }
}

impl Default for ElementBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Upcast to `Any`, implemented for every sized element type.
///
/// This is what lets [`TypedElementCollection`](crate::TypedElementCollection)
/// project type-erased elements back to their concrete type.
pub trait AnyElement {
    /// Convert a shared element into a shared `Any`.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AnyElement for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// The capability contract a navigation element offers to collections.
pub trait ShellElement: AnyElement + Send + Sync + 'static {
    /// The embedded identity and parent link.
    fn element_base(&self) -> &ElementBase;

    /// The nested collection, if this element is a group.
    ///
    /// Collections query this once when the element is inserted and cache
    /// the answer for as long as the element stays a member.
    fn group(&self) -> Option<ElementCollection> {
        None
    }

    /// Whether this element counts as visible regardless of any children.
    ///
    /// Menu entries are standalone actionable items rather than groupings,
    /// so they opt in here.
    fn is_always_visible(&self) -> bool {
        false
    }

    /// This element's ID.
    fn id(&self) -> ElementId {
        self.element_base().id()
    }

    /// This element's parent link.
    fn parent_link(&self) -> &ParentLink {
        self.element_base().parent_link()
    }
}

/// A shared, type-erased element as stored by collections.
pub type ElementRef = Arc<dyn ShellElement>;

/// What kind of node an element is, as seen by the visibility predicate.
#[derive(Clone)]
enum ElementKind {
    /// A plain element with no nested collection.
    Leaf,
    /// A group whose visibility follows its nested collection.
    Group(ElementCollection),
}

/// Snapshot of an element's capabilities, taken once at insertion.
#[derive(Clone)]
pub struct Capabilities {
    kind: ElementKind,
    always_visible: bool,
}

impl Capabilities {
    /// Query both capabilities of `element`.
    pub fn of(element: &dyn ShellElement) -> Self {
        Self {
            kind: element.group().map_or(ElementKind::Leaf, ElementKind::Group),
            always_visible: element.is_always_visible(),
        }
    }

    /// The nested collection for groups.
    pub fn nested(&self) -> Option<&ElementCollection> {
        match &self.kind {
            ElementKind::Group(nested) => Some(nested),
            ElementKind::Leaf => None,
        }
    }

    /// Whether the element always counts as visible.
    pub fn is_always_visible(&self) -> bool {
        self.always_visible
    }

    /// Evaluate the visibility predicate against current state.
    ///
    /// A group is visible while its nested collection has at least one
    /// visible item. Always-visible elements are visible unconditionally.
    /// Nothing else is ever visible.
    pub fn is_visible(&self) -> bool {
        if self.always_visible {
            return true;
        }
        match &self.kind {
            ElementKind::Group(nested) => nested.has_visible_items(),
            ElementKind::Leaf => false,
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("group", &matches!(self.kind, ElementKind::Group(_)))
            .field("always_visible", &self.always_visible)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Leaf {
        base: ElementBase,
        menu: bool,
    }

    impl ShellElement for Leaf {
        fn element_base(&self) -> &ElementBase {
            &self.base
        }

        fn is_always_visible(&self) -> bool {
            self.menu
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ElementId::next();
        let b = ElementId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_parent_link_emits_on_change_only() {
        let link = ParentLink::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        link.parent_set().connect(move |&parent| seen_clone.lock().push(parent));

        let parent = ElementId::next();
        assert_eq!(link.parent(), None);
        link.set(parent);
        link.set(parent);
        assert_eq!(link.parent(), Some(parent));
        assert_eq!(*seen.lock(), vec![parent]);

        let other = ElementId::next();
        link.set(other);
        assert_eq!(*seen.lock(), vec![parent, other]);

        assert_eq!(link.clear(), Some(other));
        assert_eq!(link.clear(), None);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_capabilities_of_leaf() {
        let plain = Leaf { base: ElementBase::new(), menu: false };
        let caps = Capabilities::of(&plain);
        assert!(caps.nested().is_none());
        assert!(!caps.is_visible());

        let menu = Leaf { base: ElementBase::new(), menu: true };
        assert!(Capabilities::of(&menu).is_visible());
    }

    #[test]
    fn test_into_any_arc_downcasts() {
        let element: ElementRef = Arc::new(Leaf { base: ElementBase::new(), menu: true });
        let id = element.id();
        let leaf = element
            .into_any_arc()
            .downcast::<Leaf>()
            .ok()
            .map(|leaf| leaf.base.id());
        assert_eq!(leaf, Some(id));
    }
}

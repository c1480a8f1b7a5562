//! Visibility-filtered element collection.
//!
//! An [`ElementCollection`] owns two observable sequences:
//!
//! - the **backing** sequence, the authoritative list of elements exactly as
//!   the owner inserted them
//! - the **visible** subset, an order-preserving subsequence of the backing
//!   sequence holding exactly the elements whose visibility predicate holds
//!
//! Every backing mutation is published on [`backing_changed`] first, then the
//! visibility of the affected elements is recomputed inline, and whatever
//! enters or leaves the visible subset is published on [`visible_changed`].
//!
//! # Cascading group visibility
//!
//! A group element is visible while its nested collection has at least one
//! visible child. When a group joins a collection, the collection watches the
//! nested collection's visible stream for as long as the group stays a member.
//! Each nested change makes the collection re-ask "is this child's parent
//! visible now?", which may flip the parent in this collection's own visible
//! subset and publish again, continuing up toward the root. Nothing is cached
//! between levels; every level pulls the current answer from the level below.
//!
//! A child whose parent link is still unassigned when such a change arrives
//! gets a one-shot listener on its `parent_set` signal instead, and the check
//! runs once the parent is known.
//!
//! # Batching
//!
//! [`pause`] switches visible-subset delivery from flowing to batching; visible
//! changes are queued until [`resume`] replays them in arrival order. Backing
//! notifications are never deferred.
//!
//! [`backing_changed`]: ElementCollection::backing_changed
//! [`visible_changed`]: ElementCollection::visible_changed
//! [`pause`]: ElementCollection::pause
//! [`resume`]: ElementCollection::resume

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use lattice_shell_core::{ConnectionGuard, Signal};
use parking_lot::Mutex;

use crate::element::{Capabilities, ElementId, ElementRef, ShellElement};
use crate::error::{CollectionError, CollectionResult};

use super::change::CollectionChange;
use super::config::CollectionConfig;
use super::observable::ObservableList;

/// A change to a sequence of type-erased elements.
pub type ElementChange = CollectionChange<ElementRef>;

/// Delivery state of visible-subset notifications.
enum Delivery {
    Flowing,
    Batching(Vec<ElementChange>),
}

/// Bookkeeping for one distinct element in the backing sequence.
struct Member {
    caps: Capabilities,
    /// How many times the element occurs in the backing sequence.
    copies: usize,
    /// Watch on the nested collection, for groups.
    _group_watch: Option<ConnectionGuard>,
}

/// A pending one-shot listener waiting for a child's parent to be assigned.
struct ParentFixup {
    /// The member group whose nested change registered this fixup.
    group: ElementId,
    _guard: ConnectionGuard,
}

struct Shared {
    this: Weak<Shared>,
    config: CollectionConfig,
    backing: OnceLock<ObservableList<ElementRef>>,
    backing_watch: Mutex<Option<ConnectionGuard>>,
    visible: ObservableList<ElementRef>,
    members: Mutex<HashMap<ElementId, Member>>,
    fixups: Mutex<HashMap<ElementId, ParentFixup>>,
    delivery: Mutex<Delivery>,
    backing_changed: Signal<ElementChange>,
    visible_changed: Signal<ElementChange>,
    visible_changed_internal: Signal<ElementChange>,
}

/// An observable, visibility-filtering collection of navigation elements.
///
/// `ElementCollection` is a cheap-clone handle; clones share the same
/// sequences and signals. Group elements hand out a clone of their nested
/// collection through [`ShellElement::group`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lattice_shell::{ElementBase, ElementCollection, ShellElement};
///
/// struct MenuEntry(ElementBase);
///
/// impl ShellElement for MenuEntry {
///     fn element_base(&self) -> &ElementBase { &self.0 }
///     fn is_always_visible(&self) -> bool { true }
/// }
///
/// let items = ElementCollection::with_name("flyout");
/// items.add(Arc::new(MenuEntry(ElementBase::new())));
/// assert_eq!(items.len(), 1);
/// assert_eq!(items.visible_len(), 1);
/// ```
#[derive(Clone)]
pub struct ElementCollection {
    shared: Arc<Shared>,
}

impl ElementCollection {
    /// Creates an empty collection with default configuration.
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    /// Creates an empty collection with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self::with_config(CollectionConfig::with_name(name))
    }

    /// Creates an empty collection with custom configuration.
    ///
    /// The backing store is not created until first use, so
    /// [`set_backing`](Self::set_backing) may still supply one.
    pub fn with_config(config: CollectionConfig) -> Self {
        let shared = Arc::new_cyclic(|this: &Weak<Shared>| {
            let visible = ObservableList::new();
            let weak = this.clone();
            visible.changed().connect(move |change: &ElementChange| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_visible_changed(change);
                }
            });

            Shared {
                this: this.clone(),
                config,
                backing: OnceLock::new(),
                backing_watch: Mutex::new(None),
                visible,
                members: Mutex::new(HashMap::new()),
                fixups: Mutex::new(HashMap::new()),
                delivery: Mutex::new(Delivery::Flowing),
                backing_changed: Signal::new(),
                visible_changed: Signal::new(),
                visible_changed_internal: Signal::new(),
            }
        });
        tracing::trace!(target: "lattice_shell::collection", collection = %shared.config.name, "collection created");
        Self { shared }
    }

    /// The configured name of this collection.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// The configuration this collection was created with.
    pub fn config(&self) -> &CollectionConfig {
        &self.shared.config
    }

    /// Whether two handles refer to the same collection.
    pub fn ptr_eq(&self, other: &ElementCollection) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Attach `backing` as the backing store.
    ///
    /// The backing store can be assigned once. Fails with
    /// [`CollectionError::BackingAlreadySet`] if one was already assigned, or
    /// if the collection already created its own by being used; nothing
    /// changes in that case. Elements already in `backing` are processed as a
    /// single insertion.
    pub fn set_backing(&self, backing: ObservableList<ElementRef>) -> CollectionResult<()> {
        self.shared.set_backing(backing)
    }

    // -------------------------------------------------------------------------
    // Backing sequence
    // -------------------------------------------------------------------------

    /// Appends an element.
    pub fn add(&self, element: ElementRef) {
        self.shared.backing().push(element);
    }

    /// Inserts an element at `index`, clamped to the end.
    ///
    /// Returns the index the element landed at.
    pub fn insert(&self, index: usize, element: ElementRef) -> usize {
        self.shared.backing().insert(index, element)
    }

    /// Removes and returns the element at `index`, or `None` if out of range.
    pub fn remove_at(&self, index: usize) -> Option<ElementRef> {
        self.shared.backing().remove_at(index)
    }

    /// Removes the first occurrence of `element`.
    ///
    /// Returns `false` and emits nothing if the element is not a member.
    pub fn remove(&self, element: &dyn ShellElement) -> bool {
        match self.index_of(element) {
            Some(index) => self.remove_at(index).is_some(),
            None => {
                tracing::trace!(target: "lattice_shell::collection", collection = %self.name(), element = %element.id(), "remove: not a member");
                false
            }
        }
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn replace(&self, index: usize, element: ElementRef) -> Option<ElementRef> {
        self.shared.backing().replace(index, element)
    }

    /// Index of the first occurrence of `element`.
    pub fn index_of(&self, element: &dyn ShellElement) -> Option<usize> {
        let id = element.id();
        self.shared.backing().position(|item| item.id() == id)
    }

    /// Whether `element` is in the backing sequence.
    pub fn contains(&self, element: &dyn ShellElement) -> bool {
        self.index_of(element).is_some()
    }

    /// Removes every element as one atomic change.
    ///
    /// Observers see exactly one backing `Reset` listing every prior element,
    /// followed by exactly one visible `Reset` listing every previously
    /// visible element. If notifications are already paused the visible
    /// `Reset` joins the open batch.
    pub fn clear(&self) {
        self.shared.clear();
    }

    /// Number of elements in the backing sequence.
    pub fn len(&self) -> usize {
        self.shared.backing().len()
    }

    /// Whether the backing sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.shared.backing().is_empty()
    }

    /// The element at `index`.
    pub fn get(&self, index: usize) -> Option<ElementRef> {
        self.shared.backing().get(index)
    }

    /// Snapshot of the backing sequence.
    pub fn items(&self) -> Vec<ElementRef> {
        self.shared.backing().items()
    }

    /// Iterates over a snapshot of the backing sequence.
    pub fn iter(&self) -> std::vec::IntoIter<ElementRef> {
        self.items().into_iter()
    }

    // -------------------------------------------------------------------------
    // Visible subset
    // -------------------------------------------------------------------------

    /// Snapshot of the visible subset.
    pub fn visible_items(&self) -> Vec<ElementRef> {
        self.shared.visible.items()
    }

    /// Number of visible elements.
    pub fn visible_len(&self) -> usize {
        self.shared.visible.len()
    }

    /// Whether at least one element is visible.
    pub fn has_visible_items(&self) -> bool {
        !self.shared.visible.is_empty()
    }

    /// Whether `element` is currently in the visible subset.
    pub fn is_visible(&self, element: &dyn ShellElement) -> bool {
        let id = element.id();
        self.shared.visible.position(|item| item.id() == id).is_some()
    }

    // -------------------------------------------------------------------------
    // Signals
    // -------------------------------------------------------------------------

    /// Emitted after every backing mutation. Never deferred.
    pub fn backing_changed(&self) -> &Signal<ElementChange> {
        &self.shared.backing_changed
    }

    /// Emitted when elements enter or leave the visible subset.
    pub fn visible_changed(&self) -> &Signal<ElementChange> {
        &self.shared.visible_changed
    }

    /// Same payloads as [`visible_changed`](Self::visible_changed), delivered
    /// right after it. Parent collections listen here.
    pub fn visible_changed_internal(&self) -> &Signal<ElementChange> {
        &self.shared.visible_changed_internal
    }

    // -------------------------------------------------------------------------
    // Batching
    // -------------------------------------------------------------------------

    /// Start queueing visible-subset notifications.
    ///
    /// Fails with [`CollectionError::AlreadyPaused`] if already paused.
    pub fn pause(&self) -> CollectionResult<()> {
        if self.shared.begin_batch() {
            tracing::trace!(target: "lattice_shell::collection", collection = %self.name(), "paused");
            Ok(())
        } else {
            tracing::warn!(target: "lattice_shell::collection", collection = %self.name(), "pause while already paused");
            Err(CollectionError::already_paused(self.name()))
        }
    }

    /// Stop queueing and replay queued notifications in arrival order.
    ///
    /// Does nothing if not paused.
    pub fn resume(&self) {
        self.shared.end_batch();
    }

    /// Pause until the returned guard is dropped.
    pub fn pause_scoped(&self) -> CollectionResult<PauseGuard<'_>> {
        self.pause()?;
        Ok(PauseGuard {
            shared: &self.shared,
            owns_batch: true,
        })
    }

    /// Whether visible-subset notifications are currently queued.
    pub fn is_paused(&self) -> bool {
        matches!(*self.shared.delivery.lock(), Delivery::Batching(_))
    }

    /// Number of queued visible-subset notifications.
    pub fn pending_len(&self) -> usize {
        match &*self.shared.delivery.lock() {
            Delivery::Batching(pending) => pending.len(),
            Delivery::Flowing => 0,
        }
    }
}

impl Default for ElementCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ElementCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementCollection")
            .field("name", &self.name())
            .field("len", &self.shared.backing.get().map_or(0, |b| b.len()))
            .field("visible_len", &self.visible_len())
            .field("paused", &self.is_paused())
            .finish()
    }
}

/// Resumes visible-subset delivery when dropped.
///
/// Returned by [`ElementCollection::pause_scoped`].
#[must_use = "dropping a PauseGuard resumes delivery immediately"]
pub struct PauseGuard<'a> {
    shared: &'a Shared,
    owns_batch: bool,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        if self.owns_batch {
            self.shared.end_batch();
        }
    }
}

impl fmt::Debug for PauseGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PauseGuard")
            .field("collection", &self.shared.config.name)
            .field("owns_batch", &self.owns_batch)
            .finish()
    }
}

impl Shared {
    fn backing(&self) -> &ObservableList<ElementRef> {
        let mut fresh = false;
        let backing = self.backing.get_or_init(|| {
            fresh = true;
            ObservableList::new()
        });
        if fresh {
            self.watch_backing(backing);
        }
        backing
    }

    fn set_backing(&self, backing: ObservableList<ElementRef>) -> CollectionResult<()> {
        let mut fresh = false;
        let stored = self.backing.get_or_init(|| {
            fresh = true;
            backing
        });
        if !fresh {
            tracing::warn!(target: "lattice_shell::collection", collection = %self.config.name, "backing store assigned twice");
            return Err(CollectionError::backing_already_set(&self.config.name));
        }

        self.watch_backing(stored);
        let seeded = stored.items();
        if !seeded.is_empty() {
            self.on_backing_changed(&CollectionChange::added(0, seeded));
        }
        Ok(())
    }

    fn watch_backing(&self, backing: &ObservableList<ElementRef>) {
        let weak = self.this.clone();
        let guard = backing.changed().connect_scoped(move |change: &ElementChange| {
            if let Some(shared) = weak.upgrade() {
                shared.on_backing_changed(change);
            }
        });
        *self.backing_watch.lock() = Some(guard);
    }

    fn on_backing_changed(&self, change: &ElementChange) {
        tracing::trace!(
            target: "lattice_shell::collection",
            collection = %self.config.name,
            action = ?change.action(),
            added = change.new_items().len(),
            removed = change.old_items().len(),
            "backing changed"
        );
        self.backing_changed.emit(change.clone());

        for element in change.old_items() {
            self.release(element);
            self.drop_from_visible(element.id());
            // Another copy may remain; put it back at its new position.
            if self.backing_contains(element.id()) {
                self.check_visibility(element);
            }
        }

        for element in change.new_items() {
            self.retain(element);
            self.check_visibility(element);
        }
    }

    fn clear(&self) {
        let _span = tracing::trace_span!(
            target: "lattice_shell::collection",
            "lattice_shell::mutation",
            collection = %self.config.name,
            op = "clear"
        )
        .entered();

        let _batch = PauseGuard {
            shared: self,
            owns_batch: self.begin_batch(),
        };

        let old_items = self.backing().clear_silently();
        let old_visible = self.visible.clear_silently();
        let members = std::mem::take(&mut *self.members.lock());
        let fixups = std::mem::take(&mut *self.fixups.lock());
        drop(members);
        drop(fixups);

        tracing::trace!(target: "lattice_shell::collection", collection = %self.config.name, removed = old_items.len(), visible = old_visible.len(), "cleared");
        self.backing_changed.emit(CollectionChange::reset(old_items));
        self.on_visible_changed(&CollectionChange::reset(old_visible));
    }

    fn backing_contains(&self, id: ElementId) -> bool {
        self.backing().position(|item| item.id() == id).is_some()
    }

    /// Record one more occurrence of `element`, watching it if it is a group.
    fn retain(&self, element: &ElementRef) {
        let id = element.id();
        if let Some(member) = self.members.lock().get_mut(&id) {
            member.copies += 1;
            return;
        }

        let caps = Capabilities::of(element.as_ref());
        let group_watch = caps.nested().map(|nested| self.watch_group(id, nested));
        self.members.lock().insert(
            id,
            Member {
                caps,
                copies: 1,
                _group_watch: group_watch,
            },
        );
    }

    /// Forget one occurrence of `element`, unwatching it after the last one.
    fn release(&self, element: &ElementRef) {
        let id = element.id();
        let released = {
            let mut members = self.members.lock();
            match members.get(&id).map(|member| member.copies) {
                Some(copies) if copies > 1 => {
                    if let Some(member) = members.get_mut(&id) {
                        member.copies -= 1;
                    }
                    None
                }
                Some(_) => members.remove(&id),
                None => None,
            }
        };

        if let Some(member) = released {
            if member.caps.nested().is_some() {
                self.fixups.lock().retain(|_, fixup| fixup.group != id);
                tracing::trace!(target: "lattice_shell::cascade", collection = %self.config.name, group = %id, "stopped watching group");
            }
        }
    }

    fn watch_group(&self, group: ElementId, nested: &ElementCollection) -> ConnectionGuard {
        tracing::trace!(target: "lattice_shell::cascade", collection = %self.config.name, %group, nested = %nested.name(), "watching group");
        let weak = self.this.clone();
        nested
            .visible_changed_internal()
            .connect_scoped(move |change: &ElementChange| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_group_visibility_changed(group, change);
                }
            })
    }

    fn is_element_visible(&self, element: &ElementRef) -> bool {
        let cached = self
            .members
            .lock()
            .get(&element.id())
            .map(|member| member.caps.clone());
        cached
            .unwrap_or_else(|| Capabilities::of(element.as_ref()))
            .is_visible()
    }

    /// Bring `element`'s membership in the visible subset in line with the
    /// visibility predicate.
    fn check_visibility(&self, element: &ElementRef) {
        let id = element.id();
        let visible_now = self.is_element_visible(element);
        let position = self.visible.position(|item| item.id() == id);

        match (visible_now, position) {
            (true, None) => {
                if let Some(index) = self.visible_insert_index(id) {
                    tracing::trace!(target: "lattice_shell::collection", collection = %self.config.name, element = %id, index, "element shown");
                    self.visible.insert(index, element.clone());
                }
            }
            (true, Some(position)) => {
                // A new copy may have moved the first occurrence forward.
                if let Some(index) = self.visible_insert_index(id) {
                    if index != position {
                        tracing::trace!(target: "lattice_shell::collection", collection = %self.config.name, element = %id, from = position, to = index, "element moved");
                        self.visible.remove_at(position);
                        self.visible.insert(index, element.clone());
                    }
                }
            }
            (false, Some(position)) => {
                tracing::trace!(target: "lattice_shell::collection", collection = %self.config.name, element = %id, "element hidden");
                self.visible.remove_at(position);
            }
            (false, None) => {}
        }
    }

    /// Where `id` belongs in the visible subset: the number of distinct
    /// visible elements preceding its first occurrence in the backing
    /// sequence. `None` if it is not in the backing sequence.
    fn visible_insert_index(&self, id: ElementId) -> Option<usize> {
        let visible: HashSet<ElementId> = self
            .visible
            .with(|items| items.iter().map(|item| item.id()).collect());
        let mut preceding = HashSet::new();

        self.backing().with(|items| {
            for item in items {
                let current = item.id();
                if current == id {
                    return Some(preceding.len());
                }
                if visible.contains(&current) {
                    preceding.insert(current);
                }
            }
            None
        })
    }

    fn drop_from_visible(&self, id: ElementId) {
        if let Some(position) = self.visible.position(|item| item.id() == id) {
            self.visible.remove_at(position);
        }
    }

    /// Re-check the visibility of the member with `id`, if there is one.
    fn check_visibility_of(&self, id: ElementId) {
        let element = self
            .backing()
            .with(|items| items.iter().find(|item| item.id() == id).cloned());
        match element {
            Some(element) => self.check_visibility(&element),
            None => {
                tracing::trace!(target: "lattice_shell::cascade", collection = %self.config.name, parent = %id, "parent is not a member");
            }
        }
    }

    fn on_group_visibility_changed(&self, group: ElementId, change: &ElementChange) {
        tracing::debug!(
            target: "lattice_shell::cascade",
            collection = %self.config.name,
            %group,
            action = ?change.action(),
            "nested visibility changed"
        );

        let mut parents = Vec::new();
        for child in change.new_items() {
            match child.parent_link().parent() {
                Some(parent) => push_unique(&mut parents, parent),
                None => self.defer_until_parent_set(group, child),
            }
        }
        for child in change.old_items() {
            match child.parent_link().parent() {
                Some(parent) => push_unique(&mut parents, parent),
                None => {
                    // Gone from the nested collection; the group it left is
                    // the only parent it could have had here.
                    self.cancel_parent_fixup(child.id());
                    push_unique(&mut parents, group);
                }
            }
        }

        for parent in parents {
            self.check_visibility_of(parent);
        }
    }

    fn defer_until_parent_set(&self, group: ElementId, child: &ElementRef) {
        let child_id = child.id();
        let mut fixups = self.fixups.lock();
        if fixups.contains_key(&child_id) {
            return;
        }

        let weak = self.this.clone();
        let parent_set = child.parent_link().parent_set();
        let id = parent_set.connect_once(move |&parent: &ElementId| {
            if let Some(shared) = weak.upgrade() {
                shared.fixups.lock().remove(&child_id);
                tracing::debug!(target: "lattice_shell::cascade", collection = %shared.config.name, child = %child_id, %parent, "parent assigned, re-checking");
                shared.check_visibility_of(parent);
            }
        });

        tracing::debug!(target: "lattice_shell::cascade", collection = %self.config.name, child = %child_id, %group, "parent unset, deferring check");
        fixups.insert(
            child_id,
            ParentFixup {
                group,
                _guard: parent_set.guard(id),
            },
        );
    }

    fn cancel_parent_fixup(&self, child: ElementId) {
        if self.fixups.lock().remove(&child).is_some() {
            tracing::debug!(target: "lattice_shell::cascade", collection = %self.config.name, %child, "child left before parent was assigned");
        }
    }

    fn on_visible_changed(&self, change: &ElementChange) {
        {
            let mut delivery = self.delivery.lock();
            if let Delivery::Batching(pending) = &mut *delivery {
                tracing::trace!(target: "lattice_shell::collection", collection = %self.config.name, queued = pending.len() + 1, "visible change queued");
                pending.push(change.clone());
                return;
            }
        }
        self.visible_changed.emit(change.clone());
        self.visible_changed_internal.emit(change.clone());
    }

    /// Switch to batching. Returns `false` if already batching.
    fn begin_batch(&self) -> bool {
        let mut delivery = self.delivery.lock();
        match *delivery {
            Delivery::Batching(_) => false,
            Delivery::Flowing => {
                *delivery = Delivery::Batching(Vec::with_capacity(self.config.pending_capacity));
                true
            }
        }
    }

    fn end_batch(&self) {
        let previous = std::mem::replace(&mut *self.delivery.lock(), Delivery::Flowing);
        let Delivery::Batching(pending) = previous else {
            tracing::trace!(target: "lattice_shell::collection", collection = %self.config.name, "resume while flowing");
            return;
        };

        let _span = tracing::trace_span!(
            target: "lattice_shell::collection",
            "lattice_shell::batch",
            collection = %self.config.name,
            pending = pending.len()
        )
        .entered();
        for change in pending {
            self.on_visible_changed(&change);
        }
    }
}

fn push_unique(ids: &mut Vec<ElementId>, id: ElementId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        tracing::trace!(target: "lattice_shell::collection", collection = %self.config.name, "collection dropped, detaching");
    }
}

static_assertions::assert_impl_all!(ElementCollection: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ChangeAction;
    use crate::element::ElementBase;

    struct Node {
        base: ElementBase,
        menu: bool,
        nested: Option<ElementCollection>,
    }

    impl ShellElement for Node {
        fn element_base(&self) -> &ElementBase {
            &self.base
        }

        fn group(&self) -> Option<ElementCollection> {
            self.nested.clone()
        }

        fn is_always_visible(&self) -> bool {
            self.menu
        }
    }

    fn leaf() -> ElementRef {
        Arc::new(Node {
            base: ElementBase::new(),
            menu: false,
            nested: None,
        })
    }

    fn menu() -> ElementRef {
        Arc::new(Node {
            base: ElementBase::new(),
            menu: true,
            nested: None,
        })
    }

    fn group(name: &str) -> (ElementRef, ElementCollection) {
        let nested = ElementCollection::with_name(name);
        let element: ElementRef = Arc::new(Node {
            base: ElementBase::new(),
            menu: false,
            nested: Some(nested.clone()),
        });
        (element, nested)
    }

    fn record(signal: &Signal<ElementChange>) -> Arc<Mutex<Vec<ElementChange>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        signal.connect(move |change| log_clone.lock().push(change.clone()));
        log
    }

    fn ids(items: &[ElementRef]) -> Vec<ElementId> {
        items.iter().map(|item| item.id()).collect()
    }

    #[test]
    fn test_plain_leaf_is_never_visible() {
        let items = ElementCollection::new();
        let visible_log = record(items.visible_changed());

        items.add(leaf());
        assert_eq!(items.len(), 1);
        assert_eq!(items.visible_len(), 0);
        assert!(visible_log.lock().is_empty());
    }

    #[test]
    fn test_visible_preserves_backing_order() {
        let items = ElementCollection::new();
        let a = menu();
        let b = leaf();
        let c = menu();
        let d = menu();

        items.add(a.clone());
        items.add(b.clone());
        items.add(d.clone());
        items.insert(2, c.clone());

        assert_eq!(ids(&items.items()), ids(&[a.clone(), b, c.clone(), d.clone()]));
        assert_eq!(ids(&items.visible_items()), ids(&[a, c, d]));
    }

    #[test]
    fn test_backing_notified_before_visible() {
        let items = ElementCollection::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_clone = order.clone();
        items
            .backing_changed()
            .connect(move |_| order_clone.lock().push("backing"));
        let order_clone = order.clone();
        items
            .visible_changed()
            .connect(move |_| order_clone.lock().push("visible"));
        let order_clone = order.clone();
        items
            .visible_changed_internal()
            .connect(move |_| order_clone.lock().push("internal"));

        items.add(menu());
        assert_eq!(*order.lock(), vec!["backing", "visible", "internal"]);
    }

    #[test]
    fn test_remove_missing_element_is_silent() {
        let items = ElementCollection::new();
        items.add(menu());
        let backing_log = record(items.backing_changed());
        let visible_log = record(items.visible_changed());

        let stranger = menu();
        assert!(!items.remove(stranger.as_ref()));
        assert_eq!(items.remove_at(5).map(|e| e.id()), None);
        assert!(backing_log.lock().is_empty());
        assert!(visible_log.lock().is_empty());
    }

    #[test]
    fn test_remove_hides_element() {
        let items = ElementCollection::new();
        let entry = menu();
        items.add(entry.clone());
        let visible_log = record(items.visible_changed());

        assert!(items.remove(entry.as_ref()));
        assert!(!items.contains(entry.as_ref()));
        assert_eq!(items.visible_len(), 0);

        let log = visible_log.lock();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action(), ChangeAction::Remove);
        assert_eq!(ids(log[0].old_items()), vec![entry.id()]);
    }

    #[test]
    fn test_duplicate_copies_keep_visible_order() {
        let items = ElementCollection::new();
        let x = menu();
        let a = menu();

        items.add(x.clone());
        items.add(a.clone());
        items.add(x.clone());
        assert_eq!(ids(&items.visible_items()), vec![x.id(), a.id()]);

        // Removing the first copy moves x behind a.
        items.remove_at(0);
        assert_eq!(ids(&items.visible_items()), vec![a.id(), x.id()]);
        assert!(items.is_visible(x.as_ref()));

        items.remove(x.as_ref());
        assert_eq!(ids(&items.visible_items()), vec![a.id()]);
    }

    #[test]
    fn test_duplicate_inserted_ahead_moves_visible_entry() {
        let items = ElementCollection::new();
        let a = menu();
        let x = menu();
        items.add(a.clone());
        items.add(x.clone());
        let visible_log = record(items.visible_changed());

        items.insert(0, x.clone());
        assert_eq!(ids(&items.items()), vec![x.id(), a.id(), x.id()]);
        assert_eq!(ids(&items.visible_items()), vec![x.id(), a.id()]);

        let log = visible_log.lock();
        let actions: Vec<_> = log.iter().map(|c| c.action()).collect();
        assert_eq!(actions, vec![ChangeAction::Remove, ChangeAction::Add]);
        assert_eq!(log[1].new_index(), Some(0));
    }

    #[test]
    fn test_duplicate_inserted_behind_changes_nothing_visible() {
        let items = ElementCollection::new();
        let x = menu();
        items.add(x.clone());
        items.add(menu());
        let visible_log = record(items.visible_changed());

        items.add(x.clone());
        assert!(visible_log.lock().is_empty());
    }

    #[test]
    fn test_replace_updates_visibility() {
        let items = ElementCollection::new();
        let hidden = leaf();
        let shown = menu();
        items.add(hidden.clone());

        let old = items.replace(0, shown.clone());
        assert_eq!(old.map(|e| e.id()), Some(hidden.id()));
        assert_eq!(ids(&items.visible_items()), vec![shown.id()]);
        assert!(items.replace(3, leaf()).is_none());
    }

    #[test]
    fn test_pause_twice_fails() {
        let items = ElementCollection::with_name("tabs");
        items.pause().unwrap();
        assert_eq!(
            items.pause(),
            Err(CollectionError::already_paused("tabs"))
        );
        assert!(items.is_paused());
        items.resume();
        assert!(!items.is_paused());
        // Resuming while flowing is harmless.
        items.resume();
    }

    #[test]
    fn test_pause_resume_replays_in_order() {
        let items = ElementCollection::new();
        let visible_log = record(items.visible_changed());
        let a = menu();
        let b = menu();

        items.pause().unwrap();
        items.add(a.clone());
        items.add(b.clone());
        items.remove(a.as_ref());
        assert!(visible_log.lock().is_empty());
        assert_eq!(items.pending_len(), 3);

        items.resume();
        let log = visible_log.lock();
        let actions: Vec<_> = log.iter().map(|c| c.action()).collect();
        assert_eq!(
            actions,
            vec![ChangeAction::Add, ChangeAction::Add, ChangeAction::Remove]
        );
        assert_eq!(ids(log[0].new_items()), vec![a.id()]);
        assert_eq!(ids(log[1].new_items()), vec![b.id()]);
        assert_eq!(ids(log[2].old_items()), vec![a.id()]);
        assert_eq!(items.pending_len(), 0);
    }

    #[test]
    fn test_backing_not_deferred_while_paused() {
        let items = ElementCollection::new();
        let backing_log = record(items.backing_changed());

        let _guard = items.pause_scoped().unwrap();
        items.add(menu());
        assert_eq!(backing_log.lock().len(), 1);
    }

    #[test]
    fn test_pause_scoped_resumes_on_drop() {
        let items = ElementCollection::new();
        let visible_log = record(items.visible_changed());
        {
            let _guard = items.pause_scoped().unwrap();
            items.add(menu());
            assert!(visible_log.lock().is_empty());
        }
        assert_eq!(visible_log.lock().len(), 1);
        assert!(!items.is_paused());
    }

    #[test]
    fn test_clear_is_atomic() {
        let items = ElementCollection::new();
        let all: Vec<ElementRef> = (0..5).map(|_| menu()).collect();
        for element in &all {
            items.add(element.clone());
        }
        let backing_log = record(items.backing_changed());
        let visible_log = record(items.visible_changed());

        items.clear();

        assert!(items.is_empty());
        assert_eq!(items.visible_len(), 0);
        let backing = backing_log.lock();
        let visible = visible_log.lock();
        assert_eq!(backing.len(), 1);
        assert_eq!(visible.len(), 1);
        assert_eq!(backing[0].action(), ChangeAction::Reset);
        assert_eq!(visible[0].action(), ChangeAction::Reset);
        assert_eq!(ids(backing[0].old_items()), ids(&all));
        assert_eq!(ids(visible[0].old_items()), ids(&all));
        assert!(!items.is_paused());
    }

    #[test]
    fn test_clear_joins_open_batch() {
        let items = ElementCollection::new();
        items.add(menu());
        let visible_log = record(items.visible_changed());

        items.pause().unwrap();
        items.clear();
        assert!(items.is_paused());
        assert!(visible_log.lock().is_empty());

        items.resume();
        assert_eq!(visible_log.lock().len(), 1);
    }

    #[test]
    fn test_set_backing_once() {
        let items = ElementCollection::with_name("sections");
        let seeded = ObservableList::from_vec(vec![menu(), leaf()]);
        items.set_backing(seeded).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.visible_len(), 1);

        let err = items.set_backing(ObservableList::new()).unwrap_err();
        assert_eq!(err, CollectionError::backing_already_set("sections"));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_set_backing_after_first_use_fails() {
        let items = ElementCollection::new();
        assert!(items.is_empty());
        assert!(items.set_backing(ObservableList::new()).is_err());
    }

    #[test]
    fn test_group_visibility_follows_children() {
        let root = ElementCollection::with_name("root");
        let (section, contents) = group("contents");
        root.add(section.clone());
        assert_eq!(root.visible_len(), 0);

        let entry = menu();
        entry.parent_link().set(section.id());
        contents.add(entry.clone());
        assert_eq!(ids(&root.visible_items()), vec![section.id()]);

        contents.remove(entry.as_ref());
        assert_eq!(root.visible_len(), 0);
    }

    #[test]
    fn test_removing_group_stops_watching() {
        let root = ElementCollection::new();
        let (section, contents) = group("contents");
        let baseline = contents.visible_changed_internal().connection_count();

        root.add(section.clone());
        assert_eq!(
            contents.visible_changed_internal().connection_count(),
            baseline + 1
        );

        root.remove(section.as_ref());
        assert_eq!(
            contents.visible_changed_internal().connection_count(),
            baseline
        );
    }

    #[test]
    fn test_dropping_collection_detaches_from_groups() {
        let (section, contents) = group("contents");
        {
            let root = ElementCollection::new();
            root.add(section.clone());
            assert_eq!(contents.visible_changed_internal().connection_count(), 1);
        }
        assert_eq!(contents.visible_changed_internal().connection_count(), 0);
    }

    #[test]
    fn test_clear_unwatches_groups() {
        let root = ElementCollection::new();
        let (section, contents) = group("contents");
        root.add(section);
        root.clear();
        assert_eq!(contents.visible_changed_internal().connection_count(), 0);
    }
}

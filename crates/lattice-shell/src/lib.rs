//! Lattice Shell - navigation collections for application shells.
//!
//! Shell navigation (tabs, flyout sections, menu entries) is a tree of
//! elements held in [`ElementCollection`]s. Each collection keeps the full
//! backing sequence and a derived visible subset: an element is shown when
//! it is always visible (a menu entry) or when it is a group with at least
//! one visible child. Changes deep in the tree cascade up to the root.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lattice_shell::{ElementBase, ElementCollection, ShellElement};
//!
//! struct MenuEntry(ElementBase);
//!
//! impl ShellElement for MenuEntry {
//!     fn element_base(&self) -> &ElementBase { &self.0 }
//!     fn is_always_visible(&self) -> bool { true }
//! }
//!
//! struct Section {
//!     base: ElementBase,
//!     contents: ElementCollection,
//! }
//!
//! impl ShellElement for Section {
//!     fn element_base(&self) -> &ElementBase { &self.base }
//!     fn group(&self) -> Option<ElementCollection> { Some(self.contents.clone()) }
//! }
//!
//! let root = ElementCollection::with_name("root");
//! let section = Arc::new(Section {
//!     base: ElementBase::new(),
//!     contents: ElementCollection::with_name("section"),
//! });
//! root.add(section.clone());
//! assert_eq!(root.visible_len(), 0);
//!
//! let entry = Arc::new(MenuEntry(ElementBase::new()));
//! entry.parent_link().set(section.id());
//! section.contents.add(entry);
//! assert_eq!(root.visible_len(), 1);
//! ```

pub mod collection;
pub mod element;
pub mod error;

pub use collection::{
    ChangeAction, CollectionBuilder, CollectionChange, CollectionConfig, ElementChange,
    ElementCollection, ObservableList, PauseGuard, TypedElementCollection,
};
pub use element::{
    AnyElement, Capabilities, ElementBase, ElementId, ElementRef, ParentLink,
    ShellElement,
};
pub use error::{CollectionError, CollectionResult};

pub use lattice_shell_core::{ConnectionGuard, ConnectionId, Signal};

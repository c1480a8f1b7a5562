//! Navigation element collections.
//!
//! - [`ObservableList`]: ordered sequence that announces every change
//! - [`ElementCollection`]: backing sequence plus its visible subset, with
//!   cascading group visibility and pausable visible notifications
//! - [`TypedElementCollection`]: typed projection over an element collection
//! - [`CollectionBuilder`]: configuration and an optional external backing store

mod change;
mod config;
mod filtered;
mod observable;
mod typed;

pub use change::{ChangeAction, CollectionChange};
pub use config::{CollectionBuilder, CollectionConfig, DEFAULT_PENDING_CAPACITY};
pub use filtered::{ElementChange, ElementCollection, PauseGuard};
pub use observable::ObservableList;
pub use typed::TypedElementCollection;

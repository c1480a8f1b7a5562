//! Shared fixtures for the navigation collection integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use lattice_shell::{
    Capabilities, ElementBase, ElementChange, ElementCollection, ElementId, ElementRef,
    ShellElement, Signal,
};
use lattice_shell_core::logging::directive_for_all;
use parking_lot::Mutex;

/// Install a test-friendly subscriber once per test binary.
///
/// Set `RUST_LOG` to override the default of every Lattice Shell target at
/// `debug`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive_for_all("debug")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A standalone actionable entry; always visible.
pub struct MenuEntry {
    pub base: ElementBase,
    pub label: &'static str,
}

impl ShellElement for MenuEntry {
    fn element_base(&self) -> &ElementBase {
        &self.base
    }

    fn is_always_visible(&self) -> bool {
        true
    }
}

/// A plain element with no children; never visible.
pub struct Placeholder {
    pub base: ElementBase,
}

impl ShellElement for Placeholder {
    fn element_base(&self) -> &ElementBase {
        &self.base
    }
}

/// A grouping element; visible while its contents have a visible child.
pub struct Section {
    pub base: ElementBase,
    pub contents: ElementCollection,
}

impl ShellElement for Section {
    fn element_base(&self) -> &ElementBase {
        &self.base
    }

    fn group(&self) -> Option<ElementCollection> {
        Some(self.contents.clone())
    }
}

pub fn entry(label: &'static str) -> Arc<MenuEntry> {
    Arc::new(MenuEntry {
        base: ElementBase::new(),
        label,
    })
}

pub fn placeholder() -> Arc<Placeholder> {
    Arc::new(Placeholder {
        base: ElementBase::new(),
    })
}

pub fn section(name: &str) -> Arc<Section> {
    Arc::new(Section {
        base: ElementBase::new(),
        contents: ElementCollection::with_name(name),
    })
}

/// Add `child` to `parent`'s contents, wiring the parent link first.
pub fn adopt(parent: &Section, child: ElementRef) {
    child.parent_link().set(parent.id());
    parent.contents.add(child);
}

/// Record every payload emitted by `signal`.
pub fn record(signal: &Signal<ElementChange>) -> Arc<Mutex<Vec<ElementChange>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();
    signal.connect(move |change| log_clone.lock().push(change.clone()));
    log
}

pub fn ids(items: &[ElementRef]) -> Vec<ElementId> {
    items.iter().map(|item| item.id()).collect()
}

/// Assert the visible subset is exactly the visible elements of the backing
/// sequence, in backing order, one entry per distinct element.
pub fn assert_consistent(items: &ElementCollection) {
    let mut seen = HashSet::new();
    let expected: Vec<ElementId> = items
        .iter()
        .filter(|item| seen.insert(item.id()))
        .filter(|item| Capabilities::of(item.as_ref()).is_visible())
        .map(|item| item.id())
        .collect();
    assert_eq!(
        ids(&items.visible_items()),
        expected,
        "visible subset of '{}' is out of sync",
        items.name()
    );
}

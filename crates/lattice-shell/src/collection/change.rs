//! Change notification payloads.

/// What kind of structural change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// Items were inserted at `new_index`.
    Add,
    /// Items were removed from `old_index`.
    Remove,
    /// One item at `new_index` was replaced by another.
    Replace,
    /// The sequence was cleared; `old_items` holds everything it contained.
    Reset,
}

/// Describes one change to an observable sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionChange<T> {
    action: ChangeAction,
    new_items: Vec<T>,
    old_items: Vec<T>,
    new_index: Option<usize>,
    old_index: Option<usize>,
}

impl<T> CollectionChange<T> {
    /// Items inserted starting at `index`.
    pub fn added(index: usize, items: Vec<T>) -> Self {
        Self {
            action: ChangeAction::Add,
            new_items: items,
            old_items: Vec::new(),
            new_index: Some(index),
            old_index: None,
        }
    }

    /// Items removed starting at `index`.
    pub fn removed(index: usize, items: Vec<T>) -> Self {
        Self {
            action: ChangeAction::Remove,
            new_items: Vec::new(),
            old_items: items,
            new_index: None,
            old_index: Some(index),
        }
    }

    /// The item at `index` was replaced.
    pub fn replaced(index: usize, new_item: T, old_item: T) -> Self {
        Self {
            action: ChangeAction::Replace,
            new_items: vec![new_item],
            old_items: vec![old_item],
            new_index: Some(index),
            old_index: Some(index),
        }
    }

    /// The sequence was cleared of `old_items`.
    pub fn reset(old_items: Vec<T>) -> Self {
        Self {
            action: ChangeAction::Reset,
            new_items: Vec::new(),
            old_items,
            new_index: None,
            old_index: None,
        }
    }

    /// The kind of change.
    pub fn action(&self) -> ChangeAction {
        self.action
    }

    /// Items that entered the sequence.
    pub fn new_items(&self) -> &[T] {
        &self.new_items
    }

    /// Items that left the sequence.
    pub fn old_items(&self) -> &[T] {
        &self.old_items
    }

    /// Where the new items start, for `Add` and `Replace`.
    pub fn new_index(&self) -> Option<usize> {
        self.new_index
    }

    /// Where the old items started, for `Remove` and `Replace`.
    pub fn old_index(&self) -> Option<usize> {
        self.old_index
    }

    /// Every affected item: new items first, then old ones.
    pub fn affected(&self) -> impl Iterator<Item = &T> {
        self.new_items.iter().chain(self.old_items.iter())
    }
}

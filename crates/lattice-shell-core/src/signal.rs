//! Signal/slot system for Lattice Shell.
//!
//! This module provides a type-safe, Qt-inspired signal/slot mechanism used by
//! the navigation collections to publish change notifications. Signals are
//! emitted when state changes, and connected slots (callbacks) are invoked in
//! response.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The main signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII subscription handle that disconnects when dropped
//!
//! # Execution Model
//!
//! Slots always run synchronously on the emitting thread, in the order they
//! were connected. Emission is reentrant: the connection table is snapshotted
//! before any slot runs, so a slot may connect, disconnect, or emit further
//! signals (including this one) without deadlocking. A slot that was
//! disconnected by an earlier slot of the same emission is skipped.
//!
//! # Example
//!
//! ```
//! use lattice_shell_core::Signal;
//!
//! // Create a signal that passes a string argument
//! let title_changed = Signal::<String>::new();
//!
//! // Connect a slot (closure)
//! let conn_id = title_changed.connect(|title| {
//!     println!("Title changed to: {}", title);
//! });
//!
//! // Emit the signal
//! title_changed.emit("Home".to_string());
//!
//! // Disconnect when done
//! title_changed.disconnect(conn_id);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`]
    /// or to wrap it into a [`ConnectionGuard`] via [`Signal::guard`]. The ID
    /// remains valid until the connection is explicitly disconnected, a
    /// one-shot connection fires, or the signal is dropped.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Slot<Args>,
    /// Removed from the table right before its first invocation.
    once: bool,
    /// Connection order, used to invoke slots deterministically.
    seq: u64,
}

struct ConnectionTable<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    next_seq: Mutex<u64>,
}

impl<Args> ConnectionTable<Args> {
    fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            next_seq: Mutex::new(0),
        }
    }

    fn insert(&self, slot: Slot<Args>, once: bool) -> ConnectionId {
        let seq = {
            let mut next = self.next_seq.lock();
            *next += 1;
            *next
        };
        self.connections.lock().insert(Connection { slot, once, seq })
    }

    /// Snapshot the slots to invoke for one emission, in connection order.
    fn snapshot(&self) -> Vec<(ConnectionId, Slot<Args>, bool)> {
        let mut pending: Vec<(u64, ConnectionId, Slot<Args>, bool)> = self
            .connections
            .lock()
            .iter()
            .map(|(id, conn)| (conn.seq, id, conn.slot.clone(), conn.once))
            .collect();
        pending.sort_by_key(|(seq, ..)| *seq);

        pending
            .into_iter()
            .map(|(_, id, slot, once)| (id, slot, once))
            .collect()
    }

    /// Remove a one-shot connection that is about to fire.
    ///
    /// Returns `false` if it was disconnected, or already fired.
    fn take_once(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    fn contains(&self, id: ConnectionId) -> bool {
        self.connections.lock().contains_key(id)
    }
}

/// Type-erased access to a connection table, used by [`ConnectionGuard`].
trait Disconnect: Send + Sync {
    fn disconnect(&self, id: ConnectionId) -> bool;
    fn is_connected(&self, id: ConnectionId) -> bool;
}

impl<Args: 'static> Disconnect for ConnectionTable<Args> {
    fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    fn is_connected(&self, id: ConnectionId) -> bool {
        self.contains(id)
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// Signals are the core of the observer pattern in Lattice Shell. When a
/// signal is emitted, all connected slots are invoked with the provided
/// arguments.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
///
/// # Related Types
///
/// - [`ConnectionId`] - Returned by [`connect`](Self::connect), used to disconnect
/// - [`ConnectionGuard`] - RAII-style connection that auto-disconnects on drop
pub struct Signal<Args> {
    /// All active connections. Shared so that guards can hold a weak handle.
    table: Arc<ConnectionTable<Args>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            table: Arc::new(ConnectionTable::new()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use lattice_shell_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.table.insert(Arc::new(slot), false)
    }

    /// Connect a slot that is invoked at most once.
    ///
    /// The connection is removed before the slot runs, so a reentrant emission
    /// from inside the slot cannot invoke it a second time.
    ///
    /// # Example
    ///
    /// ```
    /// use lattice_shell_core::Signal;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let signal = Signal::<()>::new();
    /// let hits = Arc::new(AtomicUsize::new(0));
    /// let hits_clone = hits.clone();
    /// signal.connect_once(move |_| {
    ///     hits_clone.fetch_add(1, Ordering::SeqCst);
    /// });
    /// signal.emit(());
    /// signal.emit(());
    /// assert_eq!(hits.load(Ordering::SeqCst), 1);
    /// ```
    pub fn connect_once<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.table.insert(Arc::new(slot), true)
    }

    /// Connect a slot with automatic disconnection when the guard is dropped.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        self.guard(id)
    }

    /// Wrap an existing connection into a [`ConnectionGuard`].
    ///
    /// The guard disconnects `id` from this signal when dropped. Wrapping an
    /// ID that is no longer connected is allowed; dropping the guard is then a
    /// no-op.
    pub fn guard(&self, id: ConnectionId) -> ConnectionGuard {
        let table: Arc<dyn Disconnect> = self.table.clone();
        ConnectionGuard {
            table: Arc::downgrade(&table),
            id,
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.table.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.table.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.table.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing. Collections use this for
    /// silent bulk mutations that publish one synthetic notification instead.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots.
    ///
    /// If the signal is blocked, this does nothing. Otherwise every slot that
    /// is still connected when its turn comes is invoked directly, in
    /// connection order. No lock is held while slots run.
    #[tracing::instrument(skip_all, target = "lattice_shell_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "lattice_shell_core::signal", "signal blocked, skipping emit");
            return;
        }

        let slots = self.table.snapshot();
        tracing::trace!(target: "lattice_shell_core::signal", connection_count = slots.len(), "emitting signal");

        for (id, slot, once) in slots {
            // A previous slot may have disconnected this one.
            let connected = if once {
                self.table.take_once(id)
            } else {
                self.table.contains(id)
            };
            if connected {
                slot(&args);
            }
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.table.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

/// A connection guard that automatically disconnects when dropped.
///
/// Guards are the explicit subscription handles of Lattice Shell: whoever owns
/// the guard owns the subscription, so tearing down the owner tears down the
/// listener. The guard only holds a weak reference to the signal, so it never
/// keeps the signal alive and dropping it after the signal is gone is a no-op.
///
/// # Example
///
/// ```
/// use lattice_shell_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);  // counter = 42
/// }
/// signal.emit(43);  // Nothing happens - connection was dropped
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
#[must_use = "dropping a ConnectionGuard disconnects the slot immediately"]
pub struct ConnectionGuard {
    table: Weak<dyn Disconnect>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Whether the signal is still alive and the connection still present.
    pub fn is_connected(&self) -> bool {
        self.table
            .upgrade()
            .is_some_and(|table| table.is_connected(self.id))
    }

    /// Disconnect now, returning whether a live connection was removed.
    pub fn disconnect(self) -> bool {
        // Drop runs afterwards and finds nothing left to remove.
        self.table
            .upgrade()
            .is_some_and(|table| table.disconnect(self.id))
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            let _ = table.disconnect(self.id);
        }
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
static_assertions::assert_impl_all!(ConnectionGuard: Send, Sync);

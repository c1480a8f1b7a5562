//! Core systems for Lattice Shell.
//!
//! This crate provides the plumbing the navigation collections are built on:
//!
//! - **Signal/Slot System**: Type-safe, reentrant change notification
//! - **Subscription Handles**: RAII [`ConnectionGuard`]s that make teardown explicit
//! - **Logging**: `tracing` targets and span names for every subsystem
//!
//! # Signal/Slot Example
//!
//! ```
//! use lattice_shell_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;

pub use signal::{ConnectionGuard, ConnectionId, Signal};

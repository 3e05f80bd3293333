//! Watched-entry bookkeeping
//!
//! Maps engine-owned, monotonically increasing [`WatchKey`]s to the element
//! being watched and the completion function to run once it becomes visible.
//! Keys are never reused for the lifetime of a registry, and iteration
//! follows key order, which is registration order.

mod callback_registry;


pub use callback_registry::*;

//! Pre-load interception point
//!
//! Start listeners run before a watched image is finalised. Each listener
//! receives the [`LoadEvent`] by value together with a [`Proceed`]
//! continuation; calling [`Proceed::proceed`] hands the (possibly rewritten)
//! event to the next listener. The continuation may be moved into a task and
//! called later, after the listener's own asynchronous work.
//!
//! Listeners run most-recently-added first. There is no removal API: once
//! attached, a listener stays for the lifetime of the engine.

mod chain;


pub use chain::*;

//! Rectangle geometry used to decide whether a watched element is about to
//! become visible.
//!
//! All coordinates are in document space. The observation region is derived
//! fresh on every evaluation from the host viewport (or container) bounds,
//! expanded by the configured [`Margin`].

mod intersect;


pub use intersect::*;

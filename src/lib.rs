//! Deferred loading of off-screen content.
//!
//! A [`Lazyload`] engine watches elements of a host document that carry a
//! marker attribute and, once an element comes within a configurable
//! distance of the viewport (or of a container), runs its completion: by
//! default the marker value is passed through the interceptor chain and
//! written back as the element's image source.
//!
//! The engine does not talk to a real document. Hosts plug in through the
//! [`Document`], [`GeometryProvider`] and [`SignalSource`] traits, bundled by
//! a [`TypeConfig`]:
//!
//! ```ignore
//! let engine = LazyloadBuilder::<HostTypeConfig>::new(document, geometry, signals)
//!     .config(LazyloadConfig::new()?)
//!     .build();
//! engine.add_elements(".feed-item");
//! ```
//!
//! Signal-driven evaluation passes are rate limited (see [`RateLimiter`]) and
//! use Tokio timers when a runtime is available.

pub mod config;
mod engine;
mod errors;
mod geometry;
mod host;
mod interceptor;
mod limiter;
pub mod metrics;
mod registry;
mod type_config;

pub use config::*;
pub use engine::*;
pub use errors::*;
pub use geometry::*;
pub use host::*;
pub use interceptor::*;
pub use limiter::*;
pub use registry::*;
pub use type_config::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

//! The lazyload engine
//!
//! [`Lazyload`] watches elements carrying the marker attribute and runs
//! their completion once they come within the margin-expanded observation
//! region. Evaluation passes run at construction, at registration, on
//! [`Lazyload::refresh`], and on rate-limited host signals while the engine
//! is [`EngineState::Active`].

mod builder;
mod lazyload;
mod state;
mod target;

pub use builder::*;
pub use lazyload::*;
pub use state::*;
pub use target::*;

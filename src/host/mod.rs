//! Host collaborators
//!
//! The engine never touches a real document. Element lookup, geometry and
//! event wiring are provided by the embedding host through the traits in
//! this module; faults are forwarded to an injected [`FaultReporter`].

mod document;
mod fault_reporter;
mod geometry_provider;
mod signal_source;

pub use document::*;
pub use fault_reporter::*;
pub use geometry_provider::*;
pub use signal_source::*;

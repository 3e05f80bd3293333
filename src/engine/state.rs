use std::fmt;

/// Lifecycle of an engine.
///
/// `Active` and `Paused` alternate through `pause`/`resume`; `Destroyed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Subscribed to host signals
    Active,
    /// Unsubscribed; entries kept
    Paused,
    /// Unsubscribed, registry cleared
    Destroyed,
}

impl EngineState {
    pub fn is_destroyed(&self) -> bool {
        matches!(self, EngineState::Destroyed)
    }
}

impl fmt::Display for EngineState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            EngineState::Active => "active",
            EngineState::Paused => "paused",
            EngineState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

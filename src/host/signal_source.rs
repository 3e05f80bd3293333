use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

/// Host events that may change what is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Scroll of the observation root
    Scroll,
    /// Window resize
    Resize,
    /// Resize of the observation container
    ContainerResize,
    /// Touch or pointer movement
    PointerMove,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Scroll => "scroll",
            Signal::Resize => "resize",
            Signal::ContainerResize => "container-resize",
            Signal::PointerMove => "touchmove",
        }
    }
}

pub type SignalHandler = Arc<dyn Fn() + Send + Sync>;

/// Event subscription surface of the host.
///
/// Handlers are identified by `Arc` pointer identity: `unsubscribe` must
/// remove exactly the handler previously passed to `subscribe`.
#[cfg_attr(test, automock)]
pub trait SignalSource: Send + Sync + 'static {
    fn subscribe(
        &self,
        signal: Signal,
        handler: SignalHandler,
    );

    fn unsubscribe(
        &self,
        signal: Signal,
        handler: &SignalHandler,
    );
}

/// Compare handlers by identity.
pub fn same_handler(
    a: &SignalHandler,
    b: &SignalHandler,
) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

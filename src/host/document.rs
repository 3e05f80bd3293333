/// How a resolved resource is applied to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Receives the resource through its `src` attribute
    Image,
    /// Receives the resource as a background image
    Other,
}

/// Document access needed by the engine.
///
/// `E` is a cheap handle into the host document; the engine stores clones of
/// it but never owns the underlying element.
pub trait Document<E>: Send + Sync + 'static {
    /// Capability check: whether `element` is a renderable element.
    fn is_element(
        &self,
        element: &E,
    ) -> bool;

    /// Element standing for the whole document.
    fn root(&self) -> E;

    /// All elements matching `selector`, in document order.
    fn query_selector_all(
        &self,
        selector: &str,
    ) -> Vec<E>;

    /// Every descendant of `element`, in document order, excluding itself.
    fn descendants(
        &self,
        element: &E,
    ) -> Vec<E>;

    fn attribute(
        &self,
        element: &E,
        name: &str,
    ) -> Option<String>;

    fn set_attribute(
        &self,
        element: &E,
        name: &str,
        value: &str,
    );

    fn remove_attribute(
        &self,
        element: &E,
        name: &str,
    );

    fn kind(
        &self,
        element: &E,
    ) -> ElementKind;

    fn set_background_image(
        &self,
        element: &E,
        url: &str,
    );
}

use crate::ElementRect;

/// Reports bounds in document coordinates. Values are read fresh on every
/// call; the engine never caches them across evaluations.
pub trait GeometryProvider<E>: Send + Sync + 'static {
    /// Bounds of the observation root: the scrolled viewport when
    /// `container` is `None`, otherwise the container's box.
    fn observation_region_bounds(
        &self,
        container: Option<&E>,
    ) -> ElementRect;

    /// Rendered `(width, height)` of `element`. Checked before the position
    /// is resolved, so hosts should answer without walking the layout tree.
    fn element_size(
        &self,
        element: &E,
    ) -> (f64, f64);

    fn element_bounding_rect(
        &self,
        element: &E,
    ) -> ElementRect;
}

/// What `add_elements` / `remove_elements` operate on.
#[derive(Debug, Clone, PartialEq)]
pub enum Target<E> {
    /// Every element matching the selector, in document order
    Selector(String),
    Element(E),
    Elements(Vec<E>),
}

impl<E> From<&str> for Target<E> {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl<E> From<String> for Target<E> {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl<E> From<Vec<E>> for Target<E> {
    fn from(elements: Vec<E>) -> Self {
        Target::Elements(elements)
    }
}

impl<E: Clone> From<&[E]> for Target<E> {
    fn from(elements: &[E]) -> Self {
        Target::Elements(elements.to_vec())
    }
}

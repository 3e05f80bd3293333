//! In-memory host document for engine tests.
//!
//! Node `0` is the document itself and is not an element. Every other node
//! is created with [`FakeHost::append`] and gets a zero rectangle until one
//! is assigned. Selector queries understand `#id`, `.class`, `[attr]` and
//! bare tag names.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::same_handler;
use crate::Document;
use crate::ElementKind;
use crate::ElementRect;
use crate::GeometryProvider;
use crate::Signal;
use crate::SignalHandler;
use crate::SignalSource;

pub type NodeId = usize;

pub const DOCUMENT: NodeId = 0;

#[derive(Debug, Clone)]
struct FakeNode {
    tag: String,
    element: bool,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    children: Vec<NodeId>,
    rect: ElementRect,
    background_image: Option<String>,
}

impl FakeNode {
    fn new(
        tag: &str,
        element: bool,
    ) -> Self {
        Self {
            tag: tag.to_string(),
            element,
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            rect: ElementRect::default(),
            background_image: None,
        }
    }

    fn matches(
        &self,
        selector: &str,
    ) -> bool {
        if !self.element {
            return false;
        }
        if let Some(id) = selector.strip_prefix('#') {
            return self.id.as_deref() == Some(id);
        }
        if let Some(class) = selector.strip_prefix('.') {
            return self.classes.iter().any(|c| c == class);
        }
        if let Some(attr) = selector.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return self.attributes.contains_key(attr);
        }
        self.tag == selector
    }
}

pub struct FakeHost {
    nodes: Mutex<Vec<FakeNode>>,
    viewport: Mutex<ElementRect>,
    handlers: Mutex<Vec<(Signal, SignalHandler)>>,
    rect_queries: AtomicUsize,
}

impl std::fmt::Debug for FakeHost {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("FakeHost")
            .field("nodes", &self.nodes.lock().len())
            .field("viewport", &*self.viewport.lock())
            .finish_non_exhaustive()
    }
}

impl FakeHost {
    /// Host with an empty document and a viewport at the origin.
    pub fn new(
        viewport_width: f64,
        viewport_height: f64,
    ) -> Arc<Self> {
        Arc::new(Self {
            nodes: Mutex::new(vec![FakeNode::new("#document", false)]),
            viewport: Mutex::new(ElementRect::new(0.0, 0.0, viewport_width, viewport_height)),
            handlers: Mutex::new(Vec::new()),
            rect_queries: AtomicUsize::new(0),
        })
    }

    /// Append an element under `parent`. `img` elements are images.
    pub fn append(
        &self,
        parent: NodeId,
        tag: &str,
    ) -> NodeId {
        self.insert(parent, FakeNode::new(tag, true))
    }

    /// Append a non-element node, such as text.
    pub fn append_text(
        &self,
        parent: NodeId,
    ) -> NodeId {
        self.insert(parent, FakeNode::new("#text", false))
    }

    /// Append an `img` under `parent` marked with `attribute = src`, laid out
    /// at `rect`.
    pub fn append_marked_image(
        &self,
        parent: NodeId,
        attribute: &str,
        src: &str,
        rect: ElementRect,
    ) -> NodeId {
        let node = self.append(parent, "img");
        self.set_attribute(&node, attribute, src);
        self.set_rect(node, rect);
        node
    }

    fn insert(
        &self,
        parent: NodeId,
        node: FakeNode,
    ) -> NodeId {
        let mut nodes = self.nodes.lock();
        let id = nodes.len();
        nodes.push(node);
        nodes[parent].children.push(id);
        id
    }

    pub fn set_rect(
        &self,
        node: NodeId,
        rect: ElementRect,
    ) {
        self.nodes.lock()[node].rect = rect;
    }

    pub fn set_id(
        &self,
        node: NodeId,
        id: &str,
    ) {
        self.nodes.lock()[node].id = Some(id.to_string());
    }

    pub fn add_class(
        &self,
        node: NodeId,
        class: &str,
    ) {
        self.nodes.lock()[node].classes.push(class.to_string());
    }

    pub fn background_image(
        &self,
        node: NodeId,
    ) -> Option<String> {
        self.nodes.lock()[node].background_image.clone()
    }

    /// Scroll the viewport to `top`.
    pub fn scroll_to(
        &self,
        top: f64,
    ) {
        self.viewport.lock().top = top;
    }

    /// Deliver `signal` to every handler subscribed to it.
    pub fn fire(
        &self,
        signal: Signal,
    ) {
        let handlers: Vec<SignalHandler> = self
            .handlers
            .lock()
            .iter()
            .filter(|(s, _)| *s == signal)
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn subscribers(
        &self,
        signal: Signal,
    ) -> usize {
        self.handlers.lock().iter().filter(|(s, _)| *s == signal).count()
    }

    fn collect_descendants(
        nodes: &[FakeNode],
        node: NodeId,
        out: &mut Vec<NodeId>,
    ) {
        for child in &nodes[node].children {
            out.push(*child);
            Self::collect_descendants(nodes, *child, out);
        }
    }
}

impl Document<NodeId> for FakeHost {
    fn is_element(
        &self,
        element: &NodeId,
    ) -> bool {
        self.nodes.lock().get(*element).is_some_and(|n| n.element)
    }

    fn root(&self) -> NodeId {
        DOCUMENT
    }

    fn query_selector_all(
        &self,
        selector: &str,
    ) -> Vec<NodeId> {
        let nodes = self.nodes.lock();
        let mut order = Vec::new();
        Self::collect_descendants(&nodes, DOCUMENT, &mut order);
        order.into_iter().filter(|id| nodes[*id].matches(selector)).collect()
    }

    fn descendants(
        &self,
        element: &NodeId,
    ) -> Vec<NodeId> {
        let nodes = self.nodes.lock();
        let mut out = Vec::new();
        if *element < nodes.len() {
            Self::collect_descendants(&nodes, *element, &mut out);
        }
        out
    }

    fn attribute(
        &self,
        element: &NodeId,
        name: &str,
    ) -> Option<String> {
        self.nodes.lock().get(*element).and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(
        &self,
        element: &NodeId,
        name: &str,
        value: &str,
    ) {
        if let Some(node) = self.nodes.lock().get_mut(*element) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(
        &self,
        element: &NodeId,
        name: &str,
    ) {
        if let Some(node) = self.nodes.lock().get_mut(*element) {
            node.attributes.remove(name);
        }
    }

    fn kind(
        &self,
        element: &NodeId,
    ) -> ElementKind {
        match self.nodes.lock().get(*element) {
            Some(node) if node.tag == "img" => ElementKind::Image,
            _ => ElementKind::Other,
        }
    }

    fn set_background_image(
        &self,
        element: &NodeId,
        url: &str,
    ) {
        if let Some(node) = self.nodes.lock().get_mut(*element) {
            node.background_image = Some(url.to_string());
        }
    }
}

impl FakeHost {
    /// Number of `element_bounding_rect` calls so far.
    pub fn rect_queries(&self) -> usize {
        self.rect_queries.load(Ordering::SeqCst)
    }
}

impl GeometryProvider<NodeId> for FakeHost {
    fn observation_region_bounds(
        &self,
        container: Option<&NodeId>,
    ) -> ElementRect {
        match container {
            Some(node) => self.nodes.lock()[*node].rect,
            None => *self.viewport.lock(),
        }
    }

    fn element_size(
        &self,
        element: &NodeId,
    ) -> (f64, f64) {
        let rect = self.nodes.lock()[*element].rect;
        (rect.width, rect.height)
    }

    fn element_bounding_rect(
        &self,
        element: &NodeId,
    ) -> ElementRect {
        self.rect_queries.fetch_add(1, Ordering::SeqCst);
        self.nodes.lock()[*element].rect
    }
}

impl SignalSource for FakeHost {
    fn subscribe(
        &self,
        signal: Signal,
        handler: SignalHandler,
    ) {
        self.handlers.lock().push((signal, handler));
    }

    fn unsubscribe(
        &self,
        signal: Signal,
        handler: &SignalHandler,
    ) {
        self.handlers
            .lock()
            .retain(|(s, h)| !(*s == signal && same_handler(h, handler)));
    }
}

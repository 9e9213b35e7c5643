//! DOM implementation of the byte-grid view.
//!
//! Expects the renderer to emit one element per byte inside a container:
//!
//! ```html
//! <div id="packet">
//!   <span data-offset="0" class="even selectionStart">00</span>
//!   <span data-offset="1" class="odd">01</span>
//!   <span data-offset="2" class="even invalid">??</span>
//!   <span data-offset="3" class="odd selectionEnd">03</span>
//! </div>
//! ```
//!
//! Nodes are looked up by query on every call. Click handlers are
//! `gloo_events::EventListener`s held per `(RegionId, NodeKey)`; dropping one
//! removes it from the element.

use std::collections::HashMap;
use std::rc::Rc;

use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use bytelabel_core::{
    ByteNode, NodeKey, NodePaint, Parity, PlatformError, RegionId, SelectionMarkers, ViewBinding,
};

const OFFSET_ATTR: &str = "data-offset";
const INVALID_CLASS: &str = "invalid";
const ODD_CLASS: &str = "odd";
const EVEN_CLASS: &str = "even";
const SELECTION_START: &str = ".selectionStart";
const SELECTION_END: &str = ".selectionEnd";

/// A rendered byte element.
#[derive(Clone, Debug)]
pub struct DomByteNode {
    element: HtmlElement,
    offset: usize,
    invalid: bool,
    parity: Parity,
}

impl DomByteNode {
    /// Wrap an element carrying a numeric `data-offset`.
    pub fn from_element(element: HtmlElement) -> Option<Self> {
        let offset = element.get_attribute(OFFSET_ATTR)?.trim().parse().ok()?;
        let classes = element.class_list();
        let parity = if classes.contains(ODD_CLASS) {
            Parity::Odd
        } else if classes.contains(EVEN_CLASS) {
            Parity::Even
        } else {
            Parity::of(offset)
        };
        Some(Self {
            invalid: classes.contains(INVALID_CLASS),
            element,
            offset,
            parity,
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl ByteNode for DomByteNode {
    fn offset(&self) -> usize {
        self.offset
    }

    fn is_invalid(&self) -> bool {
        self.invalid
    }

    fn parity(&self) -> Parity {
        self.parity
    }
}

/// Byte-grid view over the element with id `container_id`.
pub struct DomByteView {
    container_id: String,
    listeners: HashMap<(RegionId, NodeKey), EventListener>,
    on_click: Rc<dyn Fn(&RegionId)>,
}

impl DomByteView {
    /// Create a view whose click handlers report the clicked region to
    /// `on_click`.
    pub fn new(container_id: impl Into<String>, on_click: impl Fn(&RegionId) + 'static) -> Self {
        Self {
            container_id: container_id.into(),
            listeners: HashMap::new(),
            on_click: Rc::new(on_click),
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Number of click handlers currently attached.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn container(&self) -> Option<Element> {
        gloo_utils::document().get_element_by_id(&self.container_id)
    }

    fn marker_offset(&self, container: &Element, selector: &str) -> Option<usize> {
        let element = container.query_selector(selector).ok().flatten()?;
        element.get_attribute(OFFSET_ATTR)?.trim().parse().ok()
    }
}

impl ViewBinding for DomByteView {
    type Node = DomByteNode;

    fn byte_nodes(&self) -> Vec<DomByteNode> {
        let Some(container) = self.container() else {
            return Vec::new();
        };
        let Ok(node_list) = container.query_selector_all("[data-offset]") else {
            return Vec::new();
        };

        let mut nodes = Vec::with_capacity(node_list.length() as usize);
        for i in 0..node_list.length() {
            let Some(node) = node_list.item(i) else {
                continue;
            };
            let Ok(element) = node.dyn_into::<HtmlElement>() else {
                continue;
            };
            if let Some(byte) = DomByteNode::from_element(element) {
                nodes.push(byte);
            }
        }
        nodes
    }

    fn selection_markers(&self) -> SelectionMarkers {
        let Some(container) = self.container() else {
            return SelectionMarkers::default();
        };
        SelectionMarkers {
            start: self.marker_offset(&container, SELECTION_START),
            end: self.marker_offset(&container, SELECTION_END),
        }
    }

    fn paint(&mut self, node: &DomByteNode, paint: &NodePaint) -> Result<(), PlatformError> {
        if !node.element.is_connected() {
            return Err(PlatformError::StaleNode(node.offset));
        }

        let style = node.element.style();
        let writes = [
            ("background-color", paint.background.to_css()),
            ("color", paint.foreground.to_css()),
            ("cursor", paint.cursor.as_css().to_string()),
            ("font-weight", paint.weight.as_css().to_string()),
        ];
        for (property, value) in writes {
            style
                .set_property(property, &value)
                .map_err(|e| PlatformError::Other(format!("set {property}: {e:?}")))?;
        }
        Ok(())
    }

    fn attach_click(&mut self, node: &DomByteNode, region: &RegionId) -> Result<(), PlatformError> {
        if !node.element.is_connected() {
            return Err(PlatformError::StaleNode(node.offset));
        }

        let on_click = Rc::clone(&self.on_click);
        let clicked = region.clone();
        let listener = EventListener::new(&node.element, "click", move |_event| {
            tracing::trace!(target: "bytelabel::highlight", region = %clicked, "byte clicked");
            on_click(&clicked);
        });
        self.listeners.insert((region.clone(), node.key()), listener);
        Ok(())
    }

    fn detach_click(&mut self, key: NodeKey, region: &RegionId) {
        self.listeners.remove(&(region.clone(), key));
    }
}

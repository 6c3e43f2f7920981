use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Node, Window};

use crate::dom;
use crate::error::ProbeError;

/// The receiver every operation runs against.
///
/// The driver hands in whatever it holds (a window, a document, an element
/// or some other node) and every operation matches on the variant instead
/// of probing properties at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    PageRoot(Document),
    ElementNode(Element),
    OtherNode(Node),
}

impl Context {
    pub fn from_js(value: &JsValue) -> Result<Context, ProbeError> {
        if let Some(window) = value.dyn_ref::<Window>() {
            let document = window.document().ok_or_else(|| ProbeError::invalid_node("Window has no document"))?;
            return Ok(Context::PageRoot(document));
        }
        if let Some(node) = value.dyn_ref::<Node>() {
            return Ok(Context::from_node(node.clone()));
        }
        Err(ProbeError::invalid_node("Context is neither a window nor a DOM node"))
    }

    pub fn from_node(node: Node) -> Context {
        match node.node_type() {
            Node::DOCUMENT_NODE => Context::PageRoot(node.unchecked_into()),
            Node::ELEMENT_NODE => Context::ElementNode(node.unchecked_into()),
            _ => Context::OtherNode(node),
        }
    }

    /// The page the current window shows.
    pub fn page() -> Result<Context, ProbeError> {
        Ok(Context::PageRoot(dom::document()?))
    }

    /// Search root for queries. Computed on every call since the page may
    /// have mutated in between.
    pub fn scope(&self) -> Node {
        match self {
            Context::PageRoot(document) => document.clone().into(),
            Context::ElementNode(element) => element.clone().into(),
            Context::OtherNode(node) => node.clone(),
        }
    }

    /// The document that evaluates path queries against the scope.
    pub(crate) fn evaluator(&self) -> Result<Document, ProbeError> {
        match self {
            Context::PageRoot(document) => Ok(document.clone()),
            Context::ElementNode(element) => element.owner_document().map_or_else(dom::document, Ok),
            Context::OtherNode(node) => node.owner_document().map_or_else(dom::document, Ok),
        }
    }

    /// Concrete element for geometry and visibility: a non-element node
    /// stands in for its parent, a page for its root element.
    pub fn element(&self) -> Option<Element> {
        match self {
            Context::PageRoot(document) => document.document_element(),
            Context::ElementNode(element) => Some(element.clone()),
            Context::OtherNode(node) => node.parent_element(),
        }
    }

    pub(crate) fn require_element(&self) -> Result<Element, ProbeError> {
        match self {
            Context::ElementNode(element) => Ok(element.clone()),
            _ => Err(ProbeError::invalid_node("Node is not of type HTMLElement")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_window_maps_to_page_root() {
        let window = web_sys::window().unwrap();
        let ctx = Context::from_js(&window.clone().into()).unwrap();
        assert_eq!(ctx, Context::PageRoot(window.document().unwrap()));
    }

    #[wasm_bindgen_test]
    fn test_scope_of_page_root_is_document() {
        let document = dom::document().unwrap();
        let ctx = Context::from_js(&document.clone().into()).unwrap();
        let document_node: Node = document.into();
        assert!(ctx.scope().is_same_node(Some(&document_node)));
    }

    #[wasm_bindgen_test]
    fn test_element_and_text_nodes() {
        let document = dom::document().unwrap();
        let div = document.create_element("div").unwrap();
        let text = document.create_text_node("hello");
        div.append_child(&text).unwrap();

        let element_ctx = Context::from_node(div.clone().into());
        assert_eq!(element_ctx, Context::ElementNode(div.clone()));
        assert_eq!(element_ctx.element(), Some(div.clone()));

        let text_ctx = Context::from_node(text.into());
        assert!(matches!(text_ctx, Context::OtherNode(_)));
        assert_eq!(text_ctx.element(), Some(div));
        assert!(text_ctx.require_element().is_err());
    }

    #[wasm_bindgen_test]
    fn test_non_node_value_is_invalid() {
        let result = Context::from_js(&JsValue::from_f64(3.0));
        assert!(matches!(result, Err(ProbeError::InvalidNode { .. })));
    }
}

//! Small accessors over the global page objects shared by every module.

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, HtmlHeadElement, SvgElement, Window};

use crate::error::ProbeError;

pub(crate) fn window() -> Result<Window, ProbeError> {
    web_sys::window().ok_or_else(|| ProbeError::JsError { message: "Failed to get window object".to_string() })
}

pub(crate) fn window_document() -> Result<(Window, Document), ProbeError> {
    let window = window()?;
    let document = window.document().ok_or_else(|| ProbeError::JsError { message: "Failed to get document object".to_string() })?;
    Ok((window, document))
}

pub(crate) fn document() -> Result<Document, ProbeError> {
    window_document().map(|(_, document)| document)
}

pub(crate) fn body(document: &Document) -> Result<HtmlElement, ProbeError> {
    document.body().ok_or_else(|| ProbeError::invalid_node("Document has no body"))
}

pub(crate) fn head(document: &Document) -> Result<HtmlHeadElement, ProbeError> {
    document.head().ok_or_else(|| ProbeError::invalid_node("Document has no head"))
}

pub(crate) fn create_html_element(document: &Document, tag: &str) -> Result<HtmlElement, ProbeError> {
    document
        .create_element(tag)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| ProbeError::invalid_node(format!("<{}> is not an HTMLElement", tag)))
}

/// Inline style of HTML and SVG elements alike (the tracer icon is usually an `<svg>`).
pub(crate) fn inline_style(element: &Element) -> Result<CssStyleDeclaration, ProbeError> {
    if let Some(html) = element.dyn_ref::<HtmlElement>() {
        return Ok(html.style());
    }
    if let Some(svg) = element.dyn_ref::<SvgElement>() {
        return Ok(svg.style());
    }
    js_sys::Reflect::get(element, &JsValue::from_str("style"))?
        .dyn_into::<CssStyleDeclaration>()
        .map_err(|_| ProbeError::invalid_node("Element has no inline style"))
}

pub(crate) fn set_px(style: &CssStyleDeclaration, property: &str, value: f64) -> Result<(), ProbeError> {
    style.set_property(property, &format!("{}px", value))?;
    Ok(())
}

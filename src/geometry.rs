use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use web_sys::{CssStyleDeclaration, Element};

use crate::context::Context;
use crate::dom;
use crate::error::ProbeError;

/// Viewport-relative box of a rendered element.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[wasm_bindgen]
impl BoundingBox {
    #[wasm_bindgen(constructor)]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> BoundingBox {
        BoundingBox { left, top, width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Plain `{left, top, width, height}` record for `JSON.stringify` and drivers.
    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        let json = serde_json::to_string(self)
            .map_err(|e| ProbeError::SerializationError { message: e.to_string() })?;
        js_sys::JSON::parse(&json)
    }
}

/// Leading integer of a computed length the way `parseInt` reads it:
/// `"5px"` is 5, `"2.5px"` is 2, anything without digits is 0.
pub fn parse_px(value: &str) -> f64 {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, &trimmed[1..]),
        Some(b'+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<f64>().map(|n| sign * n).unwrap_or(0.0)
}

pub(crate) fn computed_style(element: &Element) -> Result<CssStyleDeclaration, ProbeError> {
    dom::window()?
        .get_computed_style(element)?
        .ok_or_else(|| ProbeError::invalid_node("Element has no computed style"))
}

/// Bounding rectangle, shifted onto the content box for `<iframe>` so that
/// coordinates land inside the embedded page rather than on its chrome.
pub fn bounding_box(element: &Element) -> Result<BoundingBox, ProbeError> {
    let rect = element.get_bounding_client_rect();
    let mut bbox = BoundingBox::new(rect.left(), rect.top(), rect.width(), rect.height());
    if element.tag_name().eq_ignore_ascii_case("iframe") {
        let style = computed_style(element)?;
        bbox.left += parse_px(&style.get_property_value("padding-left")?)
            + parse_px(&style.get_property_value("border-left-width")?);
        bbox.top += parse_px(&style.get_property_value("padding-top")?)
            + parse_px(&style.get_property_value("border-top-width")?);
    }
    Ok(bbox)
}

pub fn box_of(ctx: &Context) -> Result<BoundingBox, ProbeError> {
    bounding_box(&ctx.require_element()?)
}

/// Rendered, not hidden, and occupying some layout space.
pub fn visible(ctx: &Context) -> Result<bool, ProbeError> {
    let element = match ctx.element() {
        Some(element) => element,
        None => return Ok(false),
    };
    let rect = element.get_bounding_client_rect();
    let style = computed_style(&element)?;
    let has_layout = rect.top() != 0.0 || rect.bottom() != 0.0 || rect.width() != 0.0 || rect.height() != 0.0;
    Ok(style.get_property_value("display")? != "none"
        && style.get_property_value("visibility")? != "hidden"
        && has_layout)
}

pub fn invisible(ctx: &Context) -> Result<bool, ProbeError> {
    visible(ctx).map(|v| !v)
}

//! Element-side helpers the driver calls right before or after it sends
//! real input: scrolling, synthetic input events and text/option selection.

use js_sys::{Array, JsString, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Event, EventInit, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement,
    IntersectionObserver, IntersectionObserverEntry, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
};

use crate::context::Context;
use crate::error::ProbeError;
use crate::query::compile_pattern;
use crate::wait::deferred;

/// Scrolls the element to the center of the viewport unless it is already
/// fully visible. Fails for detached nodes and non-elements.
pub async fn scroll_into_view_if_needed(ctx: &Context) -> Result<(), ProbeError> {
    if !ctx.scope().is_connected() {
        return Err(ProbeError::invalid_node("Node is detached from document"));
    }
    let element = ctx.require_element()?;

    let ratio = visible_ratio(&element).await?;
    if ratio != 1.0 {
        let options = ScrollIntoViewOptions::new();
        options.set_block(ScrollLogicalPosition::Center);
        options.set_inline(ScrollLogicalPosition::Center);
        options.set_behavior(ScrollBehavior::Instant);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    }
    Ok(())
}

async fn visible_ratio(element: &web_sys::Element) -> Result<f64, ProbeError> {
    let (promise, resolve, _) = deferred();
    let on_entries = Closure::once_into_js(move |entries: Array, observer: IntersectionObserver| {
        let ratio = entries
            .get(0)
            .dyn_into::<IntersectionObserverEntry>()
            .map(|entry| entry.intersection_ratio())
            .unwrap_or(0.0);
        let _ = resolve.call1(&JsValue::NULL, &JsValue::from_f64(ratio));
        observer.disconnect();
    });
    let observer = IntersectionObserver::new(on_entries.unchecked_ref())?;
    observer.observe(element);
    let ratio = JsFuture::from(promise).await?;
    Ok(ratio.as_f64().unwrap_or(0.0))
}

/// Fires bubbling `input` then `change`, as if the user had edited the field.
pub fn input_event(ctx: &Context) -> Result<(), ProbeError> {
    let target = ctx.scope();
    let init = EventInit::new();
    init.set_bubbles(true);
    for kind in ["input", "change"] {
        target.dispatch_event(&Event::new_with_event_init_dict(kind, &init)?)?;
    }
    Ok(())
}

/// Selects the first match of `pattern` inside an input or textarea value.
/// Match offsets come straight from `RegExp.exec`, already in UTF-16 units.
pub fn select_text(ctx: &Context, pattern: &str) -> Result<(), ProbeError> {
    let regex = compile_pattern(pattern)?;
    let element = ctx.require_element()?;
    let value = text_field_value(&element)?;
    if let Some(found) = regex.exec(&value) {
        let start = Reflect::get(&found, &JsValue::from_str("index"))?.as_f64().unwrap_or(0.0) as u32;
        let length = found.get(0).dyn_into::<JsString>().map(|m| m.length()).unwrap_or(0);
        let end = start + length;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_selection_range(start, end)?;
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_selection_range(start, end)?;
        }
    }
    Ok(())
}

pub fn select_all_text(ctx: &Context) -> Result<(), ProbeError> {
    let element = ctx.require_element()?;
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.select();
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.select();
    } else {
        return Err(ProbeError::invalid_node("Element is not an input or textarea"));
    }
    Ok(())
}

fn text_field_value(element: &web_sys::Element) -> Result<String, ProbeError> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        Ok(input.value())
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        Ok(area.value())
    } else {
        Err(ProbeError::invalid_node("Element is not an input or textarea"))
    }
}

/// For each entry, selects the first option whose text contains it or that
/// matches it as a CSS selector, then fires `input` and `change`. Entries
/// that are not valid selectors only match by text.
pub fn select_options<S: AsRef<str>>(ctx: &Context, wanted: &[S]) -> Result<(), ProbeError> {
    let select = ctx
        .require_element()?
        .dyn_into::<HtmlSelectElement>()
        .map_err(|_| ProbeError::invalid_node("Element is not a select"))?;
    let options = select.options();
    for entry in wanted {
        let entry = entry.as_ref();
        let found = (0..options.length())
            .filter_map(|i| options.item(i))
            .filter_map(|el| el.dyn_into::<HtmlOptionElement>().ok())
            .find(|option| option.inner_text().contains(entry) || option.matches(entry).unwrap_or(false));
        match found {
            Some(option) => option.set_selected(true),
            None => probe_warn!("select: no option matches '{}'", entry),
        }
    }
    input_event(ctx)
}

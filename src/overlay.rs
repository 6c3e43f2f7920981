//! Annotation overlays: a dashed frame plus a message label, optionally kept
//! glued to an element by a polling tracker.
//!
//! The page is the registry. An overlay exists while a node with its id is
//! attached; creating one with an id already on the page does nothing. A
//! tracker stops on the first tick that finds its frame gone (or the id held
//! by a non-HTML node), or when `OverlayHandle::stop` / `remove_overlay`
//! cancels it.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures_util::stream::StreamExt;
use gloo_timers::future::IntervalStream;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use crate::context::Context;
use crate::dom;
use crate::error::ProbeError;
use crate::geometry::{bounding_box, BoundingBox};
use crate::wait;

pub const DEFAULT_POLL_INTERVAL_MS: u32 = 100;

const FRAME_STYLE: &str = "position: fixed; z-index: 2147483647; border: 2px dashed red; \
    border-radius: 3px; box-shadow: #5f3232 0 0 3px; pointer-events: none; box-sizing: border-box;";
const LABEL_STYLE: &str = "position: absolute; color: #cc26d6; font-size: 12px; background: #ffffffeb; \
    box-shadow: #333 0 0 3px; padding: 2px 5px; border-radius: 3px; white-space: nowrap;";

thread_local! {
    static TRACKERS: RefCell<HashMap<String, Rc<Cell<bool>>>> = RefCell::new(HashMap::new());
}

/// Label offsets relative to the frame. `None` keeps the default
/// (directly below the frame, left-aligned with it).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelPlacement {
    pub top: Option<f64>,
    pub left: Option<f64>,
}

/// Flips the label above the frame when it would run off the bottom of the
/// viewport and pulls it left by the overflow when it would run off the right.
pub fn place_label(viewport: (f64, f64), label: (f64, f64), bbox: &BoundingBox) -> LabelPlacement {
    let (viewport_width, viewport_height) = viewport;
    let (label_width, label_height) = label;
    let mut placement = LabelPlacement::default();
    if viewport_height < label_height + bbox.top + bbox.height {
        placement.top = Some(-label_height - 2.0);
    }
    if viewport_width < label_width + bbox.left {
        placement.left = Some(viewport_width - label_width - bbox.left);
    }
    placement
}

/// Draws a frame at `bbox` with `message` (HTML) as its label once the page
/// has loaded. Returns `false` without touching the page when a node with
/// `id` already exists.
///
/// TODO: surface the duplicate case to JS callers as an explicit "already
/// exists" result instead of resolving with `undefined` either way.
pub async fn overlay(id: &str, bbox: BoundingBox, message: &str) -> Result<bool, ProbeError> {
    wait::wait_load().await?;

    let (window, document) = dom::window_document()?;
    if document.get_element_by_id(id).is_some() {
        probe_log!("overlay: '{}' already on the page, skipping", id);
        return Ok(false);
    }

    let frame = dom::create_html_element(&document, "div")?;
    frame.set_id(id);
    let style = frame.style();
    style.set_css_text(FRAME_STYLE);
    write_box(&frame, &bbox)?;
    if bbox.area() == 0.0 {
        style.set_property("border", "none")?;
    }

    let label = dom::create_html_element(&document, "div")?;
    label.style().set_css_text(LABEL_STYLE);
    dom::set_px(&label.style(), "top", bbox.height)?;
    label.set_inner_html(message);

    frame.append_child(&label)?;
    dom::body(&document)?.append_child(&frame)?;

    let viewport = (
        window.inner_width()?.as_f64().unwrap_or(0.0),
        window.inner_height()?.as_f64().unwrap_or(0.0),
    );
    let size = (f64::from(label.offset_width()), f64::from(label.offset_height()));
    let placement = place_label(viewport, size, &bbox);
    if let Some(top) = placement.top {
        dom::set_px(&label.style(), "top", top)?;
    }
    if let Some(left) = placement.left {
        dom::set_px(&label.style(), "left", left)?;
    }
    Ok(true)
}

/// Overlays the context's element (a text node stands in for its parent)
/// and keeps the frame on it while it moves
/// or resizes.
///
/// The tracker re-reads the box every `poll_interval_ms` and only writes to
/// the frame when the box changed. Without a `stop()` or `remove_overlay`
/// the tracker lives as long as the frame does, which may be the lifetime
/// of the page.
pub async fn element_overlay(
    ctx: &Context,
    id: &str,
    message: &str,
    poll_interval_ms: u32,
) -> Result<OverlayHandle, ProbeError> {
    let element = ctx
        .element()
        .ok_or_else(|| ProbeError::invalid_node("Context has no element to overlay"))?;
    let initial = bounding_box(&element)?;
    if !overlay(id, initial, message).await? {
        return Ok(OverlayHandle::inert(id));
    }

    let cancelled = Rc::new(Cell::new(false));
    TRACKERS.with(|trackers| {
        if let Some(previous) = trackers.borrow_mut().insert(id.to_string(), cancelled.clone()) {
            previous.set(true);
        }
    });
    wasm_bindgen_futures::spawn_local(track(id.to_string(), element, initial, poll_interval_ms, cancelled.clone()));
    probe_log!("elementOverlay: tracking '{}' every {}ms", id, poll_interval_ms);

    Ok(OverlayHandle { id: id.to_string(), cancelled })
}

async fn track(id: String, element: Element, mut previous: BoundingBox, interval_ms: u32, cancelled: Rc<Cell<bool>>) {
    let mut ticks = IntervalStream::new(interval_ms);
    while ticks.next().await.is_some() {
        if cancelled.get() {
            break;
        }
        let frame = match dom::document()
            .ok()
            .and_then(|document| document.get_element_by_id(&id))
            .and_then(|frame| frame.dyn_into::<HtmlElement>().ok())
        {
            Some(frame) => frame,
            None => break,
        };
        let current = match bounding_box(&element) {
            Ok(current) => current,
            Err(_) => break,
        };
        if current == previous {
            continue;
        }
        if write_box(&frame, &current).is_err() {
            break;
        }
        previous = current;
    }
    cancelled.set(true);
    TRACKERS.with(|trackers| {
        let mut trackers = trackers.borrow_mut();
        if trackers.get(&id).is_some_and(|flag| Rc::ptr_eq(flag, &cancelled)) {
            trackers.remove(&id);
        }
    });
    probe_log!("elementOverlay: tracker '{}' stopped", id);
}

fn write_box(frame: &HtmlElement, bbox: &BoundingBox) -> Result<(), ProbeError> {
    let style = frame.style();
    dom::set_px(&style, "left", bbox.left)?;
    dom::set_px(&style, "top", bbox.top)?;
    dom::set_px(&style, "width", bbox.width)?;
    dom::set_px(&style, "height", bbox.height)?;
    Ok(())
}

/// Removes the overlay with `id` if present and cancels its tracker.
pub fn remove_overlay(id: &str) -> Result<(), ProbeError> {
    cancel_tracker(id);
    if let Some(frame) = dom::document()?.get_element_by_id(id) {
        frame.remove();
    }
    Ok(())
}

fn cancel_tracker(id: &str) {
    TRACKERS.with(|trackers| {
        if let Some(flag) = trackers.borrow_mut().remove(id) {
            flag.set(true);
        }
    });
}

pub fn is_tracked(id: &str) -> bool {
    TRACKERS.with(|trackers| trackers.borrow().contains_key(id))
}

/// Typed "stop tracking" handle for an element overlay.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct OverlayHandle {
    id: String,
    cancelled: Rc<Cell<bool>>,
}

impl OverlayHandle {
    fn inert(id: &str) -> OverlayHandle {
        OverlayHandle { id: id.to_string(), cancelled: Rc::new(Cell::new(true)) }
    }
}

#[wasm_bindgen]
impl OverlayHandle {
    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.id.clone()
    }

    /// False once the tracker has ended for any reason, and from the start
    /// when the overlay id was already taken.
    #[wasm_bindgen(js_name = isTracking)]
    pub fn is_tracking(&self) -> bool {
        !self.cancelled.get()
    }

    /// Stops the tracker and removes the frame. A handle whose tracker has
    /// already ended leaves the page alone, since the id may now belong to
    /// someone else's overlay.
    pub fn stop(&self) -> Result<(), JsValue> {
        if self.cancelled.replace(true) {
            return Ok(());
        }
        remove_overlay(&self.id).map_err(JsValue::from)
    }
}

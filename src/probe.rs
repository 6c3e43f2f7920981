//! The JS-facing surface. A driver constructs a `Probe` around whatever it
//! holds (window, document, element or other node) and calls operations
//! by name; deferred operations hand back promises.

use js_sys::{Array, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Element, Node};

use crate::actions;
use crate::config::ProbeConfig;
use crate::context::Context;
use crate::error::ProbeError;
use crate::geometry::{self, BoundingBox};
use crate::inject::{self, Source};
use crate::overlay;
use crate::query;
use crate::text;
use crate::tracer;
use crate::wait;

#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct Probe {
    context: Context,
    config: ProbeConfig,
}

fn settle<T, F>(future: F) -> Promise
where
    T: Into<JsValue>,
    F: std::future::Future<Output = Result<T, ProbeError>> + 'static,
{
    future_to_promise(async move { future.await.map(Into::into).map_err(JsValue::from) })
}

// Duplicate-id creations report `false` internally but resolve like a
// successful creation, which is what drivers already expect.
fn settle_unit<T, F>(future: F) -> Promise
where
    F: std::future::Future<Output = Result<T, ProbeError>> + 'static,
{
    settle(async move { future.await.map(|_| JsValue::UNDEFINED) })
}

impl Probe {
    pub fn from_context(context: Context, config: ProbeConfig) -> Probe {
        Probe { context, config }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

#[wasm_bindgen]
impl Probe {
    #[wasm_bindgen(constructor)]
    pub fn new(this: JsValue) -> Result<Probe, JsValue> {
        Ok(Probe::from_context(Context::from_js(&this)?, ProbeConfig::default()))
    }

    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(this: JsValue, config: &str) -> Result<Probe, JsValue> {
        Ok(Probe::from_context(Context::from_js(&this)?, ProbeConfig::from_json(config)?))
    }

    pub fn element(&self, selectors: Vec<String>) -> Result<Option<Element>, JsValue> {
        Ok(query::element(&self.context, &selectors)?)
    }

    pub fn elements(&self, selector: &str) -> Result<Array, JsValue> {
        Ok(query::elements(&self.context, selector)?.to_array())
    }

    #[wasm_bindgen(js_name = elementX)]
    pub fn element_x(&self, xpaths: Vec<String>) -> Result<Option<Node>, JsValue> {
        Ok(query::element_x(&self.context, &xpaths)?)
    }

    #[wasm_bindgen(js_name = elementsX)]
    pub fn elements_x(&self, xpath: &str) -> Result<Array, JsValue> {
        Ok(query::elements_x(&self.context, xpath)?.to_array())
    }

    #[wasm_bindgen(js_name = elementMatches)]
    pub fn element_matches(&self, pairs: Vec<String>) -> Result<Option<Element>, JsValue> {
        Ok(query::element_matches(&self.context, &pairs)?)
    }

    pub fn parents(&self, selector: &str) -> Result<Array, JsValue> {
        Ok(query::parents(&self.context, selector)?.into_iter().collect())
    }

    pub fn contains(&self, candidate: &Node) -> bool {
        query::contains(&self.context, candidate)
    }

    #[wasm_bindgen(js_name = waitElement)]
    pub fn wait_element(&self, selectors: Vec<String>) -> Promise {
        let context = self.context.clone();
        let (timeout, interval) = (self.config.wait_timeout_ms, self.config.wait_interval_ms);
        settle(async move {
            query::wait_element(&context, &selectors, timeout, interval)
                .await
                .map(|found| found.map_or(JsValue::NULL, JsValue::from))
        })
    }

    #[wasm_bindgen(js_name = "box")]
    pub fn bounding_box(&self) -> Result<BoundingBox, JsValue> {
        Ok(geometry::box_of(&self.context)?)
    }

    pub fn visible(&self) -> Result<bool, JsValue> {
        Ok(geometry::visible(&self.context)?)
    }

    pub fn invisible(&self) -> Result<bool, JsValue> {
        Ok(geometry::invisible(&self.context)?)
    }

    pub fn text(&self) -> String {
        text::text(&self.context)
    }

    pub fn overlay(&self, id: String, left: f64, top: f64, width: f64, height: f64, message: String) -> Promise {
        settle_unit(async move { overlay::overlay(&id, BoundingBox::new(left, top, width, height), &message).await })
    }

    /// Resolves with an `OverlayHandle` once the frame is drawn; tracking
    /// continues in the background.
    #[wasm_bindgen(js_name = elementOverlay)]
    pub fn element_overlay(&self, id: String, message: String) -> Promise {
        let context = self.context.clone();
        let interval = self.config.poll_interval_ms;
        settle(async move { overlay::element_overlay(&context, &id, &message, interval).await })
    }

    #[wasm_bindgen(js_name = removeOverlay)]
    pub fn remove_overlay(&self, id: &str) -> Result<(), JsValue> {
        Ok(overlay::remove_overlay(id)?)
    }

    #[wasm_bindgen(js_name = initMouseTracer)]
    pub fn init_mouse_tracer(&self, icon_id: String, icon: String) -> Promise {
        settle_unit(async move { tracer::init_mouse_tracer(&icon_id, &icon).await })
    }

    #[wasm_bindgen(js_name = updateMouseTracer)]
    pub fn update_mouse_tracer(&self, icon_id: &str, x: f64, y: f64) -> Result<bool, JsValue> {
        Ok(tracer::update_mouse_tracer(icon_id, x, y)?)
    }

    #[wasm_bindgen(js_name = addScriptTag)]
    pub fn add_script_tag(&self, id: String, url: Option<String>, content: Option<String>) -> Promise {
        settle_unit(async move {
            inject::add_script_tag(&id, Source::pick(url.as_deref(), content.as_deref())).await
        })
    }

    #[wasm_bindgen(js_name = addStyleTag)]
    pub fn add_style_tag(&self, id: String, url: Option<String>, content: Option<String>) -> Promise {
        settle_unit(async move {
            inject::add_style_tag(&id, Source::pick(url.as_deref(), content.as_deref())).await
        })
    }

    #[wasm_bindgen(js_name = waitLoad)]
    pub fn wait_load(&self) -> Promise {
        settle_unit(wait::wait_load())
    }

    #[wasm_bindgen(js_name = waitIdle)]
    pub fn wait_idle(&self, timeout: u32) -> Promise {
        settle_unit(wait::wait_idle(timeout))
    }

    pub fn resource(&self) -> Promise {
        let context = self.context.clone();
        settle(async move { wait::wait_resource(&context).await })
    }

    #[wasm_bindgen(js_name = fetchAsDataURL)]
    pub fn fetch_as_data_url(&self, url: String) -> Promise {
        settle(async move { wait::fetch_as_data_url(&url).await })
    }

    #[wasm_bindgen(js_name = scrollIntoViewIfNeeded)]
    pub fn scroll_into_view_if_needed(&self) -> Promise {
        let context = self.context.clone();
        settle_unit(async move { actions::scroll_into_view_if_needed(&context).await })
    }

    #[wasm_bindgen(js_name = inputEvent)]
    pub fn input_event(&self) -> Result<(), JsValue> {
        Ok(actions::input_event(&self.context)?)
    }

    #[wasm_bindgen(js_name = selectText)]
    pub fn select_text(&self, pattern: &str) -> Result<(), JsValue> {
        Ok(actions::select_text(&self.context, pattern)?)
    }

    #[wasm_bindgen(js_name = selectAllText)]
    pub fn select_all_text(&self) -> Result<(), JsValue> {
        Ok(actions::select_all_text(&self.context)?)
    }

    pub fn select(&self, selectors: Vec<String>) -> Result<(), JsValue> {
        Ok(actions::select_options(&self.context, &selectors)?)
    }
}

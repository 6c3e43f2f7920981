//! Deferred results: page load, idle time, media/resource readiness and
//! fetching a resource as a data URL.

use base64::Engine;
use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlImageElement, HtmlMediaElement, IdleRequestOptions, Url};

use crate::context::Context;
use crate::dom;
use crate::error::ProbeError;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A pending promise together with its settle functions, so DOM callbacks
/// (`onload`, `addEventListener`, `requestIdleCallback`) can settle it directly.
pub(crate) fn deferred() -> (Promise, Function, Function) {
    let mut settle = None;
    let promise = Promise::new(&mut |resolve, reject| settle = Some((resolve, reject)));
    // The executor runs synchronously inside the Promise constructor.
    let (resolve, reject) = settle.unwrap_or_else(|| (Function::new_no_args(""), Function::new_no_args("")));
    (promise, resolve, reject)
}

pub async fn wait_load() -> Result<(), ProbeError> {
    let (window, document) = dom::window_document()?;
    if document.ready_state() == "complete" {
        return Ok(());
    }
    let (promise, resolve, _) = deferred();
    window.add_event_listener_with_callback("load", &resolve)?;
    JsFuture::from(promise).await?;
    Ok(())
}

pub async fn wait_idle(timeout_ms: u32) -> Result<(), ProbeError> {
    let window = dom::window()?;
    let (promise, resolve, _) = deferred();
    let options = IdleRequestOptions::new();
    options.set_timeout(timeout_ms);
    window.request_idle_callback_with_options(&resolve, &options)?;
    JsFuture::from(promise).await?;
    Ok(())
}

/// Resolves with the element's `currentSrc` once it has loaded; rejects
/// with the element's `error` event.
pub async fn wait_resource(ctx: &Context) -> Result<String, ProbeError> {
    let element = ctx.require_element()?;
    if let Some(image) = element.dyn_ref::<HtmlImageElement>() {
        if image.complete() {
            return Ok(image.current_src());
        }
        let image = image.clone();
        return settle_on(&element, "load", move || image.current_src()).await;
    }
    if let Some(media) = element.dyn_ref::<HtmlMediaElement>() {
        if media.ready_state() >= HtmlMediaElement::HAVE_CURRENT_DATA {
            return Ok(media.current_src());
        }
        let media = media.clone();
        return settle_on(&element, "loadeddata", move || media.current_src()).await;
    }
    Err(ProbeError::invalid_node(format!("<{}> is not an image or media element", element.tag_name().to_lowercase())))
}

async fn settle_on(
    target: &web_sys::Element,
    event: &str,
    source: impl FnOnce() -> String + 'static,
) -> Result<String, ProbeError> {
    let (promise, resolve, reject) = deferred();
    let on_ready = Closure::once_into_js(move || {
        let _ = resolve.call1(&JsValue::NULL, &JsValue::from_str(&source()));
    });
    target.add_event_listener_with_callback(event, on_ready.unchecked_ref())?;
    target.add_event_listener_with_callback("error", &reject)?;
    let src = JsFuture::from(promise).await.map_err(ProbeError::resource)?;
    Ok(src.as_string().unwrap_or_default())
}

/// `data:` URL for a fetched body. A missing or empty content type falls
/// back to `application/octet-stream`.
pub fn encode_data_url(mime: Option<&str>, body: &[u8]) -> String {
    let mime = mime.map(str::trim).filter(|m| !m.is_empty()).unwrap_or(FALLBACK_MIME);
    format!("data:{};base64,{}", mime, base64::engine::general_purpose::STANDARD.encode(body))
}

pub async fn fetch_as_data_url(url: &str) -> Result<String, ProbeError> {
    let base = dom::window()?.location().href()?;
    let absolute = Url::new_with_base(url, &base)
        .map_err(ProbeError::resource)?
        .href();

    let response = reqwest::Client::new()
        .get(absolute.as_str())
        .send()
        .await
        .map_err(|e| ProbeError::ResourceFailed { message: format!("Request error: {}", e) })?;
    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .bytes()
        .await
        .map_err(|e| ProbeError::ResourceFailed { message: format!("Body error: {}", e) })?;

    probe_log!("fetchAsDataURL: {} ({} bytes)", absolute, body.len());
    Ok(encode_data_url(mime.as_deref(), &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[test]
    fn test_encode_data_url_with_mime() {
        assert_eq!(encode_data_url(Some("text/plain"), b"hi"), "data:text/plain;base64,aGk=");
    }

    #[test]
    fn test_encode_data_url_missing_mime() {
        assert_eq!(encode_data_url(None, b""), "data:application/octet-stream;base64,");
        assert_eq!(encode_data_url(Some("  "), b"a"), "data:application/octet-stream;base64,YQ==");
    }

    #[wasm_bindgen_test]
    async fn test_wait_load_resolves_on_loaded_page() {
        assert!(wait_load().await.is_ok());
    }

    #[wasm_bindgen_test]
    async fn test_wait_idle_resolves() {
        assert!(wait_idle(50).await.is_ok());
    }

    #[wasm_bindgen_test]
    async fn test_wait_resource_rejects_broken_image() {
        let document = dom::document().unwrap();
        let img = document.create_element("img").unwrap();
        document.body().unwrap().append_child(&img).unwrap();
        let ctx = Context::ElementNode(img.clone());
        let pending = wait_resource(&ctx);
        img.set_attribute("src", "/pageprobe-missing-image.png").unwrap();
        assert!(matches!(pending.await, Err(ProbeError::ResourceFailed { .. })));
        img.remove();
    }

    #[wasm_bindgen_test]
    async fn test_wait_resource_on_div_is_invalid_node() {
        let div = dom::document().unwrap().create_element("div").unwrap();
        let result = wait_resource(&Context::ElementNode(div)).await;
        assert!(matches!(result, Err(ProbeError::InvalidNode { .. })));
    }
}

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlLinkElement, HtmlScriptElement, HtmlStyleElement};

use crate::dom;
use crate::error::ProbeError;
use crate::wait::deferred;

/// Where an injected script or stylesheet comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    Url(&'a str),
    Inline(&'a str),
}

impl<'a> Source<'a> {
    /// A non-empty URL wins over inline content, the way drivers pass both slots.
    pub fn pick(url: Option<&'a str>, content: Option<&'a str>) -> Source<'a> {
        match url.filter(|u| !u.is_empty()) {
            Some(url) => Source::Url(url),
            None => Source::Inline(content.unwrap_or_default()),
        }
    }
}

/// Appends a `<script>` with `id` to the head. Resolves when a remote
/// script has loaded (immediately for inline code). Returns `false` without
/// touching the page if `id` is already taken.
pub async fn add_script_tag(id: &str, source: Source<'_>) -> Result<bool, ProbeError> {
    let document = dom::document()?;
    if document.get_element_by_id(id).is_some() {
        return Ok(false);
    }

    let (promise, resolve, reject) = deferred();
    let script = document
        .create_element("script")?
        .dyn_into::<HtmlScriptElement>()
        .map_err(|_| ProbeError::invalid_node("<script> is not an HTMLScriptElement"))?;
    match source {
        Source::Url(url) => {
            script.set_src(url);
            script.set_onload(Some(&resolve));
        }
        Source::Inline(content) => {
            script.set_type("text/javascript");
            script.set_text(content)?;
            resolve.call0(&JsValue::NULL)?;
        }
    }
    script.set_id(id);
    script.set_onerror(Some(&reject));
    dom::head(&document)?.append_child(&script)?;

    JsFuture::from(promise).await.map_err(ProbeError::resource)?;
    probe_log!("addScriptTag: '{}' ready", id);
    Ok(true)
}

/// Stylesheet counterpart of [`add_script_tag`]: a `<link rel=stylesheet>`
/// for URLs, a `<style>` element for inline CSS.
pub async fn add_style_tag(id: &str, source: Source<'_>) -> Result<bool, ProbeError> {
    let document = dom::document()?;
    if document.get_element_by_id(id).is_some() {
        return Ok(false);
    }

    let (promise, resolve, reject) = deferred();
    let node: web_sys::HtmlElement = match source {
        Source::Url(url) => {
            let link = document
                .create_element("link")?
                .dyn_into::<HtmlLinkElement>()
                .map_err(|_| ProbeError::invalid_node("<link> is not an HTMLLinkElement"))?;
            link.set_rel("stylesheet");
            link.set_href(url);
            link.into()
        }
        Source::Inline(content) => {
            let style = document
                .create_element("style")?
                .dyn_into::<HtmlStyleElement>()
                .map_err(|_| ProbeError::invalid_node("<style> is not an HTMLStyleElement"))?;
            style.set_type("text/css");
            style.append_child(&document.create_text_node(content))?;
            resolve.call0(&JsValue::NULL)?;
            style.into()
        }
    };
    node.set_id(id);
    node.set_onload(Some(&resolve));
    node.set_onerror(Some(&reject));
    dom::head(&document)?.append_child(&node)?;

    JsFuture::from(promise).await.map_err(ProbeError::resource)?;
    probe_log!("addStyleTag: '{}' ready", id);
    Ok(true)
}

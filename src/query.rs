//! Element resolution over CSS selectors and XPath expressions.
//!
//! Single-match operations take an ordered candidate list and stop at the
//! first candidate that yields anything; later candidates are never
//! evaluated. Not finding anything is `Ok(None)`, never an error.

use futures::future::{select, Either};
use futures_util::stream::StreamExt;
use gloo_timers::future::{IntervalStream, TimeoutFuture};
use js_sys::{Array, Function, Reflect, RegExp};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DocumentFragment, Element, Node, NodeList, XPathResult};

use crate::context::Context;
use crate::error::ProbeError;
use crate::text::text_of;

/// Ordered result of a multi-match query. Iterating does not consume it, so
/// callers can walk it any number of times; nodes are read on demand.
#[derive(Debug, Clone)]
pub enum NodeCollection {
    Css(NodeList),
    XPath(XPathResult),
}

impl NodeCollection {
    pub fn len(&self) -> u32 {
        match self {
            NodeCollection::Css(list) => list.length(),
            NodeCollection::XPath(snapshot) => snapshot.snapshot_length().unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: u32) -> Option<Node> {
        match self {
            NodeCollection::Css(list) => list.item(index),
            NodeCollection::XPath(snapshot) => snapshot.snapshot_item(index).ok().flatten(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Node> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    pub fn to_array(&self) -> js_sys::Array {
        self.iter().collect()
    }
}

pub fn element<S: AsRef<str>>(ctx: &Context, selectors: &[S]) -> Result<Option<Element>, ProbeError> {
    let scope = ctx.scope();
    for selector in selectors {
        let selector = selector.as_ref();
        if let Some(found) = query_one(&scope, selector)? {
            probe_log!("element: candidate '{}' matched", selector);
            return Ok(Some(found));
        }
    }
    Ok(None)
}

pub fn elements(ctx: &Context, selector: &str) -> Result<NodeCollection, ProbeError> {
    query_all(&ctx.scope(), selector).map(NodeCollection::Css)
}

pub fn element_x<S: AsRef<str>>(ctx: &Context, xpaths: &[S]) -> Result<Option<Node>, ProbeError> {
    let evaluator = ctx.evaluator()?;
    let scope = ctx.scope();
    for xpath in xpaths {
        let xpath = xpath.as_ref();
        let result = evaluator
            .evaluate_with_opt_callback_and_type(xpath, &scope, None, XPathResult::FIRST_ORDERED_NODE_TYPE)
            .map_err(|e| ProbeError::selector(xpath, e))?;
        if let Some(node) = result.single_node_value()? {
            probe_log!("elementX: candidate '{}' matched", xpath);
            return Ok(Some(node));
        }
    }
    Ok(None)
}

pub fn elements_x(ctx: &Context, xpath: &str) -> Result<NodeCollection, ProbeError> {
    let result = ctx
        .evaluator()?
        .evaluate_with_opt_callback_and_type(xpath, &ctx.scope(), None, XPathResult::ORDERED_NODE_SNAPSHOT_TYPE)
        .map_err(|e| ProbeError::selector(xpath, e))?;
    Ok(NodeCollection::XPath(result))
}

/// Splits a flattened `[selector, pattern, selector, pattern, ...]` list.
/// A trailing selector without a pattern is ignored.
pub fn selector_pattern_pairs<'a, S: AsRef<str>>(flat: &'a [S]) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    flat.chunks_exact(2).map(|pair| (pair[0].as_ref(), pair[1].as_ref()))
}

/// Builds a pattern with the page's own `RegExp`, so drivers write
/// JavaScript syntax (lookaround, backreferences) and get its errors.
pub(crate) fn compile_pattern(pattern: &str) -> Result<RegExp, ProbeError> {
    let invalid = |e: JsValue| ProbeError::pattern(pattern, e);
    let constructor = Reflect::get(&js_sys::global(), &JsValue::from_str("RegExp"))
        .map_err(invalid)?
        .dyn_into::<Function>()
        .map_err(invalid)?;
    Reflect::construct(&constructor, &Array::of1(&JsValue::from_str(pattern)))
        .map(|value| value.unchecked_into::<RegExp>())
        .map_err(invalid)
}

pub fn element_matches<S: AsRef<str>>(ctx: &Context, pairs: &[S]) -> Result<Option<Element>, ProbeError> {
    let scope = ctx.scope();
    for (selector, pattern) in selector_pattern_pairs(pairs) {
        let regex = compile_pattern(pattern)?;
        let candidates = query_all(&scope, selector)?;
        let found = (0..candidates.length())
            .filter_map(|i| candidates.item(i))
            .find(|node| regex.test(&text_of(node)));
        if let Some(node) = found {
            probe_log!("elementMatches: '{}' /{}/ matched", selector, pattern);
            return Ok(node.dyn_into::<Element>().ok());
        }
    }
    Ok(None)
}

/// Ancestors matching `selector`, nearest first. The receiver itself is not included.
pub fn parents(ctx: &Context, selector: &str) -> Result<Vec<Element>, ProbeError> {
    let mut current = match ctx {
        Context::PageRoot(_) => None,
        Context::ElementNode(element) => element.parent_element(),
        Context::OtherNode(node) => node.parent_element(),
    };
    let mut list = Vec::new();
    while let Some(parent) = current {
        if parent.matches(selector).map_err(|e| ProbeError::selector(selector, e))? {
            list.push(parent.clone());
        }
        current = parent.parent_element();
    }
    Ok(list)
}

pub fn contains(ctx: &Context, candidate: &Node) -> bool {
    ctx.scope().contains(Some(candidate))
}

/// Polls `element` over the candidates until one resolves or the timeout
/// passes. A timeout is reported as not-found.
pub async fn wait_element<S: AsRef<str>>(
    ctx: &Context,
    selectors: &[S],
    timeout_ms: u32,
    interval_ms: u32,
) -> Result<Option<Element>, ProbeError> {
    let poll = async {
        let mut interval = IntervalStream::new(interval_ms);
        loop {
            if let Some(found) = element(ctx, selectors)? {
                return Ok::<_, ProbeError>(found);
            }
            StreamExt::next(&mut interval).await;
        }
    };

    match select(Box::pin(poll), TimeoutFuture::new(timeout_ms)).await {
        Either::Left((Ok(found), _)) => Ok(Some(found)),
        Either::Left((Err(e), _)) => Err(e),
        Either::Right(_) => {
            probe_log!("waitElement: nothing matched after {}ms", timeout_ms);
            Ok(None)
        }
    }
}

fn query_one(scope: &Node, selector: &str) -> Result<Option<Element>, ProbeError> {
    let result = if let Some(document) = scope.dyn_ref::<web_sys::Document>() {
        document.query_selector(selector)
    } else if let Some(element) = scope.dyn_ref::<Element>() {
        element.query_selector(selector)
    } else if let Some(fragment) = scope.dyn_ref::<DocumentFragment>() {
        fragment.query_selector(selector)
    } else {
        return Err(ProbeError::invalid_node("Scope node cannot be queried"));
    };
    result.map_err(|e| ProbeError::selector(selector, e))
}

fn query_all(scope: &Node, selector: &str) -> Result<NodeList, ProbeError> {
    let result = if let Some(document) = scope.dyn_ref::<web_sys::Document>() {
        document.query_selector_all(selector)
    } else if let Some(element) = scope.dyn_ref::<Element>() {
        element.query_selector_all(selector)
    } else if let Some(fragment) = scope.dyn_ref::<DocumentFragment>() {
        fragment.query_selector_all(selector)
    } else {
        return Err(ProbeError::invalid_node("Scope node cannot be queried"));
    };
    result.map_err(|e| ProbeError::selector(selector, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;
    use wasm_bindgen_test::*;
    use web_sys::{ShadowRootInit, ShadowRootMode};

    wasm_bindgen_test_configure!(run_in_browser);

    #[test]
    fn test_pairs_drop_trailing_selector() {
        let flat = ["a", "x", "button", "^Go$", "orphan"];
        let pairs: Vec<_> = selector_pattern_pairs(&flat).collect();
        assert_eq!(pairs, vec![("a", "x"), ("button", "^Go$")]);
    }

    #[test]
    fn test_pairs_empty() {
        let flat: [&str; 0] = [];
        assert_eq!(selector_pattern_pairs(&flat).count(), 0);
    }

    fn mount(id: &str, html: &str) -> Element {
        let document = dom::document().unwrap();
        let host = document.create_element("div").unwrap();
        host.set_id(id);
        host.set_inner_html(html);
        document.body().unwrap().append_child(&host).unwrap();
        host
    }

    #[wasm_bindgen_test]
    fn test_element_first_candidate_wins() {
        let host = mount("q-first", r#"<p class="b">second</p><p class="a">first</p>"#);
        let ctx = Context::page().unwrap();
        let found = element(&ctx, &["#q-first .a", "#q-first .b"]).unwrap().unwrap();
        assert_eq!(found.class_name(), "a");
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_element_falls_back_then_not_found() {
        let host = mount("q-fallback", r#"<span class="late">x</span>"#);
        let ctx = Context::page().unwrap();
        assert!(element(&ctx, &["#q-fallback .missing"]).unwrap().is_none());
        let found = element(&ctx, &["#q-fallback .missing", "#q-fallback .late"]).unwrap();
        assert!(found.is_some());
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_element_is_scoped_to_element_context() {
        let host = mount("q-scope", r#"<div id="q-inner"><i class="s">in</i></div><i class="s">out</i>"#);
        let inner = dom::document().unwrap().get_element_by_id("q-inner").unwrap();
        let ctx = Context::ElementNode(inner);
        let all = elements(&ctx, ".s").unwrap();
        assert_eq!(all.len(), 1);
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_element_invalid_selector() {
        let ctx = Context::page().unwrap();
        match element(&ctx, &["[[[invalid"]) {
            Err(ProbeError::InvalidSelector { selector, .. }) => assert_eq!(selector, "[[[invalid"),
            other => panic!("Expected InvalidSelector, got {:?}", other),
        }
    }

    #[wasm_bindgen_test]
    fn test_elements_x_preserves_document_order_and_restarts() {
        let host = mount("q-x", r#"<b>1</b><b>2</b><b>3</b>"#);
        let ctx = Context::page().unwrap();
        let nodes = elements_x(&ctx, "//div[@id='q-x']/b").unwrap();
        let first: Vec<_> = nodes.iter().map(|n| n.text_content().unwrap()).collect();
        let second: Vec<_> = nodes.iter().map(|n| n.text_content().unwrap()).collect();
        assert_eq!(first, vec!["1", "2", "3"]);
        assert_eq!(first, second);
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_element_x_first_in_document_order() {
        let host = mount("q-x1", r#"<u>a</u><u>b</u>"#);
        let ctx = Context::page().unwrap();
        let found = element_x(&ctx, &["//div[@id='nope']", "//div[@id='q-x1']/u"]).unwrap().unwrap();
        assert_eq!(found.text_content().unwrap(), "a");
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_element_matches_advances_only_on_total_failure() {
        let host = mount("q-m", r#"<a>Cancel</a><a>Submit</a><button>Submit</button>"#);
        let ctx = Context::page().unwrap();
        let found = element_matches(&ctx, &["#q-m em", "Submit", "#q-m a", "Sub", "#q-m button", "Submit"])
            .unwrap()
            .unwrap();
        assert_eq!(found.tag_name(), "A");
        assert_eq!(found.text_content().unwrap(), "Submit");
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_element_matches_invalid_pattern() {
        let host = mount("q-mp", r#"<a>x</a>"#);
        let ctx = Context::page().unwrap();
        let result = element_matches(&ctx, &["#q-mp a", "("]);
        assert!(matches!(result, Err(ProbeError::InvalidPattern { .. })));
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_element_matches_uses_js_pattern_syntax() {
        let host = mount("q-js", r#"<a>Submit later</a><a>Submit</a><i>'x'</i>"#);
        let ctx = Context::page().unwrap();
        let found = element_matches(&ctx, &["#q-js a", "^Submit(?! later)"]).unwrap().unwrap();
        assert_eq!(found.text_content().unwrap(), "Submit");
        let quoted = element_matches(&ctx, &["#q-js i", r#"(['"])x\1"#]).unwrap();
        assert!(quoted.is_some());
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_queries_inside_shadow_root() {
        let host = mount("q-shadow", "");
        let shadow = host.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Open)).unwrap();
        shadow.set_inner_html(r#"<b class="in">one</b><b class="in">two</b>"#);
        let ctx = Context::from_node(shadow.into());
        assert!(matches!(ctx, Context::OtherNode(_)));

        let found = element(&ctx, &[".missing", ".in"]).unwrap().unwrap();
        assert_eq!(found.text_content().unwrap(), "one");
        assert_eq!(elements(&ctx, ".in").unwrap().len(), 2);
        let matched = element_matches(&ctx, &["b", "^two$"]).unwrap().unwrap();
        assert_eq!(matched.text_content().unwrap(), "two");
        assert!(element(&Context::page().unwrap(), &["#q-shadow .in"]).unwrap().is_none());
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_text_node_scope_cannot_be_queried() {
        let text = dom::document().unwrap().create_text_node("t");
        let result = element(&Context::OtherNode(text.into()), &["b"]);
        assert!(matches!(result, Err(ProbeError::InvalidNode { .. })));
    }

    #[wasm_bindgen_test]
    fn test_parents_nearest_first() {
        let host = mount("q-p", r#"<section class="x"><div class="x"><span id="q-leaf"></span></div></section>"#);
        let leaf = dom::document().unwrap().get_element_by_id("q-leaf").unwrap();
        let found = parents(&Context::ElementNode(leaf), ".x").unwrap();
        let tags: Vec<_> = found.iter().map(|e| e.tag_name()).collect();
        assert_eq!(tags, vec!["DIV", "SECTION"]);
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_contains() {
        let host = mount("q-c", r#"<span id="q-c-in"></span>"#);
        let document = dom::document().unwrap();
        let inner = document.get_element_by_id("q-c-in").unwrap();
        let outside = document.create_element("span").unwrap();
        let ctx = Context::ElementNode(host.clone());
        assert!(contains(&ctx, &inner));
        assert!(!contains(&ctx, &outside));
        host.remove();
    }

    #[wasm_bindgen_test]
    async fn test_wait_element_appears_after_delay() {
        let ctx = Context::page().unwrap();
        let wait = wait_element(&ctx, &["#q-wait-late"], 1000, 50);
        let add = async {
            TimeoutFuture::new(100).await;
            mount("q-wait-late", "")
        };
        let (found, host) = futures::future::join(wait, add).await;
        assert!(found.unwrap().is_some());
        host.remove();
    }

    #[wasm_bindgen_test]
    async fn test_wait_element_times_out_as_not_found() {
        let ctx = Context::page().unwrap();
        let found = wait_element(&ctx, &["#q-wait-never"], 100, 20).await.unwrap();
        assert!(found.is_none());
    }
}

use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement, Node};

use crate::context::Context;

/// How the text of a node is read. Predicate matching and `text()` both
/// dispatch through this so they always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    TextInput,
    TextArea,
    Select,
    Rendered,
    NonElement,
}

impl ElementKind {
    pub fn from_tag(tag_name: &str) -> ElementKind {
        if tag_name.eq_ignore_ascii_case("input") {
            ElementKind::TextInput
        } else if tag_name.eq_ignore_ascii_case("textarea") {
            ElementKind::TextArea
        } else if tag_name.eq_ignore_ascii_case("select") {
            ElementKind::Select
        } else {
            ElementKind::Rendered
        }
    }

    pub fn of(node: &Node) -> ElementKind {
        match node.dyn_ref::<web_sys::Element>() {
            Some(element) => ElementKind::from_tag(&element.tag_name()),
            None => ElementKind::NonElement,
        }
    }
}

pub fn text_of(node: &Node) -> String {
    let kind = ElementKind::of(node);
    let extracted = match kind {
        ElementKind::TextInput => node.dyn_ref::<HtmlInputElement>().map(|input| input.value()),
        ElementKind::TextArea => node.dyn_ref::<HtmlTextAreaElement>().map(|area| area.value()),
        ElementKind::Select => node.dyn_ref::<HtmlSelectElement>().map(selected_labels),
        ElementKind::Rendered => node.dyn_ref::<HtmlElement>().map(|el| el.inner_text()),
        ElementKind::NonElement => None,
    };
    // Non-HTML elements (svg, mathml) have no innerText; fall back to raw text.
    extracted.unwrap_or_else(|| node.text_content().unwrap_or_default())
}

pub fn text(ctx: &Context) -> String {
    match ctx {
        Context::PageRoot(document) => document
            .document_element()
            .map(|root| text_of(&root))
            .unwrap_or_default(),
        Context::ElementNode(element) => text_of(element),
        Context::OtherNode(node) => text_of(node),
    }
}

fn selected_labels(select: &HtmlSelectElement) -> String {
    let options = select.selected_options();
    (0..options.length())
        .filter_map(|i| options.item(i))
        .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
        .map(|option| option.inner_text())
        .collect::<Vec<_>>()
        .join(",")
}

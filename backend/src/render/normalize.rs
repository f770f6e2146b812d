// src/render/normalize.rs

//! Structural clean-up of sanitized markup before display.

use std::sync::LazyLock;

use markup5ever_rcdom::Handle;
use regex::Regex;

use super::dom::{self, NodeSet};
use super::style;
use crate::error::RenderError;

/// Class the editor puts on block elements that stand in for list items.
const LIST_MARKER_CLASS: &str = "ql-list";
/// Zero-width helper span the editor injects for its own list rendering.
const EDITOR_UI_CLASS: &str = "ql-ui";
const LIST_KIND_ATTR: &str = "data-list";
const IFRAME_WRAPPER_CLASS: &str = "iframe-wrapper";
const TABLE_WRAPPER_CLASS: &str = "table-wrapper";

static ORDERED_KIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)order|number").expect("static regex"));

/// Runs every structural pass over `html` and serializes the result.
pub fn post_process(html: &str) -> Result<String, RenderError> {
    let root = dom::parse(html)?;
    strip_editor_ui(&root);
    merge_marker_lists(&root);
    fix_list_container_kinds(&root);
    wrap_embeds(&root);
    wrap_tables(&root);
    harden_links(&root);
    strip_list_kinds(&root);
    dom::inner_html(&root)
}

fn container_tag(kind: &str) -> &'static str {
    if ORDERED_KIND.is_match(kind) { "ol" } else { "ul" }
}

fn is_list_container(node: &Handle) -> bool {
    dom::is_tag(node, "ul") || dom::is_tag(node, "ol")
}

/// Builds a fresh `<li>` holding the children of `item`, keeping its inline style.
fn list_item_from(item: &Handle) -> Handle {
    let li = dom::create_element("li");
    if let Some(style) = dom::attr(item, "style") {
        dom::set_attr(&li, "style", &style);
    }
    dom::move_children(item, &li);
    li
}

fn strip_editor_ui(root: &Handle) {
    for node in dom::elements_by_tag(root, "span") {
        if dom::has_class(&node, EDITOR_UI_CLASS) {
            dom::detach(&node);
        }
    }
}

/// Turns runs of adjacent `.ql-list` blocks into real lists.
fn merge_marker_lists(root: &Handle) {
    let markers: Vec<Handle> = dom::descendant_elements(root)
        .into_iter()
        .filter(|n| dom::has_class(n, LIST_MARKER_CLASS))
        .collect();
    let mut processed = NodeSet::default();

    for node in &markers {
        if processed.contains(node) {
            continue;
        }
        if dom::closest(node, is_list_container).is_some() {
            processed.insert(node);
            continue;
        }

        let kind = marker_kind(node);
        let mut run = Vec::new();
        let mut current = Some(node.clone());
        while let Some(el) = current {
            if !dom::has_class(&el, LIST_MARKER_CLASS) || marker_kind(&el) != kind {
                break;
            }
            processed.insert(&el);
            current = dom::next_element_sibling(&el);
            run.push(el);
        }

        let list = dom::create_element(container_tag(&kind));
        dom::insert_before(&run[0], &list);
        for item in &run {
            let li = list_item_from(item);
            dom::append(&list, &li);
            dom::detach(item);
        }
    }
}

fn marker_kind(node: &Handle) -> String {
    dom::attr(node, LIST_KIND_ATTR)
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| "bullet".to_string())
}

/// Moves `li[data-list]` items whose kind disagrees with their container
/// into a container of the right kind.
fn fix_list_container_kinds(root: &Handle) {
    let items: Vec<Handle> = dom::elements_by_tag(root, "li")
        .into_iter()
        .filter(|n| dom::has_attr(n, LIST_KIND_ATTR))
        .collect();

    for li in &items {
        // Already moved by an earlier run.
        let Some(parent) = dom::parent(li) else {
            continue;
        };
        let raw_kind = dom::attr(li, LIST_KIND_ATTR).unwrap_or_default();
        let desired = container_tag(&raw_kind.to_ascii_lowercase());
        if dom::is_tag(&parent, desired) {
            continue;
        }

        let same_kind = |n: &Handle| {
            dom::is_tag(n, "li") && dom::attr(n, LIST_KIND_ATTR).unwrap_or_default() == raw_kind
        };
        let mut start = li.clone();
        while let Some(prev) = dom::previous_element_sibling(&start) {
            if !same_kind(&prev) {
                break;
            }
            start = prev;
        }
        let mut run = Vec::new();
        let mut current = Some(start);
        while let Some(el) = current {
            if !same_kind(&el) {
                break;
            }
            current = dom::next_element_sibling(&el);
            run.push(el);
        }
        let Some(last) = run.last() else {
            continue;
        };
        let trailing = dom::following_siblings(last);

        let list = dom::create_element(desired);
        if is_list_container(&parent) {
            dom::insert_after(&parent, &list);
            if trailing.iter().any(dom::is_element) {
                if let Some(rest) = dom::shallow_clone(&parent) {
                    for node in &trailing {
                        dom::append(&rest, node);
                    }
                    dom::insert_after(&list, &rest);
                }
            }
        } else {
            dom::insert_before(&run[0], &list);
        }

        for item in &run {
            let fresh = list_item_from(item);
            dom::append(&list, &fresh);
            dom::detach(item);
        }

        if is_list_container(&parent) && dom::element_children(&parent).is_empty() {
            dom::detach(&parent);
        }
    }
}

/// Responsive wrappers for fluid iframes, a width cap for fixed ones.
fn wrap_embeds(root: &Handle) {
    for iframe in dom::elements_by_tag(root, "iframe") {
        let src = dom::attr(&iframe, "src").unwrap_or_default();
        if src.trim().is_empty() {
            continue;
        }
        let inside_wrapper = dom::parent(&iframe)
            .and_then(|p| dom::closest(&p, |n| dom::has_class(n, IFRAME_WRAPPER_CLASS)))
            .is_some();
        if inside_wrapper {
            continue;
        }

        let inline = dom::attr(&iframe, "style").unwrap_or_default();
        let width = dom::attr(&iframe, "width")
            .filter(|w| !w.trim().is_empty())
            .or_else(|| style::declaration(&inline, "width"))
            .unwrap_or_default();

        if width.trim().is_empty() || width.contains('%') {
            let wrapper = dom::create_element("div");
            dom::set_attr(&wrapper, "class", IFRAME_WRAPPER_CLASS);
            if dom::has_attr(&iframe, "sandbox") {
                dom::set_attr(&wrapper, "data-has-sandbox", "1");
            }
            dom::wrap(&iframe, &wrapper);
        } else {
            let mut decls = style::declarations(&inline);
            style::set_declaration(&mut decls, "max-width", "100%");
            style::set_declaration(&mut decls, "display", "block");
            dom::set_attr(&iframe, "style", &style::serialize_declarations(&decls));
        }
    }
}

fn wrap_tables(root: &Handle) {
    for table in dom::elements_by_tag(root, "table") {
        let inside_wrapper = dom::parent(&table)
            .and_then(|p| dom::closest(&p, |n| dom::has_class(n, TABLE_WRAPPER_CLASS)))
            .is_some();
        if inside_wrapper {
            continue;
        }
        let wrapper = dom::create_element("div");
        dom::set_attr(&wrapper, "class", TABLE_WRAPPER_CLASS);
        dom::wrap(&table, &wrapper);
    }
}

fn harden_links(root: &Handle) {
    for link in dom::elements_by_tag(root, "a") {
        if dom::attr(&link, "target").is_none_or(|t| t.trim().is_empty()) {
            dom::set_attr(&link, "target", "_blank");
        }
        if dom::attr(&link, "rel").is_none_or(|r| r.trim().is_empty()) {
            dom::set_attr(&link, "rel", "noopener noreferrer");
        }
    }
}

fn strip_list_kinds(root: &Handle) {
    for node in dom::descendant_elements(root) {
        dom::remove_attr(&node, LIST_KIND_ATTR);
    }
}

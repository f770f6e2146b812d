// src/render/dom.rs

//! Thin helpers over an `html5ever` + `RcDom` tree.
//!
//! Every tree built here is detached from any document: the fragment root is
//! an `<html>` element whose parent has already been dropped, so nothing done
//! to it can leak outside the render call that owns it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, Namespace, ParseOpts, QualName, parse_fragment};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use crate::error::RenderError;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

fn html_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag))
}

fn attr_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

/// Parses `html` as the contents of a `<div>` and returns the fragment root.
pub fn parse(html: &str) -> Result<Handle, RenderError> {
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), html_name("div"), Vec::new())
        .one(html);
    // The document drains its descendants when dropped, so the root is
    // taken out of it rather than cloned.
    let root = dom.document.children.take().into_iter().next();
    let root = root.ok_or(RenderError::MissingRoot)?;
    let _ = root.parent.take();
    Ok(root)
}

/// Serializes the children of `node` (the equivalent of `innerHTML`).
pub fn inner_html(node: &Handle) -> Result<String, RenderError> {
    let mut buf = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    serialize(&mut buf, &SerializableHandle::from(node.clone()), opts)?;
    Ok(String::from_utf8(buf)?)
}

/// Creates a detached element with no attributes.
pub fn create_element(tag: &str) -> Handle {
    new_element(html_name(tag), Vec::new())
}

/// Creates a detached element with the same name and attributes as `node`,
/// but no children. `None` for non-element nodes.
pub fn shallow_clone(node: &Handle) -> Option<Handle> {
    match &node.data {
        NodeData::Element { name, attrs, .. } => Some(new_element(name.clone(), attrs.borrow().clone())),
        _ => None,
    }
}

fn new_element(name: QualName, attrs: Vec<Attribute>) -> Handle {
    Node::new(NodeData::Element {
        name,
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

pub fn tag_name(node: &Handle) -> Option<LocalName> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.clone()),
        _ => None,
    }
}

pub fn is_tag(node: &Handle, tag: &str) -> bool {
    match node.data {
        NodeData::Element { ref name, .. } => &*name.local == tag,
        _ => false,
    }
}

pub fn attr(node: &Handle, name: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(node: &Handle, name: &str) -> bool {
    attr(node, name).is_some()
}

pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|a| &*a.name.local == name) {
            Some(existing) => existing.value = StrTendril::from_slice(value),
            None => attrs.push(Attribute {
                name: attr_name(name),
                value: StrTendril::from_slice(value),
            }),
        }
    }
}

pub fn remove_attr(node: &Handle, name: &str) {
    if let NodeData::Element { ref attrs, .. } = node.data {
        attrs.borrow_mut().retain(|a| &*a.name.local != name);
    }
}

pub fn has_class(node: &Handle, class: &str) -> bool {
    attr(node, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

pub fn classes(node: &Handle) -> Vec<String> {
    attr(node, "class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn parent(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take()?;
    let parent = weak.upgrade();
    node.parent.set(Some(weak));
    parent
}

pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|c| is_element(c))
        .cloned()
        .collect()
}

/// All element descendants of `root` in document (pre-)order, root excluded.
pub fn descendant_elements(root: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack: Vec<Handle> = root.children.borrow().iter().rev().cloned().collect();
    while let Some(node) = stack.pop() {
        if is_element(&node) {
            out.push(node.clone());
        }
        stack.extend(node.children.borrow().iter().rev().cloned());
    }
    out
}

/// Descendant elements matching `tag`, in document order.
pub fn elements_by_tag(root: &Handle, tag: &str) -> Vec<Handle> {
    descendant_elements(root)
        .into_iter()
        .filter(|n| is_tag(n, tag))
        .collect()
}

/// Concatenated text of `root`, skipping script and style contents.
pub fn text_content(root: &Handle) -> String {
    let mut out = String::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        match node.data {
            NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
            NodeData::Element { ref name, .. }
                if &*name.local == "script" || &*name.local == "style" => {}
            _ => stack.extend(node.children.borrow().iter().rev().cloned()),
        }
    }
    out
}

/// The first ancestor-or-self element satisfying `pred`.
pub fn closest(node: &Handle, pred: impl Fn(&Handle) -> bool) -> Option<Handle> {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if is_element(&n) && pred(&n) {
            return Some(n);
        }
        current = parent(&n);
    }
    None
}

fn sibling_index(parent: &Handle, node: &Handle) -> Option<usize> {
    parent
        .children
        .borrow()
        .iter()
        .position(|c| Rc::ptr_eq(c, node))
}

pub fn next_element_sibling(node: &Handle) -> Option<Handle> {
    let parent = parent(node)?;
    let index = sibling_index(&parent, node)?;
    let children = parent.children.borrow();
    children[index + 1..].iter().find(|c| is_element(c)).cloned()
}

pub fn previous_element_sibling(node: &Handle) -> Option<Handle> {
    let parent = parent(node)?;
    let index = sibling_index(&parent, node)?;
    let children = parent.children.borrow();
    children[..index].iter().rev().find(|c| is_element(c)).cloned()
}

/// Every sibling node (text included) that follows `node`.
pub fn following_siblings(node: &Handle) -> Vec<Handle> {
    let Some(parent) = parent(node) else {
        return Vec::new();
    };
    let Some(index) = sibling_index(&parent, node) else {
        return Vec::new();
    };
    parent.children.borrow()[index + 1..].to_vec()
}

/// Removes `node` from its parent. A detached node is left untouched.
pub fn detach(node: &Handle) {
    if let Some(weak) = node.parent.take() {
        if let Some(parent) = weak.upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(c, node));
        }
    }
}

pub fn append(parent: &Handle, child: &Handle) {
    detach(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

fn insert_at_offset(reference: &Handle, node: &Handle, offset: usize) {
    let Some(parent) = parent(reference) else {
        return;
    };
    detach(node);
    let Some(index) = sibling_index(&parent, reference) else {
        return;
    };
    node.parent.set(Some(Rc::downgrade(&parent)));
    parent
        .children
        .borrow_mut()
        .insert(index + offset, node.clone());
}

pub fn insert_before(reference: &Handle, node: &Handle) {
    insert_at_offset(reference, node, 0);
}

pub fn insert_after(reference: &Handle, node: &Handle) {
    insert_at_offset(reference, node, 1);
}

/// Moves every child of `from` to the end of `to`.
pub fn move_children(from: &Handle, to: &Handle) {
    let children = from.children.take();
    for child in children {
        child.parent.set(Some(Rc::downgrade(to)));
        to.children.borrow_mut().push(child);
    }
}

/// Puts `wrapper` where `node` was and moves `node` inside it.
pub fn wrap(node: &Handle, wrapper: &Handle) {
    insert_before(node, wrapper);
    append(wrapper, node);
}

/// Identity set of nodes, for "already processed" bookkeeping during a walk.
#[derive(Default)]
pub struct NodeSet(HashSet<*const Node>);

impl NodeSet {
    pub fn insert(&mut self, node: &Handle) -> bool {
        self.0.insert(Rc::as_ptr(node))
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.0.contains(&Rc::as_ptr(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_serialize_roundtrip() {
        let root = parse("<p class=\"a\">one <b>two</b></p>").unwrap();
        assert_eq!(
            inner_html(&root).unwrap(),
            "<p class=\"a\">one <b>two</b></p>"
        );
    }

    #[test]
    fn fragment_root_is_detached() {
        let root = parse("<p>x</p>").unwrap();
        assert!(parent(&root).is_none());
    }

    #[test]
    fn wrap_moves_node_into_wrapper() {
        let root = parse("<p>a</p><table><tr><td>1</td></tr></table>").unwrap();
        let table = elements_by_tag(&root, "table").remove(0);
        let wrapper = create_element("div");
        set_attr(&wrapper, "class", "table-wrapper");
        wrap(&table, &wrapper);
        let html = inner_html(&root).unwrap();
        assert!(html.starts_with("<p>a</p><div class=\"table-wrapper\"><table>"));
        assert!(closest(&table, |n| has_class(n, "table-wrapper")).is_some());
    }

    #[test]
    fn sibling_navigation_skips_text() {
        let root = parse("<p id=\"1\">a</p>\n<p id=\"2\">b</p>").unwrap();
        let first = elements_by_tag(&root, "p").remove(0);
        let next = next_element_sibling(&first).unwrap();
        assert_eq!(attr(&next, "id").as_deref(), Some("2"));
        let back = previous_element_sibling(&next).unwrap();
        assert!(Rc::ptr_eq(&back, &first));
    }

    #[test]
    fn attributes_are_set_and_removed() {
        let root = parse("<a href=\"x\">l</a>").unwrap();
        let a = elements_by_tag(&root, "a").remove(0);
        set_attr(&a, "target", "_blank");
        set_attr(&a, "href", "y");
        remove_attr(&a, "target");
        assert_eq!(attr(&a, "href").as_deref(), Some("y"));
        assert!(!has_attr(&a, "target"));
    }

    #[test]
    fn text_content_skips_script() {
        let root = parse("<p>hi <script>evil()</script>there</p>").unwrap();
        assert_eq!(text_content(&root), "hi there");
    }

    #[test]
    fn created_elements_serialize_as_html() {
        let root = parse("<p>x</p>").unwrap();
        let list = create_element("ul");
        let item = create_element("li");
        append(&list, &item);
        append(&root, &list);
        assert!(parent(&list).is_some());
        assert_eq!(inner_html(&root).unwrap(), "<p>x</p><ul><li></li></ul>");
    }

    #[test]
    fn shallow_clone_copies_attributes_only() {
        let root = parse("<ol class=\"x\" start=\"3\"><li>a</li></ol>").unwrap();
        let ol = elements_by_tag(&root, "ol").remove(0);
        let copy = shallow_clone(&ol).unwrap();
        assert_eq!(attr(&copy, "start").as_deref(), Some("3"));
        assert!(element_children(&copy).is_empty());
        assert!(parent(&copy).is_none());

        let text = root.children.borrow()[0].children.borrow()[0].clone();
        assert!(shallow_clone(&text).is_none());
    }
}

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::dom::events::{DispatchResult, DomEvent, Listener};
use crate::dom::style::{InlineStyle, parse_inline_style};

// ============================================================================
// Node arena
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    /// Root of an encapsulated subtree attached to `host`.
    ShadowRoot { host: NodeId, open: bool },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A file attached to a file input (or carried by a simulated drop).
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub value: String,
    pub checked: bool,
    pub selected: bool,
    pub files: Vec<FileEntry>,
    pub shadow_root: Option<NodeId>,
    /// Explicit layout box; when absent the box is derived from style and tag.
    pub layout: Option<Rect>,
    /// Script-visible expando properties (framework internals live here).
    pub properties: HashMap<String, String>,
}

impl Element {
    pub fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        let tag = tag.to_ascii_lowercase();
        let attrs: Vec<(String, String)> = attrs
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        let lookup = |name: &str| attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());

        let value = match tag.as_str() {
            "input" => lookup("value").unwrap_or_default(),
            _ => String::new(),
        };
        let checked = tag == "input" && lookup("checked").is_some();
        let selected = tag == "option" && lookup("selected").is_some();

        Self {
            tag,
            attrs,
            value,
            checked,
            selected,
            files: vec![],
            shadow_root: None,
            layout: None,
            properties: HashMap::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    /// Lowercased `type` for `<input>`, defaulting to `text`.
    pub fn input_type(&self) -> Option<String> {
        if self.tag != "input" {
            return None;
        }
        Some(
            self.attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "text".to_string()),
        )
    }

    pub fn role(&self) -> Option<String> {
        self.attr("role")
            .map(|r| r.trim().to_ascii_lowercase())
            .filter(|r| !r.is_empty())
    }
}

// ============================================================================
// Document
// ============================================================================

pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    listeners: Vec<Listener>,
    event_log: Vec<DomEvent>,
    active_element: Option<NodeId>,
    blobs: HashMap<String, FileEntry>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("events", &self.event_log.len())
            .field("active_element", &self.active_element)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

const LABELABLE_TAGS: &[&str] = &["input", "select", "textarea", "button", "meter", "output", "progress"];
const DISABLEABLE_TAGS: &[&str] = &["input", "select", "textarea", "button", "fieldset", "option", "optgroup"];
const NON_TEXT_INPUT_TYPES: &[&str] = &[
    "checkbox", "radio", "file", "hidden", "submit", "button", "reset", "image", "range", "color",
];

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: vec![],
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            listeners: vec![],
            event_log: vec![],
            active_element: None,
            blobs: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ---- Construction ----

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: vec![],
            kind,
        });
        id
    }

    pub fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push_node(NodeKind::Element(Element::new(tag, attrs)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Builder shortcut: create an element with attributes and append it.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let id = self.create_element(tag, attrs);
        self.append_child(parent, id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    pub fn remove_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.remove_children(node);
        if !text.is_empty() {
            self.append_text(node, text);
        }
    }

    /// Attach (or return the existing) shadow root of `host`.
    pub fn attach_shadow(&mut self, host: NodeId, open: bool) -> NodeId {
        if let Some(existing) = self.shadow_root(host) {
            return existing;
        }
        let root = self.push_node(NodeKind::ShadowRoot { host, open });
        if let Some(el) = self.element_mut(host) {
            el.shadow_root = Some(root);
        }
        root
    }

    // ---- Node access ----

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_shadow_root(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id.0).map(|n| &n.kind),
            Some(NodeKind::ShadowRoot { .. })
        )
    }

    pub fn is_document(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0).map(|n| &n.kind), Some(NodeKind::Document))
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.element(host).and_then(|el| el.shadow_root)
    }

    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        match self.nodes.get(root.0).map(|n| &n.kind) {
            Some(NodeKind::ShadowRoot { host, .. }) => Some(*host),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> &str {
        self.element(id).map(|el| el.tag.as_str()).unwrap_or("")
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.remove_attr(name);
        }
    }

    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class_name))
    }

    pub fn class_attr(&self, id: NodeId) -> &str {
        self.attr(id, "class").unwrap_or("")
    }

    pub fn add_class(&mut self, id: NodeId, class_name: &str) {
        if self.has_class(id, class_name) {
            return;
        }
        let current = self.class_attr(id).trim().to_string();
        let next = if current.is_empty() {
            class_name.to_string()
        } else {
            format!("{} {}", current, class_name)
        };
        self.set_attr(id, "class", &next);
    }

    pub fn remove_class(&mut self, id: NodeId, class_name: &str) {
        if !self.has_class(id, class_name) {
            return;
        }
        let next = self
            .class_attr(id)
            .split_whitespace()
            .filter(|c| *c != class_name)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", &next);
    }

    pub fn role(&self, id: NodeId) -> Option<String> {
        self.element(id).and_then(|el| el.role())
    }

    pub fn input_type(&self, id: NodeId) -> Option<String> {
        self.element(id).and_then(|el| el.input_type())
    }

    pub fn property(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id)
            .and_then(|el| el.properties.get(key))
            .map(|v| v.as_str())
    }

    pub fn set_property(&mut self, id: NodeId, key: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.properties.insert(key.to_string(), value.to_string());
        }
    }

    pub fn has_property_prefix(&self, id: NodeId, prefix: &str) -> bool {
        self.element(id)
            .is_some_and(|el| el.properties.keys().any(|k| k.starts_with(prefix)))
    }

    // ---- Tree navigation ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Parent element within the same tree (never crosses a shadow boundary).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    /// Parent element in the composed tree: a shadow root's children report the host.
    pub fn composed_parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        if self.is_element(parent) {
            Some(parent)
        } else {
            self.shadow_host(parent)
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Light-tree descendant elements in preorder, excluding `id`.
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.is_element(current) {
                out.push(current);
                stack.extend(self.children(current).iter().rev().copied());
            }
        }
        out
    }

    /// Descendant elements including everything inside nested shadow trees.
    pub fn composed_descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        if let Some(shadow) = self.shadow_root(id) {
            stack.push(shadow);
        }
        while let Some(current) = stack.pop() {
            if self.is_shadow_root(current) {
                stack.extend(self.children(current).iter().rev().copied());
                continue;
            }
            if self.is_element(current) {
                out.push(current);
                stack.extend(self.children(current).iter().rev().copied());
                if let Some(shadow) = self.shadow_root(current) {
                    stack.push(shadow);
                }
            }
        }
        out
    }

    /// Ancestor elements nearest-first, stopping at the tree root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent_element(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent_element(node);
        }
        out
    }

    /// Ancestor elements nearest-first, continuing through shadow hosts.
    pub fn composed_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.composed_parent_element(id);
        while let Some(node) = current {
            out.push(node);
            current = self.composed_parent_element(node);
        }
        out
    }

    /// Document node or shadow root that owns `id`.
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    pub fn composed_contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = match self.parent(n) {
                Some(p) => Some(p),
                None => self.shadow_host(n),
            };
        }
        false
    }

    /// Number of composed ancestor elements.
    pub fn depth(&self, id: NodeId) -> usize {
        self.composed_ancestors(id).len()
    }

    /// Nearest element containing every node (light tree).
    pub fn common_ancestor(&self, nodes: &[NodeId]) -> Option<NodeId> {
        let (first, rest) = nodes.split_first()?;
        let mut chain = self.ancestors(*first);
        if rest.is_empty() {
            return chain.first().copied();
        }
        chain.retain(|anc| rest.iter().all(|n| self.contains(*anc, *n)));
        chain.first().copied()
    }

    /// Composed preorder position of every node: host, its shadow tree, then light children.
    pub fn composed_order(&self) -> HashMap<NodeId, usize> {
        let mut order = HashMap::new();
        let mut stack = vec![self.root];
        let mut index = 0usize;
        while let Some(current) = stack.pop() {
            order.insert(current, index);
            index += 1;
            stack.extend(self.children(current).iter().rev().copied());
            if let Some(shadow) = self.shadow_root(current) {
                stack.push(shadow);
            }
        }
        order
    }

    pub fn get_element_by_id(&self, scope_root: NodeId, element_id: &str) -> Option<NodeId> {
        if element_id.is_empty() {
            return None;
        }
        self.descendant_elements(scope_root)
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(element_id))
    }

    /// Nearest enclosing `<form>`, or the one named by the `form` attribute.
    pub fn form_owner(&self, id: NodeId) -> Option<NodeId> {
        if let Some(form_id) = self.attr(id, "form") {
            if let Some(form) = self.get_element_by_id(self.tree_root(id), form_id) {
                return Some(form);
            }
        }
        self.ancestors(id).into_iter().find(|a| self.tag(*a) == "form")
    }

    // ---- Text ----

    fn text_parts(&self, id: NodeId) -> Vec<String> {
        let mut parts = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current.0) else {
                continue;
            };
            match &node.kind {
                NodeKind::Text(text) => parts.push(text.clone()),
                NodeKind::Element(el)
                    if matches!(el.tag.as_str(), "script" | "style" | "template") => {}
                _ => stack.extend(node.children.iter().rev().copied()),
            }
        }
        parts
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.text_parts(id).concat()
    }

    /// Text content with runs of whitespace collapsed and node boundaries spaced.
    pub fn normalized_text(&self, id: NodeId) -> String {
        collapse_whitespace(&self.text_parts(id).join(" "))
    }

    /// Direct text-node children only.
    pub fn own_text(&self, id: NodeId) -> String {
        let text = self
            .children(id)
            .iter()
            .filter_map(|c| match &self.nodes[c.0].kind {
                NodeKind::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");
        collapse_whitespace(&text)
    }

    // ---- Form state ----

    pub fn value(&self, id: NodeId) -> String {
        let Some(el) = self.element(id) else {
            return String::new();
        };
        match el.tag.as_str() {
            "select" => self
                .selected_options(id)
                .first()
                .map(|o| self.option_value(*o))
                .unwrap_or_default(),
            "option" => self.option_value(id),
            _ => el.value.clone(),
        }
    }

    /// Property write; `<select>` selects the first option whose value matches.
    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if self.tag(id) == "select" {
            let options = self.options_of(id);
            let mut matched = false;
            for option in options {
                let is_match = !matched && self.option_value(option) == value;
                if is_match {
                    matched = true;
                }
                self.set_selected(option, is_match);
            }
            return;
        }
        if let Some(el) = self.element_mut(id) {
            el.value = value.to_string();
        }
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.checked)
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(id) {
            el.checked = checked;
        }
    }

    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => self.normalized_text(option),
        }
    }

    pub fn option_text(&self, option: NodeId) -> String {
        let text = self.normalized_text(option);
        if text.is_empty() {
            self.attr(option, "label").unwrap_or("").to_string()
        } else {
            text
        }
    }

    pub fn options_of(&self, select: NodeId) -> Vec<NodeId> {
        self.descendant_elements(select)
            .into_iter()
            .filter(|n| self.tag(*n) == "option")
            .collect()
    }

    pub fn is_selected(&self, option: NodeId) -> bool {
        self.element(option).is_some_and(|el| el.selected)
    }

    pub fn set_selected(&mut self, option: NodeId, selected: bool) {
        if let Some(el) = self.element_mut(option) {
            el.selected = selected;
        }
    }

    /// Selected options; a single select with nothing selected shows its first option.
    pub fn selected_options(&self, select: NodeId) -> Vec<NodeId> {
        let options = self.options_of(select);
        let selected: Vec<NodeId> = options
            .iter()
            .copied()
            .filter(|o| self.is_selected(*o))
            .collect();
        if !selected.is_empty() || self.has_attr(select, "multiple") {
            return selected;
        }
        options
            .into_iter()
            .find(|o| !self.has_attr(*o, "disabled"))
            .into_iter()
            .collect()
    }

    pub fn files(&self, id: NodeId) -> &[FileEntry] {
        self.element(id).map(|el| el.files.as_slice()).unwrap_or(&[])
    }

    pub fn set_files(&mut self, id: NodeId, files: Vec<FileEntry>) {
        if let Some(el) = self.element_mut(id) {
            el.files = files;
        }
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if DISABLEABLE_TAGS.contains(&el.tag.as_str()) && el.has_attr("disabled") {
            return true;
        }
        self.ancestors(id)
            .into_iter()
            .any(|a| self.tag(a) == "fieldset" && self.has_attr(a, "disabled"))
    }

    pub fn is_content_editable(&self, id: NodeId) -> bool {
        match self.attr(id, "contenteditable") {
            Some(v) => !v.eq_ignore_ascii_case("false"),
            None => false,
        }
    }

    /// Whether typing into the element changes its text.
    pub fn is_text_editable(&self, id: NodeId) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if self.is_disabled(id) || el.has_attr("readonly") {
            return false;
        }
        match el.tag.as_str() {
            "textarea" => true,
            "input" => el
                .input_type()
                .is_some_and(|t| !NON_TEXT_INPUT_TYPES.contains(&t.as_str())),
            _ => self.is_content_editable(id),
        }
    }

    // ---- Style & layout ----

    pub fn computed_style(&self, id: NodeId) -> InlineStyle {
        let mut style = parse_inline_style(self.attr(id, "style"));
        if self.has_attr(id, "hidden") && style.display.is_none() {
            style.display = Some("none".to_string());
        }
        style
    }

    /// False when the element or any composed ancestor is `display:none`.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        if !self.is_element(id) {
            return false;
        }
        std::iter::once(id)
            .chain(self.composed_ancestors(id))
            .all(|n| !self.computed_style(n).is_display_none())
    }

    pub fn set_layout(&mut self, id: NodeId, rect: Rect) {
        if let Some(el) = self.element_mut(id) {
            el.layout = Some(rect);
        }
    }

    /// Layout box from explicit layout, inline size, or tag defaults.
    pub fn bounding_rect(&self, id: NodeId) -> Rect {
        if !self.is_rendered(id) {
            return Rect::default();
        }
        let Some(el) = self.element(id) else {
            return Rect::default();
        };
        if let Some(rect) = &el.layout {
            return rect.clone();
        }
        let style = self.computed_style(id);
        let (default_width, default_height) = self.default_box(id, el);
        Rect {
            x: style.left.unwrap_or(0.0),
            y: style.top.unwrap_or(0.0),
            width: style.width.unwrap_or(default_width),
            height: style.height.unwrap_or(default_height),
        }
    }

    fn default_box(&self, id: NodeId, el: &Element) -> (f64, f64) {
        match el.tag.as_str() {
            "input" => match el.input_type().as_deref() {
                Some("checkbox") | Some("radio") => (16.0, 16.0),
                Some("hidden") => (0.0, 0.0),
                Some("file") => (250.0, 30.0),
                _ => (200.0, 24.0),
            },
            "textarea" => (300.0, 60.0),
            "select" => (200.0, 24.0),
            "button" => (80.0, 30.0),
            "option" => (200.0, 20.0),
            "label" | "span" | "a" | "legend" | "strong" | "em" | "b" | "i" | "small" => {
                if self.children(id).is_empty() && el.shadow_root.is_none() {
                    (0.0, 0.0)
                } else {
                    (80.0, 18.0)
                }
            }
            "br" | "script" | "style" | "template" | "meta" | "link" | "head" | "title" => {
                (0.0, 0.0)
            }
            _ => {
                let mut kids = self.element_children(id);
                if let Some(shadow) = el.shadow_root {
                    kids.extend(self.element_children(shadow));
                }
                let content: f64 = kids.iter().map(|k| self.bounding_rect(*k).height).sum();
                let has_text = !self.own_text(id).is_empty();
                if content <= 0.0 && !has_text {
                    // Empty widgets still occupy space when they are interactive.
                    if el.tag.contains('-')
                        || el.has_attr("contenteditable")
                        || el.has_attr("role")
                        || el.has_attr("tabindex")
                    {
                        (200.0, 24.0)
                    } else {
                        (0.0, 0.0)
                    }
                } else {
                    (600.0, content.max(20.0))
                }
            }
        }
    }

    // ---- Events ----

    pub fn listen(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: impl Fn(&mut Document, &DomEvent) + 'static,
    ) {
        self.listeners.push(Listener {
            node,
            event_type: event_type.to_string(),
            handler: Rc::new(handler),
        });
    }

    fn event_path(&self, event: &DomEvent) -> Vec<NodeId> {
        let mut path = vec![event.target];
        if !event.bubbles {
            return path;
        }
        let mut current = event.target;
        loop {
            let next = match self.parent(current) {
                Some(p) => Some(p),
                None if event.composed => self.shadow_host(current),
                None => None,
            };
            match next {
                Some(n) => {
                    path.push(n);
                    current = n;
                }
                None => break,
            }
        }
        path
    }

    /// Record the event and run matching listeners along the composed path.
    pub fn dispatch_event(&mut self, event: DomEvent) -> DispatchResult {
        let path = self.event_path(&event);
        let handlers: Vec<_> = path
            .iter()
            .flat_map(|node| {
                self.listeners
                    .iter()
                    .filter(|l| l.node == *node && l.event_type == event.event_type)
                    .map(|l| Rc::clone(&l.handler))
                    .collect::<Vec<_>>()
            })
            .collect();

        self.event_log.push(event.clone());
        for handler in &handlers {
            handler(self, &event);
        }

        DispatchResult {
            handled: handlers.len(),
        }
    }

    pub fn event_log(&self) -> &[DomEvent] {
        &self.event_log
    }

    /// Count of logged events of `event_type` targeted at `target`.
    pub fn events_for(&self, target: NodeId, event_type: &str) -> usize {
        self.event_log
            .iter()
            .filter(|e| e.target == target && e.event_type == event_type)
            .count()
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    pub fn focus(&mut self, id: NodeId) {
        if self.active_element == Some(id) {
            return;
        }
        if let Some(previous) = self.active_element {
            self.blur(previous);
        }
        self.active_element = Some(id);
        self.dispatch_event(DomEvent::focus(id));
        self.dispatch_event(DomEvent::new("focusin", id));
    }

    pub fn blur(&mut self, id: NodeId) {
        if self.active_element != Some(id) {
            return;
        }
        self.active_element = None;
        self.dispatch_event(DomEvent::blur(id));
        self.dispatch_event(DomEvent::new("focusout", id));
    }

    /// Pointer sequence plus native activation behavior.
    pub fn click(&mut self, id: NodeId) -> DispatchResult {
        if self.is_disabled(id) {
            return DispatchResult::default();
        }
        self.dispatch_event(DomEvent::new("mousedown", id));
        self.dispatch_event(DomEvent::new("mouseup", id));

        let toggled = self.run_activation(id);
        let result = self.dispatch_event(DomEvent::new("click", id));

        if toggled {
            self.dispatch_event(DomEvent::new("input", id));
            self.dispatch_event(DomEvent::change(id));
        } else if let Some(control) = self.label_forward_target(id) {
            self.click(control);
        }

        result
    }

    fn run_activation(&mut self, id: NodeId) -> bool {
        let Some(input_type) = self.input_type(id) else {
            return false;
        };
        match input_type.as_str() {
            "checkbox" => {
                let next = !self.checked(id);
                self.set_checked(id, next);
                true
            }
            "radio" if !self.checked(id) => {
                self.check_radio_exclusive(id);
                true
            }
            _ => false,
        }
    }

    /// Check a radio and clear the others sharing its name, tree and form.
    pub fn check_radio_exclusive(&mut self, id: NodeId) {
        self.set_checked(id, true);
        let Some(name) = self.attr(id, "name").map(str::to_string) else {
            return;
        };
        if name.is_empty() {
            return;
        }
        let owner = self.form_owner(id);
        let peers: Vec<NodeId> = self
            .descendant_elements(self.tree_root(id))
            .into_iter()
            .filter(|n| {
                *n != id
                    && self.input_type(*n).as_deref() == Some("radio")
                    && self.attr(*n, "name") == Some(name.as_str())
                    && self.form_owner(*n) == owner
            })
            .collect();
        for peer in peers {
            self.set_checked(peer, false);
        }
    }

    fn label_forward_target(&self, id: NodeId) -> Option<NodeId> {
        if LABELABLE_TAGS.contains(&self.tag(id)) {
            return None;
        }
        let label = if self.tag(id) == "label" {
            id
        } else {
            self.ancestors(id)
                .into_iter()
                .find(|a| self.tag(*a) == "label")?
        };
        self.label_control(label).filter(|c| *c != id)
    }

    /// The control a `<label>` is associated with.
    pub fn label_control(&self, label: NodeId) -> Option<NodeId> {
        if let Some(target) = self.attr(label, "for") {
            return self.get_element_by_id(self.tree_root(label), target);
        }
        self.descendant_elements(label).into_iter().find(|n| {
            LABELABLE_TAGS.contains(&self.tag(*n)) && self.input_type(*n).as_deref() != Some("hidden")
        })
    }

    /// `document.execCommand("insertText")` on the focused element, replacing its text.
    pub fn exec_insert_text(&mut self, text: &str) -> bool {
        let Some(target) = self.active_element else {
            return false;
        };
        if !self.is_text_editable(target) {
            return false;
        }
        self.dispatch_event(DomEvent::before_input(target, text));
        if self.is_content_editable(target) {
            self.set_text_content(target, text);
        } else {
            self.set_value(target, text);
        }
        self.dispatch_event(DomEvent::input(target, Some(text)));
        true
    }

    // ---- Object URLs ----

    pub fn register_blob(&mut self, url: &str, file: FileEntry) {
        self.blobs.insert(url.to_string(), file);
    }

    pub fn blob(&self, url: &str) -> Option<&FileEntry> {
        self.blobs.get(url)
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

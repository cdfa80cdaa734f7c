use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mastro_html::{Value, escape_attribute, escape_body};
use tracing::trace;

use crate::error::DomError;
use crate::event::{Event, Listener, ListenerId};
use crate::parse::{Parsed, is_void_element, parse_fragment};
use crate::selector::Selector;
use crate::style::{dataset_attribute, dataset_key, style_lookup, style_with};

/// Handle to a node. Stays cheap to copy; using it after the node was freed
/// gives [`DomError::StaleNode`] instead of touching whatever reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A JavaScript-style property value on an element.
#[derive(Clone)]
pub enum Property {
    Value(Value),
    /// An arbitrary shared object, e.g. a reactive accessor handed from a
    /// parent component to a child.
    Shared(Rc<dyn Any>),
}

impl Property {
    pub fn shared<T: 'static>(value: T) -> Property {
        Property::Shared(Rc::new(value))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Property::Value(v) => Some(v),
            Property::Shared(_) => None,
        }
    }

    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        match self {
            Property::Shared(any) => any.clone().downcast::<T>().ok(),
            Property::Value(_) => None,
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Property::Value(v) => v.is_truthy(),
            Property::Shared(_) => true,
        }
    }

    fn to_text(&self) -> String {
        match self {
            Property::Value(v) => v.to_string(),
            Property::Shared(_) => String::new(),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Property::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Property::Value(a), Property::Value(b)) => a == b,
            (Property::Shared(a), Property::Shared(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for Property {
    fn from(v: Value) -> Self {
        Property::Value(v)
    }
}

/// Connected elements a tree change removed and added, each in tree order.
///
/// The document never calls back into its owner; the host uses this to run
/// connect/disconnect lifecycle hooks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mutation {
    pub removed: Vec<NodeId>,
    pub added: Vec<NodeId>,
}

impl Mutation {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    pub fn extend(&mut self, other: Mutation) {
        self.removed.extend(other.removed);
        self.added.extend(other.added);
    }
}

const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "autofocus",
    "checked",
    "disabled",
    "hidden",
    "multiple",
    "open",
    "readonly",
    "required",
    "selected",
];

const STRING_ATTRIBUTES: &[&str] = &[
    "alt",
    "dir",
    "href",
    "id",
    "lang",
    "name",
    "placeholder",
    "role",
    "src",
    "title",
    "type",
];

/// Attribute reflected by a property, if any.
fn reflected_attribute(property: &str) -> Option<(String, bool)> {
    let lower = property.to_ascii_lowercase();
    match property {
        "className" | "class" => Some(("class".into(), false)),
        "htmlFor" => Some(("for".into(), false)),
        _ if BOOLEAN_ATTRIBUTES.contains(&lower.as_str()) => Some((lower, true)),
        _ if STRING_ATTRIBUTES.contains(&property) => Some((lower, false)),
        _ => None,
    }
}

enum NodeKind {
    Element(Element),
    Text(String),
    Comment(String),
}

struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    properties: BTreeMap<String, Property>,
    nested: BTreeMap<String, BTreeMap<String, Value>>,
    listeners: Vec<(ListenerId, String, Listener)>,
}

impl Element {
    fn new(tag: String, attrs: Vec<(String, String)>) -> Self {
        Element {
            tag,
            attrs,
            properties: BTreeMap::new(),
            nested: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attribute(&mut self, name: String, value: String) {
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(attr) => attr.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }
}

struct NodeEntry {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    entry: Option<NodeEntry>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_listener: u64,
}

impl Arena {
    fn entry(&self, id: NodeId) -> Result<&NodeEntry, DomError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(DomError::StaleNode(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, DomError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(DomError::StaleNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&Element, DomError> {
        match &self.entry(id)?.kind {
            NodeKind::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match &mut self.entry_mut(id)?.kind {
            NodeKind::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let entry = NodeEntry {
            kind,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Free `id` and its whole subtree. The caller detaches it first.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index as usize)
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };
            if let Some(entry) = slot.entry.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                stack.extend(entry.children);
            }
        }
    }

    fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.entry_mut(id)?.parent.take() {
            if let Ok(entry) = self.entry_mut(parent) {
                entry.children.retain(|c| *c != id);
            }
        }
        Ok(())
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).ok().and_then(|e| e.parent)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    /// Elements of the subtree rooted at `id`, in tree order.
    fn elements(&self, id: NodeId, include_self: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Ok(entry) = self.entry(cur) else {
                continue;
            };
            if matches!(entry.kind, NodeKind::Element(_)) && (include_self || cur != id) {
                out.push(cur);
            }
            stack.extend(entry.children.iter().rev());
        }
        out
    }

    fn insert_parsed(&mut self, parent: NodeId, parsed: Vec<Parsed>) -> Result<(), DomError> {
        for node in parsed {
            let (kind, children) = match node {
                Parsed::Element {
                    tag,
                    attrs,
                    children,
                } => (NodeKind::Element(Element::new(tag, attrs)), children),
                Parsed::Text(text) => (NodeKind::Text(text), Vec::new()),
                Parsed::Comment(text) => (NodeKind::Comment(text), Vec::new()),
            };
            let id = self.alloc(kind);
            self.entry_mut(id)?.parent = Some(parent);
            self.entry_mut(parent)?.children.push(id);
            self.insert_parsed(id, children)?;
        }
        Ok(())
    }

    fn text_content(&self, id: NodeId, out: &mut String) {
        let Ok(entry) = self.entry(id) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            NodeKind::Element(_) => {
                for child in &entry.children {
                    self.text_content(*child, out);
                }
            }
        }
    }

    fn serialize(&self, id: NodeId, raw_text: bool, out: &mut String) {
        let Ok(entry) = self.entry(id) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(text) if raw_text => out.push_str(text),
            NodeKind::Text(text) => out.push_str(&escape_body(text)),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                self.serialize_children(id, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    fn serialize_children(&self, id: NodeId, out: &mut String) {
        let Ok(entry) = self.entry(id) else {
            return;
        };
        let raw_text = matches!(&entry.kind, NodeKind::Element(el) if el.tag == "script" || el.tag == "style");
        for child in &entry.children {
            self.serialize(*child, raw_text, out);
        }
    }
}

/// An in-memory document: an arena of element, text and comment nodes with
/// a `body` element as the connected root.
///
/// `Document` is a cheap handle; clones share the same tree. Methods never
/// hold a borrow while running user callbacks, so event listeners may freely
/// read and modify the document.
#[derive(Clone)]
pub struct Document {
    arena: Rc<RefCell<Arena>>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("body", &self.body)
            .field("nodes", &self.node_count())
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let body = arena.alloc(NodeKind::Element(Element::new("body".into(), Vec::new())));
        Document {
            arena: Rc::new(RefCell::new(arena)),
            body,
        }
    }

    /// A document whose body holds the parsed `html`.
    pub fn parse(html: &str) -> Self {
        let doc = Document::new();
        let mut arena = doc.arena.borrow_mut();
        // `body` was just allocated, inserting into it cannot fail.
        let _ = arena.insert_parsed(doc.body, parse_fragment(html));
        drop(arena);
        doc
    }

    /// The connected root.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Live nodes, including detached ones.
    pub fn node_count(&self) -> usize {
        self.arena
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    pub fn exists(&self, id: NodeId) -> bool {
        self.arena.borrow().entry(id).is_ok()
    }

    // ---- tree ----

    pub fn create_element(&self, tag: &str) -> NodeId {
        let element = Element::new(tag.to_ascii_lowercase(), Vec::new());
        self.arena.borrow_mut().alloc(NodeKind::Element(element))
    }

    pub fn create_text_node(&self, text: &str) -> NodeId {
        self.arena.borrow_mut().alloc(NodeKind::Text(text.to_string()))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.borrow().parent(id)
    }

    /// All child nodes, including text and comments.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.arena
            .borrow()
            .entry(id)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        let arena = self.arena.borrow();
        self.children(id)
            .into_iter()
            .filter(|c| arena.element(*c).is_ok())
            .collect()
    }

    /// Descendant elements of `root` in document order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        self.arena.borrow().elements(root, false)
    }

    /// Parents of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let arena = self.arena.borrow();
        let mut out = Vec::new();
        let mut cur = arena.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = arena.parent(p);
        }
        out
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.arena.borrow().is_ancestor_or_self(ancestor, node)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.exists(id) && self.contains(self.body, id)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.arena.borrow().element(id).is_ok()
    }

    /// Lower-case tag name; `None` for text, comments and stale ids.
    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.arena.borrow().element(id).ok().map(|el| el.tag.clone())
    }

    /// Move `child` (with its subtree) to the end of `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<Mutation, DomError> {
        let mut arena = self.arena.borrow_mut();
        arena.element(parent)?;
        arena.entry(child)?;
        if child == self.body {
            return Err(DomError::RemoveRoot);
        }
        if arena.is_ancestor_or_self(child, parent) {
            return Err(DomError::Hierarchy { parent, child });
        }

        let mut mutation = Mutation::default();
        if arena.is_ancestor_or_self(self.body, child) {
            mutation.removed = arena.elements(child, true);
        }
        arena.detach(child)?;
        arena.entry_mut(child)?.parent = Some(parent);
        arena.entry_mut(parent)?.children.push(child);
        if arena.is_ancestor_or_self(self.body, parent) {
            mutation.added = arena.elements(child, true);
        }
        trace!(?parent, ?child, "append child");
        Ok(mutation)
    }

    /// Detach `id` from its parent. The node stays alive and can be appended again.
    pub fn remove(&self, id: NodeId) -> Result<Mutation, DomError> {
        if id == self.body {
            return Err(DomError::RemoveRoot);
        }
        let mut arena = self.arena.borrow_mut();
        arena.entry(id)?;
        let mut mutation = Mutation::default();
        if arena.is_ancestor_or_self(self.body, id) {
            mutation.removed = arena.elements(id, true);
        }
        arena.detach(id)?;
        trace!(?id, "remove");
        Ok(mutation)
    }

    fn replace_children(&self, id: NodeId, parsed: Vec<Parsed>) -> Result<Mutation, DomError> {
        let mut arena = self.arena.borrow_mut();
        arena.element(id)?;
        let connected = arena.is_ancestor_or_self(self.body, id);

        let mut mutation = Mutation::default();
        if connected {
            mutation.removed = arena.elements(id, false);
        }
        let old = std::mem::take(&mut arena.entry_mut(id)?.children);
        for child in old {
            if let Ok(entry) = arena.entry_mut(child) {
                entry.parent = None;
            }
            arena.release(child);
        }

        arena.insert_parsed(id, parsed)?;
        if connected {
            mutation.added = arena.elements(id, false);
        }
        Ok(mutation)
    }

    /// Replace the content of `id` with parsed `html`. Replaced nodes are freed.
    pub fn set_inner_html(&self, id: NodeId, html: &str) -> Result<Mutation, DomError> {
        trace!(?id, len = html.len(), "set innerHTML");
        self.replace_children(id, parse_fragment(html))
    }

    pub fn set_text_content(&self, id: NodeId, text: &str) -> Result<Mutation, DomError> {
        let parsed = if text.is_empty() {
            Vec::new()
        } else {
            vec![Parsed::Text(text.to_string())]
        };
        self.replace_children(id, parsed)
    }

    pub fn inner_html(&self, id: NodeId) -> Result<String, DomError> {
        let arena = self.arena.borrow();
        arena.element(id)?;
        let mut out = String::new();
        arena.serialize_children(id, &mut out);
        Ok(out)
    }

    pub fn outer_html(&self, id: NodeId) -> Result<String, DomError> {
        let arena = self.arena.borrow();
        arena.entry(id)?;
        let mut out = String::new();
        arena.serialize(id, false, &mut out);
        Ok(out)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.arena.borrow().text_content(id, &mut out);
        out
    }

    // ---- attributes ----

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let arena = self.arena.borrow();
        let el = arena.element(id).ok()?;
        el.attribute(&name.to_ascii_lowercase()).map(str::to_string)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut arena = self.arena.borrow_mut();
        arena
            .element_mut(id)?
            .set_attribute(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) -> Result<(), DomError> {
        let mut arena = self.arena.borrow_mut();
        arena
            .element_mut(id)?
            .remove_attribute(&name.to_ascii_lowercase());
        Ok(())
    }

    /// Attributes in source order.
    pub fn attributes(&self, id: NodeId) -> Vec<(String, String)> {
        self.arena
            .borrow()
            .element(id)
            .map(|el| el.attrs.clone())
            .unwrap_or_default()
    }

    // ---- dataset ----

    /// `dataset.userId` reads `data-user-id`.
    pub fn dataset(&self, id: NodeId, key: &str) -> Option<String> {
        self.get_attribute(id, &dataset_attribute(key))
    }

    pub fn set_dataset(&self, id: NodeId, key: &str, value: &str) -> Result<(), DomError> {
        self.set_attribute(id, &dataset_attribute(key), value)
    }

    pub fn dataset_entries(&self, id: NodeId) -> Vec<(String, String)> {
        self.attributes(id)
            .into_iter()
            .filter_map(|(name, value)| dataset_key(&name).map(|key| (key, value)))
            .collect()
    }

    // ---- classList ----

    pub fn class_list(&self, id: NodeId) -> Vec<String> {
        self.get_attribute(id, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_list(id).iter().any(|c| c == class)
    }

    pub fn add_class(&self, id: NodeId, class: &str) -> Result<(), DomError> {
        self.toggle_class(id, class, Some(true)).map(|_| ())
    }

    pub fn remove_class(&self, id: NodeId, class: &str) -> Result<(), DomError> {
        self.toggle_class(id, class, Some(false)).map(|_| ())
    }

    /// Flip `class`, or force it on/off. Returns whether it is now present.
    pub fn toggle_class(&self, id: NodeId, class: &str, force: Option<bool>) -> Result<bool, DomError> {
        let mut arena = self.arena.borrow_mut();
        let el = arena.element_mut(id)?;
        let mut classes: Vec<String> = el
            .attribute("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let present = classes.iter().any(|c| c == class);
        let want = force.unwrap_or(!present);
        if want == present {
            return Ok(present);
        }
        if want {
            classes.push(class.to_string());
        } else {
            classes.retain(|c| c != class);
        }
        el.set_attribute("class".into(), classes.join(" "));
        Ok(want)
    }

    // ---- style ----

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        style_lookup(self.get_attribute(id, "style").as_deref(), property)
    }

    /// Set one inline style property; an empty value removes it.
    pub fn set_style(&self, id: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let style = style_with(self.get_attribute(id, "style").as_deref(), property, value);
        if style.is_empty() {
            self.remove_attribute(id, "style")
        } else {
            self.set_attribute(id, "style", &style)
        }
    }

    // ---- properties ----

    /// Assign a property. Reflected properties (`id`, `className`,
    /// `required`, ...) write their attribute, `innerHTML` and `textContent`
    /// replace the content, anything else is stored on the element.
    pub fn set_property(&self, id: NodeId, name: &str, value: Property) -> Result<Mutation, DomError> {
        match name {
            "innerHTML" => return self.set_inner_html(id, &value.to_text()),
            "textContent" | "innerText" => return self.set_text_content(id, &value.to_text()),
            _ => {}
        }
        match reflected_attribute(name) {
            Some((attr, true)) if value.is_truthy() => self.set_attribute(id, &attr, "")?,
            Some((attr, true)) => self.remove_attribute(id, &attr)?,
            Some((attr, false)) => self.set_attribute(id, &attr, &value.to_text())?,
            None => {
                let mut arena = self.arena.borrow_mut();
                arena.element_mut(id)?.properties.insert(name.to_string(), value);
            }
        }
        Ok(Mutation::default())
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<Property> {
        match name {
            "innerHTML" => return self.inner_html(id).ok().map(|s| Property::Value(s.into())),
            "textContent" | "innerText" => {
                return self.is_element(id).then(|| Property::Value(self.text_content(id).into()));
            }
            "tagName" => return self.tag_name(id).map(|t| Property::Value(t.to_ascii_uppercase().into())),
            _ => {}
        }
        if let Some((attr, boolean)) = reflected_attribute(name) {
            let current = self.get_attribute(id, &attr);
            let value = if boolean {
                Value::Bool(current.is_some())
            } else {
                Value::Str(current.unwrap_or_default())
            };
            return self.is_element(id).then_some(Property::Value(value));
        }
        let arena = self.arena.borrow();
        let el = arena.element(id).ok()?;
        match el.properties.get(name) {
            Some(p) => Some(p.clone()),
            // `value` starts out as the attribute until it is assigned.
            None if name == "value" => el
                .attribute("value")
                .map(|v| Property::Value(v.to_string().into())),
            None => None,
        }
    }

    /// Properties stored on the element (reflected ones live in attributes).
    pub fn properties(&self, id: NodeId) -> Vec<(String, Property)> {
        self.arena
            .borrow()
            .element(id)
            .map(|el| {
                el.properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `target[key] = value`: inline style for `style`, data attributes for
    /// `dataset`, otherwise a per-element map. `Null` clears style and
    /// dataset entries.
    pub fn set_nested_property(&self, id: NodeId, target: &str, key: &str, value: Value) -> Result<(), DomError> {
        match target {
            "style" => self.set_style(id, key, &value.to_string()),
            "dataset" if value.is_null() => self.remove_attribute(id, &dataset_attribute(key)),
            "dataset" => self.set_dataset(id, key, &value.to_string()),
            _ => {
                let mut arena = self.arena.borrow_mut();
                arena
                    .element_mut(id)?
                    .nested
                    .entry(target.to_string())
                    .or_default()
                    .insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    pub fn nested_property(&self, id: NodeId, target: &str, key: &str) -> Option<Value> {
        match target {
            "style" => self.style(id, key).map(Value::Str),
            "dataset" => self.dataset(id, key).map(Value::Str),
            _ => {
                let arena = self.arena.borrow();
                arena.element(id).ok()?.nested.get(target)?.get(key).cloned()
            }
        }
    }

    // ---- selectors ----

    /// Descendants of `root` matching `selector`, in document order.
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        let arena = self.arena.borrow();
        arena.entry(root)?;
        Ok(arena
            .elements(root, false)
            .into_iter()
            .filter(|id| {
                arena
                    .element(*id)
                    .is_ok_and(|el| selector.matches(&el.tag, &el.attrs))
            })
            .collect())
    }

    pub fn query_selector(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_selector_all(root, selector)?.into_iter().next())
    }

    pub fn matches(&self, id: NodeId, selector: &str) -> Result<bool, DomError> {
        let selector = Selector::parse(selector)?;
        let arena = self.arena.borrow();
        let el = arena.element(id)?;
        Ok(selector.matches(&el.tag, &el.attrs))
    }

    // ---- events ----

    pub fn add_event_listener(
        &self,
        id: NodeId,
        event_type: &str,
        listener: impl Fn(&Event) + 'static,
    ) -> Result<ListenerId, DomError> {
        let mut arena = self.arena.borrow_mut();
        arena.next_listener += 1;
        let listener_id = ListenerId(arena.next_listener);
        arena
            .element_mut(id)?
            .listeners
            .push((listener_id, event_type.to_string(), Rc::new(listener)));
        Ok(listener_id)
    }

    pub fn remove_event_listener(&self, id: NodeId, listener: ListenerId) -> Result<(), DomError> {
        let mut arena = self.arena.borrow_mut();
        arena
            .element_mut(id)?
            .listeners
            .retain(|(lid, _, _)| *lid != listener);
        Ok(())
    }

    /// Dispatch a bubbling event at `target`: listeners on the target run
    /// first, then those of each ancestor until one stops propagation.
    pub fn dispatch_event(&self, target: NodeId, event_type: &str) -> Result<Event, DomError> {
        self.arena.borrow().entry(target)?;
        let mut path = vec![target];
        path.extend(self.ancestors(target));

        let event = Event::new(event_type, target);
        for node in path {
            let listeners: Vec<Listener> = {
                let arena = self.arena.borrow();
                let Ok(el) = arena.element(node) else {
                    continue;
                };
                el.listeners
                    .iter()
                    .filter(|(_, t, _)| t == event_type)
                    .map(|(_, _, l)| l.clone())
                    .collect()
            };
            event.set_current_target(node);
            for listener in listeners {
                listener(&event);
            }
            if event.propagation_stopped() {
                break;
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_slots_are_reused_with_a_new_generation() {
        let doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.body(), div).unwrap();
        doc.set_inner_html(div, "<p>a</p>").unwrap();
        let p = doc.element_children(div)[0];
        doc.set_inner_html(div, "<p>b</p>").unwrap();
        let p2 = doc.element_children(div)[0];
        assert_ne!(p, p2);
        assert!(!doc.exists(p));
        assert_eq!(doc.set_attribute(p, "x", "y"), Err(DomError::StaleNode(p)));
    }
}

use std::fmt;
use std::rc::Rc;

use mastro_bind::Literal;
use mastro_dom::{Document, Event, NodeId, Property};
use mastro_html::{Node, Value};

use crate::source::{IntoSource, Method, Source};

/// A named member of a component.
#[derive(Debug, Clone)]
pub enum Member {
    Source(Source),
    Method(Method),
}

/// The handler table of one component instance, in declaration order.
///
/// Binding and event directives look members up by name here; a name that
/// resolves to the wrong kind of member is reported like a missing one.
#[derive(Default, Clone)]
pub struct Members {
    entries: Vec<(String, Member)>,
    initial_html: Option<Rc<dyn Fn() -> Node>>,
}

impl Members {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reactive source. Re-registering a name replaces it in place.
    pub fn source(mut self, name: impl Into<String>, source: impl IntoSource) -> Self {
        self.insert(name.into(), Member::Source(source.into_source()));
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&[Literal], &Event) + 'static,
    ) -> Self {
        self.insert(name.into(), Member::Method(Method::new(f)));
        self
    }

    /// Markup rendered into the element on connection when it has no content yet.
    pub fn initial_html(mut self, f: impl Fn() -> Node + 'static) -> Self {
        self.initial_html = Some(Rc::new(f));
        self
    }

    fn insert(&mut self, name: String, member: Member) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = member,
            None => self.entries.push((name, member)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn get_source(&self, name: &str) -> Option<&Source> {
        match self.get(name)? {
            Member::Source(s) => Some(s),
            Member::Method(_) => None,
        }
    }

    pub fn get_method(&self, name: &str) -> Option<&Method> {
        match self.get(name)? {
            Member::Method(m) => Some(m),
            Member::Source(_) => None,
        }
    }

    /// Sources in declaration order.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &Source)> {
        self.entries.iter().filter_map(|(name, member)| match member {
            Member::Source(s) => Some((name.as_str(), s)),
            Member::Method(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn initial_markup(&self) -> Option<Rc<dyn Fn() -> Node>> {
        self.initial_html.clone()
    }
}

impl fmt::Debug for Members {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Members")
            .field("entries", &self.entries)
            .field("initial_html", &self.initial_html.is_some())
            .finish()
    }
}

/// What a component's setup function can see: its element, before connection.
pub struct Setup {
    document: Document,
    element: NodeId,
}

impl Setup {
    pub(crate) fn new(document: Document, element: NodeId) -> Self {
        Setup { document, element }
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn document(&self) -> Document {
        self.document.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.document.get_attribute(self.element, name)
    }

    /// A source that forwards to whatever source a parent later hands to this
    /// element through a `props.<name>` binding, and is `Null` until then.
    pub fn prop(&self, name: &str) -> Source {
        let document = self.document.clone();
        let element = self.element;
        let name = name.to_string();
        Source::new(move |args| {
            document
                .property(element, &name)
                .and_then(|p| match p {
                    Property::Value(v) => Some(v),
                    shared => shared.downcast::<Source>().map(|s| s.get(args)),
                })
                .unwrap_or(Value::Null)
        })
    }
}

type SetupFn = dyn Fn(&Setup) -> Members;

/// A custom element definition: a setup function building the instance's
/// members, plus the event types delegated on its root.
#[derive(Clone)]
pub struct Definition {
    setup: Rc<SetupFn>,
    events: Option<Vec<String>>,
}

impl Definition {
    pub fn new(setup: impl Fn(&Setup) -> Members + 'static) -> Self {
        Definition {
            setup: Rc::new(setup),
            events: None,
        }
    }

    /// Delegate these event types instead of the host's configured set.
    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    pub fn events(&self) -> Option<&[String]> {
        self.events.as_deref()
    }

    pub(crate) fn build(&self, setup: &Setup) -> Members {
        (self.setup)(setup)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

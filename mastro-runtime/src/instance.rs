use std::cell::{Cell, RefCell};

use mastro_core::Scope;
use mastro_dom::{Document, NodeId};

use crate::component::Members;
use crate::source::Source;

/// Lifecycle of one component instance.
///
/// `Unattached -> Connecting -> Active -> Disposed`, and back to
/// `Connecting` when a disposed component is connected again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Upgraded but never connected.
    Unattached,
    /// Connected, wiring not yet run.
    Connecting,
    Active,
    /// Disconnected; every binding it created is cancelled.
    Disposed,
}

pub(crate) struct Instance {
    pub(crate) tag: String,
    pub(crate) element: NodeId,
    pub(crate) members: Members,
    // Owns effects created by setup (memos); lives as long as the element.
    setup_scope: Scope,
    state: Cell<InstanceState>,
    scope: RefCell<Option<Scope>>,
    attribute_sources: RefCell<Vec<(String, Source)>>,
    // Initial markup is still rendering; wiring waits for it.
    pub(crate) awaiting_markup: Cell<bool>,
}

impl Instance {
    pub(crate) fn new(tag: String, element: NodeId, members: Members, setup_scope: Scope) -> Self {
        Instance {
            tag,
            element,
            members,
            setup_scope,
            state: Cell::new(InstanceState::Unattached),
            scope: RefCell::new(None),
            attribute_sources: RefCell::new(Vec::new()),
            awaiting_markup: Cell::new(false),
        }
    }

    pub(crate) fn state(&self) -> InstanceState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: InstanceState) {
        self.state.set(state);
    }

    pub(crate) fn is_attached(&self) -> bool {
        matches!(
            self.state.get(),
            InstanceState::Connecting | InstanceState::Active
        )
    }

    pub(crate) fn scope(&self) -> Option<Scope> {
        self.scope.borrow().clone()
    }

    pub(crate) fn replace_scope(&self, scope: Option<Scope>) -> Option<Scope> {
        self.scope.replace(scope)
    }

    /// Expose every non-`data-` attribute present now as a source reading
    /// that attribute's current value.
    pub(crate) fn capture_attributes(&self, document: &Document) {
        let captured = document
            .attributes(self.element)
            .into_iter()
            .filter(|(name, _)| !name.starts_with("data-"))
            .map(|(name, _)| {
                let document = document.clone();
                let element = self.element;
                let attribute = name.clone();
                let source = Source::new(move |_| document.get_attribute(element, &attribute));
                (name, source)
            })
            .collect();
        *self.attribute_sources.borrow_mut() = captured;
    }

    /// Members, then captured attributes, then sources handed over by a
    /// parent's `props` bindings. Later entries replace same-name earlier ones.
    pub(crate) fn sources(&self, document: &Document) -> Vec<(String, Source)> {
        let mut out: Vec<(String, Source)> = self
            .members
            .sources()
            .map(|(name, source)| (name.to_string(), source.clone()))
            .collect();
        let mut put = |name: String, source: Source| {
            match out.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = source,
                None => out.push((name, source)),
            }
        };
        for (name, source) in self.attribute_sources.borrow().iter() {
            put(name.clone(), source.clone());
        }
        for (name, property) in document.properties(self.element) {
            if let Some(source) = property.downcast::<Source>() {
                put(name, Source::clone(&source));
            }
        }
        out
    }

    pub(crate) fn effect_count(&self) -> usize {
        self.scope().map_or(0, |scope| scope.effect_count())
    }

    /// Tear down for good, once the element is gone.
    pub(crate) fn release(&self) {
        if let Some(scope) = self.replace_scope(None) {
            scope.dispose();
        }
        self.setup_scope.dispose();
    }
}

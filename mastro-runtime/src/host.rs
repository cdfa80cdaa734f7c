use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use mastro_core::{Scope, untrack};
use mastro_dom::{Document, Event, Mutation, NodeId};
use mastro_html::{RenderNow, render_now};
use tracing::{debug, trace, warn};

use crate::binding;
use crate::component::{Definition, Setup};
use crate::config::RuntimeConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, describe};
use crate::error::RuntimeError;
use crate::events;
use crate::instance::{Instance, InstanceState};
use crate::registry::Registry;

type Microtask = Box<dyn FnOnce(&Host)>;

struct HostInner {
    document: Document,
    registry: RefCell<Registry>,
    config: RuntimeConfig,
    instances: RefCell<HashMap<NodeId, Rc<Instance>>>,
    microtasks: RefCell<VecDeque<Microtask>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    diagnostics: RefCell<VecDeque<Diagnostic>>,
}

/// The environment components live in: a document, the custom element
/// registry, and the event loop pieces the lifecycle needs.
///
/// Tree changes made through the host run connect/disconnect hooks
/// synchronously. Wiring is queued as a microtask and pending renders run on
/// a local executor; both are drained by [`Host::run_until_idle`], which
/// [`Host::dispatch`] calls after every event.
#[derive(Clone)]
pub struct Host {
    inner: Rc<HostInner>,
}

#[derive(Clone)]
pub(crate) struct WeakHost(Weak<HostInner>);

impl WeakHost {
    pub(crate) fn upgrade(&self) -> Option<Host> {
        self.0.upgrade().map(|inner| Host { inner })
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("document", &self.inner.document)
            .field("instances", &self.inner.instances.borrow().len())
            .field("microtasks", &self.inner.microtasks.borrow().len())
            .finish()
    }
}

impl Host {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_registry(Registry::new(), config)
    }

    pub fn with_registry(registry: Registry, config: RuntimeConfig) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Host {
            inner: Rc::new(HostInner {
                document: Document::new(),
                registry: RefCell::new(registry),
                config,
                instances: RefCell::new(HashMap::new()),
                microtasks: RefCell::new(VecDeque::new()),
                pool: RefCell::new(pool),
                spawner,
                diagnostics: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakHost {
        WeakHost(Rc::downgrade(&self.inner))
    }

    pub fn document(&self) -> Document {
        self.inner.document.clone()
    }

    pub fn body(&self) -> NodeId {
        self.inner.document.body()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Define a custom element and upgrade matching elements already connected.
    pub fn define(&self, tag: &str, definition: Definition) -> Result<(), RuntimeError> {
        self.inner.registry.borrow_mut().define(tag, definition)?;
        let tag = tag.to_ascii_lowercase();
        let existing = self.inner.document.query_selector_all(self.body(), &tag)?;
        self.handle_mutation(Mutation {
            removed: Vec::new(),
            added: existing,
        });
        Ok(())
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.inner.registry.borrow().is_defined(tag)
    }

    /// Replace the body's content.
    pub fn mount(&self, html: &str) -> Result<(), RuntimeError> {
        self.set_inner_html(self.body(), html)
    }

    pub fn set_inner_html(&self, id: NodeId, html: &str) -> Result<(), RuntimeError> {
        let mutation = self.inner.document.set_inner_html(id, html)?;
        self.handle_mutation(mutation);
        Ok(())
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), RuntimeError> {
        let mutation = self.inner.document.append_child(parent, child)?;
        self.handle_mutation(mutation);
        Ok(())
    }

    /// Detach `id`. The node stays alive and can be appended again.
    pub fn remove(&self, id: NodeId) -> Result<(), RuntimeError> {
        let mutation = self.inner.document.remove(id)?;
        self.handle_mutation(mutation);
        Ok(())
    }

    /// Dispatch a bubbling event, then drain queued work.
    pub fn dispatch(&self, target: NodeId, event_type: &str) -> Result<Event, RuntimeError> {
        let event = self.inner.document.dispatch_event(target, event_type)?;
        self.run_until_idle();
        Ok(event)
    }

    /// Run microtasks and pending renders until neither has work left.
    pub fn run_until_idle(&self) {
        loop {
            while let Some(task) = self.pop_microtask() {
                task(self);
            }
            self.inner.pool.borrow_mut().run_until_stalled();
            if self.inner.microtasks.borrow().is_empty() {
                break;
            }
        }
    }

    /// Lifecycle state of the component on `id`, if it was upgraded.
    pub fn state(&self, id: NodeId) -> Option<InstanceState> {
        self.instance(id).map(|instance| instance.state())
    }

    /// Live bindings of the component on `id`, nested `innerHTML` slots included.
    pub fn effect_count(&self, id: NodeId) -> usize {
        self.instance(id).map_or(0, |instance| instance.effect_count())
    }

    /// Drain the recorded diagnostics, oldest first. At most
    /// [`RuntimeConfig::max_diagnostics`] are kept between calls.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.diagnostics.borrow_mut().drain(..).collect()
    }

    pub(crate) fn report(&self, kind: DiagnosticKind, component: &str, message: String) {
        warn!(component, %kind, "{message}");
        let limit = self.inner.config.max_diagnostics;
        if limit == 0 {
            return;
        }
        let mut diagnostics = self.inner.diagnostics.borrow_mut();
        while diagnostics.len() >= limit {
            diagnostics.pop_front();
        }
        diagnostics.push_back(Diagnostic {
            kind,
            component: component.to_string(),
            message,
        });
    }

    pub(crate) fn queue_microtask(&self, task: impl FnOnce(&Host) + 'static) {
        self.inner.microtasks.borrow_mut().push_back(Box::new(task));
    }

    fn pop_microtask(&self) -> Option<Microtask> {
        self.inner.microtasks.borrow_mut().pop_front()
    }

    pub(crate) fn spawn(&self, component: &str, task: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.inner.spawner.spawn_local(task) {
            self.report(
                DiagnosticKind::Render,
                component,
                format!("cannot schedule render: {err}"),
            );
        }
    }

    fn instance(&self, id: NodeId) -> Option<Rc<Instance>> {
        self.inner.instances.borrow().get(&id).cloned()
    }

    /// Run lifecycle hooks for a tree change: disconnect what left the
    /// document, then upgrade and connect what entered it, in tree order.
    pub(crate) fn handle_mutation(&self, mutation: Mutation) {
        for id in mutation.removed {
            self.disconnect(id);
        }
        self.prune();
        for id in mutation.added {
            self.connect(id);
        }
    }

    fn prune(&self) {
        let document = &self.inner.document;
        let gone: Vec<Rc<Instance>> = {
            let mut instances = self.inner.instances.borrow_mut();
            let ids: Vec<NodeId> = instances
                .keys()
                .filter(|id| !document.exists(**id))
                .copied()
                .collect();
            ids.iter().filter_map(|id| instances.remove(id)).collect()
        };
        for instance in gone {
            trace!(tag = %instance.tag, "component released");
            instance.release();
        }
    }

    fn upgrade(&self, id: NodeId) -> Option<Rc<Instance>> {
        let tag = self.inner.document.tag_name(id)?;
        let definition = self.inner.registry.borrow().lookup(&tag)?;

        let setup_scope = Scope::new();
        let setup = Setup::new(self.document(), id);
        let members = untrack(|| setup_scope.run(|| definition.build(&setup)));
        let instance = Rc::new(Instance::new(tag, id, members, setup_scope));
        self.inner
            .instances
            .borrow_mut()
            .insert(id, instance.clone());

        events::delegate(self, &instance, &definition);
        debug!(tag = %instance.tag, ?id, "component upgraded");
        Some(instance)
    }

    fn connect(&self, id: NodeId) {
        if !self.inner.document.is_connected(id) {
            return;
        }
        let Some(instance) = self.instance(id).or_else(|| self.upgrade(id)) else {
            return;
        };
        if instance.is_attached() {
            trace!(tag = %instance.tag, ?id, "already connected");
            return;
        }

        let scope = Scope::new();
        instance.replace_scope(Some(scope.clone()));
        instance.awaiting_markup.set(false);
        instance.set_state(InstanceState::Connecting);
        debug!(tag = %instance.tag, ?id, "component connecting");

        // Reserved before the initial markup connects any descendant, so
        // ancestors are always wired first.
        self.queue_wiring(&instance, &scope);
        self.render_initial_markup(&instance, &scope);
        instance.capture_attributes(&self.inner.document);
    }

    fn queue_wiring(&self, instance: &Rc<Instance>, scope: &Scope) {
        let instance = Rc::downgrade(instance);
        let scope = scope.clone();
        self.queue_microtask(move |host| {
            if let Some(instance) = instance.upgrade() {
                host.wire(&instance, &scope);
            }
        });
    }

    fn wire(&self, instance: &Rc<Instance>, scope: &Scope) {
        if instance.state() != InstanceState::Connecting
            || scope.is_disposed()
            || instance.awaiting_markup.get()
        {
            return;
        }
        instance.set_state(InstanceState::Active);
        scope.run(|| binding::register(self, instance, instance.element, scope));
        debug!(
            tag = %instance.tag,
            effects = scope.effect_count(),
            "component active"
        );
    }

    fn disconnect(&self, id: NodeId) {
        let Some(instance) = self.instance(id) else {
            return;
        };
        if !instance.is_attached() {
            return;
        }
        if let Some(scope) = instance.replace_scope(None) {
            scope.dispose();
        }
        instance.set_state(InstanceState::Disposed);
        debug!(tag = %instance.tag, ?id, "component disconnected");
    }

    fn render_initial_markup(&self, instance: &Rc<Instance>, scope: &Scope) {
        let Some(producer) = instance.members.initial_markup() else {
            return;
        };
        let empty = self
            .inner
            .document
            .inner_html(instance.element)
            .is_ok_and(|html| html.trim().is_empty());
        if !empty {
            return;
        }

        match render_now(untrack(|| producer())) {
            RenderNow::Ready(Ok(html)) => {
                self.fill(instance, instance.element, &html);
            }
            RenderNow::Ready(Err(err)) => self.report(
                DiagnosticKind::Render,
                &instance.tag,
                format!("initial markup: {}", describe(&err)),
            ),
            RenderNow::Pending(render) => {
                instance.awaiting_markup.set(true);
                let host = self.downgrade();
                let weak = Rc::downgrade(instance);
                let scope = scope.clone();
                self.spawn(&instance.tag, async move {
                    let result = render.await;
                    let (Some(host), Some(instance)) = (host.upgrade(), weak.upgrade()) else {
                        return;
                    };
                    if scope.is_disposed() {
                        return;
                    }
                    instance.awaiting_markup.set(false);
                    match result {
                        Ok(html) => {
                            host.fill(&instance, instance.element, &html);
                        }
                        Err(err) => host.report(
                            DiagnosticKind::Render,
                            &instance.tag,
                            format!("initial markup: {}", describe(&err)),
                        ),
                    }
                    host.queue_wiring(&instance, &scope);
                });
            }
        }
    }

    /// Replace the content of `target` and run hooks for what changed.
    pub(crate) fn fill(&self, instance: &Instance, target: NodeId, html: &str) -> bool {
        match self.inner.document.set_inner_html(target, html) {
            Ok(mutation) => {
                self.handle_mutation(mutation);
                true
            }
            Err(err) => {
                self.report(DiagnosticKind::Dom, &instance.tag, err.to_string());
                false
            }
        }
    }
}

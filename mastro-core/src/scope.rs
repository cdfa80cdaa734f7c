use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::signal::EffectInner;

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Scope>> = const { RefCell::new(None) };
}

pub(crate) struct ScopeInner {
    parent: Weak<ScopeInner>,
    effects: RefCell<Vec<Rc<EffectInner>>>,
    children: RefCell<Vec<Scope>>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    disposed: Cell<bool>,
}

/// A node in the ownership tree of effects.
///
/// Effects created while a scope is current (see [`Scope::run`]) belong to it.
/// Disposing a scope disposes its children first, then its own effects, then
/// runs the registered cleanups. A disposed scope removes itself from its
/// parent, so repeatedly creating and disposing child scopes does not grow
/// the parent.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("disposed", &self.is_disposed())
            .field("effects", &self.effect_count())
            .finish()
    }
}

impl Scope {
    /// Create a detached root scope.
    pub fn new() -> Self {
        Self::with_parent(Weak::new())
    }

    fn with_parent(parent: Weak<ScopeInner>) -> Self {
        Scope {
            inner: Rc::new(ScopeInner {
                parent,
                effects: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                cleanups: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ScopeInner>) -> Self {
        Scope { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ScopeInner> {
        Rc::downgrade(&self.inner)
    }

    /// The scope effects are currently registered into, if any.
    pub fn current() -> Option<Scope> {
        CURRENT_SCOPE.with(|cur| cur.borrow().clone())
    }

    /// Create a scope owned by this one. A child of a disposed scope starts out disposed.
    pub fn child(&self) -> Scope {
        let child = Scope::with_parent(Rc::downgrade(&self.inner));
        if self.is_disposed() {
            child.inner.disposed.set(true);
        } else {
            self.inner.children.borrow_mut().push(child.clone());
        }
        child
    }

    /// Run `f` with this scope as the current owner.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = CURRENT_SCOPE.with(|cur| cur.replace(Some(self.clone())));
        let out = f();
        CURRENT_SCOPE.with(|cur| *cur.borrow_mut() = prev);
        out
    }

    /// Register `f` to run when the scope is disposed. Runs immediately if it already is.
    pub fn on_dispose(&self, f: impl FnOnce() + 'static) {
        if self.is_disposed() {
            f();
        } else {
            self.inner.cleanups.borrow_mut().push(Box::new(f));
        }
    }

    pub(crate) fn adopt(&self, effect: Rc<EffectInner>) -> bool {
        if self.is_disposed() {
            return false;
        }
        let mut effects = self.inner.effects.borrow_mut();
        effects.retain(|e| !e.is_disposed());
        effects.push(effect);
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Dispose children, effects and cleanups. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }

        let children = std::mem::take(&mut *self.inner.children.borrow_mut());
        for child in &children {
            child.dispose();
        }

        let effects = std::mem::take(&mut *self.inner.effects.borrow_mut());
        for effect in &effects {
            effect.dispose();
        }

        let cleanups = std::mem::take(&mut *self.inner.cleanups.borrow_mut());
        for cleanup in cleanups {
            cleanup();
        }

        if let Some(parent) = self.inner.parent.upgrade() {
            parent
                .children
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(&c.inner, &self.inner));
        }

        tracing::trace!(
            children = children.len(),
            effects = effects.len(),
            "scope disposed"
        );
    }

    /// Live effects owned by this scope and all of its descendants.
    pub fn effect_count(&self) -> usize {
        let own = self
            .inner
            .effects
            .borrow()
            .iter()
            .filter(|e| !e.is_disposed())
            .count();
        let children: Vec<Scope> = self.inner.children.borrow().clone();
        own + children.iter().map(Scope::effect_count).sum::<usize>()
    }

    /// Number of live child scopes.
    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }
}

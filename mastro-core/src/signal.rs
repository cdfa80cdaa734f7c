// mastro-core/src/signal.rs

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::scope::{Scope, ScopeInner};

pub(crate) type EffectFn = Box<dyn FnMut()>;

pub(crate) struct EffectInner {
    // `None` while the effect is running or after it was disposed.
    func: RefCell<Option<EffectFn>>,
    disposed: Cell<bool>,
    // Scope that owns effects created while this one runs.
    owner: Weak<ScopeInner>,
}

impl EffectInner {
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn dispose(&self) {
        self.disposed.set(true);
        // Drop the closure (and everything it captured) right away.
        let func = self.func.borrow_mut().take();
        drop(func);
    }
}

// Holds the currently running/collecting effect during dependency tracking.
thread_local! {
    static CURRENT_EFFECT: RefCell<Option<Rc<EffectInner>>> = const { RefCell::new(None) };

    // FIFO scheduler queue and guards.
    static EFFECT_QUEUE: RefCell<VecDeque<Rc<EffectInner>>> = RefCell::new(VecDeque::new());
    static QUEUED: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
    static IS_FLUSHING: Cell<bool> = const { Cell::new(false) };
}

fn ptr_id(rc: &Rc<EffectInner>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

fn enqueue_effect(eff: Rc<EffectInner>) {
    let fresh = QUEUED.with(|set| set.borrow_mut().insert(ptr_id(&eff)));
    if fresh {
        EFFECT_QUEUE.with(|q| q.borrow_mut().push_back(eff));
    }
}

fn flush_queue() {
    // Prevent re-entrant flush; effects scheduled during a flush will be queued
    // and processed by this outer flush.
    if IS_FLUSHING.with(|f| f.replace(true)) {
        return;
    }

    while let Some(eff) = EFFECT_QUEUE.with(|q| q.borrow_mut().pop_front()) {
        // Mark as not queued before running, so re-enqueues are allowed.
        QUEUED.with(|set| {
            set.borrow_mut().remove(&ptr_id(&eff));
        });
        run_effect(&eff);
    }

    IS_FLUSHING.with(|f| f.set(false));
}

fn run_effect(eff: &Rc<EffectInner>) {
    if eff.is_disposed() {
        return;
    }
    // Extract the closure so no borrow of `eff` is held while it runs (the body
    // may set signals and re-enqueue itself).
    let Some(mut func) = eff.func.borrow_mut().take() else {
        return;
    };

    let prev = CURRENT_EFFECT.with(|cur| cur.replace(Some(eff.clone())));
    match eff.owner.upgrade() {
        Some(owner) => Scope::from_inner(owner).run(&mut func),
        None => func(),
    }
    CURRENT_EFFECT.with(|cur| *cur.borrow_mut() = prev);

    // Put the function back unless the effect got disposed while running.
    if !eff.is_disposed() {
        *eff.func.borrow_mut() = Some(func);
    }
}

/// Run `f` and defer running triggered effects until it returns.
///
/// Nested batches (and batches inside an effect) are drained by the outermost one.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let outer = IS_FLUSHING.with(|fl| fl.replace(true));
    let out = f();
    if !outer {
        IS_FLUSHING.with(|fl| fl.set(false));
        flush_queue();
    }
    out
}

/// Run `f` without subscribing the current effect to anything it reads.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_EFFECT.with(|cur| cur.replace(None));
    let out = f();
    CURRENT_EFFECT.with(|cur| *cur.borrow_mut() = prev);
    out
}

struct SignalInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Rc<EffectInner>>>,
}

/// A reactive cell wrapping a `T: Clone`.
///
/// `Signal` is a handle: clones share the same value and subscribers.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.inner.value.borrow()).finish()
    }
}

impl<T: Default + Clone> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Signal<T>
where
    T: Clone,
{
    /// Create a new signal.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(initial),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Read the value, and if inside an `effect`, register that effect as a subscriber.
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Read the value without subscribing.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the value (tracked). `f` must not write to this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Borrow the value without subscribing.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Update the value and notify all subscribers via the scheduler.
    pub fn set(&self, new: T) {
        *self.inner.value.borrow_mut() = new;
        self.notify();
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    /// Number of live effects currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|e| !e.is_disposed())
            .count()
    }

    fn track(&self) {
        CURRENT_EFFECT.with(|current| {
            if let Some(effect_rc) = current.borrow().as_ref() {
                let mut subs = self.inner.subscribers.borrow_mut();
                if !subs.iter().any(|e| Rc::ptr_eq(e, effect_rc)) {
                    subs.push(effect_rc.clone());
                }
            }
        });
    }

    fn notify(&self) {
        // Snapshot live subscribers before enqueuing; disposed ones are pruned here.
        let subscribers = {
            let mut subs = self.inner.subscribers.borrow_mut();
            subs.retain(|e| !e.is_disposed());
            subs.clone()
        };

        for subscriber in subscribers {
            enqueue_effect(subscriber);
        }
        flush_queue();
    }
}

/// Handle to a registered effect; [`Effect::dispose`] cancels it.
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Stop the effect. Subsequent dependency changes no longer run it.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Register a closure as a reactive effect:
/// - runs immediately to collect dependencies,
/// - then re-runs whenever any `Signal` it `get()`s is `set()`.
///
/// When called inside [`Scope::run`] (or inside another effect owned by a
/// scope) the effect belongs to that scope and is disposed with it.
pub fn effect<F>(f: F) -> Effect
where
    F: FnMut() + 'static,
{
    let owner = Scope::current();
    let eff = Rc::new(EffectInner {
        func: RefCell::new(Some(Box::new(f) as EffectFn)),
        disposed: Cell::new(false),
        owner: owner
            .as_ref()
            .map(Scope::downgrade)
            .unwrap_or_default(),
    });

    let adopted = owner.as_ref().is_none_or(|scope| scope.adopt(eff.clone()));
    if adopted {
        // Initial run with dependency collection; writes it makes are flushed afterwards.
        batch(|| run_effect(&eff));
    } else {
        eff.dispose();
    }

    Effect { inner: eff }
}

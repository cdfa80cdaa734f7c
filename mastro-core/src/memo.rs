use std::fmt;

use crate::signal::{Effect, Signal, effect, untrack};

/// A derived, read-only reactive value.
///
/// The computation re-runs whenever one of its dependencies changes, but
/// dependents of the memo are only notified when the result differs from the
/// previous one.
pub struct Memo<T> {
    signal: Signal<T>,
    effect: Effect,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Memo").field(&self.signal.peek()).finish()
    }
}

impl<T> Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    pub fn new(mut compute: impl FnMut() -> T + 'static) -> Self {
        let signal = Signal::new(untrack(&mut compute));
        let effect = effect({
            let signal = signal.clone();
            move || {
                let next = compute();
                if signal.with_untracked(|cur| *cur != next) {
                    signal.set(next);
                }
            }
        });
        Memo { signal, effect }
    }

    /// Current value; subscribes the running effect.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn peek(&self) -> T {
        self.signal.peek()
    }

    /// Stop recomputing. The last value stays readable.
    pub fn dispose(&self) {
        self.effect.dispose();
    }
}

/// Shorthand for [`Memo::new`].
pub fn computed<T>(compute: impl FnMut() -> T + 'static) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    Memo::new(compute)
}

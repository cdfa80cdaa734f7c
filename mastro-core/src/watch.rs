use std::cell::RefCell;

use crate::signal::{Effect, effect};

/// Call `on_change(new, old)` whenever the value produced by `source`
/// changes. The first evaluation only records a baseline.
///
/// Like any effect, the watcher belongs to the current [`Scope`] and stops
/// when that scope is disposed.
///
/// [`Scope`]: crate::Scope
pub fn watch<T, S, F>(mut source: S, mut on_change: F) -> Effect
where
    T: PartialEq + Clone + 'static,
    S: FnMut() -> T + 'static,
    F: FnMut(&T, &T) + 'static,
{
    let last = RefCell::new(None::<T>);
    effect(move || {
        let next = source();
        // Released before `on_change`, which may write signals.
        let previous = last.replace(Some(next.clone()));
        if let Some(old) = previous.filter(|old| *old != next) {
            on_change(&next, &old);
        }
    })
}

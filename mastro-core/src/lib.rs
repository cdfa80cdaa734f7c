//! Reactive primitives used by the mastro component runtime.
//!
//! - [`Signal`]: a mutable cell; reading it inside an [`effect`] subscribes
//!   that effect, writing it re-runs every subscriber.
//! - [`Memo`]: a derived, read-only value that only notifies when it changes.
//! - [`effect`]: runs a closure now and again whenever a dependency changes.
//! - [`Scope`]: groups effects (and child scopes) under one disposer.
//!
//! Everything is single-threaded. Effects triggered while another effect is
//! running are queued and drained by the outermost flush, so two effects never
//! interleave.

pub mod memo;
pub mod scope;
pub mod signal;
pub mod watch;

pub use memo::{Memo, computed};
pub use scope::Scope;
pub use signal::{Effect, Signal, batch, effect, untrack};
pub use watch::watch;

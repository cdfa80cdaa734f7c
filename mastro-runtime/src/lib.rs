//! Reactive custom elements over a [`mastro_dom::Document`].
//!
//! A component is a [`Definition`] registered under a hyphenated tag name.
//! When an element with that tag is connected, the [`Host`]:
//!
//! 1. renders the component's initial markup if the element is empty,
//! 2. exposes its plain attributes as sources,
//! 3. on the next microtask, wires every `data-bind` directive in its own
//!    subtree to the matching [`Source`], each as one reactive effect.
//!
//! `data-on<type>` directives are resolved by one delegated listener per
//! event type on the component root. Disconnecting the element disposes
//! every binding it created, including those inside re-rendered
//! `innerHTML` content.
//!
//! Broken directives never fail the component; they are reported as
//! [`Diagnostic`]s and logged with `tracing`.

mod binding;
pub mod component;
pub mod config;
pub mod diagnostics;
pub mod error;
mod events;
pub mod host;
mod instance;
pub mod registry;
pub mod source;

pub use component::{Definition, Member, Members, Setup};
pub use config::RuntimeConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::RuntimeError;
pub use host::Host;
pub use instance::InstanceState;
pub use registry::{Registry, is_custom_element_name};
pub use source::{IntoSource, Method, Source, literal_value};

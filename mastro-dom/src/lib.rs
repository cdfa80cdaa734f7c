//! A small in-memory DOM used as the host environment for mastro components
//! and for inspecting markup outside a browser.
//!
//! The [`Document`] is an arena of nodes addressed by generation-checked
//! [`NodeId`]s. It supports the capabilities components need: subtree
//! queries with simple selectors, attribute, dataset, class list and inline
//! style access, properties with attribute reflection, `innerHTML`, and
//! bubbling events.

pub mod document;
pub mod error;
pub mod event;
pub mod parse;
pub mod selector;
pub mod style;

pub use document::{Document, Mutation, NodeId, Property};
pub use error::DomError;
pub use event::{Event, Listener, ListenerId};
pub use parse::{Parsed, decode_entities, parse_fragment};
pub use selector::Selector;

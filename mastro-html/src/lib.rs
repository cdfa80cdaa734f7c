//! HTML templates that know what to escape, rendered to a string or as a
//! stream of chunks.
//!
//! Templates are built with [`html!`] (or [`html()`] for pre-split literals)
//! into a [`Node`] tree. Literal template text is trusted; every interpolated
//! [`Value`] is escaped for the context it lands in. [`Node::raw`] is the only
//! way to bypass escaping.
//!
//! [`render_to_stream`] yields chunks as soon as they are known, waiting on
//! deferred values and async sequences strictly in document order.
//! [`render_to_string`] drains the same stream.

pub mod document;
pub mod error;
pub mod escape;
pub mod node;
pub mod render;
pub mod stream;
pub mod template;
pub mod value;

pub use document::{DocumentOptions, html_document};
pub use error::{BoxError, RenderError};
pub use escape::{Escape, escape_attribute, escape_body};
pub use node::{AsyncSequence, Deferred, Node, Text};
pub use render::{ChunkStream, RenderNow, render_now, render_to_stream, render_to_string};
pub use stream::{catch_deferred, catch_sequence, map_sequence};
pub use template::{html, html_fmt};
pub use value::{Value, format_number};

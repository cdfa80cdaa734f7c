use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;
use futures::{FutureExt, Stream, StreamExt, TryFutureExt, TryStreamExt};

use crate::escape::Escape;
use crate::error::BoxError;

pub(crate) type DeferredFuture = LocalBoxFuture<'static, Result<Node, BoxError>>;
pub(crate) type NodeStream = LocalBoxStream<'static, Result<Node, BoxError>>;

/// Intermediate, escaping-aware representation of renderable content.
///
/// `Raw` is the only variant that bypasses escaping. Deferred values and
/// async sequences are one-shot: clones share the same source and only the
/// first render can consume it.
#[derive(Clone)]
pub enum Node {
    /// Trusted markup, emitted unchanged.
    Raw(String),
    /// Text escaped on output.
    Text(Text),
    /// Children rendered left to right.
    Sequence(Vec<Node>),
    /// A pending value; rendering waits for it before moving on.
    Deferred(Deferred),
    /// Items rendered one after another as the stream produces them.
    AsyncSequence(AsyncSequence),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub value: String,
    pub escape: Escape,
}

impl Text {
    pub fn render(&self) -> String {
        self.escape.apply(&self.value).into_owned()
    }
}

#[derive(Clone)]
pub struct Deferred(Rc<RefCell<Option<DeferredFuture>>>);

impl Deferred {
    pub(crate) fn take(&self) -> Option<DeferredFuture> {
        self.0.borrow_mut().take()
    }

    pub fn is_consumed(&self) -> bool {
        self.0.borrow().is_none()
    }
}

#[derive(Clone)]
pub struct AsyncSequence(Rc<RefCell<Option<NodeStream>>>);

impl AsyncSequence {
    pub(crate) fn take(&self) -> Option<NodeStream> {
        self.0.borrow_mut().take()
    }

    pub fn is_consumed(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl Node {
    /// Trusted markup. Never pass request-derived strings here.
    pub fn raw(html: impl Into<String>) -> Node {
        Node::Raw(html.into())
    }

    /// Body text, escaped on output.
    pub fn text(value: impl Into<String>) -> Node {
        Node::Text(Text {
            value: value.into(),
            escape: Escape::Body,
        })
    }

    /// Attribute text, escaped on output including quotes.
    pub fn attribute_text(value: impl Into<String>) -> Node {
        Node::Text(Text {
            value: value.into(),
            escape: Escape::Attribute,
        })
    }

    pub fn empty() -> Node {
        Node::Sequence(Vec::new())
    }

    /// A value that becomes available later. An error aborts the render.
    pub fn deferred<F, N, E>(future: F) -> Node
    where
        F: Future<Output = Result<N, E>> + 'static,
        N: Into<Node> + 'static,
        E: Into<BoxError> + 'static,
    {
        let future: DeferredFuture = future.map_ok(Into::into).map_err(Into::into).boxed_local();
        Node::Deferred(Deferred(Rc::new(RefCell::new(Some(future)))))
    }

    /// Like [`Node::deferred`] for futures that cannot fail.
    pub fn resolve<F, N>(future: F) -> Node
    where
        F: Future<Output = N> + 'static,
        N: Into<Node> + 'static,
    {
        Node::deferred(future.map(|n| Ok::<N, BoxError>(n)))
    }

    /// A stream of items. An error aborts the render.
    pub fn async_sequence<S, N, E>(items: S) -> Node
    where
        S: Stream<Item = Result<N, E>> + 'static,
        N: Into<Node> + 'static,
        E: Into<BoxError> + 'static,
    {
        let items: NodeStream = items.map_ok(Into::into).map_err(Into::into).boxed_local();
        Node::AsyncSequence(AsyncSequence(Rc::new(RefCell::new(Some(items)))))
    }

    /// Whether rendering this node needs to wait on a deferred value or a stream.
    pub fn is_async(&self) -> bool {
        match self {
            Node::Raw(_) | Node::Text(_) => false,
            Node::Sequence(children) => children.iter().any(Node::is_async),
            Node::Deferred(_) | Node::AsyncSequence(_) => true,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::empty()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Raw(html) => f.debug_tuple("Raw").field(html).finish(),
            Node::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Node::Sequence(children) => f.debug_tuple("Sequence").field(children).finish(),
            Node::Deferred(d) => {
                let state = if d.is_consumed() { "consumed" } else { "pending" };
                f.debug_tuple("Deferred").field(&state).finish()
            }
            Node::AsyncSequence(s) => {
                let state = if s.is_consumed() { "consumed" } else { "pending" };
                f.debug_tuple("AsyncSequence").field(&state).finish()
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Raw(a), Node::Raw(b)) => a == b,
            (Node::Text(a), Node::Text(b)) => a == b,
            (Node::Sequence(a), Node::Sequence(b)) => a == b,
            (Node::Deferred(a), Node::Deferred(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Node::AsyncSequence(a), Node::AsyncSequence(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Node::Sequence(children)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::text(text)
    }
}

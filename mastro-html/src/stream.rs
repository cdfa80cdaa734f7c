//! Adapters for sources that may fail while a page is being rendered.
//!
//! The renderer aborts on the first failing source. Wrapping a source with
//! one of the `catch_*` functions turns the failure into fallback content
//! instead, so the rest of the page still renders.

use std::future::Future;

use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tracing::warn;

use crate::error::BoxError;
use crate::node::{Node, NodeStream};

/// Render the items of `items`; if it fails, render `on_error(err)` in place
/// of the remaining items and stop.
pub fn catch_sequence<S, N, E, F>(items: S, on_error: F) -> Node
where
    S: Stream<Item = Result<N, E>> + 'static,
    N: Into<Node> + 'static,
    E: Into<BoxError> + 'static,
    F: FnOnce(BoxError) -> Node + 'static,
{
    let items: NodeStream = items.map_ok(Into::into).map_err(Into::into).boxed_local();
    let caught = stream::unfold(
        (Some(items), Some(on_error)),
        |(items, on_error)| async move {
            let mut items = items?;
            match items.next().await {
                Some(Ok(node)) => Some((Ok::<Node, BoxError>(node), (Some(items), on_error))),
                Some(Err(err)) => {
                    warn!(error = %err, "async sequence failed, rendering fallback");
                    let on_error = on_error?;
                    Some((Ok(on_error(err)), (None, None)))
                }
                None => None,
            }
        },
    );
    Node::async_sequence(caught)
}

/// Render the value of `future`, or `on_error(err)` if it fails.
pub fn catch_deferred<F, N, E, H>(future: F, on_error: H) -> Node
where
    F: Future<Output = Result<N, E>> + 'static,
    N: Into<Node> + 'static,
    E: Into<BoxError> + 'static,
    H: FnOnce(BoxError) -> Node + 'static,
{
    Node::resolve(async move {
        match future.await {
            Ok(node) => node.into(),
            Err(err) => {
                let err: BoxError = err.into();
                warn!(error = %err, "deferred value failed, rendering fallback");
                on_error(err)
            }
        }
    })
}

/// Turn each item of `items` into a node with `f(item, index)`.
pub fn map_sequence<S, T, E, N, F>(items: S, mut f: F) -> Node
where
    S: Stream<Item = Result<T, E>> + 'static,
    T: 'static,
    E: Into<BoxError> + 'static,
    N: Into<Node> + 'static,
    F: FnMut(T, usize) -> N + 'static,
{
    let mut index = 0;
    Node::async_sequence(items.map_ok(move |item| {
        let node = f(item, index);
        index += 1;
        node
    }))
}

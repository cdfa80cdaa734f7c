use futures::future::LocalBoxFuture;
use futures::stream::{self, LocalBoxStream};
use futures::{FutureExt, StreamExt, TryStreamExt};

use crate::error::RenderError;
use crate::node::{Node, NodeStream};

/// Lazily produced, finite, one-shot sequence of rendered chunks.
pub type ChunkStream = LocalBoxStream<'static, Result<String, RenderError>>;

// Work left to do, innermost on top. Keeps rendering iterative so deep trees
// and long chains of deferred values don't grow the future.
enum Frame {
    Node(Node),
    Children(std::vec::IntoIter<Node>),
    Stream { items: NodeStream, rendered: usize },
}

async fn next_chunk(stack: &mut Vec<Frame>) -> Result<Option<String>, RenderError> {
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Node(Node::Raw(html)) => {
                if !html.is_empty() {
                    return Ok(Some(html));
                }
            }
            Frame::Node(Node::Text(text)) => {
                let out = text.render();
                if !out.is_empty() {
                    return Ok(Some(out));
                }
            }
            Frame::Node(Node::Sequence(children)) => {
                stack.push(Frame::Children(children.into_iter()));
            }
            Frame::Node(Node::Deferred(deferred)) => {
                let future = deferred.take().ok_or(RenderError::Consumed)?;
                let node = future.await.map_err(RenderError::Deferred)?;
                stack.push(Frame::Node(node));
            }
            Frame::Node(Node::AsyncSequence(sequence)) => {
                let items = sequence.take().ok_or(RenderError::Consumed)?;
                stack.push(Frame::Stream { items, rendered: 0 });
            }
            Frame::Children(mut children) => {
                if let Some(child) = children.next() {
                    stack.push(Frame::Children(children));
                    stack.push(Frame::Node(child));
                }
            }
            Frame::Stream {
                mut items,
                rendered,
            } => match items.next().await {
                Some(Ok(node)) => {
                    stack.push(Frame::Stream {
                        items,
                        rendered: rendered + 1,
                    });
                    stack.push(Frame::Node(node));
                }
                Some(Err(source)) => {
                    return Err(RenderError::AsyncSequence { rendered, source });
                }
                None => {}
            },
        }
    }
    Ok(None)
}

/// Render `node` as a stream of chunks, in document order.
///
/// A deferred value is awaited before anything after it is emitted, and an
/// async sequence is drained item by item. The first error ends the stream.
/// Dropping the stream stops the render; nothing else needs cancelling.
pub fn render_to_stream(node: Node) -> ChunkStream {
    stream::try_unfold(vec![Frame::Node(node)], |mut stack| async move {
        Ok(next_chunk(&mut stack).await?.map(|chunk| (chunk, stack)))
    })
    .boxed_local()
}

/// Render `node` into one string. Same output as concatenating
/// [`render_to_stream`].
pub async fn render_to_string(node: Node) -> Result<String, RenderError> {
    let chunks: Vec<String> = render_to_stream(node).try_collect().await?;
    Ok(chunks.concat())
}

/// Outcome of [`render_now`].
pub enum RenderNow {
    /// Every source was ready; this is the full result.
    Ready(Result<String, RenderError>),
    /// Some source is still pending. Driving the future finishes the render.
    Pending(LocalBoxFuture<'static, Result<String, RenderError>>),
}

impl std::fmt::Debug for RenderNow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderNow::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            RenderNow::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Render without waiting: polls once and hands back the in-flight render
/// when a deferred value or stream is not ready yet.
pub fn render_now(node: Node) -> RenderNow {
    let mut render = render_to_string(node).boxed_local();
    match (&mut render).now_or_never() {
        Some(result) => RenderNow::Ready(result),
        None => RenderNow::Pending(render),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chunks_are_skipped() {
        let node = Node::Sequence(vec![Node::raw(""), Node::text("a"), Node::empty(), Node::raw("b")]);
        let chunks: Vec<String> =
            pollster::block_on(render_to_stream(node).try_collect()).unwrap();
        assert_eq!(chunks, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn pending_render_can_be_finished() {
        let (tx, rx) = futures::channel::oneshot::channel::<&'static str>();
        let node = Node::Sequence(vec![
            Node::raw("<p>"),
            Node::resolve(rx.map(|r| r.unwrap_or("gone"))),
            Node::raw("</p>"),
        ]);
        let RenderNow::Pending(render) = render_now(node) else {
            panic!("expected pending render");
        };
        tx.send("late").unwrap();
        assert_eq!(pollster::block_on(render).unwrap(), "<p>late</p>");
    }
}

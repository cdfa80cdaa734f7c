use thiserror::Error;

/// Error produced by the source behind a deferred value or an async sequence.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a render stopped. Upstream failures are not recovered here; wrap a
/// source with [`crate::catch_sequence`] or [`crate::catch_deferred`] to
/// degrade gracefully instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("deferred value failed")]
    Deferred(#[source] BoxError),

    #[error("async sequence failed after {rendered} item(s)")]
    AsyncSequence {
        rendered: usize,
        #[source]
        source: BoxError,
    },

    #[error("deferred value or async sequence was already consumed by an earlier render")]
    Consumed,
}

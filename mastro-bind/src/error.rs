use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("invalid directive `{input}` at column {column}: {message}")]
    Syntax {
        input: String,
        column: usize,
        message: String,
    },

    #[error("directive `{input}` targets `{target}` but names no {target} (expected `{target}.name`)")]
    MissingSubtarget { input: String, target: String },
}

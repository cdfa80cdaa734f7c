use mastro_dom::DomError;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid custom element name `{0}`: must start with a letter and contain a hyphen")]
    InvalidTagName(String),
    #[error("custom element `{0}` is already defined")]
    AlreadyDefined(String),
    #[error(transparent)]
    Dom(#[from] DomError),
}

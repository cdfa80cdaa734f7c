use thiserror::Error;

use crate::document::NodeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomError {
    #[error("node {0:?} no longer exists")]
    StaleNode(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("cannot insert {child:?} into {parent:?}: it would become its own ancestor")]
    Hierarchy { parent: NodeId, child: NodeId },

    #[error("the document root cannot be removed")]
    RemoveRoot,

    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
}

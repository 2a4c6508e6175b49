use thiserror::Error;

use crate::dom::dom_model::NodeId;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Selector text could not be parsed (usually a dynamically built pattern)
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Discovery root is not a document, element or shadow root
    #[error("node {0:?} cannot be used as a discovery root")]
    InvalidRoot(NodeId),

    /// Operation needs an element but got another node kind
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// A classifier could not build a field for one element
    #[error("could not classify {element:?}: {reason}")]
    Classification { element: NodeId, reason: String },

    /// File source the engine cannot resolve (remote URLs)
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    /// Source payload (data: URL etc.) could not be decoded
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

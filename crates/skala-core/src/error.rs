use crate::adapt::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid adaptation payload ({field}): {message}")]
    InvalidAdaptation { field: String, message: String },

    #[error("Invalid structuring payload ({field}): {message}")]
    InvalidStructuring { field: String, message: String },

    #[error("Invalid scale node ({field}): {message}")]
    InvalidNode { field: String, message: String },

    #[error("The input was rejected as a scale: {reason}")]
    NotAScale { reason: String },

    #[error("The root scale cannot be deleted")]
    RootProtected,

    #[error("Another {operation} operation is still in progress")]
    OperationInProgress { operation: &'static str },

    #[error("The result arrived after the graph changed and was discarded")]
    Superseded,

    #[error("Unknown scale node: {id}")]
    UnknownNode { id: String },
}

use thiserror::Error;

/// Errors that can abort a symbol graph run.
///
/// Data-consistency problems (unmapped references, dangling edges, missing
/// containers) are not errors: they are logged and the run continues.
#[derive(Error, Debug)]
pub enum SymGraphError {
    #[error("provider error: {message} (method: {method})")]
    Provider { message: String, method: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("encoding error: {message} (node: {node})")]
    Encoding { message: String, node: String },

    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `SymGraphError`.
pub type Result<T> = std::result::Result<T, SymGraphError>;

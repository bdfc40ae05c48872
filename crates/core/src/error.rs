use thiserror::Error;

/// Errors produced while interpreting the plugin option object.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Plugin options must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// Errors that make a schema file unavailable.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema document has no `data` field")]
    MissingData,

    #[error("schema file is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("schema file is empty")]
    Empty,
}

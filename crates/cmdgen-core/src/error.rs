use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmdgenError {
    #[error("not initialized: run 'cmdgen init'")]
    NotInitialized,

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("workflow step not found: {0}")]
    StepNotFound(String),

    #[error("history entry not found: {0}")]
    HistoryNotFound(String),

    #[error("field '{field}' not found on command '{command}'")]
    FieldNotFound { command: String, field: String },

    #[error("invalid stage: {0}")]
    InvalidStage(String),

    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("missing required field(s) for '{command}': {fields}")]
    MissingRequired { command: String, fields: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CmdgenError>;

use thiserror::Error;

use crate::core::ModelId;

pub type SceneResult<T> = Result<T, SceneError>;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid constructor arguments for {model}: {reason}")]
    InvalidArgument { model: &'static str, reason: String },

    #[error("invalid value for property `{property}`: {reason}")]
    Validation { property: String, reason: String },

    #[error("column `{column}` has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("stream columns must match existing columns (missing: [{}], extra: [{}])", missing.join(", "), extra.join(", "))]
    ColumnMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("index {index} out of bounds for column `{column}` with {len} rows")]
    IndexOutOfBounds {
        column: String,
        index: usize,
        len: usize,
    },

    #[error("model {0} is not in the document")]
    UnknownModel(ModelId),

    #[error("model {id} is a {actual}, expected {expected}")]
    WrongModelKind {
        id: ModelId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{model} has no property `{property}`")]
    UnknownProperty {
        model: &'static str,
        property: String,
    },

    #[error("unresolved reference to {0}")]
    UnresolvedReference(ModelId),

    #[error("unknown model type `{0}`")]
    UnknownModelType(String),

    #[error("malformed patch: {0}")]
    MalformedPatch(String),

    #[error("out-of-order patch: expected sequence {expected}, got {actual}")]
    OutOfOrderPatch { expected: u64, actual: u64 },

    #[error("invalid canvas size: {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SceneError {
    pub(crate) fn validation(property: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            property: property.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(model: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            model,
            reason: reason.into(),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum YDocError {
    #[error("Unsupported document type: {0}")]
    UnsupportedDocumentType(String),

    #[error("Y.Doc transaction error: {0}")]
    Transaction(String),

    #[error("Y.Doc update error: {0}")]
    Update(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: expected {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error("Invalid cell type: {0}")]
    InvalidCellType(String),

    #[error("Cell index {index} out of bounds (notebook has {len} cells)")]
    CellIndexOutOfBounds { index: u32, len: u32 },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl YDocError {
    pub(crate) fn invalid(field: impl Into<String>, expected: &'static str) -> Self {
        YDocError::InvalidField {
            field: field.into(),
            expected,
        }
    }
}

pub type Result<T> = std::result::Result<T, YDocError>;

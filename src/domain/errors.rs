use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Primitive kind expected for an input field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Integer,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
        };
        f.write_str(name)
    }
}

/// Client-side input errors. Never retried, never reach the cache or the model.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Field required: {0}")]
    MissingField(&'static str),

    #[error("Field {field} must be of type {expected}")]
    WrongKind {
        field: &'static str,
        expected: FieldKind,
    },
}

/// Model invocation failed on a well-formed record
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Feature encoding failed: {reason}")]
    Encoding { reason: String },

    #[error("Model failed: {reason}")]
    Model { reason: String },

    #[error("Model returned a non-finite value: {value}")]
    NonFinite { value: f64 },

    #[error("Prediction worker failed: {reason}")]
    Worker { reason: String },
}

/// Result cache backend failures. Always absorbed by the cache wrapper.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Corrupt cache payload: {0}")]
    CorruptPayload(String),
}

/// Errors from the offline pipeline: dataset loading, fitting, artifact I/O
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Model artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact serialization failed: {0}")]
    Serialization(String),

    #[error("Artifact is inconsistent: {0}")]
    Inconsistent(String),

    #[error("Column {0} not found in the dataset")]
    MissingColumn(String),

    #[error("Malformed CSV: {0}")]
    Csv(String),

    #[error("Dataset has no usable rows")]
    EmptyDataset,

    #[error("Invalid training parameter: {0}")]
    InvalidParameter(String),

    #[error("Training failed: {0}")]
    Training(String),
}

/// User-visible outcome of a prediction request
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Model not loaded. Please train the model first.")]
    Unavailable,

    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_formatting() {
        let err = SchemaError::WrongKind {
            field: "seats",
            expected: FieldKind::Integer,
        };
        assert_eq!(err.to_string(), "Field seats must be of type integer");
        assert_eq!(
            SchemaError::MissingField("company").to_string(),
            "Field required: company"
        );
    }

    #[test]
    fn test_pipeline_error_names_column() {
        let err = PipelineError::MissingColumn("selling_price".to_string());
        assert_eq!(err.to_string(), "Column selling_price not found in the dataset");
    }

    #[test]
    fn test_service_error_wraps_prediction_detail() {
        let err: ServiceError = PredictionError::Model {
            reason: "shape mismatch".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Prediction error:"));
        assert!(msg.contains("shape mismatch"));
    }
}

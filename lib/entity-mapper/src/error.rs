use thiserror::Error;

/// Error type returned by hooks and identifier generators.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("No metadata registered for class: {0}")]
    MetadataNotFound(String),

    #[error("Identifier generator not found: {0}")]
    GeneratorNotFound(String),

    #[error("Hook {hook} failed: {source}")]
    HookFailed {
        hook: String,
        #[source]
        source: HookError,
    },

    #[error("Identifier generator {generator} failed: {source}")]
    GeneratorFailed {
        generator: String,
        #[source]
        source: HookError,
    },

    #[error("Field not found on {class}: {field}")]
    FieldNotFound { class: String, field: String },

    #[error("Field is not writable on {class}: {field}")]
    FieldNotWritable { class: String, field: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl MapperError {
    /// True when the error means "this value is not a mapped entity".
    pub fn is_metadata_not_found(&self) -> bool {
        matches!(self, MapperError::MetadataNotFound(_))
    }
}

//! Error types for Modelium
//!
//! A single unified error enum shared by every crate in the workspace,
//! grouped by concern: schema construction, lookups on a built schema,
//! projection, and persistence.

use thiserror::Error;

/// Result type alias using ModelError
pub type ModelResult<T> = Result<T, ModelError>;

/// Unified error type for all Modelium operations
#[derive(Error, Debug)]
pub enum ModelError {
    // ========================================================================
    // Schema construction errors
    // ========================================================================
    /// Two effective properties share a name without shadow markers
    #[error("Type '{type_name}' declares property '{prop}' more than once")]
    DuplicateProp { type_name: String, prop: String },

    /// A shadowing property carries both or neither of the new/override markers
    #[error(
        "Property '{prop}' on type '{type_name}' shadows an inherited property \
         and must be marked as exactly one of new or override"
    )]
    InvalidShadowMarkers { type_name: String, prop: String },

    /// An override targets an ancestor property that is not virtual
    #[error("Property '{prop}' on type '{type_name}' overrides a non-virtual inherited property")]
    OverrideNonVirtual { type_name: String, prop: String },

    /// A type's base has a different kind
    #[error("Type '{type_name}' ({kind}) cannot derive from '{base_name}' ({base_kind})")]
    BaseKindMismatch {
        type_name: String,
        kind: String,
        base_name: String,
        base_kind: String,
    },

    /// More than one key property in a type chain
    #[error("Type '{type_name}' has more than one key property in its inheritance chain")]
    DuplicateKey { type_name: String },

    // ========================================================================
    // Lookup errors
    // ========================================================================
    /// A required key property does not exist
    #[error("Type '{0}' has no key property")]
    KeyNotFound(String),

    /// A required tenant key property does not exist
    #[error("Type '{0}' has no tenant key property")]
    TenantKeyNotFound(String),

    /// A required deleted-marker property does not exist
    #[error("Type '{0}' has no deleted-marker property of the requested kinds")]
    DeletedMarkerNotFound(String),

    /// A required reference to another type does not exist
    #[error("Type '{type_name}' has no reference targeting '{target}'")]
    ReferenceNotFound { type_name: String, target: String },

    /// A model type needs a store and has none
    #[error("Missing store: {0}")]
    MissingStore(String),

    /// A type id or name resolves to nothing
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// A property id or name resolves to nothing
    #[error("Property '{prop}' not found on type '{type_name}'")]
    PropNotFound { type_name: String, prop: String },

    // ========================================================================
    // Projection errors
    // ========================================================================
    /// A property type descriptor cannot be projected onto the store side
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    /// A structural precondition of the projection pass does not hold
    #[error("Projection precondition violated: {0}")]
    ProjectionPrecondition(String),

    // ========================================================================
    // Validation errors
    // ========================================================================
    /// Generic validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    // ========================================================================
    // Persistence errors
    // ========================================================================
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File read errors with path context
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: String, message: String },

    /// File write errors with path context
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: String, message: String },

    /// Schema file version mismatch
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: String, found: String },

    /// Schema file format is invalid
    #[error("Invalid schema file format: {0}")]
    InvalidSchemaFormat(String),
}

impl ModelError {
    /// Create a duplicate-property error
    pub fn duplicate_prop(type_name: impl Into<String>, prop: impl Into<String>) -> Self {
        ModelError::DuplicateProp {
            type_name: type_name.into(),
            prop: prop.into(),
        }
    }

    /// Create an invalid-shadow-markers error
    pub fn invalid_shadow_markers(type_name: impl Into<String>, prop: impl Into<String>) -> Self {
        ModelError::InvalidShadowMarkers {
            type_name: type_name.into(),
            prop: prop.into(),
        }
    }

    /// Create an override-non-virtual error
    pub fn override_non_virtual(type_name: impl Into<String>, prop: impl Into<String>) -> Self {
        ModelError::OverrideNonVirtual {
            type_name: type_name.into(),
            prop: prop.into(),
        }
    }

    /// Create a type-not-found error
    pub fn type_not_found(name: impl Into<String>) -> Self {
        ModelError::TypeNotFound(name.into())
    }

    /// Create a property-not-found error
    pub fn prop_not_found(type_name: impl Into<String>, prop: impl Into<String>) -> Self {
        ModelError::PropNotFound {
            type_name: type_name.into(),
            prop: prop.into(),
        }
    }

    /// Create a missing-store error
    pub fn missing_store(message: impl Into<String>) -> Self {
        ModelError::MissingStore(message.into())
    }

    /// Create an unsupported-conversion error
    pub fn unsupported_conversion(context: impl Into<String>) -> Self {
        ModelError::UnsupportedConversion(context.into())
    }

    /// Create a projection-precondition error
    pub fn projection_precondition(message: impl Into<String>) -> Self {
        ModelError::ProjectionPrecondition(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ModelError::Validation(message.into())
    }

    /// Create a file read error
    pub fn file_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::FileRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file write error
    pub fn file_write(path: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::FileWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this is a schema construction error
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            ModelError::DuplicateProp { .. }
                | ModelError::InvalidShadowMarkers { .. }
                | ModelError::OverrideNonVirtual { .. }
                | ModelError::BaseKindMismatch { .. }
                | ModelError::DuplicateKey { .. }
        )
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ModelError::KeyNotFound(_)
                | ModelError::TenantKeyNotFound(_)
                | ModelError::DeletedMarkerNotFound(_)
                | ModelError::ReferenceNotFound { .. }
                | ModelError::MissingStore(_)
                | ModelError::TypeNotFound(_)
                | ModelError::PropNotFound { .. }
        )
    }

    /// Check if this is a projection error
    pub fn is_projection(&self) -> bool {
        matches!(
            self,
            ModelError::UnsupportedConversion(_) | ModelError::ProjectionPrecondition(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, ModelError::Validation(_))
    }

    /// Check if this is an IO-related error
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            ModelError::Io(_) | ModelError::FileRead { .. } | ModelError::FileWrite { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::duplicate_prop("Order", "Total");
        assert_eq!(
            err.to_string(),
            "Type 'Order' declares property 'Total' more than once"
        );

        let err = ModelError::type_not_found("Customer");
        assert_eq!(err.to_string(), "Type not found: Customer");
    }

    #[test]
    fn test_error_classification() {
        assert!(ModelError::duplicate_prop("A", "B").is_construction());
        assert!(ModelError::type_not_found("A").is_not_found());
        assert!(ModelError::missing_store("x").is_not_found());
        assert!(ModelError::unsupported_conversion("x").is_projection());
        assert!(ModelError::validation("x").is_validation());
        assert!(!ModelError::validation("x").is_io());
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ModelError = io.into();
        assert!(err.is_io());
    }

    #[test]
    fn test_shadow_errors() {
        let err = ModelError::invalid_shadow_markers("Invoice", "Number");
        assert!(err.to_string().contains("exactly one of new or override"));

        let err = ModelError::override_non_virtual("Invoice", "Number");
        assert!(err.is_construction());
    }
}

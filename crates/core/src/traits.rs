//! Core traits for Modelium
//!
//! This module defines the fundamental traits that components throughout
//! the schema graph implement to provide consistent behavior for
//! validation, identity, and persistence.

use crate::error::ModelResult;
use serde::{Serialize, de::DeserializeOwned};

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for types that can be validated
///
/// Types implementing this trait can check their internal consistency
/// and return validation errors if the state is invalid.
///
/// # Example
///
/// ```rust,ignore
/// use modelium_core::{Validatable, ModelResult, ModelError};
///
/// struct Prop {
///     name: String,
/// }
///
/// impl Validatable for Prop {
///     fn validate(&self) -> ModelResult<()> {
///         if self.name.is_empty() {
///             return Err(ModelError::validation("Name cannot be empty"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Validate the current state of the object
    ///
    /// Returns `Ok(())` if valid, or a `ModelError` describing the problem.
    fn validate(&self) -> ModelResult<()>;

    /// Check if the object is valid without returning error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Get all validation errors (for types that can have multiple errors)
    fn validation_errors(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => vec![],
            Err(e) => vec![e.to_string()],
        }
    }
}

// ============================================================================
// Persistable Trait
// ============================================================================

/// Trait for types that can be serialized to and deserialized from files
///
/// Types implementing this trait can be saved to and loaded from
/// schema files (JSON format).
pub trait Persistable: Serialize + DeserializeOwned + Sized {
    /// Get the file extension for this type (without the dot)
    fn file_extension() -> &'static str;

    /// Get the schema version for migration purposes
    fn schema_version() -> u32 {
        1
    }

    /// Save to a JSON string
    fn to_json(&self) -> ModelResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Load from a JSON string
    fn from_json(json: &str) -> ModelResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Save to a file
    fn save_to_file(&self, path: &std::path::Path) -> ModelResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| crate::error::ModelError::FileWrite {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from a file
    fn load_from_file(path: &std::path::Path) -> ModelResult<Self> {
        let json =
            std::fs::read_to_string(path).map_err(|e| crate::error::ModelError::FileRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::from_json(&json)
    }
}

// ============================================================================
// Identifiable Trait
// ============================================================================

/// Trait for types that have a unique identifier
///
/// Types implementing this trait have a UUID-based identifier
/// that can be used for lookups and cross-references.
pub trait Identifiable {
    /// Get the unique identifier
    fn id(&self) -> uuid::Uuid;

    /// Check if this matches another identifier
    fn matches_id(&self, id: uuid::Uuid) -> bool {
        self.id() == id
    }
}

// ============================================================================
// Named Trait
// ============================================================================

/// Trait for types that have a name
pub trait Named {
    /// Get the name
    fn name(&self) -> &str;

    /// Set the name
    fn set_name(&mut self, name: String);

    /// Check if the name matches (case-insensitive)
    fn name_matches(&self, other: &str) -> bool {
        self.name().eq_ignore_ascii_case(other)
    }
}

// ============================================================================
// Timestamped Trait
// ============================================================================

/// Trait for types that track creation and modification times
pub trait Timestamped {
    /// Get the creation timestamp
    fn created_at(&self) -> chrono::DateTime<chrono::Utc>;

    /// Get the last modification timestamp
    fn modified_at(&self) -> chrono::DateTime<chrono::Utc>;

    /// Update the modification timestamp to now
    fn touch(&mut self);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Test implementation for Validatable
    struct TestValidatable {
        valid: bool,
    }

    impl Validatable for TestValidatable {
        fn validate(&self) -> ModelResult<()> {
            if self.valid {
                Ok(())
            } else {
                Err(crate::error::ModelError::validation("Invalid state"))
            }
        }
    }

    #[test]
    fn test_validatable_trait() {
        let valid = TestValidatable { valid: true };
        assert!(valid.is_valid());
        assert!(valid.validation_errors().is_empty());

        let invalid = TestValidatable { valid: false };
        assert!(!invalid.is_valid());
        assert!(!invalid.validation_errors().is_empty());
    }

    // Test implementation for Persistable
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    struct TestDoc {
        name: String,
    }

    impl Persistable for TestDoc {
        fn file_extension() -> &'static str {
            "tdoc"
        }
    }

    #[test]
    fn test_persistable_json_round_trip() {
        let doc = TestDoc {
            name: "sample".to_string(),
        };
        let json = doc.to_json().unwrap();
        let back = TestDoc::from_json(&json).unwrap();
        assert_eq!(doc, back);
    }
}

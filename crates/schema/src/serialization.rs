//! Versioned schema persistence
//!
//! Schemas save as JSON inside a [`SchemaFile`] wrapper carrying a format
//! version, so older files can be migrated forward on load and newer
//! files are rejected with a clear error instead of a deserialization
//! failure deep in serde.

use std::path::Path;

use modelium_core::{ModelError, ModelResult, Persistable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registry::SchemaRegistry;

/// File extension for saved schemas (without the dot)
pub const SCHEMA_EXTENSION: &str = "mld";

/// Current schema file format version
pub const SCHEMA_FORMAT_VERSION: u32 = 1;

// ============================================================================
// SchemaFile
// ============================================================================

/// On-disk wrapper around a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Format version this file was written with
    pub schema_version: u32,

    /// Crate version this file was written with (informational)
    pub created_with: String,

    /// The schema itself
    pub schema: SchemaRegistry,
}

impl SchemaFile {
    /// Wrap a schema for saving at the current format version
    pub fn new(schema: SchemaRegistry) -> Self {
        Self {
            schema_version: SCHEMA_FORMAT_VERSION,
            created_with: modelium_core::VERSION.to_string(),
            schema,
        }
    }

    /// Check if the file predates the current format version
    pub fn needs_migration(&self) -> bool {
        self.schema_version < SCHEMA_FORMAT_VERSION
    }

    /// Migrate the file forward to the current format version
    ///
    /// Version 1 is the first format; future versions add their steps
    /// here, each bumping `schema_version` by one.
    pub fn migrate(&mut self) -> ModelResult<()> {
        while self.needs_migration() {
            match self.schema_version {
                0 => {
                    // Pre-release files carry no structural differences.
                    self.schema_version = 1;
                }
                v => {
                    return Err(ModelError::InvalidSchemaFormat(format!(
                        "no migration path from format version {}",
                        v
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Persistable for SchemaFile {
    fn file_extension() -> &'static str {
        SCHEMA_EXTENSION
    }

    fn schema_version() -> u32 {
        SCHEMA_FORMAT_VERSION
    }
}

// ============================================================================
// Save / load
// ============================================================================

/// Save a schema to a file at the current format version
pub fn save_schema(schema: &SchemaRegistry, path: &Path) -> ModelResult<()> {
    let file = SchemaFile::new(schema.clone());
    file.save_to_file(path)?;
    debug!(path = %path.display(), name = %schema.meta.name, "schema saved");
    Ok(())
}

/// Load a schema from a file, migrating older formats forward
pub fn load_schema(path: &Path) -> ModelResult<SchemaRegistry> {
    let mut file = SchemaFile::load_from_file(path)?;

    if file.schema_version > SCHEMA_FORMAT_VERSION {
        return Err(ModelError::SchemaVersionMismatch {
            expected: SCHEMA_FORMAT_VERSION.to_string(),
            found: file.schema_version.to_string(),
        });
    }
    file.migrate()?;

    debug!(path = %path.display(), name = %file.schema.meta.name, "schema loaded");
    Ok(file.schema)
}

// ============================================================================
// Tests
// ============================================================================

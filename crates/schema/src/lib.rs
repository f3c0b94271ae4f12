//! # Modelium Schema
//!
//! The schema graph at the heart of Modelium: types and properties with
//! inheritance-aware enumeration, reference wiring with auto-created
//! foreign keys, formed navigation paths, model-to-store projection, and
//! the data graph builder that turns property sets into minimal
//! select/expand trees for generators.
//!
//! Everything hangs off [`SchemaRegistry`]: types and properties
//! cross-reference each other by id and resolve through the registry, so
//! the graph stays serializable and mutation stays explicit.

pub mod builder;
pub mod data_graph;
pub mod naming;
pub mod navigation;
pub mod projector;
pub mod prop;
pub mod reference;
pub mod registry;
pub mod serialization;
pub mod type_def;
pub mod validate;

// Re-export commonly used items at crate root
pub use builder::{PropBuilder, TypeBuilder};
pub use data_graph::{
    GraphNode, GraphOptions, build_data_graph, build_data_graph_from_paths, merge, render,
};
pub use navigation::{NavStep, NavigationPath};
pub use prop::PropDef;
pub use reference::Reference;
pub use registry::{SchemaMeta, SchemaRegistry};
pub use serialization::{
    SCHEMA_EXTENSION, SCHEMA_FORMAT_VERSION, SchemaFile, load_schema, save_schema,
};
pub use type_def::{SoftReference, TypeDef};
pub use validate::{Severity, ValidationIssue, ValidationReport, validate_schema};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! # Modelium Core
//!
//! Core types, traits, and error handling for Modelium.
//!
//! This crate provides the foundational building blocks used throughout
//! the Modelium workspace, including:
//!
//! - **Types**: Type kinds, scalar types, the property type descriptor,
//!   multiplicity/binding flag sets, validation rules, and default values
//! - **Traits**: Common behaviors like `Validatable` and `Persistable`
//! - **Errors**: Unified error handling with `ModelError` and `ModelResult`
//!

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{ModelError, ModelResult};
pub use traits::{Identifiable, Named, Persistable, Timestamped, Validatable};
pub use types::{
    Binding, DefaultValue, DeletedMarker, Multiplicity, PropId, PropRules, PropType,
    ReferenceAxis, ScalarType, ScopedDefault, TypeId, TypeKind, UiWidget, UsageScenario,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

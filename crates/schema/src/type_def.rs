//! Type definitions
//!
//! [`TypeDef`] is the per-type record of the schema graph: kind,
//! single-parent base chain, the paired store type for models, locally
//! declared properties, implemented interfaces, and soft references.

use chrono::{DateTime, Utc};
use modelium_core::{
    Identifiable, ModelError, ModelResult, Named, PropId, Timestamped, TypeId, TypeKind,
    Validatable,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::naming::{is_valid_identifier, pluralize, to_snake_case};
use crate::prop::PropDef;

// ============================================================================
// SoftReference
// ============================================================================

/// A condition-based relationship not backed by a stored foreign key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftReference {
    /// Target type of the relationship
    pub to_type: TypeId,

    /// Condition expression joining the two sides
    pub condition: String,

    /// Optional description
    pub description: Option<String>,
}

impl SoftReference {
    /// Create a soft reference
    pub fn new(to_type: TypeId, condition: impl Into<String>) -> Self {
        Self {
            to_type,
            condition: condition.into(),
            description: None,
        }
    }
}

// ============================================================================
// TypeDef
// ============================================================================

/// A type in the schema graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    /// Unique identifier
    pub id: TypeId,

    /// Type name (PascalCase by convention)
    pub name: String,

    /// Pluralized name for collections and endpoints
    pub plural_name: String,

    /// Class name emitted by generators (defaults to `name`)
    pub class_name: String,

    /// Optional namespace for generated code
    pub namespace: Option<String>,

    /// Kind of the type
    pub kind: TypeKind,

    /// Cannot be instantiated directly
    pub is_abstract: bool,

    /// Cannot be derived from
    pub is_sealed: bool,

    /// Rows are partitioned by a tenant key
    pub is_multitenant: bool,

    /// Single-parent base type (same kind)
    pub base: Option<TypeId>,

    /// Paired store type (models only; store is entity-kind)
    pub store: Option<TypeId>,

    /// Locally declared properties in declaration order
    pub local_props: Vec<PropDef>,

    /// Implemented interface types
    pub interfaces: Vec<TypeId>,

    /// Condition-based relationships without a stored foreign key
    pub soft_references: Vec<SoftReference>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl TypeDef {
    /// Create a new type of the given kind
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            plural_name: pluralize(&to_snake_case(&name)),
            class_name: name.clone(),
            name,
            namespace: None,
            kind,
            is_abstract: false,
            is_sealed: false,
            is_multitenant: false,
            base: None,
            store: None,
            local_props: Vec::new(),
            interfaces: Vec::new(),
            soft_references: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the plural name
    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural_name = plural.into();
        self
    }

    /// Mark as abstract
    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Mark as sealed
    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    /// Mark as multitenant
    pub fn multitenant(mut self) -> Self {
        self.is_multitenant = true;
        self
    }

    // ========================================================================
    // Local property management
    // ========================================================================

    /// Add a locally declared property
    ///
    /// Fails on a duplicate local name; shadowing of inherited names is
    /// checked later, when the effective set is enumerated.
    pub fn add_local_prop(&mut self, prop: PropDef) -> ModelResult<PropId> {
        if self.local_props.iter().any(|p| p.name == prop.name) {
            return Err(ModelError::duplicate_prop(&self.name, &prop.name));
        }
        let id = prop.id;
        self.local_props.push(prop);
        self.touch();
        Ok(id)
    }

    /// Find a local property by name
    pub fn local_prop(&self, name: &str) -> Option<&PropDef> {
        self.local_props.iter().find(|p| p.name == name)
    }

    /// Find a local property by id
    pub fn local_prop_by_id(&self, id: PropId) -> Option<&PropDef> {
        self.local_props.iter().find(|p| p.id == id)
    }

    /// Find a local property by id, mutably
    pub fn local_prop_by_id_mut(&mut self, id: PropId) -> Option<&mut PropDef> {
        self.local_props.iter_mut().find(|p| p.id == id)
    }

    /// Remove a local property by id
    pub fn remove_local_prop(&mut self, id: PropId) -> Option<PropDef> {
        let index = self.local_props.iter().position(|p| p.id == id)?;
        self.touch();
        Some(self.local_props.remove(index))
    }

    /// Check if this type may own a store
    pub fn can_own_store(&self) -> bool {
        self.kind.can_own_store()
    }
}

impl Validatable for TypeDef {
    fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::validation("Type name cannot be empty"));
        }
        if !is_valid_identifier(&self.name) {
            return Err(ModelError::validation(format!(
                "Type name '{}' is not a valid identifier",
                self.name
            )));
        }
        if self.store.is_some() && !self.can_own_store() {
            return Err(ModelError::validation(format!(
                "Type '{}' ({}) cannot own a store; only models can",
                self.name, self.kind
            )));
        }
        if self.is_abstract && self.is_sealed {
            return Err(ModelError::validation(format!(
                "Type '{}' cannot be both abstract and sealed",
                self.name
            )));
        }
        for prop in &self.local_props {
            prop.validate()?;
        }
        Ok(())
    }
}

impl Identifiable for TypeDef {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Named for TypeDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.plural_name = pluralize(&to_snake_case(&name));
        self.class_name = name.clone();
        self.name = name;
        self.touch();
    }
}

impl Timestamped for TypeDef {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

impl PartialEq for TypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDef {}

impl std::hash::Hash for TypeDef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for TypeDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

// ============================================================================
// Tests
// ============================================================================

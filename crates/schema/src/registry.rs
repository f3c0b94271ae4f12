//! Schema registry
//!
//! [`SchemaRegistry`] owns every [`TypeDef`] in a schema, keyed by id with
//! stable insertion order, and answers the inheritance-aware queries the
//! rest of the workspace builds on: effective property enumeration with
//! shadowing rules, key/marker lookups, model-to-store resolution, and the
//! idempotent build passes.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use modelium_core::{
    DeletedMarker, ModelError, ModelResult, PropId, Timestamped, TypeId, TypeKind, UiWidget,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::projector;
use crate::prop::PropDef;
use crate::type_def::TypeDef;

/// Property name that conventionally marks soft-deleted rows
const DELETED_MARKER_NAME: &str = "IsDeleted";

// ============================================================================
// SchemaMeta
// ============================================================================

/// Schema-level metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMeta {
    /// Schema name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl SchemaMeta {
    fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            created_at: now,
            modified_at: now,
        }
    }
}

// ============================================================================
// SchemaRegistry
// ============================================================================

/// The canonical schema graph
///
/// All cross-references between types and properties are id links resolved
/// through the registry; nothing in the graph holds a direct pointer to
/// anything else. Mutation flows through `&mut self`, and the build passes
/// are reentrant: running them again on an already-built schema is a no-op
/// apart from re-syncing store properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistry {
    /// Schema-level metadata
    pub meta: SchemaMeta,

    /// All types keyed by id
    types: HashMap<TypeId, TypeDef>,

    /// Type ids in insertion order
    order: Vec<TypeId>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: SchemaMeta::new(name),
            types: HashMap::new(),
            order: Vec::new(),
        }
    }

    // ========================================================================
    // Type creation
    // ========================================================================

    /// Register a type, returning its id
    pub fn add_type(&mut self, type_def: TypeDef) -> TypeId {
        let id = type_def.id;
        self.order.push(id);
        self.types.insert(id, type_def);
        self.meta.modified_at = Utc::now();
        id
    }

    /// Create an entity-kind type
    pub fn create_entity(&mut self, name: impl Into<String>) -> TypeId {
        self.add_type(TypeDef::new(name, TypeKind::Entity))
    }

    /// Create a model-kind type
    pub fn create_model(&mut self, name: impl Into<String>) -> TypeId {
        self.add_type(TypeDef::new(name, TypeKind::Model))
    }

    /// Create an enum-kind type
    pub fn create_enum(&mut self, name: impl Into<String>) -> TypeId {
        self.add_type(TypeDef::new(name, TypeKind::Enum))
    }

    /// Create a complex-kind type
    pub fn create_complex(&mut self, name: impl Into<String>) -> TypeId {
        self.add_type(TypeDef::new(name, TypeKind::Complex))
    }

    /// Create an interface-kind type
    pub fn create_interface(&mut self, name: impl Into<String>) -> TypeId {
        self.add_type(TypeDef::new(name, TypeKind::Interface))
    }

    // ========================================================================
    // Type lookup
    // ========================================================================

    /// Get a type by id
    pub fn get_type(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(&id)
    }

    /// Get a type by id, failing loudly when absent
    pub fn require_type(&self, id: TypeId) -> ModelResult<&TypeDef> {
        self.types
            .get(&id)
            .ok_or_else(|| ModelError::type_not_found(id.to_string()))
    }

    /// Get a type by id, mutably
    pub fn type_mut(&mut self, id: TypeId) -> ModelResult<&mut TypeDef> {
        self.meta.modified_at = Utc::now();
        self.types
            .get_mut(&id)
            .ok_or_else(|| ModelError::type_not_found(id.to_string()))
    }

    /// Find a type by name
    pub fn find_type_by_name(&self, name: &str) -> Option<&TypeDef> {
        self.order
            .iter()
            .filter_map(|id| self.types.get(id))
            .find(|t| t.name == name)
    }

    /// All types in insertion order
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.order.iter().filter_map(|id| self.types.get(id))
    }

    /// Number of registered types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // ========================================================================
    // Property lookup
    // ========================================================================

    /// Add a property to a type
    ///
    /// Only local duplicate names are rejected here; shadowing of inherited
    /// names is checked when the effective set is enumerated.
    pub fn add_prop(&mut self, type_id: TypeId, prop: PropDef) -> ModelResult<PropId> {
        self.type_mut(type_id)?.add_local_prop(prop)
    }

    /// Find a property anywhere in the registry, with its owning type
    pub fn find_prop(&self, prop_id: PropId) -> Option<(&TypeDef, &PropDef)> {
        self.types().find_map(|t| {
            t.local_prop_by_id(prop_id).map(|p| (t, p))
        })
    }

    /// Find a property, failing loudly when absent
    pub fn require_prop(&self, prop_id: PropId) -> ModelResult<(&TypeDef, &PropDef)> {
        self.find_prop(prop_id)
            .ok_or_else(|| ModelError::prop_not_found("<any>", prop_id.to_string()))
    }

    /// Find a property anywhere in the registry, mutably
    pub fn prop_mut(&mut self, prop_id: PropId) -> ModelResult<&mut PropDef> {
        self.meta.modified_at = Utc::now();
        let owner = self
            .order
            .iter()
            .find(|id| {
                self.types
                    .get(id)
                    .is_some_and(|t| t.local_prop_by_id(prop_id).is_some())
            })
            .copied()
            .ok_or_else(|| ModelError::prop_not_found("<any>", prop_id.to_string()))?;
        self.types
            .get_mut(&owner)
            .and_then(|t| t.local_prop_by_id_mut(prop_id))
            .ok_or_else(|| ModelError::prop_not_found("<any>", prop_id.to_string()))
    }

    // ========================================================================
    // Inheritance
    // ========================================================================

    /// Set a type's base, enforcing kind equality and acyclicity
    pub fn set_base(&mut self, type_id: TypeId, base_id: TypeId) -> ModelResult<()> {
        let kind = self.require_type(type_id)?.kind;
        let base = self.require_type(base_id)?;
        if base.kind != kind {
            return Err(ModelError::BaseKindMismatch {
                type_name: self.require_type(type_id)?.name.clone(),
                kind: kind.to_string(),
                base_name: base.name.clone(),
                base_kind: base.kind.to_string(),
            });
        }
        if type_id == base_id || self.is_kind_of(base_id, type_id) {
            return Err(ModelError::validation(format!(
                "Setting base of '{}' would create an inheritance cycle",
                self.require_type(type_id)?.name
            )));
        }
        self.type_mut(type_id)?.base = Some(base_id);
        Ok(())
    }

    /// The base chain of a type, root first, ending with the type itself
    pub fn base_chain_root_first(&self, type_id: TypeId) -> ModelResult<Vec<TypeId>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(type_id);

        while let Some(id) = current {
            if !seen.insert(id) {
                let name = self.require_type(type_id)?.name.clone();
                return Err(ModelError::validation(format!(
                    "Base chain of '{}' contains a cycle",
                    name
                )));
            }
            chain.push(id);
            current = self.require_type(id)?.base;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Check if `ancestor` appears in `type_id`'s ancestor-or-self chain
    pub fn is_kind_of(&self, type_id: TypeId, ancestor: TypeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(type_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.get_type(id).and_then(|t| t.base);
        }
        false
    }

    /// The effective property set of a type
    ///
    /// Walks the base chain root-first and applies the shadowing rules: a
    /// child property with an inherited name must carry exactly one of the
    /// new/override markers, and overriding requires the ancestor property
    /// to be virtual. A shadowing property replaces the ancestor's at the
    /// ancestor's position.
    pub fn effective_props(&self, type_id: TypeId) -> ModelResult<Vec<&PropDef>> {
        let chain = self.base_chain_root_first(type_id)?;
        let type_name = self.require_type(type_id)?.name.clone();

        let mut props: Vec<&PropDef> = Vec::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();

        for level_id in chain {
            let level = self.require_type(level_id)?;
            for prop in &level.local_props {
                match by_name.get(prop.name.as_str()) {
                    None => {
                        by_name.insert(prop.name.as_str(), props.len());
                        props.push(prop);
                    }
                    Some(&index) => {
                        if prop.is_new == prop.is_override {
                            // Both markers, or neither.
                            if prop.is_new {
                                return Err(ModelError::invalid_shadow_markers(
                                    &type_name, &prop.name,
                                ));
                            }
                            return Err(ModelError::duplicate_prop(&type_name, &prop.name));
                        }
                        if prop.is_override && !props[index].is_virtual {
                            return Err(ModelError::override_non_virtual(&type_name, &prop.name));
                        }
                        props[index] = prop;
                    }
                }
            }
        }

        Ok(props)
    }

    // ========================================================================
    // Single-result lookups
    // ========================================================================

    /// Find the key property, erroring on duplicates
    pub fn find_key(&self, type_id: TypeId) -> ModelResult<Option<&PropDef>> {
        let keys: Vec<&PropDef> = self
            .effective_props(type_id)?
            .into_iter()
            .filter(|p| p.is_key)
            .collect();
        match keys.len() {
            0 => Ok(None),
            1 => Ok(Some(keys[0])),
            _ => Err(ModelError::DuplicateKey {
                type_name: self.require_type(type_id)?.name.clone(),
            }),
        }
    }

    /// Get the key property, failing loudly when absent
    pub fn require_key(&self, type_id: TypeId) -> ModelResult<&PropDef> {
        let name = self.require_type(type_id)?.name.clone();
        self.find_key(type_id)?
            .ok_or(ModelError::KeyNotFound(name))
    }

    /// Find the tenant key property
    pub fn find_tenant_key(&self, type_id: TypeId) -> ModelResult<Option<&PropDef>> {
        Ok(self
            .effective_props(type_id)?
            .into_iter()
            .find(|p| p.is_tenant_key))
    }

    /// Get the tenant key property, failing loudly when absent
    pub fn require_tenant_key(&self, type_id: TypeId) -> ModelResult<&PropDef> {
        let name = self.require_type(type_id)?.name.clone();
        self.find_tenant_key(type_id)?
            .ok_or(ModelError::TenantKeyNotFound(name))
    }

    /// Find the first property marked with any of the given deletion kinds
    pub fn find_deleted_marker(
        &self,
        type_id: TypeId,
        kinds: &[DeletedMarker],
    ) -> ModelResult<Option<&PropDef>> {
        Ok(self
            .effective_props(type_id)?
            .into_iter()
            .find(|p| kinds.contains(&p.deleted_marker)))
    }

    /// Get a deletion marker property, failing loudly when absent
    pub fn require_deleted_marker(
        &self,
        type_id: TypeId,
        kinds: &[DeletedMarker],
    ) -> ModelResult<&PropDef> {
        let name = self.require_type(type_id)?.name.clone();
        self.find_deleted_marker(type_id, kinds)?
            .ok_or(ModelError::DeletedMarkerNotFound(name))
    }

    /// Find the to-one reference whose foreign key targets the given type
    ///
    /// Candidates are scanned in effective declaration order (base chain
    /// root-first, then locals) and the first match wins; when both a
    /// navigation property and its bare foreign key qualify, the navigation
    /// property is returned.
    pub fn find_reference_with_foreign_key(
        &self,
        type_id: TypeId,
        target: TypeId,
    ) -> ModelResult<Option<&PropDef>> {
        let props = self.effective_props(type_id)?;
        for prop in &props {
            let r = &prop.reference;
            if !r.is_to_one() || r.target() != Some(target) || r.foreign_key.is_none() {
                continue;
            }
            if prop.is_navigation() {
                return Ok(Some(prop));
            }
            // Bare foreign key: prefer its paired navigation property.
            if let Some(nav_id) = r.navigation_prop {
                if let Some(nav) = props.iter().find(|p| p.id == nav_id) {
                    return Ok(Some(nav));
                }
            }
            return Ok(Some(prop));
        }
        Ok(None)
    }

    /// Get the to-one reference targeting a type, failing loudly when absent
    pub fn require_reference_with_foreign_key(
        &self,
        type_id: TypeId,
        target: TypeId,
    ) -> ModelResult<&PropDef> {
        let type_name = self.require_type(type_id)?.name.clone();
        let target_name = self.require_type(target)?.name.clone();
        self.find_reference_with_foreign_key(type_id, target)?
            .ok_or(ModelError::ReferenceNotFound {
                type_name,
                target: target_name,
            })
    }

    // ========================================================================
    // Model-to-store resolution
    // ========================================================================

    /// The type's store id when it has one, otherwise the type itself
    pub fn store_or_self(&self, type_id: TypeId) -> TypeId {
        self.get_type(type_id)
            .and_then(|t| t.store)
            .unwrap_or(type_id)
    }

    /// The type's store id, failing loudly when absent
    pub fn required_store(&self, type_id: TypeId) -> ModelResult<TypeId> {
        let t = self.require_type(type_id)?;
        t.store
            .ok_or_else(|| ModelError::missing_store(format!("Type '{}' has no store", t.name)))
    }

    /// The entity-kind equivalent of a type: its store for models, itself
    /// otherwise
    pub fn entity_type_for(&self, type_id: TypeId) -> ModelResult<TypeId> {
        if self.require_type(type_id)?.kind.is_model() {
            self.required_store(type_id)
        } else {
            Ok(type_id)
        }
    }

    /// The entity-side counterpart of a property
    ///
    /// For a property on a model type this is its linked store property
    /// (missing link is fatal); for anything else the property itself.
    pub fn store_prop_for(&self, prop_id: PropId) -> ModelResult<PropId> {
        let (owner, prop) = self.require_prop(prop_id)?;
        if owner.kind.is_model() {
            prop.store.ok_or_else(|| {
                ModelError::missing_store(format!(
                    "Property '{}' on model '{}' has no store property",
                    prop.name, owner.name
                ))
            })
        } else {
            Ok(prop_id)
        }
    }

    // ========================================================================
    // Build passes
    // ========================================================================

    /// Run the full build pass for one type
    ///
    /// For a model with a store this allocates and syncs store properties,
    /// then applies the finishing conventions (deleted-marker naming,
    /// widget inference, excluded-property removal). Reentrant.
    pub fn build_type(&mut self, type_id: TypeId) -> ModelResult<()> {
        let (name, is_projected) = {
            let t = self.require_type(type_id)?;
            (t.name.clone(), t.kind.is_model() && t.store.is_some())
        };
        debug!(type_name = %name, projected = is_projected, "building type");

        if is_projected {
            projector::allocate_store_props(self, type_id)?;
            projector::sync_store_props(self, type_id)?;
        }
        self.finalize_type(type_id)?;
        if is_projected {
            let store = self.required_store(type_id)?;
            self.finalize_type(store)?;
        }
        Ok(())
    }

    /// Run the build pass for every type
    ///
    /// The allocation phase runs for all projected models before any sync
    /// phase, so cross-type reference rewriting always finds its store
    /// mappings.
    pub fn build_all(&mut self) -> ModelResult<()> {
        let all: Vec<TypeId> = self.order.clone();

        let projected: Vec<TypeId> = all
            .iter()
            .copied()
            .filter(|id| {
                self.get_type(*id)
                    .is_some_and(|t| t.kind.is_model() && t.store.is_some())
            })
            .collect();

        for &id in &projected {
            projector::allocate_store_props(self, id)?;
        }
        for &id in &projected {
            projector::sync_store_props(self, id)?;
        }
        for &id in &all {
            self.finalize_type(id)?;
        }

        debug!(
            types = all.len(),
            projected = projected.len(),
            "schema build complete"
        );
        Ok(())
    }

    /// Apply finishing conventions to a type's local properties
    fn finalize_type(&mut self, type_id: TypeId) -> ModelResult<()> {
        let t = self.type_mut(type_id)?;

        let mut removed = Vec::new();
        for prop in &mut t.local_props {
            if prop.deleted_marker == DeletedMarker::None && prop.name == DELETED_MARKER_NAME {
                prop.deleted_marker = DeletedMarker::Own;
            }
            if prop.ui_widget.is_none() {
                prop.ui_widget = Some(UiWidget::for_prop_type(&prop.prop_type));
            }
            if prop.is_excluded {
                removed.push(prop.id);
            }
        }
        for id in removed {
            t.remove_local_prop(id);
        }
        t.touch();
        Ok(())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new("schema")
    }
}

// ============================================================================
// Tests
// ============================================================================

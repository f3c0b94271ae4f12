//! Reference metadata attached to navigation properties
//!
//! A [`Reference`] records how a property relates its owning type to a
//! target type: cardinality, binding style, direction within the
//! containment hierarchy, and the paired foreign-key/navigation property
//! endpoints on either side of the relationship.

use modelium_core::{Binding, ModelError, ModelResult, Multiplicity, PropId, ReferenceAxis, TypeId};
use serde::{Deserialize, Serialize};

use crate::registry::SchemaRegistry;

// ============================================================================
// Reference
// ============================================================================

/// Relationship metadata carried by a property
///
/// Every property carries a `Reference` value; for plain scalar properties
/// it is the inert default (`is == false`) and every derived query answers
/// false or `None`. The flag-set representation lets one reference express
/// optionality and cardinality together (e.g. `ONE | ZERO`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Reference {
    /// Whether this property is a reference at all
    pub is: bool,

    /// Cardinality of the relationship
    pub multiplicity: Multiplicity,

    /// Binding style (loose/nested/owned/associated/independent)
    pub binding: Binding,

    /// Direction within the containment hierarchy
    pub axis: ReferenceAxis,

    /// Whether the property holds a collection of targets
    pub is_collection: bool,

    /// Target type of the relationship
    pub to_type: Option<TypeId>,

    /// Scalar property on the owning type holding the target's key
    pub foreign_key: Option<PropId>,

    /// Navigation property paired with the foreign key
    pub navigation_prop: Option<PropId>,

    /// On the item side of a collection: the item's back-reference property
    pub foreign_item_to_collection_prop: Option<PropId>,

    /// On the item side of a collection: the owner's collection property
    pub foreign_collection_prop: Option<PropId>,

    /// Deletion of targets may skip per-row processing
    pub is_deletion_optimized: bool,

    /// Soft-delete cascade through this reference is suppressed
    pub is_soft_delete_cascade_disabled: bool,
}

impl Reference {
    /// Create an inert non-reference
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a required to-one reference
    pub fn to_one(to_type: TypeId) -> Self {
        Self {
            is: true,
            multiplicity: Multiplicity::ONE,
            binding: Binding::ASSOCIATED,
            axis: ReferenceAxis::ToParent,
            is_collection: false,
            to_type: Some(to_type),
            ..Self::default()
        }
    }

    /// Create a to-many collection reference
    pub fn to_many(to_type: TypeId) -> Self {
        Self {
            is: true,
            multiplicity: Multiplicity::MANY,
            binding: Binding::ASSOCIATED,
            axis: ReferenceAxis::ToCollection,
            is_collection: true,
            to_type: Some(to_type),
            ..Self::default()
        }
    }

    // ========================================================================
    // Derived queries
    // ========================================================================

    /// Check if this reference points at a single target
    pub fn is_to_one(&self) -> bool {
        self.is && self.multiplicity.is_to_one()
    }

    /// Check if this reference points at many targets
    pub fn is_to_many(&self) -> bool {
        self.is && self.multiplicity.is_to_many()
    }

    /// Check if the relationship may be absent
    pub fn is_optional(&self) -> bool {
        self.is && self.multiplicity.is_optional()
    }

    /// Check if this reference points from a child to its parent
    pub fn is_to_parent(&self) -> bool {
        self.is && self.axis == ReferenceAxis::ToParent
    }

    /// Check if this reference points at a collection of children
    pub fn is_to_collection(&self) -> bool {
        self.is && self.axis == ReferenceAxis::ToCollection
    }

    /// Check if the target is fetched detached rather than joined
    pub fn is_loose(&self) -> bool {
        self.is && self.binding.contains(Binding::LOOSE)
    }

    /// Check if the source owns the target's lifetime
    pub fn is_owned(&self) -> bool {
        self.is && self.binding.contains(Binding::OWNED)
    }

    /// Check if target rows nest inside the source's aggregate
    pub fn is_nested(&self) -> bool {
        self.is && self.binding.contains(Binding::NESTED)
    }

    /// Get the target type, or None for a non-reference
    pub fn target(&self) -> Option<TypeId> {
        if self.is { self.to_type } else { None }
    }

    // ========================================================================
    // Projection support
    // ========================================================================

    /// Rewrite this reference so every endpoint lives on the store side
    ///
    /// `source` is the model property being projected and `entity` its
    /// already-allocated store property; when an endpoint is `source`
    /// itself the pair is substituted directly, which is what lets
    /// self-referential relationships terminate. Every other endpoint is
    /// resolved through the registry's model-to-store property mapping,
    /// and a Model-kind target type is replaced by its store type.
    pub fn clone_to_entity(
        &self,
        registry: &SchemaRegistry,
        source: PropId,
        entity: PropId,
    ) -> ModelResult<Reference> {
        if !self.is {
            return Ok(Reference::none());
        }

        let map_prop = |prop: Option<PropId>| -> ModelResult<Option<PropId>> {
            match prop {
                None => Ok(None),
                Some(pid) if pid == source => Ok(Some(entity)),
                Some(pid) => registry.store_prop_for(pid).map(Some),
            }
        };

        let to_type = match self.to_type {
            None => None,
            Some(tid) => {
                let target = registry.require_type(tid)?;
                if target.kind.is_model() {
                    Some(registry.required_store(tid)?)
                } else {
                    Some(tid)
                }
            }
        };

        Ok(Reference {
            is: self.is,
            multiplicity: self.multiplicity,
            binding: self.binding,
            axis: self.axis,
            is_collection: self.is_collection,
            to_type,
            foreign_key: map_prop(self.foreign_key)?,
            navigation_prop: map_prop(self.navigation_prop)?,
            foreign_item_to_collection_prop: map_prop(self.foreign_item_to_collection_prop)?,
            foreign_collection_prop: map_prop(self.foreign_collection_prop)?,
            is_deletion_optimized: self.is_deletion_optimized,
            is_soft_delete_cascade_disabled: self.is_soft_delete_cascade_disabled,
        })
    }

    /// Validate internal consistency
    pub fn validate(&self) -> ModelResult<()> {
        if !self.is {
            return Ok(());
        }
        if self.to_type.is_none() {
            return Err(ModelError::validation(
                "Reference is active but has no target type",
            ));
        }
        if self.is_collection && !self.multiplicity.is_to_many() {
            return Err(ModelError::validation(
                "Collection reference must have MANY multiplicity",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inert_reference_answers_nothing() {
        let mut r = Reference::none();
        // Even with stray metadata set, `is == false` silences every query.
        r.multiplicity = Multiplicity::MANY;
        r.axis = ReferenceAxis::ToParent;
        r.to_type = Some(uuid::Uuid::new_v4());

        assert!(!r.is_to_many());
        assert!(!r.is_to_parent());
        assert!(!r.is_loose());
        assert_eq!(r.target(), None);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_to_one_shape() {
        let target = uuid::Uuid::new_v4();
        let r = Reference::to_one(target);

        assert!(r.is_to_one());
        assert!(!r.is_to_many());
        assert!(r.is_to_parent());
        assert_eq!(r.target(), Some(target));
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_to_many_shape() {
        let target = uuid::Uuid::new_v4();
        let r = Reference::to_many(target);

        assert!(r.is_to_many());
        assert!(r.is_collection);
        assert!(r.is_to_collection());
        assert!(!r.is_to_one());
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_optional_to_one() {
        let mut r = Reference::to_one(uuid::Uuid::new_v4());
        r.multiplicity = Multiplicity::ONE_OR_ZERO;

        assert!(r.is_to_one());
        assert!(r.is_optional());
    }

    #[test]
    fn test_validate_rejects_missing_target() {
        let mut r = Reference::to_one(uuid::Uuid::new_v4());
        r.to_type = None;
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_collection_without_many() {
        let mut r = Reference::to_many(uuid::Uuid::new_v4());
        r.multiplicity = Multiplicity::ONE;
        assert!(r.validate().is_err());
    }
}

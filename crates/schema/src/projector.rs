//! Model-to-store projection
//!
//! For every model-kind type that owns an entity-kind store, the projector
//! guarantees each pending model property a structurally equivalent store
//! property and keeps the pair in sync across repeated build passes.
//!
//! The pass is split in two phases. Allocation creates and links store
//! property shells (resolving auto-related siblings first, so an implicit
//! foreign key exists on the store side before the navigation property
//! that uses it). Sync re-copies every field onto the already-linked store
//! property through an explicit, statically enumerated copy routine:
//! plain values are copied, type/property/reference/path endpoints are
//! remapped to their store counterparts, and rules/defaults are cloned.
//! Both phases are idempotent.

use std::collections::HashSet;

use modelium_core::{ModelError, ModelResult, PropId, PropType, TypeId, TypeKind};
use tracing::{debug, trace};

use crate::prop::PropDef;
use crate::registry::SchemaRegistry;

// ============================================================================
// Allocation phase
// ============================================================================

/// Ensure every pending property of a projected model has a linked store
/// property shell
///
/// Fails when the model's store chain is incomplete: a base model without
/// its own store cannot be mirrored.
pub fn allocate_store_props(registry: &mut SchemaRegistry, model_id: TypeId) -> ModelResult<()> {
    let store_id = registry.required_store(model_id)?;
    check_store_chain(registry, model_id)?;

    let model_name = registry.require_type(model_id)?.name.clone();
    debug!(model = %model_name, "allocating store properties");

    let pending: Vec<PropId> = registry
        .require_type(model_id)?
        .local_props
        .iter()
        .filter(|p| p.is_store_pending || p.store.is_some())
        .map(|p| p.id)
        .collect();

    let mut visiting = HashSet::new();
    for prop_id in pending {
        allocate_prop(registry, model_id, store_id, prop_id, &mut visiting)?;
    }
    Ok(())
}

/// Verify the model's store chain mirrors its base chain
///
/// Every base model must own a store, and the store's base link must point
/// at the base model's store.
fn check_store_chain(registry: &mut SchemaRegistry, model_id: TypeId) -> ModelResult<()> {
    let store_id = registry.required_store(model_id)?;
    let base = registry.require_type(model_id)?.base;

    let Some(base_id) = base else {
        return Ok(());
    };

    let base_type = registry.require_type(base_id)?;
    let base_name = base_type.name.clone();
    let Some(base_store) = base_type.store else {
        let model_name = registry.require_type(model_id)?.name.clone();
        return Err(ModelError::projection_precondition(format!(
            "Model '{}' has a store but its base '{}' does not",
            model_name, base_name
        )));
    };

    match registry.require_type(store_id)?.base {
        None => {
            registry.type_mut(store_id)?.base = Some(base_store);
        }
        Some(existing) if existing == base_store => {}
        Some(_) => {
            let model_name = registry.require_type(model_id)?.name.clone();
            return Err(ModelError::projection_precondition(format!(
                "Store of model '{}' derives from a type that is not the base model's store",
                model_name
            )));
        }
    }
    Ok(())
}

/// Allocate (or find) the store property shell for one model property
///
/// Auto-related siblings are resolved first. Re-running on a linked
/// property is a no-op.
fn allocate_prop(
    registry: &mut SchemaRegistry,
    model_id: TypeId,
    store_id: TypeId,
    prop_id: PropId,
    visiting: &mut HashSet<PropId>,
) -> ModelResult<()> {
    if !visiting.insert(prop_id) {
        return Ok(());
    }

    let (already_linked, auto_related, shell) = {
        let model = registry.require_type(model_id)?;
        let prop = model.local_prop_by_id(prop_id).ok_or_else(|| {
            ModelError::prop_not_found(&model.name, prop_id.to_string())
        })?;
        (
            prop.store.is_some(),
            prop.auto_related_props.clone(),
            store_shell(prop),
        )
    };

    for related in auto_related {
        allocate_prop(registry, model_id, store_id, related, visiting)?;
    }

    if already_linked {
        let model_prop = registry.prop_mut(prop_id)?;
        model_prop.is_store_pending = false;
        return Ok(());
    }

    // A previous run may have left an unlinked store property of the same
    // name behind; reattach instead of duplicating.
    let existing = registry
        .require_type(store_id)?
        .local_prop(&shell.name)
        .map(|p| p.id);

    let store_prop_id = match existing {
        Some(id) => id,
        None => {
            trace!(prop = %shell.name, "creating store property");
            registry.type_mut(store_id)?.add_local_prop(shell)?
        }
    };

    let model_prop = registry.prop_mut(prop_id)?;
    model_prop.store = Some(store_prop_id);
    model_prop.is_store_pending = false;
    Ok(())
}

/// A bare store-side copy of a model property
///
/// Only identity-free fields are carried; everything relational is written
/// by the sync phase once all shells exist.
fn store_shell(prop: &PropDef) -> PropDef {
    let mut shell = PropDef::new(prop.name.clone(), prop.prop_type.clone());
    shell.field_name = prop.field_name.clone();
    shell.display_label = prop.display_label.clone();
    shell.description = prop.description.clone();
    shell
}

// ============================================================================
// Sync phase
// ============================================================================

/// Re-copy every linked property of a projected model onto its store
/// property
pub fn sync_store_props(registry: &mut SchemaRegistry, model_id: TypeId) -> ModelResult<()> {
    let model_name = registry.require_type(model_id)?.name.clone();
    debug!(model = %model_name, "syncing store properties");

    let props: Vec<(PropId, Option<PropId>, bool, bool, String)> = registry
        .require_type(model_id)?
        .local_props
        .iter()
        .map(|p| {
            (
                p.id,
                p.store,
                p.is_data_member,
                p.is_store_pending,
                p.name.clone(),
            )
        })
        .collect();

    for (prop_id, store, is_data_member, is_pending, name) in props {
        match store {
            Some(_) => assign_model_to_entity(registry, prop_id)?,
            None if is_data_member && !is_pending => {
                return Err(ModelError::missing_store(format!(
                    "Data-member property '{}' on model '{}' has no store property",
                    name, model_name
                )));
            }
            None => {}
        }
    }
    Ok(())
}

/// Copy one model property onto its linked store property
///
/// The copy is a closed-world routine: every field of [`PropDef`] is
/// handled explicitly, either copied as-is, remapped through the
/// registry's model-to-store resolution, or deep-cloned. A value shape
/// with no store-side equivalent is a hard failure.
pub fn assign_model_to_entity(registry: &mut SchemaRegistry, prop_id: PropId) -> ModelResult<()> {
    let (owner_name, source) = {
        let (owner, prop) = registry.require_prop(prop_id)?;
        (owner.name.clone(), prop.clone())
    };
    let store_pid = source.store.ok_or_else(|| {
        ModelError::missing_store(format!(
            "Property '{}' on model '{}' has no store property",
            source.name, owner_name
        ))
    })?;

    // Remapped values, computed against the immutable registry first.
    let prop_type = entity_prop_type(registry, &source)?;
    let reference = source
        .reference
        .clone_to_entity(registry, source.id, store_pid)?;
    let nav_to = source.nav_to.to_entity_path(registry)?.into_owned();
    let nav_from = source.nav_from.to_entity_path(registry)?.into_owned();
    let cascade_from_props = map_props(registry, &source.cascade_from_props)?;
    let auto_related_props = map_props(registry, &source.auto_related_props)?;

    let target = registry.prop_mut(store_pid)?;
    target.name = source.name.clone();
    target.field_name = source.field_name.clone();
    target.display_label = source.display_label.clone();
    target.description = source.description.clone();
    target.prop_type = prop_type;
    target.is_key = source.is_key;
    target.is_tenant_key = source.is_tenant_key;
    target.is_guid_key = source.is_guid_key;
    target.is_new = source.is_new;
    target.is_override = source.is_override;
    target.is_virtual = source.is_virtual;
    target.is_editable = source.is_editable;
    target.is_observable = source.is_observable;
    target.is_sortable = source.is_sortable;
    target.is_filterable = source.is_filterable;
    target.is_data_member = source.is_data_member;
    target.is_excluded = source.is_excluded;
    target.defaults = source.defaults.clone();
    target.rules = source.rules.clone();
    target.deleted_marker = source.deleted_marker;
    target.ui_widget = source.ui_widget;
    target.reference = reference;
    target.nav_to = nav_to;
    target.nav_from = nav_from;
    target.cascade_from_props = cascade_from_props;
    target.auto_related_props = auto_related_props;
    Ok(())
}

/// Map a property type descriptor onto the store side
fn entity_prop_type(registry: &SchemaRegistry, prop: &PropDef) -> ModelResult<PropType> {
    let map_target = |type_id: TypeId| -> ModelResult<TypeId> {
        let target = registry.require_type(type_id)?;
        match target.kind {
            TypeKind::Model => registry.required_store(type_id),
            TypeKind::Entity | TypeKind::Complex => Ok(type_id),
            TypeKind::Enum | TypeKind::Interface => Err(ModelError::unsupported_conversion(
                format!(
                    "Property '{}' references {} type '{}' in an object position",
                    prop.name, target.kind, target.name
                ),
            )),
        }
    };

    match &prop.prop_type {
        PropType::Scalar(_) | PropType::Enumeration { .. } => Ok(prop.prop_type.clone()),
        PropType::Object { type_id } => Ok(PropType::Object {
            type_id: map_target(*type_id)?,
        }),
        PropType::Collection { element_type } => Ok(PropType::Collection {
            element_type: map_target(*element_type)?,
        }),
    }
}

/// Map a list of property ids onto their store counterparts
fn map_props(registry: &SchemaRegistry, props: &[PropId]) -> ModelResult<Vec<PropId>> {
    props
        .iter()
        .map(|&pid| registry.store_prop_for(pid))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Reference;
    use modelium_core::ScalarType;
    use pretty_assertions::assert_eq;

    /// Model `Person { Name }` paired with an entity store
    fn person_schema() -> (SchemaRegistry, TypeId, TypeId) {
        let mut registry = SchemaRegistry::new("people");
        let person = registry.create_model("Person");
        let store = registry.create_entity("Person");
        registry.type_mut(person).unwrap().store = Some(store);

        let mut name = PropDef::new("Name", modelium_core::PropType::string());
        name.is_store_pending = true;
        registry.add_prop(person, name).unwrap();

        (registry, person, store)
    }

    #[test]
    fn test_simple_projection() {
        let (mut registry, person, store) = person_schema();
        registry.build_type(person).unwrap();

        let store_type = registry.get_type(store).unwrap();
        assert_eq!(store_type.local_props.len(), 1);

        let name = store_type.local_prop("Name").unwrap();
        assert!(name.prop_type.is_scalar());
        assert_eq!(name.field_name, "name");

        let model_name = registry.get_type(person).unwrap().local_prop("Name").unwrap();
        assert_eq!(model_name.store, Some(name.id));
        assert!(!model_name.is_store_pending);
    }

    #[test]
    fn test_build_is_idempotent() {
        let (mut registry, person, store) = person_schema();
        registry.build_type(person).unwrap();
        let first: Vec<PropId> = registry
            .get_type(store)
            .unwrap()
            .local_props
            .iter()
            .map(|p| p.id)
            .collect();

        registry.build_type(person).unwrap();
        let second: Vec<PropId> = registry
            .get_type(store)
            .unwrap()
            .local_props
            .iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_reference_rewritten_to_store_target() {
        let mut registry = SchemaRegistry::new("shop");
        let order = registry.create_model("Order");
        let order_store = registry.create_entity("OrderRow");
        let customer = registry.create_model("Customer");
        let customer_store = registry.create_entity("CustomerRow");
        registry.type_mut(order).unwrap().store = Some(order_store);
        registry.type_mut(customer).unwrap().store = Some(customer_store);

        let mut fk = PropDef::new(
            "CustomerId",
            modelium_core::PropType::scalar(ScalarType::Uuid),
        );
        fk.is_store_pending = true;
        let fk_id = fk.id;

        let mut nav = PropDef::new("Customer", modelium_core::PropType::object(customer));
        nav.is_store_pending = true;
        nav.auto_related_props = vec![fk_id];
        let mut reference = Reference::to_one(customer);
        reference.foreign_key = Some(fk_id);
        reference.navigation_prop = Some(nav.id);
        nav.reference = reference;

        registry.add_prop(order, fk).unwrap();
        let nav_id = registry.add_prop(order, nav).unwrap();

        registry.build_all().unwrap();

        let store_nav_id = registry.store_prop_for(nav_id).unwrap();
        let (store_owner, store_nav) = registry.find_prop(store_nav_id).unwrap();
        assert_eq!(store_owner.id, order_store);
        assert_eq!(store_nav.reference.target(), Some(customer_store));

        // Endpoints remapped to store-side properties.
        let store_fk = registry.store_prop_for(fk_id).unwrap();
        assert_eq!(store_nav.reference.foreign_key, Some(store_fk));
        assert_eq!(store_nav.reference.navigation_prop, Some(store_nav_id));
        assert_eq!(
            store_nav.prop_type.referenced_type(),
            Some(customer_store)
        );
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut registry = SchemaRegistry::new("catalog");
        let category = registry.create_model("Category");
        let store = registry.create_entity("CategoryRow");
        registry.type_mut(category).unwrap().store = Some(store);

        let mut fk = PropDef::new(
            "ParentId",
            modelium_core::PropType::scalar(ScalarType::Uuid),
        );
        fk.is_store_pending = true;
        let fk_id = fk.id;

        let mut nav = PropDef::new("Parent", modelium_core::PropType::object(category));
        nav.is_store_pending = true;
        nav.auto_related_props = vec![fk_id];
        let mut reference = Reference::to_one(category);
        reference.foreign_key = Some(fk_id);
        reference.navigation_prop = Some(nav.id);
        nav.reference = reference;

        registry.add_prop(category, fk).unwrap();
        let nav_id = registry.add_prop(category, nav).unwrap();

        registry.build_all().unwrap();

        let store_nav_id = registry.store_prop_for(nav_id).unwrap();
        let (_, store_nav) = registry.find_prop(store_nav_id).unwrap();
        assert_eq!(store_nav.reference.target(), Some(store));
        assert_eq!(store_nav.reference.navigation_prop, Some(store_nav_id));
    }

    #[test]
    fn test_incomplete_store_chain_fails() {
        let mut registry = SchemaRegistry::new("shop");
        let base = registry.create_model("Document");
        let derived = registry.create_model("Invoice");
        let derived_store = registry.create_entity("InvoiceRow");
        registry.set_base(derived, base).unwrap();
        registry.type_mut(derived).unwrap().store = Some(derived_store);

        let err = registry.build_type(derived).unwrap_err();
        assert!(err.is_projection());
    }

    #[test]
    fn test_mirrored_store_chain_links_bases() {
        let mut registry = SchemaRegistry::new("shop");
        let base = registry.create_model("Document");
        let base_store = registry.create_entity("DocumentRow");
        let derived = registry.create_model("Invoice");
        let derived_store = registry.create_entity("InvoiceRow");
        registry.set_base(derived, base).unwrap();
        registry.type_mut(base).unwrap().store = Some(base_store);
        registry.type_mut(derived).unwrap().store = Some(derived_store);

        registry.build_all().unwrap();

        assert_eq!(registry.get_type(derived_store).unwrap().base, Some(base_store));
    }

    #[test]
    fn test_data_member_without_store_fails() {
        let (mut registry, person, _) = person_schema();
        let mut orphan = PropDef::new("Age", modelium_core::PropType::scalar(ScalarType::Int32));
        orphan.is_data_member = true;
        orphan.is_store_pending = false;
        registry.add_prop(person, orphan).unwrap();

        let err = registry.build_type(person).unwrap_err();
        assert!(matches!(err, ModelError::MissingStore(_)));
    }

    #[test]
    fn test_enum_in_object_position_is_unsupported() {
        let mut registry = SchemaRegistry::new("shop");
        let model = registry.create_model("Order");
        let store = registry.create_entity("OrderRow");
        let state = registry.create_enum("OrderState");
        registry.type_mut(model).unwrap().store = Some(store);

        let mut prop = PropDef::new("State", modelium_core::PropType::object(state));
        prop.is_store_pending = true;
        registry.add_prop(model, prop).unwrap();

        let err = registry.build_type(model).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedConversion(_)));
    }
}

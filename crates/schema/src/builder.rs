//! Composition-style schema builders
//!
//! [`TypeBuilder`] and [`PropBuilder`] are thin, short-lived handles over
//! the registry that make schema construction read declaratively while
//! keeping all state in the registry itself. Wiring a to-one reference
//! auto-creates the implicit foreign-key property and links the pair
//! reciprocally, so generators can discover either side from the other.

use modelium_core::{
    Binding, DefaultValue, DeletedMarker, ModelError, ModelResult, Multiplicity, PropId, PropType,
    ReferenceAxis, ScalarType, ScopedDefault, TypeId, TypeKind, UiWidget, UsageScenario,
};

use crate::navigation::NavigationPath;
use crate::prop::PropDef;
use crate::reference::Reference;
use crate::registry::SchemaRegistry;

// ============================================================================
// Registry entry points
// ============================================================================

impl SchemaRegistry {
    /// Start defining an entity-kind type
    pub fn define_entity(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        let id = self.create_entity(name);
        TypeBuilder {
            registry: self,
            type_id: id,
        }
    }

    /// Start defining a model-kind type
    pub fn define_model(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        let id = self.create_model(name);
        TypeBuilder {
            registry: self,
            type_id: id,
        }
    }

    /// Start defining an enum-kind type
    pub fn define_enum(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        let id = self.create_enum(name);
        TypeBuilder {
            registry: self,
            type_id: id,
        }
    }

    /// Start defining a complex-kind type
    pub fn define_complex(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        let id = self.create_complex(name);
        TypeBuilder {
            registry: self,
            type_id: id,
        }
    }

    /// Start defining an interface-kind type
    pub fn define_interface(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        let id = self.create_interface(name);
        TypeBuilder {
            registry: self,
            type_id: id,
        }
    }

    /// Resume building an existing type
    pub fn edit_type(&mut self, type_id: TypeId) -> ModelResult<TypeBuilder<'_>> {
        self.require_type(type_id)?;
        Ok(TypeBuilder {
            registry: self,
            type_id,
        })
    }
}

// ============================================================================
// TypeBuilder
// ============================================================================

/// Builder handle for one type
pub struct TypeBuilder<'a> {
    registry: &'a mut SchemaRegistry,
    type_id: TypeId,
}

impl<'a> TypeBuilder<'a> {
    /// The type being built
    pub fn id(&self) -> TypeId {
        self.type_id
    }

    /// Create the paired entity-kind store type and link it
    ///
    /// Only models can own a store.
    pub fn with_store(&mut self, store_name: impl Into<String>) -> ModelResult<TypeId> {
        let kind = self.registry.require_type(self.type_id)?.kind;
        if !kind.can_own_store() {
            let name = self.registry.require_type(self.type_id)?.name.clone();
            return Err(ModelError::validation(format!(
                "Type '{}' ({}) cannot own a store; only models can",
                name, kind
            )));
        }
        let store = self.registry.create_entity(store_name);
        self.registry.type_mut(self.type_id)?.store = Some(store);
        Ok(store)
    }

    /// Set the base type
    pub fn base(&mut self, base_id: TypeId) -> ModelResult<&mut Self> {
        self.registry.set_base(self.type_id, base_id)?;
        Ok(self)
    }

    /// Set the namespace
    pub fn namespace(&mut self, namespace: impl Into<String>) -> ModelResult<&mut Self> {
        self.registry.type_mut(self.type_id)?.namespace = Some(namespace.into());
        Ok(self)
    }

    /// Set the plural name
    pub fn plural(&mut self, plural: impl Into<String>) -> ModelResult<&mut Self> {
        self.registry.type_mut(self.type_id)?.plural_name = plural.into();
        Ok(self)
    }

    /// Mark the type abstract
    pub fn abstract_(&mut self) -> ModelResult<&mut Self> {
        self.registry.type_mut(self.type_id)?.is_abstract = true;
        Ok(self)
    }

    /// Mark the type sealed
    pub fn sealed(&mut self) -> ModelResult<&mut Self> {
        self.registry.type_mut(self.type_id)?.is_sealed = true;
        Ok(self)
    }

    /// Mark the type multitenant
    pub fn multitenant(&mut self) -> ModelResult<&mut Self> {
        self.registry.type_mut(self.type_id)?.is_multitenant = true;
        Ok(self)
    }

    /// Add a scalar or enumeration property
    ///
    /// Properties of a projected model are created store-pending.
    pub fn prop(
        &mut self,
        name: impl Into<String>,
        prop_type: PropType,
    ) -> ModelResult<PropBuilder<'_>> {
        let mut prop = PropDef::new(name, prop_type);
        prop.is_store_pending = self.is_projected()?;
        let prop_id = self.registry.add_prop(self.type_id, prop)?;
        Ok(PropBuilder {
            registry: &mut *self.registry,
            owner: self.type_id,
            prop_id,
            fk_id: None,
        })
    }

    /// Add the key property
    pub fn key(&mut self, name: impl Into<String>, scalar: ScalarType) -> ModelResult<PropId> {
        let mut prop = PropDef::key(name, scalar);
        prop.is_store_pending = self.is_projected()?;
        self.registry.add_prop(self.type_id, prop)
    }

    /// Add a to-one reference, auto-creating its foreign-key property
    ///
    /// The foreign key is named `{name}Id` and typed after the target's
    /// key (UUID when the target has no key yet). Both properties carry
    /// the same reference with reciprocal endpoint links, and the
    /// navigation property lists the foreign key as auto-related so the
    /// projector resolves it first.
    pub fn to_one(
        &mut self,
        name: impl Into<String>,
        target: TypeId,
    ) -> ModelResult<PropBuilder<'_>> {
        let name = name.into();
        self.registry.require_type(target)?;
        let pending = self.is_projected()?;

        let fk_scalar = match self.registry.find_key(target)? {
            Some(key) => match &key.prop_type {
                PropType::Scalar(s) => *s,
                _ => ScalarType::Uuid,
            },
            None => ScalarType::Uuid,
        };

        let mut fk = PropDef::new(format!("{}Id", name), PropType::Scalar(fk_scalar));
        fk.is_store_pending = pending;
        let fk_id = fk.id;

        let mut nav = PropDef::new(name, PropType::object(target));
        nav.is_store_pending = pending;
        nav.auto_related_props = vec![fk_id];
        let nav_id = nav.id;

        let mut reference = Reference::to_one(target);
        reference.foreign_key = Some(fk_id);
        reference.navigation_prop = Some(nav_id);
        fk.reference = reference.clone();
        nav.reference = reference;

        self.registry.add_prop(self.type_id, fk)?;
        let prop_id = self.registry.add_prop(self.type_id, nav)?;
        Ok(PropBuilder {
            registry: &mut *self.registry,
            owner: self.type_id,
            prop_id,
            fk_id: Some(fk_id),
        })
    }

    /// Add a to-many collection reference
    ///
    /// Collections have no scalar foreign key on the owning side; the
    /// item side carries the back-reference.
    pub fn to_many(
        &mut self,
        name: impl Into<String>,
        target: TypeId,
    ) -> ModelResult<PropBuilder<'_>> {
        self.registry.require_type(target)?;
        let mut prop = PropDef::new(name, PropType::collection(target));
        prop.is_store_pending = self.is_projected()?;
        prop.reference = Reference::to_many(target);
        let prop_id = self.registry.add_prop(self.type_id, prop)?;
        Ok(PropBuilder {
            registry: &mut *self.registry,
            owner: self.type_id,
            prop_id,
            fk_id: None,
        })
    }

    /// Run the build pass for this type
    pub fn build(&mut self) -> ModelResult<TypeId> {
        self.registry.build_type(self.type_id)?;
        Ok(self.type_id)
    }

    fn is_projected(&self) -> ModelResult<bool> {
        let t = self.registry.require_type(self.type_id)?;
        Ok(t.kind == TypeKind::Model && t.store.is_some())
    }
}

// ============================================================================
// PropBuilder
// ============================================================================

/// Builder handle for one property
///
/// For navigation properties created by [`TypeBuilder::to_one`], binding
/// and multiplicity changes are mirrored onto the auto-created foreign
/// key's reference so both sides stay consistent.
pub struct PropBuilder<'a> {
    registry: &'a mut SchemaRegistry,
    owner: TypeId,
    prop_id: PropId,
    fk_id: Option<PropId>,
}

impl<'a> PropBuilder<'a> {
    /// The property being built
    pub fn id(&self) -> PropId {
        self.prop_id
    }

    /// Finish, returning the property id
    pub fn done(self) -> PropId {
        self.prop_id
    }

    /// Mark as the key property
    pub fn key(self) -> ModelResult<Self> {
        self.update(|p| {
            p.is_key = true;
            p.is_editable = false;
            p.rules.required = true;
        })
    }

    /// Mark as the tenant key property
    pub fn tenant_key(self) -> ModelResult<Self> {
        self.update(|p| p.is_tenant_key = true)
    }

    /// Mark as required
    pub fn required(self) -> ModelResult<Self> {
        self.update(|p| p.rules.required = true)
    }

    /// Set the minimum value or length
    pub fn min(self, min: f64) -> ModelResult<Self> {
        self.update(|p| p.rules.min = Some(min))
    }

    /// Set the maximum value or length
    pub fn max(self, max: f64) -> ModelResult<Self> {
        self.update(|p| p.rules.max = Some(max))
    }

    /// Set the rule violation message
    pub fn message(self, message: impl Into<String>) -> ModelResult<Self> {
        let message = message.into();
        self.update(|p| p.rules.error_message = Some(message))
    }

    /// Add a default value for every scenario
    pub fn default_value(self, value: DefaultValue) -> ModelResult<Self> {
        self.update(|p| p.defaults.push(ScopedDefault::for_all(value)))
    }

    /// Add a default value for one scenario
    pub fn default_for(self, scenario: UsageScenario, value: DefaultValue) -> ModelResult<Self> {
        self.update(|p| p.defaults.push(ScopedDefault::new(scenario, value)))
    }

    /// Mark as read-only
    pub fn read_only(self) -> ModelResult<Self> {
        self.update(|p| p.is_editable = false)
    }

    /// Mark as observable (implies editable)
    pub fn observable(self) -> ModelResult<Self> {
        self.update(|p| {
            p.is_observable = true;
            p.is_editable = true;
        })
    }

    /// Mark as sortable
    pub fn sortable(self) -> ModelResult<Self> {
        self.update(|p| p.is_sortable = true)
    }

    /// Mark as filterable
    pub fn filterable(self) -> ModelResult<Self> {
        self.update(|p| p.is_filterable = true)
    }

    /// Set data-member participation
    pub fn data_member(self, value: bool) -> ModelResult<Self> {
        self.update(|p| p.is_data_member = value)
    }

    /// Exclude from the built type
    pub fn excluded(self) -> ModelResult<Self> {
        self.update(|p| p.is_excluded = true)
    }

    /// Classify as a deletion marker
    pub fn deleted_marker(self, marker: DeletedMarker) -> ModelResult<Self> {
        self.update(|p| p.deleted_marker = marker)
    }

    /// Set the editor widget
    pub fn widget(self, widget: UiWidget) -> ModelResult<Self> {
        self.update(|p| p.ui_widget = Some(widget))
    }

    /// Mark as virtual (overridable)
    pub fn virtual_(self) -> ModelResult<Self> {
        self.update(|p| p.is_virtual = true)
    }

    /// Mark as intentionally hiding an inherited property
    pub fn new_(self) -> ModelResult<Self> {
        self.update(|p| p.is_new = true)
    }

    /// Mark as overriding a virtual inherited property
    pub fn override_(self) -> ModelResult<Self> {
        self.update(|p| p.is_override = true)
    }

    /// Add a cascade source: changes to it re-raise this property
    pub fn cascade_from(self, source: PropId) -> ModelResult<Self> {
        self.update(|p| {
            p.cascade_from_props.push(source);
            p.is_observable = true;
            p.is_editable = true;
        })
    }

    // ========================================================================
    // Reference shaping (mirrored onto the foreign-key sibling)
    // ========================================================================

    /// Add the Loose binding flag
    pub fn loose(self) -> ModelResult<Self> {
        self.update_reference(|r| r.binding |= Binding::LOOSE)
    }

    /// Add the Nested binding flag
    pub fn nested(self) -> ModelResult<Self> {
        self.update_reference(|r| r.binding |= Binding::NESTED)
    }

    /// Add the Owned binding flag
    pub fn owned(self) -> ModelResult<Self> {
        self.update_reference(|r| r.binding |= Binding::OWNED)
    }

    /// Set the reference axis
    pub fn axis(self, axis: ReferenceAxis) -> ModelResult<Self> {
        self.update_reference(move |r| r.axis = axis)
    }

    /// Make a to-one relationship optional
    pub fn optional(self) -> ModelResult<Self> {
        self.update_reference(|r| r.multiplicity = Multiplicity::ONE_OR_ZERO)?
            .update_fk(|fk_prop| fk_prop.rules.required = false)
    }

    /// Attach a formed navigation path from a dotted name string
    pub fn via(self, dotted: &str) -> ModelResult<Self> {
        let path = NavigationPath::via_path(self.registry, self.owner, dotted)?;
        self.update(move |p| p.nav_to = path)
    }

    /// Attach an already-formed navigation path
    pub fn via_path(self, path: NavigationPath) -> ModelResult<Self> {
        self.update(move |p| p.nav_to = path)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn update(self, f: impl FnOnce(&mut PropDef)) -> ModelResult<Self> {
        f(self.registry.prop_mut(self.prop_id)?);
        Ok(self)
    }

    fn update_fk(self, f: impl FnOnce(&mut PropDef)) -> ModelResult<Self> {
        if let Some(fk_id) = self.fk_id {
            f(self.registry.prop_mut(fk_id)?);
        }
        Ok(self)
    }

    fn update_reference(self, f: impl Fn(&mut Reference)) -> ModelResult<Self> {
        f(&mut self.registry.prop_mut(self.prop_id)?.reference);
        if let Some(fk_id) = self.fk_id {
            f(&mut self.registry.prop_mut(fk_id)?.reference);
        }
        Ok(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_one_auto_creates_foreign_key() {
        let mut registry = SchemaRegistry::new("shop");
        let customer = {
            let mut b = registry.define_entity("Customer");
            b.key("Id", ScalarType::Uuid).unwrap();
            b.id()
        };

        let mut order = registry.define_entity("Order");
        let nav_id = order.to_one("Customer", customer).unwrap().done();

        let order_type = registry.find_type_by_name("Order").unwrap();
        let fk = order_type.local_prop("CustomerId").unwrap();
        let nav = order_type.local_prop_by_id(nav_id).unwrap();

        assert_eq!(fk.prop_type, PropType::Scalar(ScalarType::Uuid));
        assert_eq!(nav.reference.foreign_key, Some(fk.id));
        assert_eq!(nav.reference.navigation_prop, Some(nav_id));
        assert_eq!(fk.reference.navigation_prop, Some(nav_id));
        assert_eq!(nav.auto_related_props, vec![fk.id]);
        assert!(nav.reference.is_to_one());
    }

    #[test]
    fn test_fk_typed_after_target_key() {
        let mut registry = SchemaRegistry::new("shop");
        let product = {
            let mut b = registry.define_entity("Product");
            b.key("Sku", ScalarType::Int64).unwrap();
            b.id()
        };

        let mut line = registry.define_entity("OrderLine");
        line.to_one("Product", product).unwrap().done();

        let fk = registry
            .find_type_by_name("OrderLine")
            .unwrap()
            .local_prop("ProductId")
            .unwrap();
        assert_eq!(fk.prop_type, PropType::Scalar(ScalarType::Int64));
    }

    #[test]
    fn test_to_many_has_no_foreign_key() {
        let mut registry = SchemaRegistry::new("shop");
        let line = registry.define_entity("OrderLine").id();

        let mut order = registry.define_entity("Order");
        let lines_id = order.to_many("Lines", line).unwrap().done();

        let (_, lines) = registry.find_prop(lines_id).unwrap();
        assert!(lines.reference.is_to_many());
        assert_eq!(lines.reference.foreign_key, None);
        assert!(lines.prop_type.is_collection());
    }

    #[test]
    fn test_model_props_created_pending() {
        let mut registry = SchemaRegistry::new("shop");
        let mut model = registry.define_model("Order");
        model.with_store("OrderRow").unwrap();
        let total = model
            .prop("Total", PropType::scalar(ScalarType::Decimal))
            .unwrap()
            .done();

        let (_, prop) = registry.find_prop(total).unwrap();
        assert!(prop.is_store_pending);
    }

    #[test]
    fn test_store_only_for_models() {
        let mut registry = SchemaRegistry::new("shop");
        let mut entity = registry.define_entity("Order");
        assert!(entity.with_store("OrderRow").is_err());
    }

    #[test]
    fn test_optional_mirrors_onto_fk() {
        let mut registry = SchemaRegistry::new("shop");
        let customer = registry.define_entity("Customer").id();

        let mut order = registry.define_entity("Order");
        let nav_id = order
            .to_one("Customer", customer)
            .unwrap()
            .optional()
            .unwrap()
            .done();

        let (_, nav) = registry.find_prop(nav_id).unwrap();
        assert!(nav.reference.is_optional());

        let fk = registry
            .find_type_by_name("Order")
            .unwrap()
            .local_prop("CustomerId")
            .unwrap();
        assert!(fk.reference.is_optional());
        assert!(!fk.rules.required);
    }

    #[test]
    fn test_loose_mirrors_onto_fk() {
        let mut registry = SchemaRegistry::new("shop");
        let customer = registry.define_entity("Customer").id();

        let mut order = registry.define_entity("Order");
        order
            .to_one("Customer", customer)
            .unwrap()
            .loose()
            .unwrap()
            .done();

        let order_type = registry.find_type_by_name("Order").unwrap();
        assert!(order_type.local_prop("Customer").unwrap().reference.is_loose());
        assert!(
            order_type
                .local_prop("CustomerId")
                .unwrap()
                .reference
                .binding
                .contains(Binding::LOOSE)
        );
    }

    #[test]
    fn test_via_attaches_navigation_path() {
        let mut registry = SchemaRegistry::new("shop");
        let customer = {
            let mut b = registry.define_entity("Customer");
            b.prop("Name", PropType::string()).unwrap().done();
            b.id()
        };

        let mut order = registry.define_entity("Order");
        order.to_one("Customer", customer).unwrap().done();
        let display = order
            .prop("CustomerName", PropType::string())
            .unwrap()
            .data_member(false)
            .unwrap()
            .via("Customer.Name")
            .unwrap()
            .done();

        let (_, prop) = registry.find_prop(display).unwrap();
        assert!(prop.nav_to.is());
        assert_eq!(prop.nav_to.target_path, "Customer.Name");
    }

    #[test]
    fn test_builder_end_to_end_projection() {
        let mut registry = SchemaRegistry::new("shop");

        let customer_model = {
            let mut b = registry.define_model("Customer");
            b.with_store("CustomerRow").unwrap();
            b.key("Id", ScalarType::Uuid).unwrap();
            b.prop("Name", PropType::string())
                .unwrap()
                .required()
                .unwrap()
                .done();
            b.id()
        };

        {
            let mut b = registry.define_model("Order");
            b.with_store("OrderRow").unwrap();
            b.key("Id", ScalarType::Uuid).unwrap();
            b.to_one("Customer", customer_model).unwrap().done();
        }

        registry.build_all().unwrap();

        let order_store = registry
            .required_store(registry.find_type_by_name("Order").unwrap().id)
            .unwrap();
        let customer_store = registry.required_store(customer_model).unwrap();

        let store_nav = registry
            .get_type(order_store)
            .unwrap()
            .local_prop("Customer")
            .unwrap();
        assert_eq!(store_nav.reference.target(), Some(customer_store));
    }
}

//! Property definitions
//!
//! [`PropDef`] is the per-property record of the schema graph: its value
//! shape, key/behavior flags, validation rules, defaults, reference
//! metadata, the link to its projected store property, and the formed
//! navigation paths that describe where its value really comes from.

use modelium_core::{
    DefaultValue, DeletedMarker, Identifiable, ModelError, ModelResult, Named, PropId, PropRules,
    PropType, ScalarType, ScopedDefault, UiWidget, UsageScenario, Validatable,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::naming::{is_valid_identifier, to_camel_case, to_snake_case};
use crate::navigation::NavigationPath;
use crate::reference::Reference;

// ============================================================================
// PropDef
// ============================================================================

/// A property of a schema type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropDef {
    /// Unique identifier
    pub id: PropId,

    /// Property name (PascalCase by convention)
    pub name: String,

    /// Serialized/storage field name (snake_case)
    pub field_name: String,

    /// Human-readable label for editors
    pub display_label: String,

    /// Optional description
    pub description: Option<String>,

    /// Shape of the property's value
    pub prop_type: PropType,

    // ========================================================================
    // Key flags
    // ========================================================================
    /// This property is the primary key of its type chain
    pub is_key: bool,

    /// This property is the tenant discriminator key
    pub is_tenant_key: bool,

    /// The key is a UUID rather than a sequential value
    pub is_guid_key: bool,

    // ========================================================================
    // Inheritance shadow markers
    // ========================================================================
    /// Intentionally hides an inherited property of the same name
    pub is_new: bool,

    /// Overrides a virtual inherited property of the same name
    pub is_override: bool,

    /// May be overridden by derived types
    pub is_virtual: bool,

    // ========================================================================
    // Behavior flags
    // ========================================================================
    /// The value can be written after construction
    pub is_editable: bool,

    /// Changes raise change notifications; requires editability
    pub is_observable: bool,

    /// Lists can sort by this property
    pub is_sortable: bool,

    /// Lists can filter by this property
    pub is_filterable: bool,

    /// The value round-trips through the data layer
    pub is_data_member: bool,

    /// Removed from the effective set during the build pass
    pub is_excluded: bool,

    // ========================================================================
    // Values and rules
    // ========================================================================
    /// Scenario-scoped default values
    pub defaults: Vec<ScopedDefault>,

    /// Validation constraints
    pub rules: PropRules,

    /// Soft-delete marker classification
    pub deleted_marker: DeletedMarker,

    /// Editor widget; inferred during the build pass when None
    pub ui_widget: Option<UiWidget>,

    // ========================================================================
    // Relationships and projection
    // ========================================================================
    /// Reference metadata (inert for plain scalars)
    pub reference: Reference,

    /// The projected store property, once allocated
    pub store: Option<PropId>,

    /// A store property still needs to be allocated for this property
    pub is_store_pending: bool,

    /// Formed navigation path this property's value is read through
    pub nav_to: NavigationPath,

    /// Formed navigation path pointing back at this property
    pub nav_from: NavigationPath,

    /// Properties whose changes cascade notifications into this one
    pub cascade_from_props: Vec<PropId>,

    /// Companion properties created alongside this one (e.g. its FK)
    pub auto_related_props: Vec<PropId>,
}

impl PropDef {
    /// Create a new property with the given name and value shape
    pub fn new(name: impl Into<String>, prop_type: PropType) -> Self {
        let name = name.into();
        let field_name = to_snake_case(&name);
        Self {
            id: Uuid::new_v4(),
            display_label: name.clone(),
            name,
            field_name,
            description: None,
            prop_type,
            is_key: false,
            is_tenant_key: false,
            is_guid_key: false,
            is_new: false,
            is_override: false,
            is_virtual: false,
            is_editable: true,
            is_observable: false,
            is_sortable: false,
            is_filterable: false,
            is_data_member: true,
            is_excluded: false,
            defaults: Vec::new(),
            rules: PropRules::default(),
            deleted_marker: DeletedMarker::None,
            ui_widget: None,
            reference: Reference::none(),
            store: None,
            is_store_pending: false,
            nav_to: NavigationPath::none(),
            nav_from: NavigationPath::none(),
            cascade_from_props: Vec::new(),
            auto_related_props: Vec::new(),
        }
    }

    /// Create a key property
    ///
    /// UUID-typed keys are additionally marked as GUID keys and get a
    /// generated default.
    pub fn key(name: impl Into<String>, scalar: ScalarType) -> Self {
        let mut prop = Self::new(name, PropType::Scalar(scalar));
        prop.is_key = true;
        prop.is_editable = false;
        prop.rules = PropRules::new().required();
        if scalar == ScalarType::Uuid {
            prop.is_guid_key = true;
            prop.defaults
                .push(ScopedDefault::new(UsageScenario::Create, DefaultValue::NewUuid));
        }
        prop
    }

    /// Get the camelCase form of the name (for serialized payloads)
    pub fn camel_name(&self) -> String {
        to_camel_case(&self.name)
    }

    /// Check if this is a navigation property (object or collection shape)
    pub fn is_navigation(&self) -> bool {
        self.prop_type.is_navigation()
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.display_label = label.into();
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.rules.required = true;
        self
    }

    /// Set the validation rules
    pub fn with_rules(mut self, rules: PropRules) -> Self {
        self.rules = rules;
        self
    }

    /// Add a default value for all scenarios
    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.defaults.push(ScopedDefault::for_all(value));
        self
    }

    /// Mark as observable (implies editable)
    pub fn observable(mut self) -> Self {
        self.is_observable = true;
        self.is_editable = true;
        self
    }

    /// Mark as sortable and filterable
    pub fn queryable(mut self) -> Self {
        self.is_sortable = true;
        self.is_filterable = true;
        self
    }

    /// Set the editor widget explicitly
    pub fn with_widget(mut self, widget: UiWidget) -> Self {
        self.ui_widget = Some(widget);
        self
    }
}

impl Validatable for PropDef {
    fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::validation("Property name cannot be empty"));
        }
        if !is_valid_identifier(&self.name) {
            return Err(ModelError::validation(format!(
                "Property name '{}' is not a valid identifier",
                self.name
            )));
        }
        if self.is_new && self.is_override {
            return Err(ModelError::validation(format!(
                "Property '{}' cannot be both new and override",
                self.name
            )));
        }
        if self.is_observable && !self.is_editable {
            return Err(ModelError::validation(format!(
                "Observable property '{}' must be editable",
                self.name
            )));
        }
        if !self.is_observable && !self.cascade_from_props.is_empty() {
            return Err(ModelError::validation(format!(
                "Property '{}' lists cascade sources but is not observable",
                self.name
            )));
        }
        if self.is_navigation() && !self.reference.is && !self.nav_to.is() {
            return Err(ModelError::validation(format!(
                "Navigation property '{}' has neither a reference nor a navigation path",
                self.name
            )));
        }
        self.reference.validate()
    }
}

impl Identifiable for PropDef {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Named for PropDef {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.field_name = to_snake_case(&name);
        self.name = name;
    }
}

impl PartialEq for PropDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PropDef {}

impl std::hash::Hash for PropDef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for PropDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.prop_type)
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
    fn test_new_prop_defaults() {
        let prop = PropDef::new("OrderDate", PropType::scalar(ScalarType::DateTime));

        assert_eq!(prop.field_name, "order_date");
        assert_eq!(prop.display_label, "OrderDate");
        assert!(prop.is_data_member);
        assert!(prop.is_editable);
        assert!(!prop.is_key);
        assert!(!prop.reference.is);
        assert!(!prop.nav_to.is());
        assert!(prop.validate().is_ok());
    }

    #[test]
    fn test_key_prop() {
        let prop = PropDef::key("Id", ScalarType::Uuid);

        assert!(prop.is_key);
        assert!(prop.is_guid_key);
        assert!(!prop.is_editable);
        assert!(prop.rules.required);
        assert_eq!(prop.defaults.len(), 1);
        assert_eq!(prop.defaults[0].value, DefaultValue::NewUuid);
    }

    #[test]
    fn test_non_uuid_key() {
        let prop = PropDef::key("Number", ScalarType::Int64);

        assert!(prop.is_key);
        assert!(!prop.is_guid_key);
        assert!(prop.defaults.is_empty());
    }

    #[test]
    fn test_camel_name() {
        let prop = PropDef::new("CustomerId", PropType::scalar(ScalarType::Uuid));
        assert_eq!(prop.camel_name(), "customerId");
    }

    #[test]
    fn test_observable_implies_editable() {
        let prop = PropDef::new("Total", PropType::scalar(ScalarType::Decimal)).observable();
        assert!(prop.is_editable);

        let mut broken = prop.clone();
        broken.is_editable = false;
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_cascade_requires_observable() {
        let mut prop = PropDef::new("Total", PropType::scalar(ScalarType::Decimal));
        prop.cascade_from_props.push(Uuid::new_v4());
        assert!(prop.validate().is_err());

        let observable = prop.observable();
        assert!(observable.validate().is_ok());
    }

    #[test]
    fn test_shadow_markers_exclusive() {
        let mut prop = PropDef::new("Name", PropType::string());
        prop.is_new = true;
        prop.is_override = true;
        assert!(prop.validate().is_err());
    }

    #[test]
    fn test_invalid_name_rejected() {
        let prop = PropDef::new("2fast", PropType::string());
        assert!(prop.validate().is_err());
    }

    #[test]
    fn test_equality_by_id() {
        let a = PropDef::new("Name", PropType::string());
        let mut b = a.clone();
        b.name = "Renamed".to_string();
        assert_eq!(a, b);

        let c = PropDef::new("Name", PropType::string());
        assert_ne!(a, c);
    }
}

//! Registry-wide structural validation
//!
//! [`validate_schema`] walks the whole registry and collects every finding
//! instead of stopping at the first, so editors and CLI callers can show a
//! complete report. The build passes stay fail-fast; this is the
//! diagnostic view of the same rules plus the cross-type checks only a
//! whole-schema walk can make (dangling endpoints, reciprocity, store
//! kinds).

use modelium_core::{TypeKind, Validatable};
use serde::{Deserialize, Serialize};

use crate::registry::SchemaRegistry;
use crate::type_def::TypeDef;

// ============================================================================
// ValidationIssue
// ============================================================================

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The schema cannot build
    Error,
    /// Suspicious but buildable
    Warning,
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Severity of the finding
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Name of the offending type
    pub type_name: String,

    /// Name of the offending property, when the finding is property-level
    pub prop_name: Option<String>,
}

/// The collected findings of a schema walk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// All findings in discovery order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Check if the report has no errors (warnings allowed)
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// All error findings
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// All warning findings
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    fn error(&mut self, type_name: &str, prop_name: Option<&str>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Error,
            message: message.into(),
            type_name: type_name.to_string(),
            prop_name: prop_name.map(str::to_string),
        });
    }

    fn warning(&mut self, type_name: &str, prop_name: Option<&str>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: message.into(),
            type_name: type_name.to_string(),
            prop_name: prop_name.map(str::to_string),
        });
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "schema is valid");
        }
        for issue in &self.issues {
            let severity = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            match &issue.prop_name {
                Some(prop) => writeln!(
                    f,
                    "{}: {}.{}: {}",
                    severity, issue.type_name, prop, issue.message
                )?,
                None => writeln!(f, "{}: {}: {}", severity, issue.type_name, issue.message)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Schema walk
// ============================================================================

/// Validate the whole registry, collecting every finding
pub fn validate_schema(registry: &SchemaRegistry) -> ValidationReport {
    let mut report = ValidationReport::default();

    for type_def in registry.types() {
        validate_type(registry, type_def, &mut report);
    }

    report
}

fn validate_type(registry: &SchemaRegistry, type_def: &TypeDef, report: &mut ValidationReport) {
    let name = type_def.name.as_str();

    // Per-object rules (identifier hygiene, flag consistency).
    if let Err(e) = type_def.validate() {
        report.error(name, None, e.to_string());
    }

    // Base chain: existence, kind equality, acyclicity.
    if let Some(base_id) = type_def.base {
        match registry.get_type(base_id) {
            None => report.error(name, None, "base type does not exist"),
            Some(base) if base.kind != type_def.kind => report.error(
                name,
                None,
                format!(
                    "base type '{}' has kind {}, expected {}",
                    base.name, base.kind, type_def.kind
                ),
            ),
            Some(_) => {
                if let Err(e) = registry.base_chain_root_first(type_def.id) {
                    report.error(name, None, e.to_string());
                }
            }
        }
    }

    // Store: must exist and be entity-kind.
    if let Some(store_id) = type_def.store {
        match registry.get_type(store_id) {
            None => report.error(name, None, "store type does not exist"),
            Some(store) if store.kind != TypeKind::Entity => report.error(
                name,
                None,
                format!("store type '{}' is {}, expected Entity", store.name, store.kind),
            ),
            Some(_) => {}
        }
    }

    // Shadowing and key uniqueness surface through enumeration.
    if let Err(e) = registry.effective_props(type_def.id) {
        report.error(name, None, e.to_string());
    }
    if let Err(e) = registry.find_key(type_def.id) {
        report.error(name, None, e.to_string());
    }

    for prop in &type_def.local_props {
        validate_prop(registry, type_def, prop, report);
    }

    for soft in &type_def.soft_references {
        if registry.get_type(soft.to_type).is_none() {
            report.error(name, None, "soft reference targets a missing type");
        }
    }
}

fn validate_prop(
    registry: &SchemaRegistry,
    type_def: &TypeDef,
    prop: &crate::prop::PropDef,
    report: &mut ValidationReport,
) {
    let type_name = type_def.name.as_str();
    let prop_name = prop.name.as_str();

    if let Err(e) = prop.validate() {
        report.error(type_name, Some(prop_name), e.to_string());
    }

    // Dangling type descriptor target.
    if let Some(target) = prop.prop_type.referenced_type() {
        if registry.get_type(target).is_none() {
            report.error(
                type_name,
                Some(prop_name),
                "property type references a missing type",
            );
        }
    }

    let r = &prop.reference;
    if !r.is {
        return;
    }

    // Dangling reference endpoints.
    if let Some(target) = r.to_type {
        if registry.get_type(target).is_none() {
            report.error(type_name, Some(prop_name), "reference targets a missing type");
        }
    }
    for (label, endpoint) in [
        ("foreign key", r.foreign_key),
        ("navigation property", r.navigation_prop),
        ("collection back-reference", r.foreign_item_to_collection_prop),
        ("collection property", r.foreign_collection_prop),
    ] {
        if let Some(pid) = endpoint {
            if registry.find_prop(pid).is_none() {
                report.error(
                    type_name,
                    Some(prop_name),
                    format!("reference {} does not exist", label),
                );
            }
        }
    }

    // Foreign key and navigation property must be reciprocally linked.
    if prop.is_navigation() && r.is_to_one() {
        if let Some(fk_id) = r.foreign_key {
            if let Some((_, fk)) = registry.find_prop(fk_id) {
                if fk.reference.navigation_prop != Some(prop.id) {
                    report.error(
                        type_name,
                        Some(prop_name),
                        "foreign key does not link back to this navigation property",
                    );
                }
            }
        } else {
            report.warning(
                type_name,
                Some(prop_name),
                "to-one navigation property has no foreign key",
            );
        }
    }

    // Data members of projected models must end up with a store property.
    if type_def.kind == TypeKind::Model
        && type_def.store.is_some()
        && prop.is_data_member
        && prop.store.is_none()
        && !prop.is_store_pending
    {
        report.error(
            type_name,
            Some(prop_name),
            "data-member property has no store property and is not pending",
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prop::PropDef;
    use crate::reference::Reference;
    use modelium_core::{PropType, ScalarType};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_schema_is_valid() {
        let mut registry = SchemaRegistry::new("shop");
        let customer = {
            let mut b = registry.define_entity("Customer");
            b.key("Id", ScalarType::Uuid).unwrap();
            b.prop("Name", PropType::string()).unwrap().done();
            b.id()
        };
        let mut order = registry.define_entity("Order");
        order.key("Id", ScalarType::Uuid).unwrap();
        order.to_one("Customer", customer).unwrap().done();

        let report = validate_schema(&registry);
        assert!(report.is_valid(), "{}", report);
    }

    #[test]
    fn test_dangling_reference_target_reported() {
        let mut registry = SchemaRegistry::new("shop");
        let order = registry.create_entity("Order");

        let mut nav = PropDef::new("Customer", PropType::object(uuid::Uuid::new_v4()));
        nav.reference = Reference::to_one(uuid::Uuid::new_v4());
        registry.add_prop(order, nav).unwrap();

        let report = validate_schema(&registry);
        assert!(!report.is_valid());
        assert!(report.errors().count() >= 1);
    }

    #[test]
    fn test_broken_reciprocity_reported() {
        let mut registry = SchemaRegistry::new("shop");
        let order = registry.create_entity("Order");
        let customer = registry.create_entity("Customer");

        let fk = PropDef::new("CustomerId", PropType::scalar(ScalarType::Uuid));
        let fk_id = fk.id;
        registry.add_prop(order, fk).unwrap();

        // Navigation points at the FK, but the FK does not link back.
        let mut nav = PropDef::new("Customer", PropType::object(customer));
        let mut reference = Reference::to_one(customer);
        reference.foreign_key = Some(fk_id);
        reference.navigation_prop = Some(nav.id);
        nav.reference = reference;
        registry.add_prop(order, nav).unwrap();

        let report = validate_schema(&registry);
        assert!(!report.is_valid());
        assert!(
            report
                .errors()
                .any(|i| i.message.contains("does not link back"))
        );
    }

    #[test]
    fn test_non_entity_store_reported() {
        let mut registry = SchemaRegistry::new("shop");
        let model = registry.create_model("Order");
        let bad_store = registry.create_model("OrderRow");
        registry.type_mut(model).unwrap().store = Some(bad_store);

        let report = validate_schema(&registry);
        assert!(!report.is_valid());
        assert!(report.errors().any(|i| i.message.contains("expected Entity")));
    }

    #[test]
    fn test_shadow_violation_reported_not_thrown() {
        let mut registry = SchemaRegistry::new("shop");
        let base = registry.create_entity("Document");
        let derived = registry.create_entity("Invoice");
        registry.set_base(derived, base).unwrap();
        registry
            .add_prop(base, PropDef::new("Title", PropType::string()))
            .unwrap();
        registry
            .add_prop(derived, PropDef::new("Title", PropType::string()))
            .unwrap();

        let report = validate_schema(&registry);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_report_display() {
        let mut report = ValidationReport::default();
        assert_eq!(report.to_string(), "schema is valid");

        report.error("Order", Some("Total"), "bad things");
        let rendered = report.to_string();
        assert!(rendered.contains("error: Order.Total: bad things"));
    }

    #[test]
    fn test_to_one_without_fk_is_warning_only() {
        let mut registry = SchemaRegistry::new("shop");
        let order = registry.create_entity("Order");
        let customer = registry.create_entity("Customer");

        let mut nav = PropDef::new("Customer", PropType::object(customer));
        nav.reference = Reference::to_one(customer);
        registry.add_prop(order, nav).unwrap();

        let report = validate_schema(&registry);
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 1);
    }
}

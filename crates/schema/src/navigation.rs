//! Formed navigation paths
//!
//! A [`NavigationPath`] is an ordered sequence of reference steps that
//! reaches a distant property: "start at SourceType, follow SourceProp's
//! reference to TargetType, optionally land on TargetProp." Paths carry
//! cached dot-joined name strings that are rebuilt only by [`NavigationPath::build`],
//! which is the path's single validity gate after any structural mutation.

use std::borrow::Cow;

use modelium_core::{Binding, ModelError, ModelResult, PropId, TypeId};
use serde::{Deserialize, Serialize};

use crate::registry::SchemaRegistry;

// ============================================================================
// NavStep
// ============================================================================

/// One hop of a navigation path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavStep {
    /// Type the hop starts from
    pub source_type: TypeId,

    /// Navigation property followed by the hop
    pub source_prop: PropId,

    /// Type the hop lands on
    pub target_type: TypeId,

    /// Terminal property on the final hop, if the path ends on one
    pub target_prop: Option<PropId>,
}

impl NavStep {
    /// Create a hop without a terminal property
    pub fn new(source_type: TypeId, source_prop: PropId, target_type: TypeId) -> Self {
        Self {
            source_type,
            source_prop,
            target_type,
            target_prop: None,
        }
    }

    /// Create a hop landing on a terminal property
    pub fn to_prop(
        source_type: TypeId,
        source_prop: PropId,
        target_type: TypeId,
        target_prop: PropId,
    ) -> Self {
        Self {
            source_type,
            source_prop,
            target_type,
            target_prop: Some(target_prop),
        }
    }
}

// ============================================================================
// NavigationPath
// ============================================================================

/// An ordered sequence of reference steps reaching a distant property
///
/// The empty path (`none()`) answers `is() == false` and is a valid no-op
/// input everywhere; properties carry it by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NavigationPath {
    /// The hops, outermost first
    pub steps: Vec<NavStep>,

    /// Whether the path crosses at least one reference (rebuilt by `build`)
    pub is_foreign: bool,

    /// Cached dot-joined property names including the terminal property
    pub target_path: String,

    /// Cached dot-joined property names excluding the terminal property
    pub source_path: String,
}

impl NavigationPath {
    /// Create the empty path
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if the path has any steps
    pub fn is(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Append a step, returning a new path
    ///
    /// The result must be finalized with [`build`](Self::build) before its
    /// cached strings are read.
    pub fn appended(&self, step: NavStep) -> Self {
        let mut path = self.clone();
        path.steps.push(step);
        path
    }

    /// Add a step in place
    ///
    /// The path must be finalized with [`build`](Self::build) before its
    /// cached strings are read.
    pub fn add_step(&mut self, step: NavStep) {
        self.steps.push(step);
    }

    // ========================================================================
    // Construction from the registry
    // ========================================================================

    /// Form a one-hop path through a navigation property
    pub fn via_prop(registry: &SchemaRegistry, prop_id: PropId) -> ModelResult<Self> {
        let (owner, prop) = registry.require_prop(prop_id)?;
        let target = prop
            .reference
            .target()
            .or_else(|| prop.prop_type.referenced_type())
            .ok_or_else(|| {
                ModelError::validation(format!(
                    "Property '{}' on type '{}' is not a navigation property",
                    prop.name, owner.name
                ))
            })?;
        let mut path = Self::none();
        path.add_step(NavStep::new(owner.id, prop.id, target));
        path.build(registry)?;
        Ok(path)
    }

    /// Form a path from a dotted name string starting at a type
    ///
    /// Intermediate segments must be navigation properties; the final
    /// segment may be a scalar, which becomes the last step's terminal
    /// property. At least one navigation segment is required.
    pub fn via_path(
        registry: &SchemaRegistry,
        start_type: TypeId,
        dotted: &str,
    ) -> ModelResult<Self> {
        let mut path = Self::none();
        let mut current = start_type;

        let segments: Vec<&str> = dotted.split('.').filter(|s| !s.is_empty()).collect();
        for (i, segment) in segments.iter().enumerate() {
            let owner = registry.require_type(current)?;
            let owner_name = owner.name.clone();
            let prop = registry
                .effective_props(current)?
                .into_iter()
                .find(|p| p.name == *segment)
                .ok_or_else(|| ModelError::prop_not_found(&owner_name, *segment))?;

            let is_last = i + 1 == segments.len();
            match prop
                .reference
                .target()
                .or_else(|| prop.prop_type.referenced_type())
            {
                Some(target) => {
                    path.add_step(NavStep::new(current, prop.id, target));
                    current = target;
                }
                None if is_last => {
                    let prop_id = prop.id;
                    match path.steps.last_mut() {
                        Some(last) => last.target_prop = Some(prop_id),
                        None => {
                            return Err(ModelError::validation(format!(
                                "Path '{}' must traverse at least one navigation property",
                                dotted
                            )));
                        }
                    }
                }
                None => {
                    return Err(ModelError::validation(format!(
                        "Path segment '{}' on type '{}' is not a navigation property",
                        segment, owner_name
                    )));
                }
            }
        }

        path.build(registry)?;
        Ok(path)
    }

    // ========================================================================
    // Finalization and queries
    // ========================================================================

    /// Finalize the path: recompute `is_foreign` and the cached strings
    ///
    /// Idempotent and re-callable; must run after any structural mutation.
    pub fn build(&mut self, registry: &SchemaRegistry) -> ModelResult<()> {
        self.is_foreign = !self.steps.is_empty();
        self.target_path = self.step_prop_names(registry, true, None)?.join(".");
        self.source_path = self.step_prop_names(registry, false, None)?.join(".");
        Ok(())
    }

    /// Property names along the path
    ///
    /// `include_target` appends the terminal property's name;
    /// `start_after` windows the sequence to begin at the first step whose
    /// source is the given type, supporting sub-path extraction.
    pub fn step_prop_names(
        &self,
        registry: &SchemaRegistry,
        include_target: bool,
        start_after: Option<TypeId>,
    ) -> ModelResult<Vec<String>> {
        let mut names = Vec::with_capacity(self.steps.len() + 1);
        let mut started = start_after.is_none();

        for step in &self.steps {
            if !started {
                if step.source_type == start_after.unwrap_or_default() {
                    started = true;
                } else {
                    continue;
                }
            }
            let (_, prop) = registry.require_prop(step.source_prop)?;
            names.push(prop.name.clone());
        }

        if include_target {
            if let Some(last) = self.steps.last() {
                if let Some(target_prop) = last.target_prop {
                    let (_, prop) = registry.require_prop(target_prop)?;
                    names.push(prop.name.clone());
                }
            }
        }

        Ok(names)
    }

    /// Rewrite the path so every endpoint lives on the store side
    ///
    /// Pure and idempotent: a path already composed solely of entity-kind
    /// endpoints comes back as `Cow::Borrowed(self)` (the same reference,
    /// not merely an equal value); otherwise a rebuilt owned clone is
    /// returned and `self` is left untouched.
    pub fn to_entity_path<'a>(
        &'a self,
        registry: &SchemaRegistry,
    ) -> ModelResult<Cow<'a, NavigationPath>> {
        let mut needs_mapping = false;
        for step in &self.steps {
            if registry.require_type(step.source_type)?.kind.is_model()
                || registry.require_type(step.target_type)?.kind.is_model()
            {
                needs_mapping = true;
                break;
            }
        }
        if !needs_mapping {
            return Ok(Cow::Borrowed(self));
        }

        let mut mapped = NavigationPath::none();
        for step in &self.steps {
            let target_prop = match step.target_prop {
                Some(pid) => Some(registry.store_prop_for(pid)?),
                None => None,
            };
            mapped.add_step(NavStep {
                source_type: registry.entity_type_for(step.source_type)?,
                source_prop: registry.store_prop_for(step.source_prop)?,
                target_type: registry.entity_type_for(step.target_type)?,
                target_prop,
            });
        }
        mapped.build(registry)?;
        Ok(Cow::Owned(mapped))
    }

    /// First step whose source property's reference binding includes Loose
    ///
    /// Marks where detached (separately queried) data begins.
    pub fn first_loose_step(&self, registry: &SchemaRegistry) -> ModelResult<Option<&NavStep>> {
        for step in &self.steps {
            let (_, prop) = registry.require_prop(step.source_prop)?;
            if prop.reference.is && prop.reference.binding.contains(Binding::LOOSE) {
                return Ok(Some(step));
            }
        }
        Ok(None)
    }

    /// Target type of the final step
    pub fn final_target(&self) -> Option<TypeId> {
        self.steps.last().map(|s| s.target_type)
    }
}

impl std::fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.target_path)
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
    use crate::registry::SchemaRegistry;
    use modelium_core::{PropType, ScalarType};
    use pretty_assertions::assert_eq;

    /// Order -(Customer)-> Customer { Name }
    fn order_customer_schema() -> (SchemaRegistry, TypeId, PropId, PropId) {
        let mut registry = SchemaRegistry::new("shop");
        let order = registry.create_entity("Order");
        let customer = registry.create_entity("Customer");

        let name = registry
            .add_prop(customer, PropDef::new("Name", PropType::string()))
            .unwrap();

        let mut nav = PropDef::new("Customer", PropType::object(customer));
        nav.reference = Reference::to_one(customer);
        let nav = registry.add_prop(order, nav).unwrap();

        (registry, order, nav, name)
    }

    #[test]
    fn test_empty_path_is_noop() {
        let path = NavigationPath::none();
        assert!(!path.is());
        assert!(!path.is_foreign);
        assert_eq!(path.target_path, "");
        assert_eq!(path.final_target(), None);
    }

    #[test]
    fn test_build_caches_path_strings() {
        let (registry, order, nav, name) = order_customer_schema();
        let customer = registry.find_type_by_name("Customer").unwrap().id;

        let mut path = NavigationPath::none();
        path.add_step(NavStep::to_prop(order, nav, customer, name));
        path.build(&registry).unwrap();

        assert!(path.is());
        assert!(path.is_foreign);
        assert_eq!(path.target_path, "Customer.Name");
        assert_eq!(path.source_path, "Customer");
    }

    #[test]
    fn test_path_round_trip() {
        let (registry, order, nav, name) = order_customer_schema();
        let customer = registry.find_type_by_name("Customer").unwrap().id;

        let mut path = NavigationPath::none();
        path.add_step(NavStep::to_prop(order, nav, customer, name));
        path.build(&registry).unwrap();

        let joined = path
            .step_prop_names(&registry, true, None)
            .unwrap()
            .join(".");
        assert_eq!(joined, path.target_path);
    }

    #[test]
    fn test_via_path_resolves_dotted_names() {
        let (registry, order, _, _) = order_customer_schema();

        let path = NavigationPath::via_path(&registry, order, "Customer.Name").unwrap();
        assert_eq!(path.steps.len(), 1);
        assert_eq!(path.target_path, "Customer.Name");
        assert!(path.steps[0].target_prop.is_some());
    }

    #[test]
    fn test_via_path_rejects_scalar_only() {
        let (registry, _, _, _) = order_customer_schema();
        let customer = registry.find_type_by_name("Customer").unwrap().id;

        assert!(NavigationPath::via_path(&registry, customer, "Name").is_err());
    }

    #[test]
    fn test_via_prop_forms_single_hop() {
        let (registry, _, nav, _) = order_customer_schema();

        let path = NavigationPath::via_prop(&registry, nav).unwrap();
        assert_eq!(path.steps.len(), 1);
        assert_eq!(path.target_path, "Customer");
        assert_eq!(path.steps[0].target_prop, None);
    }

    #[test]
    fn test_to_entity_path_idempotent_on_entity_steps() {
        let (registry, order, _, _) = order_customer_schema();

        let path = NavigationPath::via_path(&registry, order, "Customer.Name").unwrap();
        let mapped = path.to_entity_path(&registry).unwrap();
        assert!(matches!(mapped, Cow::Borrowed(_)));
    }

    #[test]
    fn test_first_loose_step() {
        let (mut registry, order, nav, _) = order_customer_schema();

        let path = NavigationPath::via_path(&registry, order, "Customer.Name").unwrap();
        assert!(path.first_loose_step(&registry).unwrap().is_none());

        registry.prop_mut(nav).unwrap().reference.binding |= Binding::LOOSE;
        let loose = path.first_loose_step(&registry).unwrap();
        assert_eq!(loose.map(|s| s.source_prop), Some(nav));
    }

    #[test]
    fn test_step_prop_names_windowed() {
        let (mut registry, order, nav, name) = order_customer_schema();
        let customer = registry.find_type_by_name("Customer").unwrap().id;

        // Customer -(Country)-> Country { Code }
        let country = registry.create_entity("Country");
        let code = registry
            .add_prop(country, PropDef::new("Code", PropType::string()))
            .unwrap();
        let mut country_nav = PropDef::new("Country", PropType::object(country));
        country_nav.reference = Reference::to_one(country);
        let country_nav = registry.add_prop(customer, country_nav).unwrap();

        let _ = name;
        let mut path = NavigationPath::none();
        path.add_step(NavStep::new(order, nav, customer));
        path.add_step(NavStep::to_prop(customer, country_nav, country, code));
        path.build(&registry).unwrap();

        assert_eq!(path.target_path, "Customer.Country.Code");

        let windowed = path
            .step_prop_names(&registry, true, Some(customer))
            .unwrap();
        assert_eq!(windowed, vec!["Country".to_string(), "Code".to_string()]);
    }

    #[test]
    fn test_scalar_prop_with_type_scalar_rejected_by_via_prop() {
        let (registry, _, _, name) = order_customer_schema();
        assert!(NavigationPath::via_prop(&registry, name).is_err());
    }
}

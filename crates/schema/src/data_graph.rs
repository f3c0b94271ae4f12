//! Data graph builder
//!
//! Turns a set of properties or formed navigation paths ("these fields
//! must be fetched") into a minimal tree of leaf properties and reference
//! nodes, the shape select/expand expressions are rendered from. Sibling
//! leaves are deduplicated, traversals sharing a relationship are merged
//! into one node with the recursively merged union of their children, and
//! foreign keys can be injected alongside to-one navigation nodes.

use modelium_core::{ModelResult, PropId, TypeId};
use serde::{Deserialize, Serialize};

use crate::navigation::NavigationPath;
use crate::registry::SchemaRegistry;

// ============================================================================
// GraphNode
// ============================================================================

/// A node of a built data graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GraphNode {
    /// A scalar property to select
    Prop {
        /// The property
        prop: PropId,
        /// The property's name, for rendering
        name: String,
    },
    /// A reference to expand, with the nested graph for the target
    Reference {
        /// The navigation property carrying the reference
        source_prop: PropId,
        /// The navigation property's name, for rendering
        name: String,
        /// Target type of the reference
        target_type: TypeId,
        /// Nested nodes selected on the target
        items: Vec<GraphNode>,
    },
}

impl GraphNode {
    /// Create a leaf node
    pub fn leaf(prop: PropId, name: impl Into<String>) -> Self {
        GraphNode::Prop {
            prop,
            name: name.into(),
        }
    }

    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        matches!(self, GraphNode::Prop { .. })
    }

    /// The node's display name
    pub fn name(&self) -> &str {
        match self {
            GraphNode::Prop { name, .. } => name,
            GraphNode::Reference { name, .. } => name,
        }
    }
}

/// Leaf nodes compare by property identity; reference nodes by target
/// type, source property, and recursively equal child sets. Child sets
/// compare as sets, and empty equals empty regardless of how either side
/// was produced.
impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GraphNode::Prop { prop: a, .. }, GraphNode::Prop { prop: b, .. }) => a == b,
            (
                GraphNode::Reference {
                    source_prop: sp_a,
                    target_type: tt_a,
                    items: items_a,
                    ..
                },
                GraphNode::Reference {
                    source_prop: sp_b,
                    target_type: tt_b,
                    items: items_b,
                    ..
                },
            ) => {
                sp_a == sp_b
                    && tt_a == tt_b
                    && items_a.len() == items_b.len()
                    && items_a.iter().all(|item| items_b.contains(item))
            }
            _ => false,
        }
    }
}

impl Eq for GraphNode {}

impl std::fmt::Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphNode::Prop { name, .. } => write!(f, "{}", name),
            GraphNode::Reference { name, items, .. } => {
                write!(f, "{}({})", name, render(items))
            }
        }
    }
}

/// Render a node list as a stable comma-joined expression
///
/// Node order is first-encountered order, so output is stable across runs
/// for the same input; downstream generators rely on that for diffable
/// output.
pub fn render(nodes: &[GraphNode]) -> String {
    nodes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// GraphOptions
// ============================================================================

/// Options for data graph construction
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphOptions {
    /// Seed each reference node's children with the target type's key
    pub include_key: bool,

    /// Inject foreign-key leaves alongside to-one reference nodes
    pub include_foreign_key: bool,

    /// Discard the outermost N path levels, yielding their children at the
    /// top level (the caller already holds that context object)
    pub start_depth: usize,
}

impl GraphOptions {
    /// Options that include keys and foreign keys
    pub fn with_keys() -> Self {
        Self {
            include_key: true,
            include_foreign_key: true,
            start_depth: 0,
        }
    }
}

// ============================================================================
// Building
// ============================================================================

/// Build a minimal data graph from a property set
///
/// Non-navigation properties become leaves directly, deduplicated by name.
/// Navigation properties contribute their formed navigation path (or a
/// synthesized one-hop path when they only carry a reference), deduplicated
/// by target path, and are resolved depth-by-depth.
pub fn build_data_graph(
    registry: &SchemaRegistry,
    props: &[PropId],
    options: GraphOptions,
) -> ModelResult<Vec<GraphNode>> {
    let mut leaves: Vec<GraphNode> = Vec::new();
    let mut paths: Vec<NavigationPath> = Vec::new();

    for &prop_id in props {
        let (_, prop) = registry.require_prop(prop_id)?;
        if prop.nav_to.is() {
            push_path(&mut paths, prop.nav_to.clone());
        } else if prop.is_navigation() {
            push_path(&mut paths, NavigationPath::via_prop(registry, prop_id)?);
        } else if !leaves.iter().any(|l| l.name() == prop.name) {
            leaves.push(GraphNode::leaf(prop.id, prop.name.clone()));
        }
    }

    Ok(merge(leaves, build_from_paths(registry, &paths, options)?))
}

/// Build a minimal data graph from a set of formed navigation paths
pub fn build_data_graph_from_paths(
    registry: &SchemaRegistry,
    paths: &[NavigationPath],
    options: GraphOptions,
) -> ModelResult<Vec<GraphNode>> {
    let mut deduped: Vec<NavigationPath> = Vec::new();
    for path in paths {
        push_path(&mut deduped, path.clone());
    }
    build_from_paths(registry, &deduped, options)
}

fn push_path(paths: &mut Vec<NavigationPath>, path: NavigationPath) {
    if !path.is() {
        return;
    }
    if !paths.iter().any(|p| p.target_path == path.target_path) {
        paths.push(path);
    }
}

fn build_from_paths(
    registry: &SchemaRegistry,
    paths: &[NavigationPath],
    options: GraphOptions,
) -> ModelResult<Vec<GraphNode>> {
    let mut nodes = Vec::new();

    // Paths fully consumed by the discarded outer levels surface their
    // terminal property directly at the top level.
    let (short, long): (Vec<&NavigationPath>, Vec<&NavigationPath>) = paths
        .iter()
        .partition(|p| p.steps.len() <= options.start_depth);

    for path in short {
        if let Some(target_prop) = path.steps.last().and_then(|s| s.target_prop) {
            let (_, prop) = registry.require_prop(target_prop)?;
            let leaf = GraphNode::leaf(prop.id, prop.name.clone());
            if !nodes.contains(&leaf) {
                nodes.push(leaf);
            }
        }
    }

    Ok(merge(
        nodes,
        build_level(registry, &long, options.start_depth, options)?,
    ))
}

/// Build one depth level of the navigation tree
///
/// Paths are grouped by the step's source property in first-encountered
/// order; each group becomes one reference node whose children are the
/// merged recursion over the deeper paths.
fn build_level(
    registry: &SchemaRegistry,
    paths: &[&NavigationPath],
    depth: usize,
    options: GraphOptions,
) -> ModelResult<Vec<GraphNode>> {
    // First-encountered grouping keeps output order deterministic.
    let mut groups: Vec<(PropId, Vec<&NavigationPath>)> = Vec::new();
    for path in paths {
        let step = &path.steps[depth];
        match groups.iter_mut().find(|(key, _)| *key == step.source_prop) {
            Some((_, members)) => members.push(path),
            None => groups.push((step.source_prop, vec![path])),
        }
    }

    let mut nodes = Vec::new();
    for (source_prop, members) in groups {
        let (_, nav_prop) = registry.require_prop(source_prop)?;
        let target_type = members[0].steps[depth].target_type;
        let mut items: Vec<GraphNode> = Vec::new();

        if options.include_key {
            if let Some(key) = registry.find_key(target_type)? {
                items.push(GraphNode::leaf(key.id, key.name.clone()));
            }
        }

        let mut deeper: Vec<&NavigationPath> = Vec::new();
        for path in members {
            if depth + 1 == path.steps.len() {
                if let Some(target_prop) = path.steps[depth].target_prop {
                    let (_, prop) = registry.require_prop(target_prop)?;
                    let leaf = GraphNode::leaf(prop.id, prop.name.clone());
                    if !items.contains(&leaf) {
                        items.push(leaf);
                    }
                }
            } else {
                deeper.push(path);
            }
        }

        if !deeper.is_empty() {
            let children = build_level(registry, &deeper, depth + 1, options)?;
            items = merge(items, children);
        }

        // The foreign key travels as a sibling of the reference node; a
        // to-many navigation has no scalar foreign key to inject.
        if options.include_foreign_key && !nav_prop.reference.is_to_many() {
            if let Some(fk) = nav_prop.reference.foreign_key {
                let (_, fk_prop) = registry.require_prop(fk)?;
                let leaf = GraphNode::leaf(fk_prop.id, fk_prop.name.clone());
                if !nodes.contains(&leaf) {
                    nodes.push(leaf);
                }
            }
        }

        nodes.push(GraphNode::Reference {
            source_prop,
            name: nav_prop.name.clone(),
            target_type,
            items,
        });
    }

    Ok(nodes)
}

// ============================================================================
// Merging
// ============================================================================

/// Union two built node lists into a minimal one
///
/// Leaves merge by property identity. Reference nodes matching on
/// (target type, source property) have their child lists recursively
/// merged rather than concatenated, which is what keeps overlapping
/// sub-graphs minimal.
pub fn merge(first: Vec<GraphNode>, second: Vec<GraphNode>) -> Vec<GraphNode> {
    let mut result = first;

    for node in second {
        match node {
            GraphNode::Prop { .. } => {
                if !result.contains(&node) {
                    result.push(node);
                }
            }
            GraphNode::Reference {
                source_prop,
                name,
                target_type,
                items,
            } => {
                let existing = result.iter_mut().find_map(|n| match n {
                    GraphNode::Reference {
                        source_prop: sp,
                        target_type: tt,
                        items,
                        ..
                    } if *sp == source_prop && *tt == target_type => Some(items),
                    _ => None,
                });
                match existing {
                    Some(existing_items) => {
                        let merged = merge(std::mem::take(existing_items), items);
                        *existing_items = merged;
                    }
                    None => result.push(GraphNode::Reference {
                        source_prop,
                        name,
                        target_type,
                        items,
                    }),
                }
            }
        }
    }

    result
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

    struct Shop {
        registry: SchemaRegistry,
        order: TypeId,
        customer_nav: PropId,
        customer_fk: PropId,
        customer_name: PropId,
        customer_email: PropId,
        lines_nav: PropId,
        line_qty: PropId,
        order_total: PropId,
    }

    /// Order { Total, CustomerId, Customer -> Customer { Name, Email },
    /// Lines -> OrderLine { Qty } }
    fn shop() -> Shop {
        let mut registry = SchemaRegistry::new("shop");
        let order = registry.create_entity("Order");
        let customer = registry.create_entity("Customer");
        let line = registry.create_entity("OrderLine");

        let customer_name = registry
            .add_prop(customer, PropDef::new("Name", PropType::string()))
            .unwrap();
        let customer_email = registry
            .add_prop(customer, PropDef::new("Email", PropType::string()))
            .unwrap();
        let line_qty = registry
            .add_prop(line, PropDef::new("Qty", PropType::scalar(ScalarType::Int32)))
            .unwrap();
        let order_total = registry
            .add_prop(order, PropDef::new("Total", PropType::scalar(ScalarType::Decimal)))
            .unwrap();

        let fk = PropDef::new("CustomerId", PropType::scalar(ScalarType::Uuid));
        let fk_id = fk.id;
        let mut nav = PropDef::new("Customer", PropType::object(customer));
        let mut reference = Reference::to_one(customer);
        reference.foreign_key = Some(fk_id);
        reference.navigation_prop = Some(nav.id);
        nav.reference = reference;
        registry.add_prop(order, fk).unwrap();
        let customer_nav = registry.add_prop(order, nav).unwrap();

        let mut lines = PropDef::new("Lines", PropType::collection(line));
        lines.reference = Reference::to_many(line);
        let lines_nav = registry.add_prop(order, lines).unwrap();

        Shop {
            registry,
            order,
            customer_nav,
            customer_fk: fk_id,
            customer_name,
            customer_email,
            lines_nav,
            line_qty,
            order_total,
        }
    }

    fn path(registry: &SchemaRegistry, start: TypeId, dotted: &str) -> NavigationPath {
        NavigationPath::via_path(registry, start, dotted).unwrap()
    }

    #[test]
    fn test_leaves_and_navigation_partition() {
        let s = shop();
        let nodes = build_data_graph(
            &s.registry,
            &[s.order_total, s.customer_nav],
            GraphOptions::default(),
        )
        .unwrap();

        assert_eq!(render(&nodes), "Total,Customer()");
    }

    #[test]
    fn test_merge_minimality() {
        let s = shop();
        let name_path = path(&s.registry, s.order, "Customer.Name");
        let email_path = path(&s.registry, s.order, "Customer.Email");

        let first =
            build_data_graph_from_paths(&s.registry, &[name_path], GraphOptions::default())
                .unwrap();
        let second =
            build_data_graph_from_paths(&s.registry, &[email_path], GraphOptions::default())
                .unwrap();

        let merged = merge(first, second);
        assert_eq!(merged.len(), 1);
        assert_eq!(render(&merged), "Customer(Name,Email)");

        match &merged[0] {
            GraphNode::Reference { items, .. } => {
                assert!(items.contains(&GraphNode::leaf(s.customer_name, "Name")));
                assert!(items.contains(&GraphNode::leaf(s.customer_email, "Email")));
            }
            _ => panic!("expected reference node"),
        }
    }

    #[test]
    fn test_shared_paths_build_one_node() {
        let s = shop();
        let paths = vec![
            path(&s.registry, s.order, "Customer.Name"),
            path(&s.registry, s.order, "Customer.Email"),
        ];

        let nodes =
            build_data_graph_from_paths(&s.registry, &paths, GraphOptions::default()).unwrap();
        assert_eq!(render(&nodes), "Customer(Name,Email)");
    }

    #[test]
    fn test_fk_injected_for_to_one_only() {
        let s = shop();
        let options = GraphOptions {
            include_foreign_key: true,
            ..GraphOptions::default()
        };

        let nodes = build_data_graph(&s.registry, &[s.customer_nav], options).unwrap();
        assert!(nodes.contains(&GraphNode::leaf(s.customer_fk, "CustomerId")));

        let nodes = build_data_graph(&s.registry, &[s.lines_nav], options).unwrap();
        assert!(!nodes.iter().any(|n| n.name() == "CustomerId"));
        assert_eq!(render(&nodes), "Lines()");
    }

    #[test]
    fn test_duplicate_leaves_deduplicated() {
        let s = shop();
        let nodes = build_data_graph(
            &s.registry,
            &[s.order_total, s.order_total],
            GraphOptions::default(),
        )
        .unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_start_depth_yields_children_at_top() {
        let s = shop();
        let name_path = path(&s.registry, s.order, "Customer.Name");

        let options = GraphOptions {
            start_depth: 1,
            ..GraphOptions::default()
        };
        let nodes =
            build_data_graph_from_paths(&s.registry, &[name_path], options).unwrap();
        assert_eq!(render(&nodes), "Name");
    }

    #[test]
    fn test_include_key_seeds_children() {
        let mut s = shop();
        let customer = s.registry.find_type_by_name("Customer").unwrap().id;
        let key = s
            .registry
            .add_prop(customer, PropDef::key("Id", ScalarType::Uuid))
            .unwrap();

        let name_path = path(&s.registry, s.order, "Customer.Name");
        let options = GraphOptions {
            include_key: true,
            ..GraphOptions::default()
        };
        let nodes =
            build_data_graph_from_paths(&s.registry, &[name_path], options).unwrap();

        assert_eq!(render(&nodes), "Customer(Id,Name)");
        match &nodes[0] {
            GraphNode::Reference { items, .. } => {
                assert!(items.contains(&GraphNode::leaf(key, "Id")));
            }
            _ => panic!("expected reference node"),
        }
    }

    #[test]
    fn test_node_equality_empty_sets() {
        let sp = uuid::Uuid::new_v4();
        let tt = uuid::Uuid::new_v4();
        let a = GraphNode::Reference {
            source_prop: sp,
            name: "Customer".to_string(),
            target_type: tt,
            items: Vec::new(),
        };
        let b = GraphNode::Reference {
            source_prop: sp,
            name: "RenamedButSame".to_string(),
            target_type: tt,
            items: Vec::new(),
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_node_equality_compares_children_as_sets() {
        let sp = uuid::Uuid::new_v4();
        let tt = uuid::Uuid::new_v4();
        let x = uuid::Uuid::new_v4();
        let y = uuid::Uuid::new_v4();

        let a = GraphNode::Reference {
            source_prop: sp,
            name: "Customer".to_string(),
            target_type: tt,
            items: vec![GraphNode::leaf(x, "X"), GraphNode::leaf(y, "Y")],
        };
        let b = GraphNode::Reference {
            source_prop: sp,
            name: "Customer".to_string(),
            target_type: tt,
            items: vec![GraphNode::leaf(y, "Y"), GraphNode::leaf(x, "X")],
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_keeps_first_encountered_order() {
        let s = shop();
        let nodes = build_data_graph(
            &s.registry,
            &[s.customer_nav, s.order_total, s.line_qty],
            GraphOptions::default(),
        )
        .unwrap();

        // Leaves first (partition), then navigation nodes, in input order.
        assert_eq!(render(&nodes), "Total,Qty,Customer()");
    }
}

//! Core types used throughout Modelium
//!
//! This module contains the fundamental value objects of the schema model:
//! type kinds, the property type descriptor, reference multiplicity and
//! binding flag sets, validation rules, and default values.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ============================================================================
// Unique Identifiers
// ============================================================================

/// Type alias for schema type unique identifiers
pub type TypeId = uuid::Uuid;

/// Type alias for property unique identifiers
pub type PropId = uuid::Uuid;

// ============================================================================
// TypeKind
// ============================================================================

/// Kind of a schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Data-layer type (maps to a database table)
    #[default]
    Entity,
    /// View-facing type that may project into a paired Entity store
    Model,
    /// Enumeration with named items
    Enum,
    /// Complex value type without identity
    Complex,
    /// Interface contract implemented by other types
    Interface,
}

impl TypeKind {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            TypeKind::Entity => "Entity",
            TypeKind::Model => "Model",
            TypeKind::Enum => "Enum",
            TypeKind::Complex => "Complex",
            TypeKind::Interface => "Interface",
        }
    }

    /// Check if this is the Entity kind
    pub fn is_entity(&self) -> bool {
        matches!(self, TypeKind::Entity)
    }

    /// Check if this is the Model kind
    pub fn is_model(&self) -> bool {
        matches!(self, TypeKind::Model)
    }

    /// Check if types of this kind may own a paired store type
    ///
    /// Only Model types project into an Entity store.
    pub fn can_own_store(&self) -> bool {
        self.is_model()
    }

    /// Get all type kinds
    pub fn all() -> &'static [TypeKind] {
        &[
            TypeKind::Entity,
            TypeKind::Model,
            TypeKind::Enum,
            TypeKind::Complex,
            TypeKind::Interface,
        ]
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// ScalarType
// ============================================================================

/// Primitive value types for properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// Variable-length string
    #[default]
    String,
    /// Long-form text content
    Text,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
    /// Fixed-point decimal
    Decimal,
    /// Boolean true/false
    Bool,
    /// UUID (universally unique identifier)
    Uuid,
    /// Date and time with timezone
    DateTime,
    /// Date without time
    Date,
    /// Time without date
    Time,
    /// Binary data
    Bytes,
}

impl ScalarType {
    /// Get a user-friendly display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Text => "Text",
            ScalarType::Int32 => "Integer",
            ScalarType::Int64 => "Big Integer",
            ScalarType::Float32 => "Float",
            ScalarType::Float64 => "Double",
            ScalarType::Decimal => "Decimal",
            ScalarType::Bool => "Boolean",
            ScalarType::Uuid => "UUID",
            ScalarType::DateTime => "DateTime",
            ScalarType::Date => "Date",
            ScalarType::Time => "Time",
            ScalarType::Bytes => "Binary",
        }
    }

    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32
                | ScalarType::Int64
                | ScalarType::Float32
                | ScalarType::Float64
                | ScalarType::Decimal
        )
    }

    /// Check if this is a date/time type
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ScalarType::DateTime | ScalarType::Date | ScalarType::Time
        )
    }

    /// Get all scalar types
    pub fn all() -> &'static [ScalarType] {
        &[
            ScalarType::String,
            ScalarType::Text,
            ScalarType::Int32,
            ScalarType::Int64,
            ScalarType::Float32,
            ScalarType::Float64,
            ScalarType::Decimal,
            ScalarType::Bool,
            ScalarType::Uuid,
            ScalarType::DateTime,
            ScalarType::Date,
            ScalarType::Time,
            ScalarType::Bytes,
        ]
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// PropType (property type descriptor)
// ============================================================================

/// Describes the shape of a property's value
///
/// A property is either a scalar, an enumeration member, a single referenced
/// object, or a collection of referenced objects. Object and Collection are
/// the navigation shapes: they point at another schema type and are backed
/// by a [`Reference`] on the owning property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", content = "params")]
#[serde(rename_all = "snake_case")]
pub enum PropType {
    /// Primitive value
    Scalar(ScalarType),
    /// Enumeration value; `type_id` links to the Enum type when it is
    /// declared in the same schema
    Enumeration {
        type_id: Option<TypeId>,
        name: String,
    },
    /// Single referenced object
    Object { type_id: TypeId },
    /// Collection of referenced objects
    Collection { element_type: TypeId },
}

impl PropType {
    /// Create a string scalar descriptor
    pub fn string() -> Self {
        PropType::Scalar(ScalarType::String)
    }

    /// Create a scalar descriptor
    pub fn scalar(scalar: ScalarType) -> Self {
        PropType::Scalar(scalar)
    }

    /// Create an object descriptor pointing at a schema type
    pub fn object(type_id: TypeId) -> Self {
        PropType::Object { type_id }
    }

    /// Create a collection descriptor pointing at a schema type
    pub fn collection(element_type: TypeId) -> Self {
        PropType::Collection { element_type }
    }

    /// Check if this is a scalar descriptor
    pub fn is_scalar(&self) -> bool {
        matches!(self, PropType::Scalar(_))
    }

    /// Check if this is an enumeration descriptor
    pub fn is_enumeration(&self) -> bool {
        matches!(self, PropType::Enumeration { .. })
    }

    /// Check if this is a collection descriptor
    pub fn is_collection(&self) -> bool {
        matches!(self, PropType::Collection { .. })
    }

    /// Check if this is a navigation shape (object or collection)
    pub fn is_navigation(&self) -> bool {
        matches!(self, PropType::Object { .. } | PropType::Collection { .. })
    }

    /// Get the referenced schema type, if any
    pub fn referenced_type(&self) -> Option<TypeId> {
        match self {
            PropType::Object { type_id } => Some(*type_id),
            PropType::Collection { element_type } => Some(*element_type),
            PropType::Enumeration { type_id, .. } => *type_id,
            PropType::Scalar(_) => None,
        }
    }

    /// Get a user-friendly display name
    pub fn display_name(&self) -> String {
        match self {
            PropType::Scalar(s) => s.display_name().to_string(),
            PropType::Enumeration { name, .. } => format!("Enum<{}>", name),
            PropType::Object { .. } => "Object".to_string(),
            PropType::Collection { .. } => "Collection".to_string(),
        }
    }
}

impl Default for PropType {
    fn default() -> Self {
        PropType::Scalar(ScalarType::String)
    }
}

impl std::fmt::Display for PropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Multiplicity
// ============================================================================

bitflags! {
    /// Multiplicity of a reference, as a flag set
    ///
    /// Combinations express the usual cardinalities: `ONE` is a required
    /// to-one, `ONE | ZERO` an optional to-one, `MANY` a to-many.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Multiplicity: u8 {
        /// Zero is allowed (the relationship is optional)
        const ZERO = 1 << 0;
        /// Exactly one target
        const ONE = 1 << 1;
        /// Many targets
        const MANY = 1 << 2;
    }
}

impl Multiplicity {
    /// Optional to-one (`ONE | ZERO`)
    pub const ONE_OR_ZERO: Multiplicity = Multiplicity::ONE.union(Multiplicity::ZERO);

    /// Check if this multiplicity targets many items
    pub fn is_to_many(&self) -> bool {
        self.contains(Multiplicity::MANY)
    }

    /// Check if this multiplicity targets a single item
    pub fn is_to_one(&self) -> bool {
        self.contains(Multiplicity::ONE) && !self.contains(Multiplicity::MANY)
    }

    /// Check if the relationship may be absent
    pub fn is_optional(&self) -> bool {
        self.contains(Multiplicity::ZERO)
    }
}

// ============================================================================
// Binding
// ============================================================================

bitflags! {
    /// Binding style of a reference, as a flag set
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Binding: u8 {
        /// Detached data fetched separately rather than joined
        const LOOSE = 1 << 0;
        /// Target rows live inside the source's aggregate
        const NESTED = 1 << 1;
        /// Source owns the target's lifetime
        const OWNED = 1 << 2;
        /// Plain association without ownership
        const ASSOCIATED = 1 << 3;
        /// Target lives independently of the source
        const INDEPENDENT = 1 << 4;
    }
}

// ============================================================================
// ReferenceAxis
// ============================================================================

/// Direction of a reference within the containment hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceAxis {
    /// No axis (not a reference)
    #[default]
    None,
    /// Plain value reference
    Value,
    /// Points from a child to its parent
    ToParent,
    /// Points at a collection of children
    ToCollection,
    /// Points from a collection owner at a single collection item
    ToCollectionItem,
    /// Points from a parent to a single child
    ToChild,
    /// Points at an arbitrary ancestor
    ToAncestor,
    /// Points at an arbitrary descendant
    ToDescendant,
}

impl ReferenceAxis {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ReferenceAxis::None => "None",
            ReferenceAxis::Value => "Value",
            ReferenceAxis::ToParent => "ToParent",
            ReferenceAxis::ToCollection => "ToCollection",
            ReferenceAxis::ToCollectionItem => "ToCollectionItem",
            ReferenceAxis::ToChild => "ToChild",
            ReferenceAxis::ToAncestor => "ToAncestor",
            ReferenceAxis::ToDescendant => "ToDescendant",
        }
    }
}

impl std::fmt::Display for ReferenceAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// DeletedMarker
// ============================================================================

/// Classification of a property participating in soft-delete conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeletedMarker {
    /// Not a deletion marker
    #[default]
    None,
    /// Effective deletion state computed from related rows
    Effective,
    /// The row carries its own deleted flag
    Own,
    /// Deletion cascades from a referenced row
    Cascade,
    /// The row was moved to a recycle bin
    RecycleBin,
}

impl DeletedMarker {
    /// Check if this is a real marker
    pub fn is_marker(&self) -> bool {
        !matches!(self, DeletedMarker::None)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            DeletedMarker::None => "None",
            DeletedMarker::Effective => "Effective",
            DeletedMarker::Own => "Own",
            DeletedMarker::Cascade => "Cascade",
            DeletedMarker::RecycleBin => "RecycleBin",
        }
    }
}

// ============================================================================
// PropRules
// ============================================================================

/// Validation constraints attached to a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PropRules {
    /// The property must have a value
    pub required: bool,

    /// Minimum value (numeric) or length (string)
    pub min: Option<f64>,

    /// Maximum value (numeric) or length (string)
    pub max: Option<f64>,

    /// Custom error message shown when a rule is violated
    pub error_message: Option<String>,
}

impl PropRules {
    /// Create empty rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the minimum
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the maximum
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Set the error message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Check if any rule is set
    pub fn has_any(&self) -> bool {
        self.required || self.min.is_some() || self.max.is_some()
    }
}

// ============================================================================
// DefaultValue
// ============================================================================

/// Default values for properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Current timestamp
    Now,
    /// Generate a new UUID
    NewUuid,
    /// Custom expression evaluated by the target stack
    Expression(String),
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Null => write!(f, "NULL"),
            DefaultValue::Bool(v) => write!(f, "{}", v),
            DefaultValue::Int(v) => write!(f, "{}", v),
            DefaultValue::Float(v) => write!(f, "{}", v),
            DefaultValue::String(v) => write!(f, "\"{}\"", v),
            DefaultValue::Now => write!(f, "NOW()"),
            DefaultValue::NewUuid => write!(f, "UUID()"),
            DefaultValue::Expression(v) => write!(f, "{}", v),
        }
    }
}

/// Scenario in which a scoped default applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UsageScenario {
    /// Every scenario
    #[default]
    All,
    /// Only when creating a new row
    Create,
    /// Only when editing an existing row
    Edit,
}

/// A default value bound to a usage scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedDefault {
    /// Scenario in which the default applies
    pub scenario: UsageScenario,

    /// The default value
    pub value: DefaultValue,
}

impl ScopedDefault {
    /// Create a default that applies in every scenario
    pub fn for_all(value: DefaultValue) -> Self {
        Self {
            scenario: UsageScenario::All,
            value,
        }
    }

    /// Create a default bound to one scenario
    pub fn new(scenario: UsageScenario, value: DefaultValue) -> Self {
        Self { scenario, value }
    }
}

// ============================================================================
// UiWidget
// ============================================================================

/// Widget hint for editor rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiWidget {
    /// Single-line text input
    Text,
    /// Multi-line text area
    TextArea,
    /// Numeric input
    Number,
    /// Checkbox
    Checkbox,
    /// Date picker
    Date,
    /// Time picker
    Time,
    /// DateTime picker
    DateTime,
    /// Dropdown select
    Select,
    /// Multi-select
    MultiSelect,
    /// Hidden field
    Hidden,
}

impl UiWidget {
    /// Get the default widget for a property type descriptor
    pub fn for_prop_type(prop_type: &PropType) -> Self {
        match prop_type {
            PropType::Scalar(scalar) => match scalar {
                ScalarType::String | ScalarType::Uuid => UiWidget::Text,
                ScalarType::Text | ScalarType::Bytes => UiWidget::TextArea,
                ScalarType::Int32
                | ScalarType::Int64
                | ScalarType::Float32
                | ScalarType::Float64
                | ScalarType::Decimal => UiWidget::Number,
                ScalarType::Bool => UiWidget::Checkbox,
                ScalarType::DateTime => UiWidget::DateTime,
                ScalarType::Date => UiWidget::Date,
                ScalarType::Time => UiWidget::Time,
            },
            PropType::Enumeration { .. } => UiWidget::Select,
            PropType::Object { .. } => UiWidget::Select,
            PropType::Collection { .. } => UiWidget::MultiSelect,
        }
    }
}

impl Default for UiWidget {
    fn default() -> Self {
        UiWidget::Text
    }
}

// ============================================================================
// Tests
// ============================================================================

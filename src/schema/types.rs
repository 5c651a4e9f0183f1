//! Declarative schema description
//!
//! This is the only input the compiler accepts. Host bindings translate
//! their own type annotations into these structures; nothing here is
//! validated until `compile` runs.
//!
//! Supported types:
//! - str: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - decimal: arbitrary-precision decimal, carried as canonical text
//! - uuid / date-time: strings with a checked format
//! - any: accepted as-is
//! - list: homogeneous list with element type
//! - map: string-keyed map with value type
//! - object: nested record with its own field list

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{CompileError, CompileResult};

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldType {
    /// UTF-8 string
    #[serde(alias = "str")]
    String,
    /// 64-bit signed integer
    #[serde(alias = "integer")]
    Int,
    /// 64-bit floating point
    #[serde(alias = "number")]
    Float,
    /// Boolean
    #[serde(alias = "boolean")]
    Bool,
    /// Arbitrary-precision decimal
    Decimal,
    /// RFC 4122 identifier
    Uuid,
    /// RFC 3339 timestamp
    #[serde(alias = "datetime")]
    DateTime,
    /// Any value, converted structurally
    Any,
    /// Homogeneous list
    List {
        /// Element type (boxed to allow recursive types)
        items: Box<FieldType>,
    },
    /// String-keyed map with a single value type
    Map {
        /// Value type
        values: Box<FieldType>,
    },
    /// Nested record with its own field list
    Object {
        /// Nested field declarations in declaration order
        fields: Vec<FieldDecl>,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "integer",
            FieldType::Float => "float",
            FieldType::Bool => "boolean",
            FieldType::Decimal => "decimal",
            FieldType::Uuid => "uuid",
            FieldType::DateTime => "date-time",
            FieldType::Any => "any",
            FieldType::List { .. } => "list",
            FieldType::Map { .. } => "map",
            FieldType::Object { .. } => "object",
        }
    }

    pub fn list(items: FieldType) -> Self {
        FieldType::List {
            items: Box::new(items),
        }
    }

    pub fn map(values: FieldType) -> Self {
        FieldType::Map {
            values: Box::new(values),
        }
    }

    pub fn object(fields: Vec<FieldDecl>) -> Self {
        FieldType::Object { fields }
    }

    /// Parses a compact type annotation such as `int`, `List[str]` or
    /// `Dict[float]`.
    ///
    /// `email` and `url` parse as `String`; use
    /// [`FieldDecl::from_annotation`] to keep the format flag.
    pub fn parse(annotation: &str) -> CompileResult<Self> {
        let annotation = annotation.trim();
        match annotation {
            "str" | "string" | "email" | "url" => return Ok(FieldType::String),
            "int" | "integer" => return Ok(FieldType::Int),
            "float" | "number" => return Ok(FieldType::Float),
            "bool" | "boolean" => return Ok(FieldType::Bool),
            "decimal" => return Ok(FieldType::Decimal),
            "uuid" => return Ok(FieldType::Uuid),
            "date-time" | "datetime" => return Ok(FieldType::DateTime),
            "any" => return Ok(FieldType::Any),
            _ => {}
        }

        if let Some(inner) = strip_generic(annotation, &["List[", "list["]) {
            return Ok(FieldType::list(FieldType::parse(inner)?));
        }
        if let Some(inner) = strip_generic(annotation, &["Dict[", "dict["]) {
            // Dict[str, T] names the key type explicitly; keys are always strings.
            let value_type = match inner.split_once(',') {
                Some((key, value)) if matches!(key.trim(), "str" | "string") => value,
                Some(_) => return Err(CompileError::UnknownType(annotation.to_string())),
                None => inner,
            };
            return Ok(FieldType::map(FieldType::parse(value_type)?));
        }

        Err(CompileError::UnknownType(annotation.to_string()))
    }
}

fn strip_generic<'a>(annotation: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| annotation.strip_prefix(prefix))
        .and_then(|rest| rest.strip_suffix(']'))
}

/// Validation rules declared on a field.
///
/// Every rule is optional. Which rules apply depends on the field type; the
/// compiler rejects a rule declared on a type it cannot apply to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub email: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub url: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ge: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub le: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
    /// Allowed values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    pub fn url(mut self) -> Self {
        self.url = true;
        self
    }

    pub fn ge(mut self, bound: f64) -> Self {
        self.ge = Some(bound);
        self
    }

    pub fn le(mut self, bound: f64) -> Self {
        self.le = Some(bound);
        self
    }

    pub fn gt(mut self, bound: f64) -> Self {
        self.gt = Some(bound);
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.lt = Some(bound);
        self
    }

    pub fn multiple_of(mut self, step: f64) -> Self {
        self.multiple_of = Some(step);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn unique_items(mut self) -> Self {
        self.unique_items = true;
        self
    }

    pub fn one_of(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }
}

fn default_required() -> bool {
    true
}

/// Field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name as it appears in input records
    pub name: String,
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Validation rules
    #[serde(default)]
    pub constraints: Constraints,
    /// Whether the field must be present when no default is declared
    #[serde(default = "default_required")]
    pub required: bool,
    /// Value used when the field is absent or null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDecl {
    /// Create a required field
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            constraints: Constraints::default(),
            required: true,
            default: None,
        }
    }

    /// Create an optional field that stores `None` when absent
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type)
        }
    }

    /// Create a field from a compact annotation (`int`, `List[int]`,
    /// `email`, ...)
    pub fn from_annotation(
        name: impl Into<String>,
        annotation: &str,
        required: bool,
    ) -> CompileResult<Self> {
        let mut decl = Self::required(name, FieldType::parse(annotation)?);
        decl.required = required;
        match annotation.trim() {
            "email" => decl.constraints.email = true,
            "url" => decl.constraints.url = true,
            _ => {}
        }
        Ok(decl)
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Complete record declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDecl {
    /// Record type name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field declarations in declaration order
    pub fields: Vec<FieldDecl>,
}

impl SchemaDecl {
    /// Create a new schema declaration
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
        }
    }

    /// Parses a declaration from JSON text.
    pub fn from_json(text: &str) -> CompileResult<Self> {
        serde_json::from_str(text).map_err(|e| CompileError::Malformed(e.to_string()))
    }
}

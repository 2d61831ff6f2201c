//! Type Resolution
//!
//! Maps a host-language type expression to a proto schema type plus a
//! cardinality. Resolution order for a bare name:
//! 1. Substitution table (`int` -> `int64`, `time.Time` -> Timestamp, ...)
//! 2. Primitive table / well-known types
//! 3. Alias map (followed recursively, cycle-checked)
//! 4. Otherwise the name is a message reference
//!
//! Shapes the schema language cannot express (func, chan, inline interface,
//! nested maps, ...) become `google.protobuf.Any` so generation stays total.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::error::{ProtoGenError, Result};
use crate::schema::TypeExpr;

// =============================================================================
// Schema Types
// =============================================================================

/// Proto3 scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
}

impl ScalarType {
    /// Fixed primitive table
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "float" => Self::Float,
            "double" => Self::Double,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

/// Pre-imported well-known types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WellKnownType {
    Any,
    Duration,
    Timestamp,
}

impl WellKnownType {
    pub const ALL: [WellKnownType; 3] = [Self::Any, Self::Duration, Self::Timestamp];

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|wkt| wkt.type_name() == name)
    }

    /// Fully qualified proto type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Any => "google.protobuf.Any",
            Self::Duration => "google.protobuf.Duration",
            Self::Timestamp => "google.protobuf.Timestamp",
        }
    }

    /// Import path of the defining file
    pub fn import_path(&self) -> &'static str {
        match self {
            Self::Any => "google/protobuf/any.proto",
            Self::Duration => "google/protobuf/duration.proto",
            Self::Timestamp => "google/protobuf/timestamp.proto",
        }
    }
}

/// A fully resolved schema type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Scalar(ScalarType),
    WellKnown(WellKnownType),
    /// A message declared in one of the input files
    Message(String),
    /// A package-qualified type from outside the input set, kept as written
    External(String),
    Map {
        key: Box<SchemaType>,
        value: Box<SchemaType>,
    },
}

impl SchemaType {
    pub fn any() -> Self {
        SchemaType::WellKnown(WellKnownType::Any)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, SchemaType::Map { .. })
    }

    /// Message names this type refers to
    pub fn message_refs(&self) -> Vec<&str> {
        match self {
            SchemaType::Message(name) => vec![name.as_str()],
            SchemaType::Map { key, value } => {
                let mut refs = key.message_refs();
                refs.extend(value.message_refs());
                refs
            }
            _ => Vec::new(),
        }
    }

    /// Well-known types this type uses
    pub fn well_known_types(&self) -> Vec<WellKnownType> {
        match self {
            SchemaType::WellKnown(wkt) => vec![*wkt],
            SchemaType::Map { key, value } => {
                let mut used = key.well_known_types();
                used.extend(value.well_known_types());
                used
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Scalar(scalar) => write!(f, "{}", scalar.as_str()),
            SchemaType::WellKnown(wkt) => write!(f, "{}", wkt.type_name()),
            SchemaType::Message(name) | SchemaType::External(name) => write!(f, "{}", name),
            SchemaType::Map { key, value } => write!(f, "map<{}, {}>", key, value),
        }
    }
}

/// Field cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cardinality {
    #[default]
    Singular,
    Optional,
    Repeated,
}

impl Cardinality {
    /// Field label, if any
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Cardinality::Singular => None,
            Cardinality::Optional => Some("optional"),
            Cardinality::Repeated => Some("repeated"),
        }
    }
}

/// Result of resolving one type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub schema_type: SchemaType,
    pub cardinality: Cardinality,
}

impl ResolvedType {
    pub fn singular(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            cardinality: Cardinality::Singular,
        }
    }

    fn with(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }
}

// =============================================================================
// Alias Map
// =============================================================================

/// Declared alias name -> underlying type expression (one level)
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    aliases: HashMap<String, TypeExpr>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an alias; returns the previous target if the name was already present
    pub fn insert(&mut self, name: impl Into<String>, target: TypeExpr) -> Option<TypeExpr> {
        self.aliases.insert(name.into(), target)
    }

    pub fn get(&self, name: &str) -> Option<&TypeExpr> {
        self.aliases.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Normalize host numeric/time type names to their schema equivalents.
/// Names not in the table pass through unchanged.
pub fn substitute(name: &str) -> &str {
    match name {
        "int" => "int64",
        "int8" | "int16" | "rune" => "int32",
        "float32" | "float64" | "float" => "double",
        "uint" | "uint8" | "uint16" | "byte" => "uint32",
        "time.Duration" => "google.protobuf.Duration",
        "time.Time" => "google.protobuf.Timestamp",
        other => other,
    }
}

/// Resolves type expressions against an alias map
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    aliases: &'a AliasMap,
}

impl<'a> TypeResolver<'a> {
    pub fn new(aliases: &'a AliasMap) -> Self {
        Self { aliases }
    }

    /// Resolve a type expression to a schema type and cardinality
    pub fn resolve(&self, expr: &TypeExpr) -> Result<ResolvedType> {
        let mut chain = Vec::new();
        self.resolve_expr(expr, &mut chain)
    }

    fn resolve_expr(&self, expr: &TypeExpr, chain: &mut Vec<String>) -> Result<ResolvedType> {
        match expr {
            TypeExpr::Ident { name } => self.resolve_name(name, chain),

            TypeExpr::Qualified { package, name } => {
                let full = format!("{}.{}", package, name);
                let schema_type = match WellKnownType::from_type_name(substitute(&full)) {
                    Some(wkt) => SchemaType::WellKnown(wkt),
                    None => SchemaType::External(full),
                };
                Ok(ResolvedType::singular(schema_type))
            }

            TypeExpr::Pointer { elem } => {
                let inner = self.resolve_expr(elem, chain)?;
                let cardinality = match inner.cardinality {
                    Cardinality::Repeated => Cardinality::Repeated,
                    _ if inner.schema_type.is_map() => Cardinality::Singular,
                    _ => Cardinality::Optional,
                };
                Ok(inner.with(cardinality))
            }

            TypeExpr::Slice { elem } | TypeExpr::Array { elem, .. } => {
                if self.is_byte_elem(elem, chain)? {
                    return Ok(ResolvedType::singular(SchemaType::Scalar(ScalarType::Bytes)));
                }
                let inner = self.resolve_expr(elem, chain)?;
                if inner.schema_type.is_map() {
                    trace!(%expr, "repeated map is not representable, using Any");
                    return Ok(ResolvedType::singular(SchemaType::any()).with(Cardinality::Repeated));
                }
                Ok(inner.with(Cardinality::Repeated))
            }

            TypeExpr::Map { key, value } => {
                let key = self.map_operand(key, chain)?;
                let value = self.map_operand(value, chain)?;
                Ok(ResolvedType::singular(SchemaType::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                }))
            }

            TypeExpr::Interface
            | TypeExpr::Struct
            | TypeExpr::Func
            | TypeExpr::Chan { .. }
            | TypeExpr::Opaque => {
                trace!(%expr, "unsupported type shape, using Any");
                Ok(ResolvedType::singular(SchemaType::any()))
            }
        }
    }

    /// Whether a slice element names the byte scalar, directly or through
    /// a chain of aliases
    fn is_byte_elem(&self, expr: &TypeExpr, chain: &mut Vec<String>) -> Result<bool> {
        let TypeExpr::Ident { name } = expr else {
            return Ok(false);
        };
        if name == "byte" || name == "uint8" {
            return Ok(true);
        }
        let Some(target) = self.aliases.get(name) else {
            return Ok(false);
        };

        if chain.iter().any(|seen| seen == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(ProtoGenError::AliasCycle { chain: cycle });
        }

        chain.push(name.to_string());
        let is_byte = self.is_byte_elem(target, chain)?;
        chain.pop();
        Ok(is_byte)
    }

    fn map_operand(&self, expr: &TypeExpr, chain: &mut Vec<String>) -> Result<SchemaType> {
        let resolved = self.resolve_expr(expr, chain)?;
        if resolved.schema_type.is_map() {
            trace!(%expr, "nested map is not representable, using Any");
            return Ok(SchemaType::any());
        }
        Ok(resolved.schema_type)
    }

    fn resolve_name(&self, name: &str, chain: &mut Vec<String>) -> Result<ResolvedType> {
        let canonical = substitute(name);
        if let Some(scalar) = ScalarType::from_name(canonical) {
            return Ok(ResolvedType::singular(SchemaType::Scalar(scalar)));
        }
        if let Some(wkt) = WellKnownType::from_type_name(canonical) {
            return Ok(ResolvedType::singular(SchemaType::WellKnown(wkt)));
        }
        if name == "any" {
            return Ok(ResolvedType::singular(SchemaType::any()));
        }

        let Some(target) = self.aliases.get(name) else {
            return Ok(ResolvedType::singular(SchemaType::Message(name.to_string())));
        };

        if chain.iter().any(|seen| seen == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(ProtoGenError::AliasCycle { chain: cycle });
        }

        chain.push(name.to_string());
        let resolved = self.resolve_expr(target, chain)?;
        chain.pop();
        Ok(resolved)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// The scalar kinds a schema can name without any declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Integer,
    Double,
    Boolean,
    String,
    Null,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 5] = [
        PrimitiveKind::Integer,
        PrimitiveKind::Double,
        PrimitiveKind::Boolean,
        PrimitiveKind::String,
        PrimitiveKind::Null,
    ];

    /// The spelling used in schema source.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Double  => "double",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::String  => "string",
            PrimitiveKind::Null    => "null",
        }
    }

    /// Map keys are restricted to the non-null primitives.
    pub fn is_map_key(&self) -> bool {
        !matches!(self, PrimitiveKind::Null)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named member of a struct, oneof, rpc or channel.
///
/// The compiler instantiates `T` with an unresolved reference while parsing and
/// with [Representable] once resolution has finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field<T> {
    pub name:     String,
    pub optional: bool,
    #[serde(rename = "type")]
    pub type_:    T,
}

impl<T> Field<T> {
    pub fn new(name: impl Into<String>, optional: bool, type_: T) -> Self {
        Field {
            name: name.into(),
            optional,
            type_,
        }
    }
}

/// A resolved, self-contained type tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Representable {
    Primitive {
        primitive: PrimitiveKind,
    },
    List {
        element: Box<Representable>,
    },
    Map {
        key:   PrimitiveKind,
        value: Box<Representable>,
    },
    Struct {
        name:   String,
        fields: Vec<Field<Representable>>,
    },
    /// Exactly one of `variants` is present in a value.
    #[serde(rename = "oneof")]
    OneOf {
        name:     String,
        variants: Vec<Field<Representable>>,
    },
    Optional {
        inner: Box<Representable>,
    },
}

impl Representable {
    pub fn primitive(primitive: PrimitiveKind) -> Self {
        Representable::Primitive { primitive }
    }

    pub fn list(element: Representable) -> Self {
        Representable::List {
            element: Box::new(element),
        }
    }

    pub fn map(key: PrimitiveKind, value: Representable) -> Self {
        Representable::Map {
            key,
            value: Box::new(value),
        }
    }

    pub fn optional(inner: Representable) -> Self {
        Representable::Optional {
            inner: Box::new(inner),
        }
    }

    /// Returns the primitive kind if this is a bare primitive.
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match *self {
            Representable::Primitive { primitive } => Some(primitive),
            _ => None,
        }
    }

    /// Looks up a struct field or oneof variant by name.
    pub fn field(&self, name: &str) -> Option<&Field<Representable>> {
        match self {
            Representable::Struct { fields, .. } => fields.iter().find(|f| f.name == name),
            Representable::OneOf { variants, .. } => variants.iter().find(|f| f.name == name),
            _ => None,
        }
    }
}

/// Renders the type back to schema syntax, naming structs and oneofs rather
/// than expanding them.
impl fmt::Display for Representable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Representable::Primitive { primitive } => write!(f, "{}", primitive),
            Representable::List { element } => write!(f, "List<{}>", element),
            Representable::Map { key, value } => write!(f, "Map<{}, {}>", key, value),
            Representable::Struct { name, .. } => f.write_str(name),
            Representable::OneOf { name, .. } => f.write_str(name),
            Representable::Optional { inner } => write!(f, "Optional<{}>", inner),
        }
    }
}

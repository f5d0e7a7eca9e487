use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub use conduit_schema::{Field, PrimitiveKind, Representable};

/// An unresolved type mention such as `List<Map<string, Dog>>`.
///
/// `name` may be qualified with a service name (`Service.Member`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub name:           String,
    pub type_arguments: Vec<Reference>,
}

impl Reference {
    pub fn named(name: impl Into<String>) -> Self {
        Reference {
            name:           name.into(),
            type_arguments: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, type_arguments: Vec<Reference>) -> Self {
        Reference {
            name: name.into(),
            type_arguments,
        }
    }

    /// Splits `Service.Member` into its two halves.
    pub fn qualifier(&self) -> Option<(&str, &str)> {
        self.name.split_once('.')
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.type_arguments.is_empty() {
            let args: Vec<String> = self.type_arguments.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeclarationValue<T> {
    Struct {
        fields: Vec<Field<T>>,
    },
    #[serde(rename = "oneof")]
    OneOf {
        fields: Vec<Field<T>>,
    },
    Rpc {
        request:  Field<T>,
        response: Field<T>,
    },
    Channel {
        incoming: Field<T>,
        outgoing: Field<T>,
    },
    Service {
        members: Vec<Declaration<T>>,
    },
    Import {
        imported_names: Vec<String>,
        path:           String,
    },
}

impl<T> DeclarationValue<T> {
    /// Human readable kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DeclarationValue::Struct { .. }  => "a struct",
            DeclarationValue::OneOf { .. }   => "a oneof",
            DeclarationValue::Rpc { .. }     => "an rpc",
            DeclarationValue::Channel { .. } => "a channel",
            DeclarationValue::Service { .. } => "a service",
            DeclarationValue::Import { .. }  => "an import",
        }
    }

    /// All fields in declaration order, empty for services and imports.
    pub fn fields(&self) -> Vec<&Field<T>> {
        match self {
            DeclarationValue::Struct { fields } | DeclarationValue::OneOf { fields } => {
                fields.iter().collect()
            }
            DeclarationValue::Rpc { request, response } => vec![request, response],
            DeclarationValue::Channel { incoming, outgoing } => vec![incoming, outgoing],
            DeclarationValue::Service { .. } | DeclarationValue::Import { .. } => Vec::new(),
        }
    }
}

/// A named definition. Import statements are stored with their path as the
/// name and are looked up through `imported_names`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration<T> {
    pub name:  String,
    pub value: DeclarationValue<T>,
}

impl<T> Declaration<T> {
    /// True if looking up `name` in the enclosing scope should land here.
    pub fn declares(&self, name: &str) -> bool {
        match &self.value {
            DeclarationValue::Import { imported_names, .. } => {
                imported_names.iter().any(|n| n == name)
            }
            _ => self.name == name,
        }
    }
}

/// One parsed schema file. `T` is [Reference] before resolution and
/// [Representable] after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaFile<T> {
    pub path:         PathBuf,
    pub declarations: Vec<Declaration<T>>,
}

impl<T> SchemaFile<T> {
    pub fn find(&self, name: &str) -> Option<&Declaration<T>> {
        self.declarations.iter().find(|d| d.declares(name))
    }
}

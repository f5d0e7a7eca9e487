//! conduit
//!
//! Runtime entry point for the Conduit schema language.
//!
//! - Compile `.conduit` files into resolved type trees (re-exported from the compiler)
//! - Look up message types by name, including `Service.Member` paths
//! - Check incoming JSON payloads against a resolved type

use thiserror::Error;

pub use conduit_compiler::error::CompileError;
pub use conduit_compiler::{compile_file, compile_schema, compile_schema_to_json, FsLoader, MemoryLoader, SchemaLoader};
pub use conduit_schema::{Field, PrimitiveKind, Representable, ValueError};

use conduit_compiler::types::{Declaration, DeclarationValue, SchemaFile};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("No message type named \"{0}\"")]
    UnknownType(String),
}

/// Parse `text` as JSON and check it against `ty`.
pub fn check_json(ty: &Representable, text: &str) -> Result<serde_json::Value, CheckError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    ty.check(&value)?;
    Ok(value)
}

/// Find a message type in a resolved file.
///
/// Accepts `Name` for top level structs and oneofs, `Service.Name` for types
/// declared in a service, and `Service.Member.field` for the fields of an rpc
/// or channel, e.g. `Chat.Send.request`. Any further segments walk into
/// struct fields and oneof variants, e.g. `Chat.Send.request.author`.
pub fn message_type(file: &SchemaFile<Representable>, path: &str) -> Option<Representable> {
    let mut segments = path.split('.');
    let head = segments.next()?;
    let mut declaration = file
        .declarations
        .iter()
        .find(|d| !matches!(d.value, DeclarationValue::Import { .. }) && d.name == head)?;

    let mut ty = loop {
        let segment = match segments.next() {
            Some(segment) => segment,
            None => return as_type(declaration),
        };

        match &declaration.value {
            DeclarationValue::Service { members } => {
                declaration = members.iter().find(|m| m.name == segment)?;
            }
            DeclarationValue::Rpc { .. } | DeclarationValue::Channel { .. } => {
                let field = declaration.value.fields().into_iter().find(|f| f.name == segment)?;
                break field.type_.clone();
            }
            _ => break as_type(declaration)?.field(segment)?.type_.clone(),
        }
    };

    for segment in segments {
        ty = ty.field(segment)?.type_.clone();
    }
    Some(ty)
}

/// Look up `path` with [message_type] and check `text` against it.
pub fn check_message(file: &SchemaFile<Representable>, path: &str, text: &str) -> Result<serde_json::Value, CheckError> {
    let ty = message_type(file, path).ok_or_else(|| CheckError::UnknownType(path.to_string()))?;
    check_json(&ty, text)
}

fn as_type(declaration: &Declaration<Representable>) -> Option<Representable> {
    match &declaration.value {
        DeclarationValue::Struct { fields } => Some(Representable::Struct {
            name:   declaration.name.clone(),
            fields: fields.clone(),
        }),
        DeclarationValue::OneOf { fields } => Some(Representable::OneOf {
            name:     declaration.name.clone(),
            variants: fields.clone(),
        }),
        _ => None,
    }
}

pub mod types {
    pub use conduit_compiler::types::{Declaration, DeclarationValue, SchemaFile};
    pub use conduit_schema::{Field, PrimitiveKind, Representable};
}

pub mod error {
    pub use super::CheckError;
    pub use conduit_compiler::error::CompileError;
    pub use conduit_schema::ValueError;
}

use std::collections::HashSet;

use crate::{
    error::{ValidationError, ValidationRule},
    types::{Declaration, DeclarationValue, Field, Reference, SchemaFile},
};

/// Structural checks between parsing and resolution. Returns the file
/// unchanged when it passes:
///  1) only structs, oneofs, services and imports at file scope,
///  2) no service inside a service,
///  3) no name declared twice in one scope,
///  4) no field declared twice in one struct or oneof.
pub fn validate_schema(file: SchemaFile<Reference>) -> Result<SchemaFile<Reference>, ValidationError> {
    let fail = |rule: ValidationRule, path: &str| ValidationError {
        rule,
        declaration_path: format!("{}:{}", file.path.display(), path),
    };

    let mut seen = HashSet::new();
    for declaration in &file.declarations {
        match &declaration.value {
            DeclarationValue::Rpc { .. } => {
                return Err(fail(ValidationRule::TopLevelRpc, &declaration.name));
            }
            DeclarationValue::Channel { .. } => {
                return Err(fail(ValidationRule::TopLevelChannel, &declaration.name));
            }
            DeclarationValue::Import { imported_names, .. } => {
                for name in imported_names {
                    if !seen.insert(name.as_str()) {
                        return Err(fail(ValidationRule::DuplicateDeclaration, name));
                    }
                }
                continue;
            }
            DeclarationValue::Service { members } => {
                check_service(&declaration.name, members).map_err(|(rule, path)| fail(rule, &path))?;
            }
            DeclarationValue::Struct { fields } | DeclarationValue::OneOf { fields } => {
                check_fields(fields)
                    .map_err(|field| fail(ValidationRule::DuplicateField, &format!("{}.{}", declaration.name, field)))?;
            }
        }

        if !seen.insert(declaration.name.as_str()) {
            return Err(fail(ValidationRule::DuplicateDeclaration, &declaration.name));
        }
    }

    Ok(file)
}

fn check_service(service: &str, members: &[Declaration<Reference>]) -> Result<(), (ValidationRule, String)> {
    let mut seen = HashSet::new();
    for member in members {
        let path = format!("{}.{}", service, member.name);
        match &member.value {
            DeclarationValue::Service { .. } => return Err((ValidationRule::NestedService, path)),
            DeclarationValue::Struct { fields } | DeclarationValue::OneOf { fields } => {
                check_fields(fields)
                    .map_err(|field| (ValidationRule::DuplicateField, format!("{}.{}", path, field)))?;
            }
            _ => {}
        }
        if !seen.insert(member.name.as_str()) {
            return Err((ValidationRule::DuplicateDeclaration, path));
        }
    }
    Ok(())
}

/// Returns the first repeated field name.
fn check_fields(fields: &[Field<Reference>]) -> Result<(), String> {
    let mut seen = HashSet::new();
    match fields.iter().find(|f| !seen.insert(f.name.as_str())) {
        Some(field) => Err(field.name.clone()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(declarations: Vec<Declaration<Reference>>) -> SchemaFile<Reference> {
        SchemaFile {
            path: PathBuf::from("app.conduit"),
            declarations,
        }
    }

    fn field(name: &str) -> Field<Reference> {
        Field::new(name, false, Reference::named("string"))
    }

    fn structure(name: &str, fields: &[&str]) -> Declaration<Reference> {
        Declaration {
            name:  name.into(),
            value: DeclarationValue::Struct {
                fields: fields.iter().map(|f| field(f)).collect(),
            },
        }
    }

    fn rpc(name: &str) -> Declaration<Reference> {
        Declaration {
            name:  name.into(),
            value: DeclarationValue::Rpc {
                request:  field("request"),
                response: field("response"),
            },
        }
    }

    fn service(name: &str, members: Vec<Declaration<Reference>>) -> Declaration<Reference> {
        Declaration {
            name:  name.into(),
            value: DeclarationValue::Service { members },
        }
    }

    #[test]
    fn accepts_well_formed_files() {
        let input = file(vec![
            structure("Person", &["name", "age"]),
            service("People", vec![structure("Person", &["id"]), rpc("Find")]),
        ]);
        assert_eq!(validate_schema(input.clone()).unwrap(), input);
    }

    #[test]
    fn rejects_top_level_rpc() {
        let err = validate_schema(file(vec![rpc("Find")])).unwrap_err();
        assert_eq!(err.rule, ValidationRule::TopLevelRpc);
        assert_eq!(err.declaration_path, "app.conduit:Find");
    }

    #[test]
    fn rejects_top_level_channel() {
        let channel = Declaration {
            name:  "Chat".into(),
            value: DeclarationValue::Channel {
                incoming: field("incoming"),
                outgoing: field("outgoing"),
            },
        };
        let err = validate_schema(file(vec![channel])).unwrap_err();
        assert_eq!(err.rule, ValidationRule::TopLevelChannel);
    }

    #[test]
    fn rejects_nested_service() {
        let err = validate_schema(file(vec![service("Outer", vec![service("Inner", vec![rpc("R")])])])).unwrap_err();
        assert_eq!(err.rule, ValidationRule::NestedService);
        assert_eq!(err.declaration_path, "app.conduit:Outer.Inner");
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = validate_schema(file(vec![structure("A", &["x"]), structure("A", &["y"])])).unwrap_err();
        assert_eq!(err.rule, ValidationRule::DuplicateDeclaration);

        let import = Declaration {
            name:  "other.conduit".into(),
            value: DeclarationValue::Import {
                imported_names: vec!["A".into()],
                path:           "other.conduit".into(),
            },
        };
        let err = validate_schema(file(vec![import, structure("A", &["x"])])).unwrap_err();
        assert_eq!(err.declaration_path, "app.conduit:A");

        let err = validate_schema(file(vec![service("S", vec![rpc("R"), rpc("R")])])).unwrap_err();
        assert_eq!(err.declaration_path, "app.conduit:S.R");
    }

    #[test]
    fn rejects_duplicate_fields() {
        let err = validate_schema(file(vec![structure("A", &["x", "y", "x"])])).unwrap_err();
        assert_eq!(err.rule, ValidationRule::DuplicateField);
        assert_eq!(err.declaration_path, "app.conduit:A.x");

        let err = validate_schema(file(vec![service("S", vec![structure("B", &["z", "z"])])])).unwrap_err();
        assert_eq!(err.declaration_path, "app.conduit:S.B.z");
    }
}

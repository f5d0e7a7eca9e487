use crate::representable::{Field, PrimitiveKind, Representable};

use serde_json::{Map, Value};
use thiserror::Error;

/// A JSON value did not match the shape of a [Representable].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Value at \"{path}\" does not match {expected}: {reason}")]
pub struct ValueError {
    /// Pointer-style location of the offending value, `""` for the root.
    pub path:     String,
    pub expected: String,
    pub reason:   String,
}

impl Representable {
    /// Checks that `value` is a valid instance of this type by walking the
    /// type tag. Payloads received over the wire go through here before they
    /// are handed to user code.
    pub fn check(&self, value: &Value) -> Result<(), ValueError> {
        self.check_at(value, "")
    }

    fn check_at(&self, value: &Value, path: &str) -> Result<(), ValueError> {
        match self {
            Representable::Primitive { primitive } => {
                if primitive_matches(*primitive, value) {
                    Ok(())
                } else {
                    Err(self.mismatch(path, format!("found {}", describe(value))))
                }
            }

            Representable::Optional { inner } => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.check_at(value, path)
                }
            }

            Representable::List { element } => {
                let items = value
                    .as_array()
                    .ok_or_else(|| self.mismatch(path, format!("found {}", describe(value))))?;
                for (i, item) in items.iter().enumerate() {
                    element.check_at(item, &format!("{}/{}", path, i))?;
                }
                Ok(())
            }

            Representable::Map { key, value: element } => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| self.mismatch(path, format!("found {}", describe(value))))?;
                for (k, v) in entries {
                    if !key_matches(*key, k) {
                        return Err(self.mismatch(
                            path,
                            format!("key \"{}\" is not a valid {}", k, key),
                        ));
                    }
                    element.check_at(v, &format!("{}/{}", path, k))?;
                }
                Ok(())
            }

            Representable::Struct { fields, .. } => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| self.mismatch(path, format!("found {}", describe(value))))?;
                self.reject_unknown(fields, entries, path)?;
                for field in fields {
                    match entries.get(&field.name) {
                        Some(Value::Null) if field.optional => {}
                        Some(v) => field.type_.check_at(v, &format!("{}/{}", path, field.name))?,
                        None if field.optional => {}
                        None if matches!(field.type_, Representable::Optional { .. }) => {}
                        None => {
                            return Err(self.mismatch(
                                path,
                                format!("missing field \"{}\"", field.name),
                            ))
                        }
                    }
                }
                Ok(())
            }

            Representable::OneOf { variants, .. } => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| self.mismatch(path, format!("found {}", describe(value))))?;
                self.reject_unknown(variants, entries, path)?;
                let present: Vec<&Field<Representable>> = variants
                    .iter()
                    .filter(|v| entries.get(&v.name).map_or(false, |x| !x.is_null()))
                    .collect();
                match present.as_slice() {
                    [variant] => variant
                        .type_
                        .check_at(&entries[&variant.name], &format!("{}/{}", path, variant.name)),
                    [] => Err(self.mismatch(path, "no variant is set".to_string())),
                    _ => Err(self.mismatch(
                        path,
                        format!("{} variants are set, expected exactly one", present.len()),
                    )),
                }
            }
        }
    }

    fn reject_unknown(
        &self,
        fields: &[Field<Representable>],
        entries: &Map<String, Value>,
        path: &str,
    ) -> Result<(), ValueError> {
        match entries.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
            Some(unknown) => Err(self.mismatch(path, format!("unknown field \"{}\"", unknown))),
            None => Ok(()),
        }
    }

    fn mismatch(&self, path: &str, reason: String) -> ValueError {
        ValueError {
            path:     path.to_string(),
            expected: self.to_string(),
            reason,
        }
    }
}

fn primitive_matches(kind: PrimitiveKind, value: &Value) -> bool {
    match kind {
        PrimitiveKind::Integer => value.is_i64() || value.is_u64(),
        PrimitiveKind::Double  => value.is_number(),
        PrimitiveKind::Boolean => value.is_boolean(),
        PrimitiveKind::String  => value.is_string(),
        PrimitiveKind::Null    => value.is_null(),
    }
}

/// JSON object keys are always strings, so non-string key kinds are checked
/// against their textual form.
fn key_matches(kind: PrimitiveKind, key: &str) -> bool {
    match kind {
        PrimitiveKind::String  => true,
        PrimitiveKind::Integer => key.parse::<i64>().is_ok(),
        PrimitiveKind::Double  => key.parse::<f64>().is_ok(),
        PrimitiveKind::Boolean => key == "true" || key == "false",
        PrimitiveKind::Null    => false,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}

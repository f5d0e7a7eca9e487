use crate::{
    error::CompileError,
    traits::{GeneratedFile, Generator},
    types::{Representable, SchemaFile},
};

/// Emits the resolved file as pretty-printed JSON next to the schema, e.g.
/// `chat.conduit` → `chat.conduit.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonGenerator;

impl Generator for JsonGenerator {
    fn generate(&self, file: &SchemaFile<Representable>) -> Result<Vec<GeneratedFile>, CompileError> {
        let mut path = file.path.clone().into_os_string();
        path.push(".json");
        Ok(vec![GeneratedFile {
            path:     path.into(),
            contents: compile_schema_to_json(file)?,
        }])
    }
}

pub fn compile_schema_to_json(file: &SchemaFile<Representable>) -> Result<String, CompileError> {
    Ok(serde_json::to_string_pretty(file)?)
}

use std::path::PathBuf;

use crate::{
    error::CompileError,
    types::{Representable, SchemaFile},
};

/// One output file produced by a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub path:     PathBuf,
    pub contents: String,
}

/// Turns one resolved schema file into target-language sources. Generators
/// own naming and layout of everything they emit.
pub trait Generator {
    fn generate(&self, file: &SchemaFile<Representable>) -> Result<Vec<GeneratedFile>, CompileError>;
}

/// Renders a field type in some target language. Implementations recurse
/// through `List`, `Map` and `Optional` themselves.
pub trait TypeRenderer {
    fn render(&self, ty: &Representable) -> String;
}

impl<F> TypeRenderer for F
where
    F: Fn(&Representable) -> String,
{
    fn render(&self, ty: &Representable) -> String {
        self(ty)
    }
}

/// Renders types back in schema syntax.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaRenderer;

impl TypeRenderer for SchemaRenderer {
    fn render(&self, ty: &Representable) -> String {
        ty.to_string()
    }
}

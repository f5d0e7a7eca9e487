use std::path::Path;

use tracing::debug;

use crate::{
    error::CompileError,
    loader::SchemaLoader,
    normalizer::normalize_blocks,
    parser::parse_schema,
    resolver::resolve_schema,
    tokenizer::tokenize_schema,
    types::{Reference, Representable, SchemaFile},
    validator::validate_schema,
};

/// Tokenize, normalize, parse and validate one file.
/// Returns `Err(CompileError)` from the first stage that fails.
pub fn parse_schema_text(text: &str, path: &Path) -> Result<SchemaFile<Reference>, CompileError> {
    let tokens = tokenize_schema(text)?;
    let tokens = normalize_blocks(tokens);
    debug!(path = %path.display(), tokens = tokens.len(), "tokenized schema");

    let file = parse_schema(&tokens, path)?;
    debug!(path = %path.display(), declarations = file.declarations.len(), "parsed schema");

    Ok(validate_schema(file)?)
}

/// Compile schema text into a fully resolved file. Imports are loaded through
/// `loader`, relative to `path`.
pub fn compile_schema(
    text: &str,
    path: &Path,
    loader: &dyn SchemaLoader,
) -> Result<SchemaFile<Representable>, CompileError> {
    let file = parse_schema_text(text, path)?;
    resolve_schema(&file, loader)
}

/// Load `path` through `loader` and resolve it.
pub fn compile_file(path: &Path, loader: &dyn SchemaLoader) -> Result<SchemaFile<Representable>, CompileError> {
    let file = loader.load(path)?;
    resolve_schema(&file, loader)
}

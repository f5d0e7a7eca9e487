use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::{
    compiler::parse_schema_text,
    error::CompileError,
    types::{Reference, SchemaFile},
    utils::normalize_path,
};

/// Supplies parsed and validated files to the resolver. Resolution never
/// touches the file system itself; it only goes through this trait.
pub trait SchemaLoader {
    fn load(&self, path: &Path) -> Result<SchemaFile<Reference>, CompileError>;
}

impl<F> SchemaLoader for F
where
    F: Fn(&Path) -> Result<SchemaFile<Reference>, CompileError>,
{
    fn load(&self, path: &Path) -> Result<SchemaFile<Reference>, CompileError> {
        self(path)
    }
}

/// Reads schema files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SchemaLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<SchemaFile<Reference>, CompileError> {
        trace!(path = %path.display(), "reading schema");
        let text = fs::read_to_string(path)?;
        parse_schema_text(&text, path)
    }
}

/// Serves pre-parsed files from memory, keyed by normalized path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, SchemaFile<Reference>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    pub fn insert(&mut self, file: SchemaFile<Reference>) {
        self.files.insert(normalize_path(&file.path), file);
    }

    /// Parses and validates `text` as the file at `path`.
    pub fn insert_text(&mut self, path: impl AsRef<Path>, text: &str) -> Result<(), CompileError> {
        let file = parse_schema_text(text, path.as_ref())?;
        self.insert(file);
        Ok(())
    }
}

impl SchemaLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<SchemaFile<Reference>, CompileError> {
        self.files.get(&normalize_path(path)).cloned().ok_or_else(|| {
            CompileError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no schema loaded at {}", path.display()),
            ))
        })
    }
}

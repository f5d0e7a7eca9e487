use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Any failure of the compile pipeline. Each stage has its own error type;
/// this enum is what the public entry points return.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Output encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Syntax error at line {line}, column {column}: expected {expected}\n{context}")]
pub struct TokenizeError {
    pub expected: String,
    pub line:     usize,
    pub column:   usize,
    /// The offending line (clipped) with a caret under the bad character.
    pub context:  String,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at line {line}, column {column}: expected {expected} but found {found}")]
pub struct ParseError {
    pub expected: String,
    pub found:    String,
    pub line:     usize,
    pub column:   usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    TopLevelRpc,
    TopLevelChannel,
    NestedService,
    DuplicateDeclaration,
    DuplicateField,
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ValidationRule::TopLevelRpc          => "rpc declarations must be inside a service",
            ValidationRule::TopLevelChannel      => "channel declarations must be inside a service",
            ValidationRule::NestedService        => "services cannot contain other services",
            ValidationRule::DuplicateDeclaration => "the name is declared twice",
            ValidationRule::DuplicateField       => "the field is declared twice",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Validation error at {declaration_path}: {rule}")]
pub struct ValidationError {
    pub rule:             ValidationRule,
    /// `file.conduit:Service.Member`
    pub declaration_path: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("Unresolved reference \"{name}\" in {}", .file.display())]
    UnresolvedReference { name: String, file: PathBuf },

    #[error("\"{name}\" takes {expected} type argument(s) but {found} were given")]
    WrongArity {
        name:     String,
        expected: usize,
        found:    usize,
    },

    #[error("Map keys must be string, integer, double or boolean, not {found}")]
    InvalidMapKey { found: String },

    #[error("\"{name}\" is {kind} and cannot be used as a field type")]
    InvalidTypePosition { name: String, kind: &'static str },

    #[error("Cyclic reference: {}", .cycle.join(" -> "))]
    VariableCycle { cycle: Vec<String> },

    #[error("Cyclic import: {}", join_paths(.cycle))]
    FileCycle { cycle: Vec<PathBuf> },

    #[error("\"{name}\" is not declared in {}", .path.display())]
    MissingImportTarget { name: String, path: PathBuf },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

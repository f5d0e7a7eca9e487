//! conduit-compiler
//!
//! This crate implements:
//!  1) A layout-sensitive tokenizer for `.conduit` schema files,
//!  2) An indentation normalizer that turns leading indentation into explicit blocks,
//!  3) A recursive-descent parser producing a reference AST,
//!  4) A validator for declaration placement and duplicate names,
//!  5) A resolver that expands every reference into a `Representable` type tree,
//!     loading imports through a `SchemaLoader` and rejecting cyclic schemas,
//!  6) Error types (`CompileError`) and the `Generator` contract.

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod normalizer;
pub mod parser;
pub mod validator;
pub mod builtins;
pub mod resolver;
pub mod loader;
pub mod compiler;
pub mod traits;
pub mod gen_json;

pub use compiler::{compile_file, compile_schema, parse_schema_text};
pub use gen_json::{compile_schema_to_json, JsonGenerator};
pub use loader::{FsLoader, MemoryLoader, SchemaLoader};
pub use resolver::resolve_schema;

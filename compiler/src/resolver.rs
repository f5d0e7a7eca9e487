use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::{
    builtins::{LexicalScope, BUILTINS},
    error::{CompileError, ResolutionError},
    loader::SchemaLoader,
    types::{Declaration, DeclarationValue, Field, Reference, Representable, SchemaFile},
    utils::{import_path, normalize_path},
};

/// In-flight names and files along one branch of the recursion.
///
/// Never mutated: descending into a declaration or an import produces an
/// extended copy, so sibling branches cannot see each other's entries.
#[derive(Debug, Clone, Default)]
struct Guards {
    variables: Vec<String>,
    files:     Vec<PathBuf>,
}

impl Guards {
    fn root(path: &Path) -> Self {
        Guards {
            variables: Vec::new(),
            files:     vec![normalize_path(path)],
        }
    }

    fn enter_variable(&self, key: String) -> Result<Guards, ResolutionError> {
        if let Some(start) = self.variables.iter().position(|v| *v == key) {
            let mut cycle = self.variables[start..].to_vec();
            cycle.push(key);
            return Err(ResolutionError::VariableCycle { cycle });
        }
        let mut next = self.clone();
        next.variables.push(key);
        Ok(next)
    }

    /// Variables are per file, so crossing into another file starts a fresh
    /// variable stack.
    fn enter_file(&self, path: &Path) -> Result<Guards, ResolutionError> {
        if let Some(start) = self.files.iter().position(|f| f == path) {
            let mut cycle = self.files[start..].to_vec();
            cycle.push(path.to_path_buf());
            return Err(ResolutionError::FileCycle { cycle });
        }
        let mut files = self.files.clone();
        files.push(path.to_path_buf());
        Ok(Guards {
            variables: Vec::new(),
            files,
        })
    }
}

/// Where a name is being looked up: a file, and optionally the service whose
/// body encloses the lookup.
#[derive(Clone, Copy)]
struct Scope<'f> {
    file:    &'f SchemaFile<Reference>,
    service: Option<&'f Declaration<Reference>>,
}

impl<'f> Scope<'f> {
    fn top(file: &'f SchemaFile<Reference>) -> Self {
        Scope { file, service: None }
    }

    fn within(self, service: &'f Declaration<Reference>) -> Self {
        Scope {
            file:    self.file,
            service: Some(service),
        }
    }

    fn members(&self) -> &'f [Declaration<Reference>] {
        match self.service.map(|s| &s.value) {
            Some(DeclarationValue::Service { members }) => members,
            _ => &[],
        }
    }

    /// Guard key for a declaration found in this scope.
    fn key(&self, name: &str) -> String {
        match self.service {
            Some(service) => format!("{}.{}", service.name, name),
            None => name.to_string(),
        }
    }

    fn unresolved(&self, name: &str) -> ResolutionError {
        ResolutionError::UnresolvedReference {
            name: name.to_string(),
            file: self.file.path.clone(),
        }
    }
}

/// Replaces every reference in `file` with its structural definition.
///
/// Imports are loaded through `loader`, relative to the importing file. The
/// input is never modified and nothing partial is returned on error.
pub fn resolve_schema(
    file: &SchemaFile<Reference>,
    loader: &dyn SchemaLoader,
) -> Result<SchemaFile<Representable>, CompileError> {
    debug!(
        path = %file.path.display(),
        declarations = file.declarations.len(),
        "resolving schema"
    );
    Resolver::new(loader).resolve_file(file)
}

pub struct Resolver<'a> {
    loader:   &'a dyn SchemaLoader,
    builtins: &'a LexicalScope,
    /// Every file loaded so far, keyed by normalized path.
    loaded:   RefCell<HashMap<PathBuf, Rc<SchemaFile<Reference>>>>,
    /// Files whose whole import graph has been walked without finding a cycle.
    acyclic:  RefCell<HashSet<PathBuf>>,
}

impl<'a> Resolver<'a> {
    pub fn new(loader: &'a dyn SchemaLoader) -> Self {
        Resolver::with_builtins(loader, &BUILTINS)
    }

    /// Uses `builtins` instead of the standard primitive and generic frames.
    pub fn with_builtins(loader: &'a dyn SchemaLoader, builtins: &'a LexicalScope) -> Self {
        Resolver {
            loader,
            builtins,
            loaded:  RefCell::default(),
            acyclic: RefCell::default(),
        }
    }

    pub fn resolve_file(&self, file: &SchemaFile<Reference>) -> Result<SchemaFile<Representable>, CompileError> {
        let guards = Guards::root(&file.path);
        let scope  = Scope::top(file);

        let declarations = file
            .declarations
            .iter()
            .map(|d| self.resolve_declaration(d, scope, &guards))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SchemaFile {
            path: file.path.clone(),
            declarations,
        })
    }

    fn resolve_declaration(
        &self,
        declaration: &Declaration<Reference>,
        scope: Scope,
        guards: &Guards,
    ) -> Result<Declaration<Representable>, CompileError> {
        trace!(name = %declaration.name, kind = declaration.value.kind(), "resolving declaration");

        let value = match &declaration.value {
            DeclarationValue::Struct { fields } => DeclarationValue::Struct {
                fields: self.resolve_members_of(&declaration.name, fields, scope, guards)?,
            },
            DeclarationValue::OneOf { fields } => DeclarationValue::OneOf {
                fields: self.resolve_members_of(&declaration.name, fields, scope, guards)?,
            },
            DeclarationValue::Rpc { request, response } => DeclarationValue::Rpc {
                request:  self.resolve_field(request, scope, guards)?,
                response: self.resolve_field(response, scope, guards)?,
            },
            DeclarationValue::Channel { incoming, outgoing } => DeclarationValue::Channel {
                incoming: self.resolve_field(incoming, scope, guards)?,
                outgoing: self.resolve_field(outgoing, scope, guards)?,
            },
            DeclarationValue::Service { members } => {
                let inner = scope.within(declaration);
                DeclarationValue::Service {
                    members: members
                        .iter()
                        .map(|m| self.resolve_declaration(m, inner, guards))
                        .collect::<Result<Vec<_>, _>>()?,
                }
            }
            DeclarationValue::Import { imported_names, path } => {
                // Only existence is checked here. Whether an export may be
                // used as a type depends on the field that names it.
                let (imported, _) = self.enter_import(path, scope.file, guards)?;
                for name in imported_names {
                    export(&imported, name)?;
                }
                DeclarationValue::Import {
                    imported_names: imported_names.clone(),
                    path:           path.clone(),
                }
            }
        };

        Ok(Declaration {
            name: declaration.name.clone(),
            value,
        })
    }

    /// Resolves the fields of a struct or oneof with its own name on the
    /// variable guard.
    fn resolve_members_of(
        &self,
        name: &str,
        fields: &[Field<Reference>],
        scope: Scope,
        guards: &Guards,
    ) -> Result<Vec<Field<Representable>>, CompileError> {
        let guards = guards.enter_variable(scope.key(name))?;
        fields
            .iter()
            .map(|f| self.resolve_field(f, scope, &guards))
            .collect()
    }

    fn resolve_field(
        &self,
        field: &Field<Reference>,
        scope: Scope,
        guards: &Guards,
    ) -> Result<Field<Representable>, CompileError> {
        Ok(Field {
            name:     field.name.clone(),
            optional: field.optional,
            type_:    self.resolve_reference(&field.type_, scope, guards)?,
        })
    }

    fn resolve_reference(
        &self,
        reference: &Reference,
        scope: Scope,
        guards: &Guards,
    ) -> Result<Representable, CompileError> {
        if reference.qualifier().is_none() {
            if let Some(builtin) = self.builtins.lookup(&reference.name) {
                builtin.check_arity(reference.type_arguments.len())?;
                let arguments = reference
                    .type_arguments
                    .iter()
                    .map(|a| self.resolve_reference(a, scope, guards))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(builtin.construct(arguments)?);
            }
        }

        if !reference.type_arguments.is_empty() {
            return Err(ResolutionError::WrongArity {
                name:     reference.name.clone(),
                expected: 0,
                found:    reference.type_arguments.len(),
            }
            .into());
        }

        let (declaration, found_in) = self.lookup(&reference.name, scope)?;
        self.resolve_type(&reference.name, declaration, found_in, guards)
    }

    /// Finds the declaration `name` refers to, and the scope it lives in.
    fn lookup<'f>(
        &self,
        name: &str,
        scope: Scope<'f>,
    ) -> Result<(&'f Declaration<Reference>, Scope<'f>), ResolutionError> {
        let top = Scope::top(scope.file);

        if let Some((service_name, member_name)) = name.split_once('.') {
            let service = scope
                .file
                .declarations
                .iter()
                .find(|d| d.name == service_name && matches!(d.value, DeclarationValue::Service { .. }))
                .ok_or_else(|| scope.unresolved(name))?;
            let inner = top.within(service);
            return inner
                .members()
                .iter()
                .find(|m| m.name == member_name)
                .map(|m| (m, inner))
                .ok_or_else(|| scope.unresolved(name));
        }

        if let Some(member) = scope.members().iter().find(|m| m.name == name) {
            return Ok((member, scope));
        }

        scope
            .file
            .find(name)
            .map(|d| (d, top))
            .ok_or_else(|| scope.unresolved(name))
    }

    /// Expands a declaration used in a type position.
    fn resolve_type(
        &self,
        name: &str,
        declaration: &Declaration<Reference>,
        scope: Scope,
        guards: &Guards,
    ) -> Result<Representable, CompileError> {
        match &declaration.value {
            DeclarationValue::Struct { fields } => Ok(Representable::Struct {
                name:   declaration.name.clone(),
                fields: self.resolve_members_of(&declaration.name, fields, scope, guards)?,
            }),
            DeclarationValue::OneOf { fields } => Ok(Representable::OneOf {
                name:     declaration.name.clone(),
                variants: self.resolve_members_of(&declaration.name, fields, scope, guards)?,
            }),
            DeclarationValue::Import { path, .. } => self.resolve_import(name, path, scope, guards),
            other => Err(ResolutionError::InvalidTypePosition {
                name: name.to_string(),
                kind: other.kind(),
            }
            .into()),
        }
    }

    /// Loads the file behind an import and resolves `name` inside it, in that
    /// file's own scope.
    fn resolve_import(
        &self,
        name: &str,
        path: &str,
        scope: Scope,
        guards: &Guards,
    ) -> Result<Representable, CompileError> {
        let (imported, guards) = self.enter_import(path, scope.file, guards)?;
        let declaration = export(&imported, name)?;
        self.resolve_type(name, declaration, Scope::top(&imported), &guards)
    }

    /// Loads the file behind `path`, checks its import graph, and returns it
    /// with the file guard extended by its path.
    fn enter_import(
        &self,
        path: &str,
        importer: &SchemaFile<Reference>,
        guards: &Guards,
    ) -> Result<(Rc<SchemaFile<Reference>>, Guards), CompileError> {
        let target = import_path(&importer.path, path);
        let guards = guards.enter_file(&target)?;
        let imported = self.load(&target)?;
        self.check_imports(&imported, &guards)?;
        Ok((imported, guards))
    }

    /// Walks the import graph below `file` so that cycles are reported even
    /// through imports that are never referenced.
    fn check_imports(&self, file: &SchemaFile<Reference>, guards: &Guards) -> Result<(), CompileError> {
        // A file with an acyclic import graph cannot reach anything on the
        // current path either, or that path would close a cycle through it.
        if self.acyclic.borrow().contains(&file.path) {
            return Ok(());
        }
        for declaration in &file.declarations {
            if let DeclarationValue::Import { path, .. } = &declaration.value {
                let target = import_path(&file.path, path);
                let guards = guards.enter_file(&target)?;
                let imported = self.load(&target)?;
                self.check_imports(&imported, &guards)?;
            }
        }
        self.acyclic.borrow_mut().insert(file.path.clone());
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Rc<SchemaFile<Reference>>, CompileError> {
        let cached = self.loaded.borrow().get(path).cloned();
        if let Some(file) = cached {
            return Ok(file);
        }

        trace!(path = %path.display(), "loading import");
        let mut file = self.loader.load(path)?;
        // The file guard compares normalized import paths, so the loaded file
        // is keyed by that path rather than whatever the loader reported.
        file.path = path.to_path_buf();
        let file = Rc::new(file);
        self.loaded.borrow_mut().insert(path.to_path_buf(), Rc::clone(&file));
        Ok(file)
    }
}

fn export<'f>(file: &'f SchemaFile<Reference>, name: &str) -> Result<&'f Declaration<Reference>, ResolutionError> {
    file.find(name).ok_or_else(|| ResolutionError::MissingImportTarget {
        name: name.to_string(),
        path: file.path.clone(),
    })
}

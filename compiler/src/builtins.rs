use lazy_static::lazy_static;

use crate::{
    error::ResolutionError,
    types::{PrimitiveKind, Representable},
};

lazy_static! {
    /// Primitives innermost, generic constructors outside them.
    pub static ref BUILTINS: LexicalScope = LexicalScope::new()
        .with_frame(ScopeFrame::new(vec![
            ("List", Builtin::List),
            ("Map", Builtin::Map),
            ("Optional", Builtin::Optional),
        ]))
        .with_frame(ScopeFrame::new(
            PrimitiveKind::ALL
                .iter()
                .map(|kind| (kind.name(), Builtin::Primitive(*kind)))
                .collect(),
        ));
}

/// A type constructor that needs no declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Primitive(PrimitiveKind),
    List,
    Map,
    Optional,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Primitive(kind) => kind.name(),
            Builtin::List     => "List",
            Builtin::Map      => "Map",
            Builtin::Optional => "Optional",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Builtin::Primitive(_) => 0,
            Builtin::List | Builtin::Optional => 1,
            Builtin::Map => 2,
        }
    }

    pub fn check_arity(&self, found: usize) -> Result<(), ResolutionError> {
        if found == self.arity() {
            Ok(())
        } else {
            Err(ResolutionError::WrongArity {
                name:     self.name().to_string(),
                expected: self.arity(),
                found,
            })
        }
    }

    /// Builds the resolved type from already resolved arguments.
    pub fn construct(&self, arguments: Vec<Representable>) -> Result<Representable, ResolutionError> {
        self.check_arity(arguments.len())?;
        let mut arguments = arguments.into_iter();
        let mut next = || {
            arguments.next().ok_or_else(|| ResolutionError::WrongArity {
                name:     self.name().to_string(),
                expected: self.arity(),
                found:    0,
            })
        };

        match self {
            Builtin::Primitive(kind) => Ok(Representable::primitive(*kind)),
            Builtin::List => Ok(Representable::list(next()?)),
            Builtin::Optional => Ok(Representable::optional(next()?)),
            Builtin::Map => {
                let key = next()?;
                let value = next()?;
                match key.as_primitive().filter(PrimitiveKind::is_map_key) {
                    Some(kind) => Ok(Representable::map(kind, value)),
                    None => Err(ResolutionError::InvalidMapKey {
                        found: key.to_string(),
                    }),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFrame {
    entries: Vec<(&'static str, Builtin)>,
}

impl ScopeFrame {
    pub fn new(entries: Vec<(&'static str, Builtin)>) -> Self {
        ScopeFrame { entries }
    }

    fn get(&self, name: &str) -> Option<Builtin> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, b)| *b)
    }
}

/// An immutable stack of frames, searched innermost first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexicalScope {
    frames: Vec<ScopeFrame>,
}

impl LexicalScope {
    pub fn new() -> Self {
        LexicalScope::default()
    }

    /// Returns a new scope with `frame` as its innermost frame.
    pub fn with_frame(&self, frame: ScopeFrame) -> LexicalScope {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.push(frame);
        frames.extend(self.frames.iter().cloned());
        LexicalScope { frames }
    }

    pub fn lookup(&self, name: &str) -> Option<Builtin> {
        self.frames.iter().find_map(|frame| frame.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string() -> Representable {
        Representable::primitive(PrimitiveKind::String)
    }

    fn dog() -> Representable {
        Representable::Struct {
            name:   "Dog".into(),
            fields: vec![],
        }
    }

    #[test]
    fn looks_up_primitives_and_generics() {
        assert_eq!(BUILTINS.lookup("integer"), Some(Builtin::Primitive(PrimitiveKind::Integer)));
        assert_eq!(BUILTINS.lookup("null"), Some(Builtin::Primitive(PrimitiveKind::Null)));
        assert_eq!(BUILTINS.lookup("Map"), Some(Builtin::Map));
        assert_eq!(BUILTINS.lookup("Dog"), None);
        assert_eq!(BUILTINS.lookup("list"), None);
    }

    #[test]
    fn inner_frames_shadow_outer_ones() {
        let scope = BUILTINS.with_frame(ScopeFrame::new(vec![("List", Builtin::Optional)]));
        assert_eq!(scope.lookup("List"), Some(Builtin::Optional));
        assert_eq!(scope.lookup("string"), Some(Builtin::Primitive(PrimitiveKind::String)));
        assert_eq!(BUILTINS.lookup("List"), Some(Builtin::List));
    }

    #[test]
    fn constructs_generics() {
        assert_eq!(Builtin::List.construct(vec![dog()]).unwrap(), Representable::list(dog()));
        assert_eq!(
            Builtin::Map.construct(vec![string(), dog()]).unwrap(),
            Representable::map(PrimitiveKind::String, dog())
        );
        assert_eq!(Builtin::Optional.construct(vec![string()]).unwrap(), Representable::optional(string()));
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = Builtin::List.construct(vec![string(), string()]).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::WrongArity {
                name:     "List".into(),
                expected: 1,
                found:    2,
            }
        );
        assert!(matches!(
            Builtin::Optional.construct(vec![string(), dog()]),
            Err(ResolutionError::WrongArity { .. })
        ));
        assert!(matches!(
            Builtin::Primitive(PrimitiveKind::String).check_arity(1),
            Err(ResolutionError::WrongArity { expected: 0, .. })
        ));
    }

    #[test]
    fn rejects_invalid_map_keys() {
        assert_eq!(
            Builtin::Map.construct(vec![dog(), string()]).unwrap_err(),
            ResolutionError::InvalidMapKey { found: "Dog".into() }
        );
        assert!(Builtin::Map
            .construct(vec![Representable::list(string()), string()])
            .is_err());
        assert!(Builtin::Map
            .construct(vec![Representable::primitive(PrimitiveKind::Null), string()])
            .is_err());
        assert!(Builtin::Map
            .construct(vec![Representable::primitive(PrimitiveKind::Double), string()])
            .is_ok());
    }
}

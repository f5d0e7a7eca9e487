//! This crate holds the resolved type model of the Conduit schema language.
//!
//! A [Representable] is a fully expanded type tree: every named reference in a
//! schema has already been replaced by its structural definition, so the tree
//! can be walked without any further lookups. The same tree drives runtime
//! validation of JSON payloads through [Representable::check].
//!
//! ```
//! use conduit_schema::*;
//!
//! let person = Representable::Struct {
//!     name:   "Person".to_owned(),
//!     fields: vec![
//!         Field::new("name", false, Representable::primitive(PrimitiveKind::String)),
//!         Field::new("sonicFast", false, Representable::primitive(PrimitiveKind::Boolean)),
//!     ],
//! };
//!
//! let value = serde_json::json!({ "name": "Sonic", "sonicFast": true });
//! assert!(person.check(&value).is_ok());
//! assert_eq!(Representable::list(person).to_string(), "List<Person>");
//! ```

pub mod representable;
pub mod value;

pub use representable::*;
pub use value::*;

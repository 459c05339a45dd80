//! Registration types shared between plugin units and the host loader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Synthetic identity of a loaded unit.
///
/// Derived deterministically from the unit's source path (never its
/// contents), so the same path always maps to the same identity while two
/// different paths never collide. Reload-on-change semantics require an
/// external cache invalidation policy; the identity itself does not track
/// file modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(Uuid);

impl UnitId {
    /// Derive the identity for a plugin file path.
    pub fn for_path(path: &Path) -> Self {
        Self(Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            path.as_os_str().as_encoded_bytes(),
        ))
    }

    /// Wrap an existing UUID as a unit identity.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an extension-point base type, e.g. `"Hook"` or `"Engine"`.
///
/// Base types are declared by the host; plugin classes reference them either
/// formally through [`Parent::Base`] or textually through [`Parent::Named`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseTypeId(String);

impl BaseTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BaseTypeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A class's declared parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// Formal reference to a host-declared extension point.
    Base(BaseTypeId),
    /// Parent named textually: another class registered in the same unit,
    /// or a base type the unit could not reference formally. A unit built
    /// against its own copy of this crate cannot share nominal identity
    /// with the host's base declarations, so the textual form is a
    /// first-class fallback, not a convenience.
    Named(String),
}

/// Constructor for an extension instance.
pub type ExtensionCtor = fn() -> Box<dyn crate::Extension>;

/// Descriptor for a class defined (or re-exported) by a plugin unit.
#[derive(Debug, Clone)]
pub struct ClassSpec {
    /// Class name as declared by the unit.
    pub name: String,
    /// Declared parents, in declaration order.
    pub parents: Vec<Parent>,
    /// Constructor, if the class is concrete. Intermediate classes in a
    /// derivation chain may register without one.
    pub construct: Option<ExtensionCtor>,
    /// Identity of the unit that defined this class. `None` until the host
    /// stamps it at load time; re-exported foreign specs keep their
    /// original identity and are excluded from discovery.
    pub defined_in: Option<UnitId>,
}

impl ClassSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            construct: None,
            defined_in: None,
        }
    }

    /// Declare a formal base-type parent.
    pub fn derives(mut self, base: BaseTypeId) -> Self {
        self.parents.push(Parent::Base(base));
        self
    }

    /// Declare a parent by name.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(Parent::Named(parent.into()));
        self
    }

    /// Attach a constructor for the concrete class.
    pub fn constructor(mut self, ctor: ExtensionCtor) -> Self {
        self.construct = Some(ctor);
        self
    }

    /// Mark this spec as defined by another unit (a re-export).
    pub fn defined_in(mut self, unit: UnitId) -> Self {
        self.defined_in = Some(unit);
        self
    }
}

/// A symbol registered by a unit: a class definition or a plain value.
#[derive(Debug, Clone)]
pub enum Symbol {
    Class(ClassSpec),
    Value(serde_json::Value),
}

/// The full set of symbols a unit registered, returned by the unit's
/// manifest entry point.
#[derive(Debug)]
pub struct UnitManifest {
    /// API version the unit was built against.
    pub api_version: u32,
    /// Registered symbols in registration order. Duplicate names are
    /// retained as distinct symbols.
    pub symbols: Vec<(String, Symbol)>,
}

/// Collects a unit's registrations inside the manifest entry point.
#[derive(Debug, Default)]
pub struct Registrar {
    symbols: Vec<(String, Symbol)>,
}

impl Registrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. The host stamps unstamped specs with the loading
    /// unit's identity; specs already carrying an identity are kept as
    /// re-exports.
    pub fn class(&mut self, spec: ClassSpec) -> &mut Self {
        self.symbols.push((spec.name.clone(), Symbol::Class(spec)));
        self
    }

    /// Register a plain value symbol (metadata, defaults, etc).
    pub fn value(&mut self, name: impl Into<String>, value: serde_json::Value) -> &mut Self {
        self.symbols.push((name.into(), Symbol::Value(value)));
        self
    }

    pub fn into_manifest(self) -> UnitManifest {
        UnitManifest {
            api_version: crate::API_VERSION,
            symbols: self.symbols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_deterministic_for_path() {
        let a = UnitId::for_path(Path::new("/config/hooks/fields.so"));
        let b = UnitId::for_path(Path::new("/config/hooks/fields.so"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_unit_id_distinct_for_distinct_paths() {
        let a = UnitId::for_path(Path::new("/config/hooks/fields.so"));
        let b = UnitId::for_path(Path::new("/config/hooks/other.so"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_class_spec_builder() {
        let spec = ClassSpec::new("Leaf")
            .derives(BaseTypeId::new("Hook"))
            .extends("Mid");

        assert_eq!(spec.name, "Leaf");
        assert_eq!(spec.parents.len(), 2);
        assert_eq!(spec.parents[0], Parent::Base(BaseTypeId::new("Hook")));
        assert_eq!(spec.parents[1], Parent::Named("Mid".to_string()));
        assert!(spec.construct.is_none());
        assert!(spec.defined_in.is_none());
    }

    #[test]
    fn test_registrar_keeps_duplicate_names() {
        let mut reg = Registrar::new();
        reg.class(ClassSpec::new("A").derives(BaseTypeId::new("Hook")));
        reg.class(ClassSpec::new("A").derives(BaseTypeId::new("Hook")));

        let manifest = reg.into_manifest();
        assert_eq!(manifest.symbols.len(), 2);
        assert_eq!(manifest.symbols[0].0, "A");
        assert_eq!(manifest.symbols[1].0, "A");
    }

    #[test]
    fn test_registrar_value_symbols() {
        let mut reg = Registrar::new();
        reg.value("schema_version", serde_json::json!(2));

        let manifest = reg.into_manifest();
        assert!(matches!(manifest.symbols[0].1, Symbol::Value(_)));
    }

    #[test]
    fn test_base_type_id_display() {
        assert_eq!(BaseTypeId::new("Engine").to_string(), "Engine");
    }
}

//! hookload-plugin-api - Registration API for hookload plugin units
//!
//! This crate provides the types needed to write plugin units for hookload.
//! A plugin unit is a native dynamic library that registers the classes it
//! defines through a registration entry point; the host loads the library
//! under an isolated synthetic identity and discovers the single class that
//! serves the requested extension point.
//!
//! # Example
//!
//! ```ignore
//! use hookload_plugin_api::{BaseTypeId, ClassSpec, Extension, Registrar, export_unit};
//!
//! struct TemplateFields;
//!
//! impl Extension for TemplateFields {
//!     fn class_name(&self) -> &str {
//!         "TemplateFields"
//!     }
//! }
//!
//! fn register(reg: &mut Registrar) {
//!     reg.class(
//!         ClassSpec::new("TemplateFields")
//!             .derives(BaseTypeId::new("Hook"))
//!             .constructor(|| Box::new(TemplateFields)),
//!     );
//! }
//!
//! export_unit!(register);
//! ```

pub mod types;

pub use types::{
    BaseTypeId, ClassSpec, ExtensionCtor, Parent, Registrar, Symbol, UnitId, UnitManifest,
};

/// Current plugin API version. Units must match this exactly.
/// Checked by the host before the registration entry point is called.
pub const API_VERSION: u32 = 1;

/// The instance-side contract for loaded extension classes.
///
/// The loader never constructs instances itself; it returns the matched
/// class, and a hosting collaborator instantiates it with whatever parent
/// or context object the host system defines.
pub trait Extension: Send {
    /// Name of the concrete class this instance was constructed from.
    fn class_name(&self) -> &str;
}

/// Export a registration function as a hookload plugin unit.
///
/// This macro generates the C ABI entry points the hookload loader uses to
/// validate and register a unit.
///
/// # Usage
///
/// ```ignore
/// hookload_plugin_api::export_unit!(register);
/// ```
///
/// # Generated Functions
///
/// - `_hookload_unit_api_version()`: Returns the API version
/// - `_hookload_unit_manifest()`: Runs the registration function and returns
///   the unit's symbol manifest
#[macro_export]
macro_rules! export_unit {
    ($register:path) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _hookload_unit_api_version() -> u32 {
            $crate::API_VERSION
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _hookload_unit_manifest() -> *mut $crate::UnitManifest {
            let mut reg = $crate::Registrar::new();
            $register(&mut reg);
            Box::into_raw(Box::new(reg.into_manifest()))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_is_set() {
        assert_eq!(API_VERSION, 1);
    }

    #[test]
    fn test_extension_trait_is_object_safe() {
        // This compiles only if Extension is object-safe
        fn _takes_boxed_extension(_: Box<dyn Extension>) {}
    }

    #[test]
    fn test_registrar_manifest_carries_api_version() {
        let reg = Registrar::new();
        let manifest = reg.into_manifest();
        assert_eq!(manifest.api_version, API_VERSION);
    }
}

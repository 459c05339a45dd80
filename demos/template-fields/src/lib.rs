//! Template Fields - a simple example plugin unit for hookload
//!
//! This unit demonstrates:
//! - Basic unit structure with the `export_unit!` macro
//! - Registering a concrete class under the `Hook` base
//! - Factoring shared logic into an intermediate class (only the leaf
//!   class is discovered by the host)
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Validating
//!
//! ```bash
//! hookload check target/release/libtemplate_fields.so --base Hook
//! ```

use hookload_plugin_api::{BaseTypeId, ClassSpec, Extension, Registrar, export_unit};
use serde_json::{Map, Value, json};

/// Adjusts the field dictionary applied to a template before it is used.
#[derive(Default)]
pub struct TemplateFields;

impl TemplateFields {
    /// Return the fields, modified if desired. The default implementation
    /// passes them through untouched.
    pub fn modify_fields(&self, fields: Map<String, Value>) -> Map<String, Value> {
        fields
    }
}

impl Extension for TemplateFields {
    fn class_name(&self) -> &str {
        "TemplateFields"
    }
}

fn register(reg: &mut Registrar) {
    // FieldHook is an intermediate class: shared base for field-manipulating
    // hooks, no constructor. Discovery filters it out in favor of the leaf.
    reg.class(ClassSpec::new("FieldHook").derives(BaseTypeId::new("Hook")));
    reg.class(
        ClassSpec::new("TemplateFields")
            .extends("FieldHook")
            .constructor(|| Box::new(TemplateFields)),
    );
    reg.value("hook_schema", json!(1));
}

export_unit!(register);

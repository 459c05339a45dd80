//! hookload-core: isolated plugin loading and class discovery
//!
//! This crate is the host side of hookload. Given a plugin file implementing
//! an extension point, it loads the file as an isolated unit under a
//! synthetic, collision-free identity, walks the classes the unit defines,
//! and returns the single class deriving from the requested base types.
//!
//! - **Loader** - [`load_unit`] evaluates a plugin file into a [`LoadUnit`],
//!   the captured namespace of that one load
//! - **Discoverer** - [`discover`] matches the unit's own classes against a
//!   priority-ordered [`BaseTypeSpec`] and reduces derivation chains to
//!   their leaf class
//! - **Composite** - [`load_plugin`] runs both phases and returns the
//!   [`CandidateClass`], a class reference ready for later instantiation
//!
//! # Quick Start
//!
//! ```no_run
//! use hookload_core::{BaseTypeSpec, load_plugin};
//! use std::path::Path;
//!
//! fn example() -> Result<(), hookload_core::PluginError> {
//!     let bases = BaseTypeSpec::new("Hook").fallback("Engine");
//!     let class = load_plugin(Path::new("/config/hooks/template_fields.so"), &bases)?;
//!     println!("loaded {} under '{}'", class.name(), class.matched_base());
//!     Ok(())
//! }
//! ```
//!
//! The loader holds no state across calls other than the process-wide
//! registry of active synthetic identities; callers needing once-per-path
//! memoization cache [`CandidateClass`] themselves, keyed by path, and use
//! [`invalidate`] to implement reload-on-change.

pub mod discover;
pub mod error;
pub mod loader;
pub mod unit;

pub use discover::{BaseTypeSpec, CandidateClass, discover};
pub use error::{DiscoveryError, IntrospectionError, LoadError, PluginError};
pub use loader::{active_generation, invalidate, load_plugin, load_unit};
pub use unit::LoadUnit;

// Re-export the plugin API types hosts interact with directly.
pub use hookload_plugin_api::{
    API_VERSION, BaseTypeId, ClassSpec, Extension, Parent, Registrar, Symbol, UnitId, UnitManifest,
};

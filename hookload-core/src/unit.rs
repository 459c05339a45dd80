//! LoadUnit - the isolated, in-memory result of loading one plugin file

use hookload_plugin_api::{ClassSpec, Symbol, UnitId, UnitManifest};
use libloading::Library;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The captured namespace of a single plugin load.
///
/// A unit owns its synthetic identity (derived from the source path, not the
/// file contents) and the symbols the unit registered. It is owned by the
/// load operation that created it and is discarded after discovery; only the
/// matched class escapes, carrying the library keep-alive handle with it.
#[derive(Debug)]
pub struct LoadUnit {
    id: UnitId,
    path: PathBuf,
    generation: u64,
    /// Name-sorted symbol table. Duplicate names are retained as distinct
    /// entries; each distinct registration is its own candidate.
    symbols: Vec<(String, Symbol)>,
    /// Keeps the dynamic library mapped while descriptors borrowed from it
    /// are alive. Absent for in-memory units.
    library: Option<Arc<Library>>,
}

impl LoadUnit {
    /// Build a unit from a registration manifest without a backing library.
    ///
    /// Used for embedded namespaces and tests; the loader goes through
    /// [`assemble`](Self::assemble) with the library handle attached.
    pub fn from_manifest(path: impl Into<PathBuf>, manifest: UnitManifest) -> Self {
        let path = path.into();
        let id = UnitId::for_path(&path);
        Self::assemble(path, id, 0, manifest, None)
    }

    pub(crate) fn assemble(
        path: PathBuf,
        id: UnitId,
        generation: u64,
        manifest: UnitManifest,
        library: Option<Arc<Library>>,
    ) -> Self {
        let mut symbols = manifest.symbols;
        for (_, symbol) in &mut symbols {
            if let Symbol::Class(spec) = symbol {
                // Unstamped specs were defined by this unit; stamped ones
                // are re-exports and keep their original identity.
                if spec.defined_in.is_none() {
                    spec.defined_in = Some(id);
                }
            }
        }
        // Deterministic enumeration order; the sort is stable so duplicate
        // names keep their registration order.
        symbols.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            id,
            path,
            generation,
            symbols,
            library,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How many times this identity has been registered in this process.
    /// Zero for in-memory units that never went through the loader.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All registered symbols in name order.
    pub fn symbols(&self) -> &[(String, Symbol)] {
        &self.symbols
    }

    /// First symbol registered under `name`, if any.
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Every class-like symbol in the unit, including re-exports.
    pub fn classes(&self) -> impl Iterator<Item = &ClassSpec> {
        self.symbols.iter().filter_map(|(_, s)| match s {
            Symbol::Class(spec) => Some(spec),
            Symbol::Value(_) => None,
        })
    }

    /// Class symbols whose defining unit is this unit. Only these are
    /// eligible for discovery; imported or re-exported classes never are.
    pub fn native_classes(&self) -> impl Iterator<Item = &ClassSpec> {
        let id = self.id;
        self.classes()
            .filter(move |spec| spec.defined_in == Some(id))
    }

    pub(crate) fn library(&self) -> Option<&Arc<Library>> {
        self.library.as_ref()
    }
}

//! Loader - evaluates a plugin file as an isolated unit
//!
//! Each load runs the unit's registration entry point under a synthetic
//! identity derived from the file path. A process-wide registry of active
//! identities, guarded by a single mutex, keeps concurrent loads from
//! racing on registration. The lock is non-reentrant and covers only the
//! registration step, never the unit's own code, so a registration entry
//! point may itself load further units.

use hookload_plugin_api::{API_VERSION, UnitId, UnitManifest};
use libloading::Library;
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::discover::{BaseTypeSpec, CandidateClass, discover};
use crate::error::{LoadError, PluginError};
use crate::unit::LoadUnit;

const API_VERSION_SYMBOL: &str = "_hookload_unit_api_version";
const MANIFEST_SYMBOL: &str = "_hookload_unit_manifest";

/// Process-wide map of active synthetic identities to their registration
/// generation. This is the only shared state across load calls.
static ACTIVE_IDENTITIES: OnceLock<Mutex<HashMap<UnitId, u64>>> = OnceLock::new();

fn identity_registry() -> &'static Mutex<HashMap<UnitId, u64>> {
    ACTIVE_IDENTITIES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Load a plugin file as an isolated unit and capture its namespace.
///
/// Evaluating the unit may have arbitrary side effects; nothing is rolled
/// back on failure, but a partial unit is never returned. Errors carry the
/// full underlying diagnostic.
pub fn load_unit(path: &Path) -> Result<LoadUnit, LoadError> {
    tracing::debug!(file = %path.display(), "load_unit called");

    // Surface unreadable files as I/O failures before touching the linker.
    std::fs::metadata(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let id = UnitId::for_path(path);

    // SAFETY: loading a plugin unit runs its initializers with the host's
    // full privileges. Units are trusted code following the hookload
    // registration contract; sandboxing is out of scope.
    let library =
        unsafe { Library::new(path) }.map_err(|source| LoadError::Library {
            path: path.to_path_buf(),
            source,
        })?;

    let manifest = evaluate_manifest(&library, path)?;

    // The lock stays clear of the unit's own code above; a registration
    // entry point calling back into `load_unit` must not deadlock.
    let generation = {
        let mut registry = identity_registry()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let slot = registry.entry(id).or_insert(0);
        *slot += 1;
        *slot
    };

    tracing::debug!(
        file = %path.display(),
        unit = %id,
        generation,
        symbols = manifest.symbols.len(),
        "plugin unit registered"
    );

    Ok(LoadUnit::assemble(
        path.to_path_buf(),
        id,
        generation,
        manifest,
        Some(Arc::new(library)),
    ))
}

/// Validate the unit's ABI and run its registration entry point.
fn evaluate_manifest(library: &Library, path: &Path) -> Result<UnitManifest, LoadError> {
    // SAFETY: C ABI exports generated by `export_unit!`. Signatures are
    // fixed by the plugin API this crate shares with the unit.
    let api_version: libloading::Symbol<extern "C" fn() -> u32> = unsafe {
        library.get(API_VERSION_SYMBOL.as_bytes())
    }
    .map_err(|source| LoadError::EntryPoint {
        path: path.to_path_buf(),
        symbol: API_VERSION_SYMBOL,
        source,
    })?;

    let found = api_version();
    if found != API_VERSION {
        return Err(LoadError::ApiVersionMismatch {
            path: path.to_path_buf(),
            expected: API_VERSION,
            found,
        });
    }

    // SAFETY: as above; on success the unit hands us a leaked Box we take
    // ownership of.
    let manifest_fn: libloading::Symbol<extern "C" fn() -> *mut UnitManifest> = unsafe {
        library.get(MANIFEST_SYMBOL.as_bytes())
    }
    .map_err(|source| LoadError::EntryPoint {
        path: path.to_path_buf(),
        symbol: MANIFEST_SYMBOL,
        source,
    })?;

    // Registration is arbitrary unit code; isolate panics and report them
    // with the call stack so a broken unit produces a usable diagnostic.
    match std::panic::catch_unwind(AssertUnwindSafe(|| manifest_fn())) {
        Ok(ptr) if !ptr.is_null() => {
            // SAFETY: pointer came from Box::into_raw in the unit's
            // `export_unit!` expansion and is owned by us from here.
            Ok(*unsafe { Box::from_raw(ptr) })
        }
        Ok(_) => Err(LoadError::Evaluation {
            path: path.to_path_buf(),
            message: "registration entry point returned a null manifest".to_string(),
            trace: Backtrace::capture().to_string(),
        }),
        Err(payload) => {
            tracing::error!(file = %path.display(), "plugin unit panicked during registration");
            Err(LoadError::Evaluation {
                path: path.to_path_buf(),
                message: panic_message(payload.as_ref()),
                trace: Backtrace::capture().to_string(),
            })
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Forget the active identity derived from `path`.
///
/// The loader never detects file modification itself; callers implementing
/// a reload-on-change policy drop the identity here and load again.
pub fn invalidate(path: &Path) {
    let id = UnitId::for_path(path);
    identity_registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&id);
    tracing::debug!(file = %path.display(), unit = %id, "unit identity invalidated");
}

/// Registration generation currently recorded for `path`, if it has been
/// loaded in this process and not invalidated since.
pub fn active_generation(path: &Path) -> Option<u64> {
    let id = UnitId::for_path(path);
    identity_registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied()
}

/// Load a plugin file and extract its single interface class.
///
/// The two-phase composite: evaluate the file as an isolated unit, then
/// discover the one class deriving from the requested base tiers. The unit
/// is discarded; only the matched class escapes.
pub fn load_plugin(path: &Path, bases: &BaseTypeSpec) -> Result<CandidateClass, PluginError> {
    let unit = load_unit(path)?;
    discover(&unit, bases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookload_plugin_api::BaseTypeId;

    #[test]
    fn test_load_unit_nonexistent_file_is_io_error() {
        let err = load_unit(Path::new("/nonexistent/hooks/missing.so")).unwrap_err();
        match err {
            LoadError::Io { path, source } => {
                assert!(path.ends_with("missing.so"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {other}"),
        }
    }

    #[test]
    fn test_load_plugin_nonexistent_file_propagates_load_error() {
        let spec = BaseTypeSpec::new(BaseTypeId::new("Hook"));
        let err = load_plugin(Path::new("/nonexistent/hooks/missing.so"), &spec).unwrap_err();
        assert!(matches!(err, PluginError::Load(LoadError::Io { .. })));
    }

    #[test]
    fn test_load_unit_non_library_file_is_library_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("not_a_library.so");
        std::fs::write(&path, b"definitely not an object file").unwrap();

        let err = load_unit(&path).unwrap_err();
        assert!(matches!(err, LoadError::Library { .. }));
        assert!(err.to_string().contains("not_a_library.so"));
    }

    #[test]
    fn test_generation_tracking_for_unloaded_path() {
        let path = Path::new("/never/loaded/unit.so");
        assert_eq!(active_generation(path), None);
        invalidate(path);
        assert_eq!(active_generation(path), None);
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("bad schema");
        assert_eq!(panic_message(boxed.as_ref()), "bad schema");

        let boxed: Box<dyn std::any::Any + Send> = Box::new("owned panic".to_string());
        assert_eq!(panic_message(boxed.as_ref()), "owned panic");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(17u32);
        assert_eq!(panic_message(boxed.as_ref()), "panic with non-string payload");
    }
}

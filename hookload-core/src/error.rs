//! Error taxonomy for plugin loading and discovery

use hookload_plugin_api::BaseTypeId;
use std::path::PathBuf;
use thiserror::Error;

/// The plugin file could not be opened, validated, or evaluated.
///
/// Always fatal for the call; never retried. Evaluation failures carry the
/// full underlying diagnostic and a captured call stack.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Plugin file could not be read
    #[error("Cannot read plugin file {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Dynamic library failed to open
    #[error("Failed to load plugin unit {}: {}", .path.display(), .source)]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// Required registration entry point is not exported
    #[error("Plugin unit {} is missing the `{}` entry point: {}", .path.display(), .symbol, .source)]
    EntryPoint {
        path: PathBuf,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// Unit was built against an incompatible API version
    #[error("API version mismatch for {}: host expects {}, unit has {}", .path.display(), .expected, .found)]
    ApiVersionMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    /// Registration entry point failed while executing
    #[error(
        "Failed to load plugin {}. The following error was reported:\n{}\nCall stack at failure:\n{}",
        .path.display(),
        .message,
        .trace
    )]
    Evaluation {
        path: PathBuf,
        message: String,
        /// Rendered call stack captured at the failure site.
        trace: String,
    },
}

/// The file loaded cleanly but structural validation failed.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// No eligible class under any base tier
    #[error(
        "No class deriving from '{}'{} was found in {}. \
         A plugin unit must register exactly one class deriving from that base.",
        .preferred,
        fmt_alternates(.alternates),
        .path.display()
    )]
    NoMatch {
        path: PathBuf,
        preferred: BaseTypeId,
        alternates: Vec<BaseTypeId>,
    },

    /// More than one leaf candidate survived filtering
    #[error(
        "Ambiguous plugin file {}: found {} classes deriving from '{}': {}",
        .path.display(),
        .candidates.len(),
        .base,
        .candidates.join(", ")
    )]
    Ambiguous {
        path: PathBuf,
        base: BaseTypeId,
        candidates: Vec<String>,
    },
}

/// Unexpected failure while walking symbols or derivation relations.
///
/// Wraps the failure with file context; never silently swallowed.
#[derive(Error, Debug)]
pub enum IntrospectionError {
    /// Declared parent chain loops back on itself
    #[error("Cycle in declared parent chain at '{}' while introspecting {}", .class, .path.display())]
    ParentCycle { path: PathBuf, class: String },

    /// Catch-all for panics during symbol walking
    #[error("Introspection error while inspecting {}. Error reported: {}", .path.display(), .message)]
    Unexpected { path: PathBuf, message: String },
}

/// Umbrella error for the two-phase load-and-discover operation.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Introspection(#[from] IntrospectionError),
}

fn fmt_alternates(alternates: &[BaseTypeId]) -> String {
    if alternates.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = alternates.iter().map(BaseTypeId::as_str).collect();
        format!(" (or fallback bases: {})", names.join(", "))
    }
}

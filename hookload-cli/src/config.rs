//! Extension point configuration
//!
//! `hookload.toml` names the extension points a deployment declares and the
//! base-type tiers each one accepts, preferred first:
//!
//! ```toml
//! [points]
//! hook = ["Hook"]
//! engine = ["Engine", "Hook"]
//! ```

use anyhow::Context;
use hookload_core::{BaseTypeId, BaseTypeSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Named extension points mapped to their base-type tier lists.
    #[serde(default)]
    pub points: HashMap<String, Vec<String>>,
}

impl PointsConfig {
    /// Load from a TOML file. A missing file is an empty configuration.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Where the configuration lives by default: the global persistent root.
    pub fn default_path() -> PathBuf {
        hookload_paths::resolve(
            hookload_paths::RootKind::Persistent,
            &hookload_paths::Scope::Global,
            hookload_paths::Generation::Current,
        )
        .join("hookload.toml")
    }

    /// Build the tier list for a named extension point. `None` if the point
    /// is unknown or declares no tiers.
    pub fn tiers(&self, point: &str) -> Option<BaseTypeSpec> {
        let names = self.points.get(point)?;
        let mut names = names.iter();
        let mut spec = BaseTypeSpec::new(BaseTypeId::new(names.next()?));
        for name in names {
            spec = spec.fallback(BaseTypeId::new(name));
        }
        Some(spec)
    }
}

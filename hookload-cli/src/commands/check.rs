//! Plugin validation command

use anyhow::{Result, bail};
use clap::Args;
use hookload_core::{BaseTypeId, BaseTypeSpec, load_plugin};
use std::path::PathBuf;

use crate::config::PointsConfig;

/// Plugin validation arguments
#[derive(Args)]
pub struct CheckArgs {
    /// Plugin file to load
    pub file: PathBuf,

    /// Acceptable base types, preferred first (repeatable)
    #[arg(long = "base", value_name = "BASE")]
    pub bases: Vec<String>,

    /// Named extension point from hookload.toml
    #[arg(long, conflicts_with = "bases")]
    pub point: Option<String>,

    /// Configuration file (defaults to the global persistent root)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the check command
pub fn run(args: CheckArgs) -> Result<()> {
    let spec = resolve_spec(&args)?;

    let class = load_plugin(&args.file, &spec)?;

    println!(
        "✓ {}    class '{}' deriving from '{}'",
        args.file.display(),
        class.name(),
        class.matched_base()
    );
    tracing::debug!(unit = %class.unit(), "validated plugin unit");
    Ok(())
}

fn resolve_spec(args: &CheckArgs) -> Result<BaseTypeSpec> {
    if let Some(point) = &args.point {
        let config_path = args
            .config
            .clone()
            .unwrap_or_else(PointsConfig::default_path);
        let config = PointsConfig::load(&config_path)?;
        return match config.tiers(point) {
            Some(spec) => Ok(spec),
            None => bail!(
                "extension point '{}' is not declared in {}",
                point,
                config_path.display()
            ),
        };
    }

    let mut names = args.bases.iter();
    let Some(first) = names.next() else {
        bail!("provide at least one --base, or --point with a configured extension point");
    };
    let mut spec = BaseTypeSpec::new(BaseTypeId::new(first));
    for name in names {
        spec = spec.fallback(BaseTypeId::new(name));
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(bases: &[&str], point: Option<&str>) -> CheckArgs {
        CheckArgs {
            file: PathBuf::from("/p/unit.so"),
            bases: bases.iter().map(|s| s.to_string()).collect(),
            point: point.map(str::to_string),
            config: None,
        }
    }

    #[test]
    fn test_resolve_spec_from_bases() {
        let spec = resolve_spec(&args(&["Hook", "Engine"], None)).unwrap();
        assert_eq!(spec.preferred(), &BaseTypeId::new("Hook"));
        assert_eq!(spec.alternates(), &[BaseTypeId::new("Engine")]);
    }

    #[test]
    fn test_resolve_spec_requires_a_base_or_point() {
        assert!(resolve_spec(&args(&[], None)).is_err());
    }

    #[test]
    fn test_resolve_spec_unknown_point_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut a = args(&[], Some("unknown"));
        a.config = Some(dir.path().join("hookload.toml"));
        assert!(resolve_spec(&a).is_err());
    }

    #[test]
    fn test_resolve_spec_from_configured_point() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("hookload.toml");
        std::fs::write(&config_path, "[points]\nhook = [\"Hook\", \"Engine\"]\n").unwrap();

        let mut a = args(&[], Some("hook"));
        a.config = Some(config_path);
        let spec = resolve_spec(&a).unwrap();
        assert_eq!(spec.tiers().len(), 2);
    }
}

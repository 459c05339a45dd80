//! Storage path inspection command

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use hookload_paths::{Generation, RootKind, Scope, resolve};

/// Storage path arguments
#[derive(Args)]
pub struct PathsArgs {
    /// Root kind to resolve
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Scope to a site, e.g. https://studio.hookload.cloud
    #[arg(long)]
    pub site: Option<String>,

    /// Scope to a project id (requires --site)
    #[arg(long)]
    pub project: Option<u64>,

    /// Scope to a configuration id (requires --site)
    #[arg(long = "config")]
    pub config_id: Option<u64>,

    /// Use the previous path-schema generation
    #[arg(long)]
    pub legacy: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Logging,
    Cache,
    Persistent,
}

impl From<KindArg> for RootKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Logging => RootKind::Logging,
            KindArg::Cache => RootKind::Cache,
            KindArg::Persistent => RootKind::Persistent,
        }
    }
}

/// Run the paths command
pub fn run(args: PathsArgs) -> Result<()> {
    let scope = scope_from(&args)?;
    let generation = if args.legacy {
        Generation::Legacy
    } else {
        Generation::Current
    };

    println!("{}", resolve(args.kind.into(), &scope, generation).display());
    Ok(())
}

fn scope_from(args: &PathsArgs) -> Result<Scope> {
    match (&args.site, args.project, args.config_id) {
        (None, None, None) => Ok(Scope::Global),
        (None, _, _) => bail!("--project and --config require --site"),
        (Some(site), None, None) => Ok(Scope::Site {
            hostname: site.clone(),
        }),
        (Some(site), project_id, config_id) => Ok(Scope::Configuration {
            hostname: site.clone(),
            project_id,
            config_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(site: Option<&str>, project: Option<u64>, config_id: Option<u64>) -> PathsArgs {
        PathsArgs {
            kind: KindArg::Cache,
            site: site.map(str::to_string),
            project,
            config_id,
            legacy: false,
        }
    }

    #[test]
    fn test_scope_global_without_flags() {
        assert_eq!(scope_from(&args(None, None, None)).unwrap(), Scope::Global);
    }

    #[test]
    fn test_scope_site() {
        let scope = scope_from(&args(Some("https://s.example.com"), None, None)).unwrap();
        assert!(matches!(scope, Scope::Site { .. }));
    }

    #[test]
    fn test_scope_configuration() {
        let scope = scope_from(&args(Some("https://s.example.com"), Some(1), None)).unwrap();
        assert!(matches!(
            scope,
            Scope::Configuration {
                project_id: Some(1),
                config_id: None,
                ..
            }
        ));
    }

    #[test]
    fn test_project_without_site_is_an_error() {
        assert!(scope_from(&args(None, Some(1), None)).is_err());
    }
}

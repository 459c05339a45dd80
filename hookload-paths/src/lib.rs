//! Local storage paths for hookload.
//!
//! Hookload needs to store cache data, logs and other items at runtime.
//! Some of this data is global, other is per site or per configuration.
//! This crate is the single place that layout lives: a pure, deterministic
//! mapping from (root kind, scope, schema generation) to an absolute path.
//! No function here performs I/O or checks that a path exists.
//!
//! All returned paths are local to the current user.

use std::path::PathBuf;

/// Hosted sites live under this domain; the current path generation strips
/// it from site folder names to keep paths short.
const HOSTED_SUFFIX: &str = ".hookload.cloud";

/// What a resolved root is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Log and debug data
    Logging,
    /// Data that can be deleted without any loss of state
    Cache,
    /// Settings and other data retained between sessions
    Persistent,
}

/// Path schema generation.
///
/// Layouts have changed between releases; callers migrating old data ask
/// for the legacy generation explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generation {
    Legacy,
    #[default]
    Current,
}

/// How wide the resolved root is scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Shared by everything on this machine
    Global,
    /// Per site, e.g. `https://studio.hookload.cloud`
    Site { hostname: String },
    /// Per project and configuration within a site
    Configuration {
        hostname: String,
        project_id: Option<u64>,
        config_id: Option<u64>,
    },
}

/// Resolve a storage root. Pure; never touches the filesystem.
pub fn resolve(kind: RootKind, scope: &Scope, generation: Generation) -> PathBuf {
    match scope {
        Scope::Global => global_root(kind, generation),
        Scope::Site { hostname } => site_root(hostname, kind, generation),
        Scope::Configuration {
            hostname,
            project_id,
            config_id,
        } => configuration_root(hostname, *project_id, *config_id, kind, generation),
    }
}

/// The machine-global hookload storage root.
///
/// - macOS: under `~/Library/{Caches,Application Support,Logs}/Hookload`
/// - Windows: under `%APPDATA%/Hookload`
/// - Linux and everything else: under `~/.hookload`
pub fn global_root(kind: RootKind, generation: Generation) -> PathBuf {
    if cfg!(target_os = "macos") {
        // Same layout in both generations on macOS.
        let library = home().join("Library");
        match kind {
            RootKind::Cache => library.join("Caches/Hookload"),
            RootKind::Persistent => library.join("Application Support/Hookload"),
            RootKind::Logging => library.join("Logs/Hookload"),
        }
    } else if cfg!(target_os = "windows") {
        let root = appdata().join("Hookload");
        match generation {
            Generation::Legacy => root,
            Generation::Current => match kind {
                RootKind::Cache => root,
                RootKind::Persistent => root.join("Data"),
                RootKind::Logging => root.join("Logs"),
            },
        }
    } else {
        let root = home().join(".hookload");
        match generation {
            Generation::Legacy => root,
            Generation::Current => match kind {
                RootKind::Cache => root,
                RootKind::Persistent => root.join("data"),
                RootKind::Logging => root.join("logs"),
            },
        }
    }
}

/// A root where items are stored per site.
pub fn site_root(hostname: &str, kind: RootKind, generation: Generation) -> PathBuf {
    global_root(kind, generation).join(site_folder(hostname, generation))
}

/// A root for data that is project and configuration specific.
///
/// `project_id` is `None` for the site configuration; `config_id` is `None`
/// for unmanaged configurations.
pub fn configuration_root(
    hostname: &str,
    project_id: Option<u64>,
    config_id: Option<u64>,
    kind: RootKind,
    generation: Generation,
) -> PathBuf {
    let site = site_root(hostname, kind, generation);
    match generation {
        // Old layout: root/site/project_123/config_33
        Generation::Legacy => site
            .join(format!("project_{}", fmt_legacy_id(project_id)))
            .join(format!("config_{}", fmt_legacy_id(config_id))),
        // Compact layout: root/site/p123c33, root/site/p123, root/site/site
        Generation::Current => {
            let config_suffix = config_id.map(|c| format!("c{c}")).unwrap_or_default();
            let folder = match project_id {
                Some(p) => format!("p{p}{config_suffix}"),
                None => format!("site{config_suffix}"),
            };
            site.join(folder)
        }
    }
}

fn fmt_legacy_id(id: Option<u64>) -> String {
    id.map(|i| i.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn site_folder(hostname: &str, generation: Generation) -> String {
    let host = normalize_host(hostname);
    match generation {
        Generation::Legacy => host,
        // Keep paths under MAX_PATH on Windows: hosted sites lose the
        // well-known suffix, self-hosted domains keep their full name.
        Generation::Current => host
            .strip_suffix(HOSTED_SUFFIX)
            .map(str::to_string)
            .unwrap_or(host),
    }
}

/// Reduce a site identifier to its bare host: `https://Studio.X.com:8080`
/// becomes `studio.x.com`. Accepts bare hostnames too.
fn normalize_host(hostname: &str) -> String {
    if hostname.contains("://") {
        if let Some(host) = url::Url::parse(hostname)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        {
            return host.to_lowercase();
        }
    }
    hostname
        .split('/')
        .next()
        .unwrap_or("")
        .split(':')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn appdata() -> PathBuf {
    std::env::var("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("APPDATA_NOT_SET"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_root_is_under_global_root() {
        let global = global_root(RootKind::Cache, Generation::Current);
        let site = site_root("https://studio.example.com", RootKind::Cache, Generation::Current);
        assert!(site.starts_with(&global));
        assert!(site.ends_with("studio.example.com"));
    }

    #[test]
    fn test_hosted_suffix_stripped_in_current_generation() {
        let site = site_root("https://mysite.hookload.cloud", RootKind::Cache, Generation::Current);
        assert!(site.ends_with("mysite"));
    }

    #[test]
    fn test_hosted_suffix_kept_in_legacy_generation() {
        let site = site_root("https://mysite.hookload.cloud", RootKind::Cache, Generation::Legacy);
        assert!(site.ends_with("mysite.hookload.cloud"));
    }

    #[test]
    fn test_host_normalization_lowercases_and_strips_port() {
        assert_eq!(normalize_host("https://www.FOO.com:8080"), "www.foo.com");
        assert_eq!(normalize_host("www.FOO.com:8080"), "www.foo.com");
        assert_eq!(normalize_host("bare-host"), "bare-host");
    }

    #[test]
    fn test_configuration_folder_forms_current() {
        let generation = Generation::Current;
        let kind = RootKind::Persistent;

        let both = configuration_root("https://s.example.com", Some(123), Some(33), kind, generation);
        assert!(both.ends_with("p123c33"));

        let project_only = configuration_root("https://s.example.com", Some(123), None, kind, generation);
        assert!(project_only.ends_with("p123"));

        let site_config = configuration_root("https://s.example.com", None, None, kind, generation);
        assert!(site_config.ends_with("site"));

        let site_with_config =
            configuration_root("https://s.example.com", None, Some(7), kind, generation);
        assert!(site_with_config.ends_with("sitec7"));
    }

    #[test]
    fn test_configuration_folder_forms_legacy() {
        let path = configuration_root(
            "https://s.example.com",
            Some(123),
            Some(33),
            RootKind::Cache,
            Generation::Legacy,
        );
        assert!(path.ends_with("project_123/config_33"));
    }

    #[test]
    fn test_resolve_matches_layered_functions() {
        let scope = Scope::Configuration {
            hostname: "https://s.example.com".to_string(),
            project_id: Some(5),
            config_id: None,
        };
        assert_eq!(
            resolve(RootKind::Logging, &scope, Generation::Current),
            configuration_root(
                "https://s.example.com",
                Some(5),
                None,
                RootKind::Logging,
                Generation::Current
            )
        );

        assert_eq!(
            resolve(RootKind::Cache, &Scope::Global, Generation::Current),
            global_root(RootKind::Cache, Generation::Current)
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_global_roots_current_generation() {
        assert!(global_root(RootKind::Cache, Generation::Current).ends_with(".hookload"));
        assert!(global_root(RootKind::Persistent, Generation::Current).ends_with(".hookload/data"));
        assert!(global_root(RootKind::Logging, Generation::Current).ends_with(".hookload/logs"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_legacy_generation_collapses_kinds() {
        let legacy = Generation::Legacy;
        assert_eq!(
            global_root(RootKind::Cache, legacy),
            global_root(RootKind::Logging, legacy)
        );
        assert_eq!(
            global_root(RootKind::Cache, legacy),
            global_root(RootKind::Persistent, legacy)
        );
    }
}

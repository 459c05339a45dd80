//! Discoverer - structural search for the single plugin class in a unit
//!
//! Candidates come from the classes a unit defines (never its imports);
//! ancestry is resolved over everything the unit registered, imports
//! included. Candidates are matched against a priority-ordered list of
//! acceptable base types, and multi-level derivation chains are reduced to
//! their leaf class. Exactly one class must survive; zero or several is
//! always a hard failure.

use hookload_plugin_api::{
    BaseTypeId, ClassSpec, Extension, ExtensionCtor, Parent, UnitId,
};
use libloading::Library;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DiscoveryError, IntrospectionError, PluginError};
use crate::unit::LoadUnit;

/// Priority-ordered list of acceptable base types.
///
/// The first entry is the preferred base; the rest are fallbacks consulted
/// in order. The first tier yielding any filtered candidate wins — matches
/// are never merged across tiers, even when a later tier would also fit.
#[derive(Debug, Clone)]
pub struct BaseTypeSpec {
    tiers: Vec<BaseTypeId>,
}

impl BaseTypeSpec {
    pub fn new(preferred: impl Into<BaseTypeId>) -> Self {
        Self {
            tiers: vec![preferred.into()],
        }
    }

    /// Append a fallback tier, searched only if every earlier tier came up
    /// empty.
    pub fn fallback(mut self, base: impl Into<BaseTypeId>) -> Self {
        self.tiers.push(base.into());
        self
    }

    pub fn preferred(&self) -> &BaseTypeId {
        &self.tiers[0]
    }

    pub fn alternates(&self) -> &[BaseTypeId] {
        &self.tiers[1..]
    }

    pub fn tiers(&self) -> &[BaseTypeId] {
        &self.tiers
    }
}

/// The single class a successful discovery returns.
///
/// A class reference, not an instance: the hosting collaborator decides
/// when and how to construct it. Carries the library keep-alive handle so
/// the constructor stays valid after the unit is discarded.
#[derive(Debug, Clone)]
pub struct CandidateClass {
    spec: ClassSpec,
    matched_base: BaseTypeId,
    unit: UnitId,
    path: PathBuf,
    _library: Option<Arc<Library>>,
}

impl CandidateClass {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &ClassSpec {
        &self.spec
    }

    /// The base tier this class matched under.
    pub fn matched_base(&self) -> &BaseTypeId {
        &self.matched_base
    }

    /// Identity of the unit that defined the class.
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn constructor(&self) -> Option<ExtensionCtor> {
        self.spec.construct
    }

    /// Construct an instance, if the class registered a constructor.
    pub fn instantiate(&self) -> Option<Box<dyn Extension>> {
        self.spec.construct.map(|ctor| ctor())
    }
}

/// Find the single class in `unit` deriving from the requested base tiers.
pub fn discover(unit: &LoadUnit, bases: &BaseTypeSpec) -> Result<CandidateClass, PluginError> {
    // Defensive catch-all around the symbol walk: an unexpected panic is
    // wrapped with file context rather than unwinding through the caller.
    let searched = std::panic::catch_unwind(AssertUnwindSafe(|| search_tiers(unit, bases)));
    let found = match searched {
        Ok(result) => result?,
        Err(payload) => {
            tracing::error!(
                file = %unit.path().display(),
                "failed to introspect class structure"
            );
            return Err(IntrospectionError::Unexpected {
                path: unit.path().to_path_buf(),
                message: crate::loader::panic_message(payload.as_ref()),
            }
            .into());
        }
    };

    let (base, mut matched) = match found {
        Some(tier) => tier,
        None => {
            return Err(DiscoveryError::NoMatch {
                path: unit.path().to_path_buf(),
                preferred: bases.preferred().clone(),
                alternates: bases.alternates().to_vec(),
            }
            .into());
        }
    };

    if matched.len() != 1 {
        return Err(DiscoveryError::Ambiguous {
            path: unit.path().to_path_buf(),
            base,
            candidates: matched.iter().map(|c| c.name.clone()).collect(),
        }
        .into());
    }

    let spec = matched.remove(0).clone();
    tracing::debug!(
        file = %unit.path().display(),
        class = %spec.name,
        base = %base,
        "discovered plugin class"
    );

    Ok(CandidateClass {
        spec,
        matched_base: base,
        unit: unit.id(),
        path: unit.path().to_path_buf(),
        _library: unit.library().cloned(),
    })
}

/// Walk the tiers in order; the first tier with a nonempty filtered set is
/// the result. Returns `None` when every tier is empty.
fn search_tiers<'u>(
    unit: &'u LoadUnit,
    bases: &BaseTypeSpec,
) -> Result<Option<(BaseTypeId, Vec<&'u ClassSpec>)>, IntrospectionError> {
    // Only the unit's own classes are candidates, but a derivation chain
    // may pass through a re-exported foreign intermediate, so ancestry is
    // resolved over every registered class.
    let classes: Vec<&ClassSpec> = unit.classes().collect();
    let natives: Vec<&ClassSpec> = unit.native_classes().collect();

    for base in bases.tiers() {
        let mut matched = Vec::new();
        for class in &natives {
            if is_a(class, base, &classes, unit.path())? {
                matched.push(*class);
            }
        }

        if matched.len() > 1 {
            // A file may define a multi-level derivation chain; drop any
            // class that is a direct parent of another match so only leaf
            // classes remain.
            matched = filter_leaves(matched);
        }

        if !matched.is_empty() {
            return Ok(Some((base.clone(), matched)));
        }

        tracing::debug!(
            file = %unit.path().display(),
            base = %base,
            "no candidates under base tier"
        );
    }

    Ok(None)
}

/// Dual is-a check: a class matches a base if any ancestor references the
/// base formally, or names it textually. The textual form covers units that
/// could not link the host's base declarations nominally. Ancestors are
/// resolved by name among everything the unit registered, re-exports
/// included; candidate eligibility is decided by the caller.
fn is_a(
    class: &ClassSpec,
    base: &BaseTypeId,
    classes: &[&ClassSpec],
    path: &Path,
) -> Result<bool, IntrospectionError> {
    let mut stack = vec![class.name.as_str()];
    is_a_from(class, base, classes, &mut stack, path)
}

fn is_a_from<'u>(
    class: &'u ClassSpec,
    base: &BaseTypeId,
    classes: &[&'u ClassSpec],
    stack: &mut Vec<&'u str>,
    path: &Path,
) -> Result<bool, IntrospectionError> {
    for parent in &class.parents {
        match parent {
            Parent::Base(id) => {
                if id == base {
                    return Ok(true);
                }
            }
            Parent::Named(name) if name == base.as_str() => return Ok(true),
            Parent::Named(name) => {
                if stack.iter().any(|seen| *seen == name.as_str()) {
                    return Err(IntrospectionError::ParentCycle {
                        path: path.to_path_buf(),
                        class: name.clone(),
                    });
                }
                stack.push(name.as_str());
                let mut hit = false;
                for ancestor in classes.iter().filter(|c| c.name == *name) {
                    if is_a_from(ancestor, base, classes, stack, path)? {
                        hit = true;
                        break;
                    }
                }
                stack.pop();
                if hit {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

/// Remove every matched class that another matched class declares as a
/// direct parent, leaving only the most-derived classes.
fn filter_leaves(matched: Vec<&ClassSpec>) -> Vec<&ClassSpec> {
    let parent_names: HashSet<&str> = matched
        .iter()
        .flat_map(|class| class.parents.iter())
        .filter_map(|parent| match parent {
            Parent::Named(name) => Some(name.as_str()),
            Parent::Base(_) => None,
        })
        .collect();

    matched
        .into_iter()
        .filter(|class| !parent_names.contains(class.name.as_str()))
        .collect()
}

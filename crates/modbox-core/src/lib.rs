//! Mod composition and resolution engine for modbox.
//!
//! This crate turns a profile's requested mods into a Dockerfile: the
//! `ModRegistry` finds mod documents (project overrides, user overrides, then
//! built-ins), `Catalog` indexes them by capability, `Resolver` expands requests
//! into a dependency-ordered `ResolvedSet`, `validate` enforces OS exclusivity,
//! `filter_for_layer` subtracts what a base image already contains, `emit`
//! renders the artifact, and `drift` compares digests against a profile's
//! recorded build. `Engine` wires the steps together for the CLI.

pub mod capability;
pub mod concurrency;
pub mod drift;
pub mod emit;
pub mod engine;
pub mod layer;
pub mod layout;
pub mod registry;
pub mod resolve;
pub mod validate;

pub use capability::{build_provides_map, Catalog, ProvidesMap};
pub use concurrency::ProfileLock;
pub use drift::{ArtifactState, DriftReport};
pub use emit::{emit, Layer, SANDBOX_HOME, SANDBOX_USER};
pub use engine::{Artifact, BuildPlan, Engine, PlanTarget};
pub use layer::{filter_for_layer, LayeredResolution};
pub use layout::ModboxLayout;
pub use registry::{validate_identifier, ModRegistry, ModSource};
pub use resolve::{ResolvedSet, Resolver};
pub use validate::{validate, validate_layer};

use thiserror::Error;

/// Failures while loading, resolving, or validating mods.
///
/// All of these abort the current operation; a partially resolved set would
/// produce a subtly broken image.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("mod not found: {0}")]
    NotFound(String),
    #[error("invalid mod identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },
    #[error("mod '{module}' requires '{capability}', but no mod provides it")]
    UnsatisfiedRequirement { module: String, capability: String },
    #[error("dependency cycle detected: {}", chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },
    #[error("only one os mod may be selected, found '{first}' and '{second}'")]
    MultipleOsMods { first: String, second: String },
    #[error(
        "mod '{module}' requires '{capability}', but no provider is compatible with os '{os}'"
    )]
    NoCompatibleOsProvider {
        module: String,
        capability: String,
        os: String,
    },
    #[error("mod '{module}' requires os '{required}', but '{selected}' is selected")]
    CrossOsRequirement {
        module: String,
        required: String,
        selected: String,
    },
    #[error("invalid mod definition '{id}': {source}")]
    Definition {
        id: String,
        source: modbox_schema::DefinitionError,
    },
    #[error("mod registry I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("profile error: {0}")]
    Profile(#[from] modbox_schema::ProfileError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsatisfied_requirement_names_both_sides() {
        let e = ResolveError::UnsatisfiedRequirement {
            module: "tools/mise".to_owned(),
            capability: "homebrew".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("tools/mise"));
        assert!(msg.contains("homebrew"));
    }

    #[test]
    fn cycle_display_joins_chain() {
        let e = ResolveError::CycleDetected {
            chain: vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
        };
        assert_eq!(e.to_string(), "dependency cycle detected: a -> b -> a");
    }

    #[test]
    fn core_error_wraps_resolve_error() {
        let e: CoreError = ResolveError::NotFound("tools/nope".to_owned()).into();
        assert!(e.to_string().starts_with("resolution error:"));
    }
}

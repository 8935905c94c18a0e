use crate::capability::Catalog;
use crate::resolve::{ResolvedSet, Resolver};
use crate::ResolveError;
use modbox_schema::ModId;
use tracing::debug;

/// A project layer resolved against the base image it builds on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredResolution {
    /// Closure of the base profile's requests.
    pub base: ResolvedSet,
    /// Mods the project layer installs itself, in installation order.
    pub project: ResolvedSet,
    /// Requested mods left out because the base already contains them.
    pub inherited: Vec<ModId>,
}

/// Resolve `requested` as a layer on top of the closure of `base_requested`.
///
/// Nothing in the base closure is repeated in the project set, and project
/// requirements already satisfied by the base are not expanded again.
pub fn filter_for_layer(
    catalog: &Catalog,
    requested: &[ModId],
    base_requested: &[ModId],
) -> Result<LayeredResolution, ResolveError> {
    let base = Resolver::new(catalog).resolve(base_requested)?;
    let project = Resolver::new(catalog).on_top_of(&base).resolve(requested)?;

    let mut inherited: Vec<ModId> = requested
        .iter()
        .filter(|id| base.contains(id))
        .cloned()
        .collect();
    inherited.dedup();

    debug!(
        "layer: {} base mod(s), {} project mod(s), {} inherited request(s)",
        base.len(),
        project.len(),
        inherited.len()
    );

    Ok(LayeredResolution {
        base,
        project,
        inherited,
    })
}

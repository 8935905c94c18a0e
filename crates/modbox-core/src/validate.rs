use crate::capability::Catalog;
use crate::resolve::ResolvedSet;
use crate::ResolveError;
use modbox_schema::Mod;

/// Check a standalone resolved set and return its OS mod, if it has one.
///
/// At most one OS mod may be present, and no other mod may require a known
/// OS other than the selected one. A set with no OS mod is valid.
pub fn validate<'s>(
    resolved: &'s ResolvedSet,
    catalog: &Catalog,
) -> Result<Option<&'s Mod>, ResolveError> {
    let selected = exclusive_os(resolved.os_mods())?;
    if let Some(os) = selected {
        check_cross_os(resolved, os, catalog)?;
    }
    Ok(selected)
}

/// Check a project layer against its base and return the image's OS mod.
///
/// The base must be valid on its own. The project may only add an OS mod
/// when the base has none, and every project mod must be compatible with
/// the OS the combined image ends up on.
pub fn validate_layer<'s>(
    project: &'s ResolvedSet,
    base: &'s ResolvedSet,
    catalog: &Catalog,
) -> Result<Option<&'s Mod>, ResolveError> {
    validate(base, catalog)?;
    let selected = exclusive_os(base.os_mods().chain(project.os_mods()))?;
    if let Some(os) = selected {
        check_cross_os(project, os, catalog)?;
    }
    Ok(selected)
}

fn exclusive_os<'s>(
    mut os_mods: impl Iterator<Item = &'s Mod>,
) -> Result<Option<&'s Mod>, ResolveError> {
    let first = os_mods.next();
    if let (Some(first), Some(second)) = (first, os_mods.next()) {
        return Err(ResolveError::MultipleOsMods {
            first: first.id.to_string(),
            second: second.id.to_string(),
        });
    }
    Ok(first)
}

fn check_cross_os(resolved: &ResolvedSet, os: &Mod, catalog: &Catalog) -> Result<(), ResolveError> {
    for m in resolved.iter().filter(|m| !m.is_os()) {
        if let Some(required) = catalog.foreign_os_requirements(m, &os.id).first() {
            return Err(ResolveError::CrossOsRequirement {
                module: m.id.to_string(),
                required: (*required).to_owned(),
                selected: os.id.name().to_owned(),
            });
        }
    }
    Ok(())
}

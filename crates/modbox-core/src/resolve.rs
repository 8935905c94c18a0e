use crate::capability::Catalog;
use crate::registry::validate_identifier;
use crate::ResolveError;
use modbox_schema::{Mod, ModId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Mods in installation order: every mod appears after the providers of its
/// requirements, and no identifier appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedSet {
    mods: Vec<Mod>,
}

impl ResolvedSet {
    pub fn mods(&self) -> &[Mod] {
        &self.mods
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mod> {
        self.mods.iter()
    }

    pub fn ids(&self) -> Vec<&ModId> {
        self.mods.iter().map(|m| &m.id).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.mods.iter().any(|m| m.id == id)
    }

    pub fn os_mods(&self) -> impl Iterator<Item = &Mod> {
        self.mods.iter().filter(|m| m.is_os())
    }

    /// First member satisfying `capability`.
    pub fn provider_of(&self, capability: &str) -> Option<&Mod> {
        self.mods.iter().find(|m| m.provides_capability(capability))
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResolvedSet {
    type Item = &'a Mod;
    type IntoIter = std::slice::Iter<'a, Mod>;

    fn into_iter(self) -> Self::IntoIter {
        self.mods.iter()
    }
}

/// Expands requested identifiers into a [`ResolvedSet`].
///
/// OS mods always come first in the result and never have their own
/// requirements expanded. Other requests are visited in catalog order, so the
/// result does not depend on the order the user listed them in. Requirements
/// are satisfied depth-first by the first compatible provider.
///
/// A resolver created with [`on_top_of`](Self::on_top_of) treats the base set
/// as already installed: its members are never placed again, its capabilities
/// count as satisfied, and its OS mod is the selected OS.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    base: Option<&'a ResolvedSet>,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            base: None,
        }
    }

    #[must_use]
    pub fn on_top_of(mut self, base: &'a ResolvedSet) -> Self {
        self.base = Some(base);
        self
    }

    pub fn resolve(&self, requested: &[ModId]) -> Result<ResolvedSet, ResolveError> {
        let mut roots: Vec<&'a Mod> = Vec::with_capacity(requested.len());
        for id in requested {
            validate_identifier(id)?;
            let m = self
                .catalog
                .get(id)
                .ok_or_else(|| ResolveError::NotFound(id.to_string()))?;
            roots.push(m);
        }
        roots.sort_by_key(|m| (!m.is_os(), self.catalog.position(&m.id)));
        roots.dedup_by(|a, b| a.id == b.id);

        let mut walk = Walk {
            catalog: self.catalog,
            base: self.base,
            placed: Vec::new(),
            placed_ids: HashSet::new(),
            in_progress: Vec::new(),
            selected_os: self
                .base
                .and_then(|b| b.os_mods().next())
                .map(|m| m.id.clone()),
        };

        for m in roots {
            walk.visit(m)?;
        }

        // An OS mod pulled in by a requirement is placed mid-walk. It has no
        // requirements of its own, so moving it ahead keeps dependency order.
        let mut mods = walk.placed;
        mods.sort_by_key(|m| !m.is_os());

        debug!(
            "resolved {} requested mod(s) into {} mod(s)",
            requested.len(),
            mods.len()
        );
        Ok(ResolvedSet { mods })
    }
}

struct Walk<'a> {
    catalog: &'a Catalog,
    base: Option<&'a ResolvedSet>,
    placed: Vec<Mod>,
    placed_ids: HashSet<ModId>,
    in_progress: Vec<ModId>,
    selected_os: Option<ModId>,
}

impl<'a> Walk<'a> {
    fn is_settled(&self, id: &ModId) -> bool {
        self.placed_ids.contains(id) || self.base.is_some_and(|b| b.contains(id))
    }

    fn is_satisfied(&self, capability: &str) -> bool {
        self.placed.iter().any(|m| m.provides_capability(capability))
            || self
                .base
                .is_some_and(|b| b.provider_of(capability).is_some())
    }

    fn visit(&mut self, m: &'a Mod) -> Result<(), ResolveError> {
        if self.is_settled(&m.id) {
            return Ok(());
        }
        if let Some(start) = self.in_progress.iter().position(|id| *id == m.id) {
            let mut chain: Vec<String> = self.in_progress[start..]
                .iter()
                .map(ToString::to_string)
                .collect();
            chain.push(m.id.to_string());
            return Err(ResolveError::CycleDetected { chain });
        }

        if !m.is_os() {
            self.in_progress.push(m.id.clone());
            for capability in &m.requires {
                if self.is_satisfied(capability) {
                    continue;
                }
                if let (Some(os), Some(selected)) =
                    (self.catalog.os_for(capability), &self.selected_os)
                {
                    if os != selected {
                        debug!("{} requires os '{capability}', leaving it to validation", m.id);
                        continue;
                    }
                }
                let provider = self.pick_provider(m, capability)?;
                self.visit(provider)?;
            }
            self.in_progress.pop();
        } else if self.selected_os.is_none() {
            self.selected_os = Some(m.id.clone());
        }

        self.placed_ids.insert(m.id.clone());
        self.placed.push(m.clone());
        Ok(())
    }

    fn pick_provider(&self, m: &Mod, capability: &str) -> Result<&'a Mod, ResolveError> {
        let catalog = self.catalog;
        let mut providers = catalog.providers(capability).peekable();
        if providers.peek().is_none() {
            return Err(ResolveError::UnsatisfiedRequirement {
                module: m.id.to_string(),
                capability: capability.to_owned(),
            });
        }

        let Some(selected) = &self.selected_os else {
            return providers.next().ok_or_else(|| ResolveError::UnsatisfiedRequirement {
                module: m.id.to_string(),
                capability: capability.to_owned(),
            });
        };

        let chosen = providers.find(|p| catalog.compatible_with_os(p, selected));
        match chosen {
            Some(p) => {
                debug!("{capability} for {} satisfied by {}", m.id, p.id);
                Ok(p)
            }
            None => Err(ResolveError::NoCompatibleOsProvider {
                module: m.id.to_string(),
                capability: capability.to_owned(),
                os: selected.name().to_owned(),
            }),
        }
    }
}

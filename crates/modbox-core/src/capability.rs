use crate::registry::ModRegistry;
use crate::ResolveError;
use modbox_schema::{Mod, ModId};
use std::collections::{BTreeMap, HashMap};

/// Capability name to the mods that satisfy it, in catalog order.
///
/// The first provider listed for a capability is the default choice during
/// resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidesMap {
    entries: BTreeMap<String, Vec<ModId>>,
}

impl ProvidesMap {
    pub fn providers(&self, capability: &str) -> &[ModId] {
        self.entries.get(capability).map_or(&[][..], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Index every capability of every mod: bare name, full identifier, and
/// explicit `provides`. Insertion order follows `mods`.
pub fn build_provides_map(mods: &[Mod]) -> ProvidesMap {
    let mut entries: BTreeMap<String, Vec<ModId>> = BTreeMap::new();
    for m in mods {
        for capability in m.capabilities() {
            let providers = entries.entry(capability.to_owned()).or_default();
            if !providers.contains(&m.id) {
                providers.push(m.id.clone());
            }
        }
    }
    ProvidesMap { entries }
}

/// The full set of visible mods, indexed for resolution.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    mods: Vec<Mod>,
    index: HashMap<ModId, usize>,
    provides: ProvidesMap,
    os_names: BTreeMap<String, ModId>,
}

impl Catalog {
    /// Build a catalog from mods in listing order. A repeated identifier keeps
    /// its first occurrence.
    pub fn from_mods(mods: impl IntoIterator<Item = Mod>) -> Self {
        let mut unique: Vec<Mod> = Vec::new();
        let mut index = HashMap::new();
        for m in mods {
            if index.contains_key(&m.id) {
                continue;
            }
            index.insert(m.id.clone(), unique.len());
            unique.push(m);
        }

        let mut os_names = BTreeMap::new();
        for m in unique.iter().filter(|m| m.is_os()) {
            os_names
                .entry(m.id.name().to_owned())
                .or_insert_with(|| m.id.clone());
            os_names
                .entry(m.id.to_string())
                .or_insert_with(|| m.id.clone());
        }

        let provides = build_provides_map(&unique);
        Self {
            mods: unique,
            index,
            provides,
            os_names,
        }
    }

    pub fn from_registry(registry: &ModRegistry) -> Result<Self, ResolveError> {
        Ok(Self::from_mods(registry.load_all()?))
    }

    pub fn get(&self, id: &str) -> Option<&Mod> {
        self.index.get(&ModId::from(id)).map(|&i| &self.mods[i])
    }

    /// Listing position of `id`, used as the deterministic tie-break.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(&ModId::from(id)).copied()
    }

    pub fn mods(&self) -> &[Mod] {
        &self.mods
    }

    pub fn providers(&self, capability: &str) -> impl Iterator<Item = &Mod> {
        self.provides
            .providers(capability)
            .iter()
            .filter_map(|id| self.get(id))
    }

    /// The OS mod a requirement names, when it names one by bare name or full id.
    pub fn os_for(&self, requirement: &str) -> Option<&ModId> {
        self.os_names.get(requirement)
    }

    /// Requirements of `m` that name an OS mod other than `selected`.
    pub fn foreign_os_requirements<'m>(&self, m: &'m Mod, selected: &ModId) -> Vec<&'m str> {
        m.requires
            .iter()
            .map(String::as_str)
            .filter(|req| self.os_for(req).is_some_and(|os| os != selected))
            .collect()
    }

    /// Whether `m` can live in an image built on `selected`.
    pub fn compatible_with_os(&self, m: &Mod, selected: &ModId) -> bool {
        if m.is_os() {
            return m.id == *selected;
        }
        self.foreign_os_requirements(m, selected).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modbox_schema::parse_definition_str;

    fn mk(id: &str, category: &str, requires: &[&str], provides: &[&str]) -> Mod {
        let name = ModId::from(id).name().to_owned();
        let base = if category == "os" {
            "base_image = \"scratch\"\n"
        } else {
            ""
        };
        let src = format!(
            "name = \"{name}\"\ndescription = \"{id}\"\ncategory = \"{category}\"\nrequires = {requires:?}\nprovides = {provides:?}\n{base}"
        );
        parse_definition_str(&src)
            .unwrap()
            .normalize(&ModId::from(id))
            .unwrap()
    }

    #[test]
    fn map_has_implicit_and_explicit_capabilities() {
        let mods = vec![mk("tools/homebrew", "tools", &["git"], &["brew"])];
        let map = build_provides_map(&mods);
        for cap in ["homebrew", "tools/homebrew", "brew"] {
            assert_eq!(map.providers(cap), &[ModId::from("tools/homebrew")], "{cap}");
        }
        assert!(map.providers("git").is_empty());
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn providers_keep_catalog_order() {
        let mods = vec![
            mk("shell/zsh-fedora", "shell", &["fedora"], &["zsh"]),
            mk("shell/zsh-ubuntu", "shell", &["ubuntu"], &["zsh"]),
        ];
        let map = build_provides_map(&mods);
        assert_eq!(
            map.providers("zsh"),
            &[ModId::from("shell/zsh-fedora"), ModId::from("shell/zsh-ubuntu")]
        );
    }

    #[test]
    fn catalog_keeps_first_duplicate() {
        let mut second = mk("tools/git", "tools", &[], &[]);
        second.description = "shadowed".to_owned();
        let catalog = Catalog::from_mods(vec![mk("tools/git", "tools", &[], &[]), second]);
        assert_eq!(catalog.mods().len(), 1);
        assert_eq!(catalog.get("tools/git").unwrap().description, "tools/git");
    }

    #[test]
    fn os_names_and_compatibility() {
        let catalog = Catalog::from_mods(vec![
            mk("os/fedora", "os", &[], &["linux"]),
            mk("os/ubuntu", "os", &[], &["linux"]),
            mk("shell/zsh-fedora", "shell", &["fedora"], &["zsh"]),
            mk("tools/git", "tools", &[], &[]),
        ]);
        let ubuntu = ModId::from("os/ubuntu");
        assert_eq!(catalog.os_for("fedora"), Some(&ModId::from("os/fedora")));
        assert_eq!(catalog.os_for("os/ubuntu"), Some(&ubuntu));
        assert!(catalog.os_for("linux").is_none());

        let zsh = catalog.get("shell/zsh-fedora").unwrap();
        assert!(!catalog.compatible_with_os(zsh, &ubuntu));
        assert!(catalog.compatible_with_os(zsh, &ModId::from("os/fedora")));
        assert!(catalog.compatible_with_os(catalog.get("tools/git").unwrap(), &ubuntu));
        assert!(!catalog.compatible_with_os(catalog.get("os/fedora").unwrap(), &ubuntu));
    }
}

use crate::definition::{DefinitionError, ModDefinition};
use crate::types::{ModId, OS_CATEGORY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A loaded, validated mod bound to the identifier it was found under.
///
/// `requires` keeps declaration order with duplicates removed; `provides` holds
/// only the explicit capabilities. Every mod also implicitly provides its bare
/// name and its full identifier (see [`Mod::capabilities`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mod {
    pub id: ModId,
    pub description: String,
    pub category: String,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
    pub base_image: Option<String>,
    pub run_as_root: Option<String>,
    pub run_as_user: Option<String>,
    pub env: BTreeMap<String, String>,
    pub shell: Option<String>,
}

impl ModDefinition {
    /// Validate the document and bind it to `id`.
    pub fn normalize(&self, id: &ModId) -> Result<Mod, DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        let category = self.category.trim().to_owned();
        if category.is_empty() {
            return Err(DefinitionError::EmptyCategory);
        }
        if id.contains('/') && id.category() != category {
            return Err(DefinitionError::CategoryMismatch {
                id: id.to_string(),
                declared: category,
                path: id.category().to_owned(),
            });
        }

        let base_image = non_blank(self.base_image.as_deref()).map(|s| s.trim().to_owned());
        if category == OS_CATEGORY && base_image.is_none() {
            return Err(DefinitionError::MissingBaseImage(id.to_string()));
        }

        let mut env = BTreeMap::new();
        for (key, value) in &self.env {
            let key = key.trim();
            if key.is_empty() {
                return Err(DefinitionError::EmptyEnvName { id: id.to_string() });
            }
            env.insert(key.to_owned(), value.clone());
        }

        let provides = dedup_ordered(&self.provides)
            .into_iter()
            .filter(|cap| cap != id.name() && cap != id.as_str())
            .collect();

        Ok(Mod {
            id: id.clone(),
            description: self.description.trim().to_owned(),
            category,
            requires: dedup_ordered(&self.requires),
            provides,
            base_image,
            run_as_root: non_blank(self.run_as_root.as_deref()).map(str::to_owned),
            run_as_user: non_blank(self.run_as_user.as_deref()).map(str::to_owned),
            env,
            shell: non_blank(self.shell.as_deref()).map(|s| s.trim().to_owned()),
        })
    }
}

impl Mod {
    pub fn is_os(&self) -> bool {
        self.category == OS_CATEGORY
    }

    /// Every capability this mod satisfies: bare name, full identifier, then
    /// explicit `provides` entries.
    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        let implicit = if self.id.contains('/') {
            vec![self.id.name(), self.id.as_str()]
        } else {
            vec![self.id.as_str()]
        };
        implicit
            .into_iter()
            .chain(self.provides.iter().map(String::as_str))
    }

    pub fn provides_capability(&self, capability: &str) -> bool {
        self.capabilities().any(|cap| cap == capability)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn dedup_ordered(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|seen| seen == value) {
            out.push(value.to_owned());
        }
    }
    out
}

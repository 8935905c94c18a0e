use crate::ResolveError;
use modbox_schema::{parse_definition_file, parse_definition_str, Mod, ModId, BUILTIN_MODS};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error, warn};

const MOD_EXTENSION: &str = "toml";

/// Where a mod definition was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModSource {
    Project,
    User,
    Builtin,
}

impl fmt::Display for ModSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModSource::Project => write!(f, "project"),
            ModSource::User => write!(f, "user"),
            ModSource::Builtin => write!(f, "builtin"),
        }
    }
}

/// Looks up mod definitions by identifier.
///
/// Search order is the project override root, the user override root, then
/// the built-in set; the first match wins. Override roots mirror the
/// identifier layout: `<root>/<category>/<name>.toml`, or `<root>/<name>.toml`
/// for a bare identifier.
#[derive(Debug, Clone)]
pub struct ModRegistry {
    project_root: Option<PathBuf>,
    user_root: Option<PathBuf>,
    builtins: bool,
}

impl Default for ModRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModRegistry {
    /// Registry backed only by the built-in mods.
    pub fn builtin() -> Self {
        Self {
            project_root: None,
            user_root: None,
            builtins: true,
        }
    }

    /// Registry without the built-in mods, for callers that supply every definition.
    pub fn without_builtins() -> Self {
        Self {
            project_root: None,
            user_root: None,
            builtins: false,
        }
    }

    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_user_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.user_root = Some(root.into());
        self
    }

    fn roots(&self) -> impl Iterator<Item = (ModSource, &Path)> {
        [
            (ModSource::Project, self.project_root.as_deref()),
            (ModSource::User, self.user_root.as_deref()),
        ]
        .into_iter()
        .filter_map(|(source, root)| root.map(|r| (source, r)))
    }

    /// Load one mod, honoring override precedence.
    pub fn load(&self, id: &str) -> Result<Mod, ResolveError> {
        validate_identifier(id)?;
        let mod_id = ModId::new(id);

        for (source, root) in self.roots() {
            let path = mod_path(root, &mod_id);
            if path.is_file() {
                debug!("loading {mod_id} from {source} root {}", path.display());
                return load_file(&path, &mod_id);
            }
        }

        if self.builtins {
            if let Some(m) = builtin_mods().get(&mod_id) {
                return Ok(m.clone());
            }
        }

        Err(ResolveError::NotFound(id.to_owned()))
    }

    /// Which source would satisfy `load(id)`, if any.
    pub fn source_of(&self, id: &str) -> Option<ModSource> {
        validate_identifier(id).ok()?;
        let mod_id = ModId::new(id);
        for (source, root) in self.roots() {
            if mod_path(root, &mod_id).is_file() {
                return Some(source);
            }
        }
        if self.builtins && builtin_mods().contains_key(&mod_id) {
            return Some(ModSource::Builtin);
        }
        None
    }

    /// Every visible identifier, grouped by the category in its path.
    pub fn list_all(&self) -> Result<BTreeMap<String, Vec<ModId>>, ResolveError> {
        let mut ids: BTreeSet<ModId> = BTreeSet::new();
        for (_, root) in self.roots() {
            ids.extend(scan_root(root)?);
        }
        if self.builtins {
            ids.extend(builtin_mods().keys().cloned());
        }

        let mut by_category: BTreeMap<String, Vec<ModId>> = BTreeMap::new();
        for id in ids {
            by_category
                .entry(id.category().to_owned())
                .or_default()
                .push(id);
        }
        Ok(by_category)
    }

    /// Load every visible mod in listing order (category, then identifier).
    ///
    /// Fails on the first override that does not load; nothing is skipped.
    pub fn load_all(&self) -> Result<Vec<Mod>, ResolveError> {
        let mut mods = Vec::new();
        for ids in self.list_all()?.into_values() {
            for id in ids {
                let m = self
                    .load(&id)
                    .inspect_err(|e| warn!("cannot load mod '{id}': {e}"))?;
                mods.push(m);
            }
        }
        Ok(mods)
    }
}

/// Reject identifiers that could escape a search root.
pub fn validate_identifier(id: &str) -> Result<(), ResolveError> {
    let invalid = |reason| ResolveError::InvalidIdentifier {
        id: id.to_owned(),
        reason,
    };

    if id.trim().is_empty() {
        return Err(invalid("identifier is empty"));
    }
    if id.starts_with('/') || Path::new(id).is_absolute() {
        return Err(invalid("absolute paths are not allowed"));
    }
    if id.contains('\\') {
        return Err(invalid("backslashes are not allowed"));
    }
    for segment in id.split('/') {
        if segment == ".." {
            return Err(invalid("parent-directory segments are not allowed"));
        }
        if segment.is_empty() || segment == "." {
            return Err(invalid("empty or '.' segments are not allowed"));
        }
        if segment.trim() != segment {
            return Err(invalid("segments must not have surrounding whitespace"));
        }
    }
    Ok(())
}

fn mod_path(root: &Path, id: &ModId) -> PathBuf {
    let mut path = root.to_path_buf();
    let mut segments = id.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{segment}.{MOD_EXTENSION}"));
        }
    }
    path
}

fn load_file(path: &Path, id: &ModId) -> Result<Mod, ResolveError> {
    let definition = match parse_definition_file(path) {
        Ok(def) => def,
        Err(modbox_schema::DefinitionError::Io(e)) => return Err(ResolveError::Io(e)),
        Err(source) => {
            return Err(ResolveError::Definition {
                id: id.to_string(),
                source,
            })
        }
    };
    definition
        .normalize(id)
        .map_err(|source| ResolveError::Definition {
            id: id.to_string(),
            source,
        })
}

/// Identifiers present in one override root: `*.toml` at the top level and
/// one level of category directories.
fn scan_root(root: &Path) -> Result<Vec<ModId>, ResolveError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            for inner in fs::read_dir(&path)? {
                let inner = inner?;
                if let Some(stem) = mod_stem(&inner.path()) {
                    push_valid(&mut ids, format!("{name}/{stem}"));
                }
            }
        } else if let Some(stem) = mod_stem(&path) {
            push_valid(&mut ids, stem);
        }
    }
    Ok(ids)
}

fn mod_stem(path: &Path) -> Option<String> {
    if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(MOD_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.starts_with('.') {
        return None;
    }
    Some(stem.to_owned())
}

fn push_valid(ids: &mut Vec<ModId>, candidate: String) {
    match validate_identifier(&candidate) {
        Ok(()) => ids.push(ModId::new(candidate)),
        Err(e) => debug!("ignoring override file: {e}"),
    }
}

/// The built-in set, parsed once per process and never mutated afterwards.
fn builtin_mods() -> &'static BTreeMap<ModId, Mod> {
    static BUILTINS: OnceLock<BTreeMap<ModId, Mod>> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        let mut mods = BTreeMap::new();
        for builtin in BUILTIN_MODS {
            let id = ModId::from(builtin.id);
            match parse_definition_str(builtin.source).and_then(|def| def.normalize(&id)) {
                Ok(m) => {
                    mods.insert(id, m);
                }
                Err(e) => error!("built-in mod '{id}' is invalid: {e}"),
            }
        }
        mods
    })
}

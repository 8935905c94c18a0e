use crate::identity::content_hash;
use crate::types::{ArtifactDigest, ContentHash, ModId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Current profile schema version.
pub const PROFILE_VERSION: u32 = 1;

/// Image name used by the global (base) profile unless one was recorded.
pub const BASE_IMAGE_NAME: &str = "modbox-base";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("profile serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unsupported profile version: {0}, expected {PROFILE_VERSION}")]
    UnsupportedVersion(u32),
}

/// A user's declaration of the mods an image should contain.
///
/// `mods` is the user's preference order, not dependency order. `build` is
/// written only after a successful artifact emission, except for
/// `build.content_hash`, which is refreshed on every save through [`Profile::save`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub mods: Vec<String>,
    #[serde(default)]
    pub passthrough_env: Vec<String>,
    #[serde(default)]
    pub build: BuildMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_built_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_digest: Option<ArtifactDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
}

/// Whether a profile describes the shared base image or a project image on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileScope {
    Global,
    Project,
}

impl fmt::Display for ProfileScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileScope::Global => write!(f, "global"),
            ProfileScope::Project => write!(f, "project"),
        }
    }
}

impl ProfileScope {
    /// Default image tag: `modbox-base` for the global profile,
    /// `modbox-<project>` for projects.
    pub fn default_image_name(self, project_name: &str) -> String {
        match self {
            ProfileScope::Global => BASE_IMAGE_NAME.to_owned(),
            ProfileScope::Project => format!("modbox-{}", sanitize_image_component(project_name)),
        }
    }
}

fn default_version() -> u32 {
    PROFILE_VERSION
}

fn sanitize_image_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches(|c| c == '-' || c == '.' || c == '_');
    if trimmed.is_empty() {
        "project".to_owned()
    } else {
        trimmed.to_owned()
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl Profile {
    pub fn new() -> Self {
        Self {
            version: PROFILE_VERSION,
            mods: Vec::new(),
            passthrough_env: Vec::new(),
            build: BuildMetadata::default(),
        }
    }

    pub fn parse_str(input: &str) -> Result<Self, ProfileError> {
        let profile: Profile = toml::from_str(input)?;
        if profile.version != PROFILE_VERSION {
            return Err(ProfileError::UnsupportedVersion(profile.version));
        }
        Ok(profile)
    }

    pub fn to_toml_string(&self) -> Result<String, ProfileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Requested identifiers, in preference order.
    pub fn mod_ids(&self) -> Vec<ModId> {
        self.mods.iter().map(|m| ModId::new(m.trim())).collect()
    }

    /// Append `id` unless it is already requested. Returns whether the list changed.
    pub fn add_mod(&mut self, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() || self.mods.iter().any(|m| m == id) {
            return false;
        }
        self.mods.push(id.to_owned());
        true
    }

    /// Remove `id` from the requested list. Returns whether the list changed.
    pub fn remove_mod(&mut self, id: &str) -> bool {
        let id = id.trim();
        let before = self.mods.len();
        self.mods.retain(|m| m != id);
        self.mods.len() != before
    }

    /// Store the hash of the editable fields as they are now.
    pub fn seal(&mut self) {
        self.build.content_hash = Some(content_hash(self));
    }

    /// True when the stored content hash no longer matches the editable fields,
    /// i.e. the file was changed outside `add`/`remove`/`save`.
    ///
    /// Profiles that were never sealed carry no hash and are not flagged.
    pub fn is_manually_edited(&self) -> bool {
        match &self.build.content_hash {
            Some(stored) => *stored != content_hash(self),
            None => false,
        }
    }

    /// Stamp the metadata of a successful artifact emission.
    pub fn record_build(&mut self, digest: ArtifactDigest, image_name: &str, built_at: &str) {
        self.build.artifact_digest = Some(digest);
        self.build.image_name = Some(image_name.to_owned());
        self.build.last_built_at = Some(built_at.to_owned());
    }

    /// Seal and write atomically.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), ProfileError> {
        self.seal();
        self.write_to_file(path)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ProfileError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| ProfileError::Io(e.error))?;
        // Fsync parent directory to ensure rename durability on power loss.
        if let Ok(f) = fs::File::open(dir) {
            let _ = f.sync_all();
        }
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> Profile {
        let mut p = Profile::new();
        p.add_mod("os/ubuntu");
        p.add_mod("tools/mise");
        p.passthrough_env.push("GITHUB_TOKEN".to_owned());
        p
    }

    #[test]
    fn profile_roundtrip() {
        let mut profile = sample_profile();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");

        profile.save(&path).unwrap();
        let loaded = Profile::read_from_file(&path).unwrap();
        assert_eq!(profile, loaded);
        assert!(!loaded.is_manually_edited());
    }

    #[test]
    fn parses_minimal_profile() {
        let p = Profile::parse_str("mods = [\"os/ubuntu\"]\n").unwrap();
        assert_eq!(p.version, PROFILE_VERSION);
        assert_eq!(p.mods, vec!["os/ubuntu"]);
        assert!(p.build.artifact_digest.is_none());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = Profile::parse_str("version = 7\nmods = []\n").unwrap_err();
        assert!(matches!(err, ProfileError::UnsupportedVersion(7)));
    }

    #[test]
    fn hand_edit_after_save_is_detected() {
        let mut profile = sample_profile();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        profile.save(&path).unwrap();

        let edited = fs::read_to_string(&path)
            .unwrap()
            .replace("tools/mise", "tools/git");
        fs::write(&path, edited).unwrap();

        let loaded = Profile::read_from_file(&path).unwrap();
        assert!(loaded.is_manually_edited());
    }

    #[test]
    fn unsealed_profile_is_not_flagged() {
        let profile = sample_profile();
        assert!(profile.build.content_hash.is_none());
        assert!(!profile.is_manually_edited());
    }

    #[test]
    fn add_and_remove_report_changes() {
        let mut p = Profile::new();
        assert!(p.add_mod("tools/git"));
        assert!(!p.add_mod("tools/git"));
        assert!(!p.add_mod("  "));
        assert!(p.remove_mod("tools/git"));
        assert!(!p.remove_mod("tools/git"));
        assert!(p.mods.is_empty());
    }

    #[test]
    fn record_build_keeps_content_hash() {
        let mut p = sample_profile();
        p.seal();
        let hash = p.build.content_hash.clone();
        p.record_build(
            ArtifactDigest::new("d".repeat(64)),
            "modbox-base",
            "2026-01-01T00:00:00+00:00",
        );
        assert_eq!(p.build.content_hash, hash);
        assert!(!p.is_manually_edited());
        assert_eq!(p.build.image_name.as_deref(), Some("modbox-base"));
    }

    #[test]
    fn default_image_names() {
        assert_eq!(ProfileScope::Global.default_image_name("ignored"), "modbox-base");
        assert_eq!(
            ProfileScope::Project.default_image_name("My App!"),
            "modbox-my-app"
        );
        assert_eq!(ProfileScope::Project.default_image_name("---"), "modbox-project");
    }
}

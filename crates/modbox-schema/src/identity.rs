use crate::profile::Profile;
use crate::types::{ArtifactDigest, ContentHash};

/// Blake3 digest of an emitted artifact's exact bytes.
pub fn digest(text: &str) -> ArtifactDigest {
    ArtifactDigest::new(blake3::hash(text.as_bytes()).to_hex().to_string())
}

/// Hash of the user-editable part of a profile.
///
/// Covers `version`, `mods` and `passthrough_env` in their stored order; the
/// `build` table is excluded so recording a build never looks like an edit.
pub fn content_hash(profile: &Profile) -> ContentHash {
    let mut hasher = blake3::Hasher::new();

    hasher.update(format!("version:{}", profile.version).as_bytes());
    for id in &profile.mods {
        hasher.update(format!("mod:{}\n", id.len()).as_bytes());
        hasher.update(id.as_bytes());
    }
    for name in &profile.passthrough_env {
        hasher.update(format!("env:{}\n", name.len()).as_bytes());
        hasher.update(name.as_bytes());
    }

    ContentHash::new(hasher.finalize().to_hex().to_string())
}

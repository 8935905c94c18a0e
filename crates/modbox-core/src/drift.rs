use modbox_schema::{digest, ArtifactDigest, Profile};
use serde::Serialize;
use std::fmt;

/// How the artifact on disk relates to the profile's last recorded build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactState {
    /// The profile has no recorded build.
    NeverBuilt,
    /// A build was recorded but the artifact file is gone.
    Missing,
    /// The file on disk no longer matches the recorded digest.
    ManuallyEdited,
    /// Emitting the profile now would produce a different artifact.
    Stale,
    UpToDate,
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactState::NeverBuilt => write!(f, "never built"),
            ArtifactState::Missing => write!(f, "missing"),
            ArtifactState::ManuallyEdited => write!(f, "manually edited"),
            ArtifactState::Stale => write!(f, "stale"),
            ArtifactState::UpToDate => write!(f, "up to date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    /// The profile was changed without going through the tool.
    pub profile_edited: bool,
    pub artifact: ArtifactState,
    pub recorded_digest: Option<ArtifactDigest>,
    pub fresh_digest: ArtifactDigest,
    pub on_disk_digest: Option<ArtifactDigest>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        !self.profile_edited && self.artifact == ArtifactState::UpToDate
    }

    /// Regenerating would differ from the recorded build, whatever the file on disk holds.
    pub fn is_stale(&self) -> bool {
        self.recorded_digest
            .as_ref()
            .is_some_and(|recorded| *recorded != self.fresh_digest)
    }
}

/// Compare a profile's recorded build against a freshly emitted artifact and
/// the artifact currently on disk. Mismatches are reported, never raised.
pub fn check(profile: &Profile, fresh_artifact: &str, on_disk: Option<&str>) -> DriftReport {
    let recorded_digest = profile.build.artifact_digest.clone();
    let fresh_digest = digest(fresh_artifact);
    let on_disk_digest = on_disk.map(digest);

    let artifact = match (&recorded_digest, &on_disk_digest) {
        (None, _) => ArtifactState::NeverBuilt,
        (Some(_), None) => ArtifactState::Missing,
        (Some(recorded), Some(disk)) if recorded != disk => ArtifactState::ManuallyEdited,
        (Some(recorded), Some(_)) if *recorded != fresh_digest => ArtifactState::Stale,
        (Some(_), Some(_)) => ArtifactState::UpToDate,
    };

    DriftReport {
        profile_edited: profile.is_manually_edited(),
        artifact,
        recorded_digest,
        fresh_digest,
        on_disk_digest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILT: &str = "FROM ubuntu:24.04\n";

    fn built_profile() -> Profile {
        let mut profile = Profile::new();
        profile.add_mod("os/ubuntu");
        profile.seal();
        profile.record_build(digest(BUILT), "modbox-base", "2026-01-01T00:00:00+00:00");
        profile
    }

    #[test]
    fn never_built() {
        let report = check(&Profile::new(), BUILT, None);
        assert_eq!(report.artifact, ArtifactState::NeverBuilt);
        assert!(!report.is_clean());
    }

    #[test]
    fn up_to_date() {
        let report = check(&built_profile(), BUILT, Some(BUILT));
        assert_eq!(report.artifact, ArtifactState::UpToDate);
        assert!(report.is_clean());
        assert!(!report.is_stale());
    }

    #[test]
    fn missing_file() {
        let report = check(&built_profile(), BUILT, None);
        assert_eq!(report.artifact, ArtifactState::Missing);
    }

    #[test]
    fn hand_edited_file() {
        let report = check(&built_profile(), BUILT, Some("FROM ubuntu:24.04\nRUN true\n"));
        assert_eq!(report.artifact, ArtifactState::ManuallyEdited);
    }

    #[test]
    fn stale_when_emission_changes() {
        let report = check(&built_profile(), "FROM fedora:41\n", Some(BUILT));
        assert_eq!(report.artifact, ArtifactState::Stale);
        assert!(report.is_stale());
    }

    #[test]
    fn profile_edited_outside_the_tool() {
        let mut profile = built_profile();
        profile.mods.push("tools/git".to_owned());
        let report = check(&profile, BUILT, Some(BUILT));
        assert!(report.profile_edited);
        assert_eq!(report.artifact, ArtifactState::UpToDate);
        assert!(!report.is_clean());
    }

    #[test]
    fn state_serializes_kebab_case() {
        let json = serde_json::to_string(&ArtifactState::ManuallyEdited).unwrap();
        assert_eq!(json, "\"manually-edited\"");
    }
}

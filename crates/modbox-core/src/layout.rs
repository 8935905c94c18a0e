use crate::registry::ModRegistry;
use crate::CoreError;
use modbox_schema::ProfileScope;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const PROFILE_FILE: &str = "profile.toml";
const ARTIFACT_FILE: &str = "Dockerfile";
const MODS_DIR: &str = "mods";
const PROJECT_DIR: &str = ".modbox";

/// File locations for one invocation: the user's modbox home and the
/// project directory being worked on.
///
/// ```text
/// <home>/profile.toml            global profile (base image)
/// <home>/Dockerfile              its artifact
/// <home>/mods/                   user override root
/// <project>/.modbox/profile.toml project profile (layer)
/// <project>/.modbox/Dockerfile   its artifact
/// <project>/.modbox/mods/        project override root
/// ```
#[derive(Debug, Clone)]
pub struct ModboxLayout {
    home: PathBuf,
    project: PathBuf,
}

impl ModboxLayout {
    pub fn new(home: impl Into<PathBuf>, project: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            project: project.into(),
        }
    }

    #[inline]
    pub fn global_profile(&self) -> PathBuf {
        self.home.join(PROFILE_FILE)
    }

    #[inline]
    pub fn user_mods_dir(&self) -> PathBuf {
        self.home.join(MODS_DIR)
    }

    #[inline]
    pub fn project_dir(&self) -> PathBuf {
        self.project.join(PROJECT_DIR)
    }

    #[inline]
    pub fn project_profile(&self) -> PathBuf {
        self.project_dir().join(PROFILE_FILE)
    }

    #[inline]
    pub fn project_mods_dir(&self) -> PathBuf {
        self.project_dir().join(MODS_DIR)
    }

    pub fn profile_path(&self, scope: ProfileScope) -> PathBuf {
        match scope {
            ProfileScope::Global => self.global_profile(),
            ProfileScope::Project => self.project_profile(),
        }
    }

    /// The Dockerfile written next to a profile.
    pub fn artifact_path(&self, scope: ProfileScope) -> PathBuf {
        match scope {
            ProfileScope::Global => self.home.join(ARTIFACT_FILE),
            ProfileScope::Project => self.project_dir().join(ARTIFACT_FILE),
        }
    }

    /// Name of the project directory, used for default image names.
    pub fn project_name(&self) -> String {
        self.project
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Registry searching this layout's override roots before the built-ins.
    pub fn registry(&self) -> ModRegistry {
        ModRegistry::builtin()
            .with_project_root(self.project_mods_dir())
            .with_user_root(self.user_mods_dir())
    }

    /// Read the artifact next to a profile, `None` if it does not exist.
    pub fn read_artifact(&self, scope: ProfileScope) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(self.artifact_path(scope)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the artifact next to a profile.
    pub fn write_artifact(&self, scope: ProfileScope, text: &str) -> Result<PathBuf, CoreError> {
        let path = self.artifact_path(scope);
        let dir = path.parent().unwrap_or(&self.home).to_path_buf();
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| CoreError::Io(e.error))?;
        if let Ok(f) = fs::File::open(&dir) {
            let _ = f.sync_all();
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_layout() {
        let layout = ModboxLayout::new("/h", "/work/app");
        assert_eq!(layout.global_profile(), PathBuf::from("/h/profile.toml"));
        assert_eq!(layout.user_mods_dir(), PathBuf::from("/h/mods"));
        assert_eq!(
            layout.project_profile(),
            PathBuf::from("/work/app/.modbox/profile.toml")
        );
        assert_eq!(
            layout.artifact_path(ProfileScope::Project),
            PathBuf::from("/work/app/.modbox/Dockerfile")
        );
        assert_eq!(
            layout.artifact_path(ProfileScope::Global),
            PathBuf::from("/h/Dockerfile")
        );
        assert_eq!(layout.project_name(), "app");
    }

    #[test]
    fn artifact_write_then_read() {
        let home = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        let layout = ModboxLayout::new(home.path(), project.path());
        assert!(layout.read_artifact(ProfileScope::Project).unwrap().is_none());

        let path = layout
            .write_artifact(ProfileScope::Project, "FROM scratch\n")
            .unwrap();
        assert!(path.starts_with(project.path()));
        assert_eq!(
            layout.read_artifact(ProfileScope::Project).unwrap().as_deref(),
            Some("FROM scratch\n")
        );
    }
}

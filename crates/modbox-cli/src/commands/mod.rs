pub mod add;
pub mod completions;
pub mod generate;
pub mod init;
pub mod mods;
pub mod remove;
pub mod show;
pub mod status;
pub mod templates;

use modbox_core::{Engine, ModboxLayout, PlanTarget, ProfileLock};
use modbox_schema::{Profile, ProfileScope};
use std::path::PathBuf;
use tracing::info;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_PROFILE_ERROR: u8 = 2;
pub const EXIT_RESOLUTION_ERROR: u8 = 3;
pub const EXIT_DRIFT_REFUSED: u8 = 4;

/// Per-invocation state shared by every command.
pub struct Context {
    pub layout: ModboxLayout,
    pub json: bool,
}

impl Context {
    pub fn new(layout: ModboxLayout, json: bool) -> Self {
        Self { layout, json }
    }

    pub fn scope(global: bool) -> ProfileScope {
        if global {
            ProfileScope::Global
        } else {
            ProfileScope::Project
        }
    }

    pub fn profile_path(&self, scope: ProfileScope) -> PathBuf {
        self.layout.profile_path(scope)
    }

    pub fn engine(&self) -> Result<Engine, String> {
        Engine::new(self.layout.registry()).map_err(|e| e.to_string())
    }

    pub fn load_profile(&self, scope: ProfileScope) -> Result<Profile, String> {
        let path = self.profile_path(scope);
        if !path.exists() {
            let hint = match scope {
                ProfileScope::Global => "modbox init --global",
                ProfileScope::Project => "modbox init",
            };
            return Err(format!(
                "profile error: no {scope} profile at {} (run `{hint}`)",
                path.display()
            ));
        }
        Profile::read_from_file(&path)
            .map_err(|e| format!("profile error: {}: {e}", path.display()))
    }

    /// The global profile a project layer builds on; `None` for the global scope.
    pub fn load_base(&self, scope: ProfileScope) -> Result<Option<Profile>, String> {
        match scope {
            ProfileScope::Global => Ok(None),
            ProfileScope::Project => self.load_profile(ProfileScope::Global).map(Some),
        }
    }

    /// Take the profile's writer lock, waiting if another modbox holds it.
    pub fn lock(&self, scope: ProfileScope) -> Result<ProfileLock, String> {
        let path = self.profile_path(scope);
        if let Some(lock) =
            ProfileLock::try_acquire(&path).map_err(|e| format!("profile lock: {e}"))?
        {
            return Ok(lock);
        }
        info!("waiting for another modbox to release {}", path.display());
        ProfileLock::acquire(&path).map_err(|e| format!("profile lock: {e}"))
    }

    /// Image tag a profile builds: the recorded one, else the scope's default.
    pub fn image_name(&self, profile: &Profile, scope: ProfileScope) -> String {
        profile
            .build
            .image_name
            .clone()
            .unwrap_or_else(|| scope.default_image_name(&self.layout.project_name()))
    }
}

pub fn plan_target(base: Option<&Profile>) -> PlanTarget<'_> {
    match base {
        Some(base) => PlanTarget::Project { base },
        None => PlanTarget::Global,
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn colorize_state(state: &str) -> String {
    use console::Style;
    match state {
        "up to date" | "clean" => Style::new().green().apply_to(state).to_string(),
        "stale" | "never built" => Style::new().yellow().apply_to(state).to_string(),
        "missing" => Style::new().cyan().apply_to(state).to_string(),
        "manually edited" | "edited" => Style::new().red().bold().apply_to(state).to_string(),
        other => other.to_owned(),
    }
}

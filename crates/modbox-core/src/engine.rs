use crate::capability::Catalog;
use crate::drift::{self, DriftReport};
use crate::emit::{emit, Layer};
use crate::layer::filter_for_layer;
use crate::registry::ModRegistry;
use crate::resolve::{ResolvedSet, Resolver};
use crate::validate::{validate, validate_layer};
use crate::CoreError;
use modbox_schema::{digest, ArtifactDigest, ModId, Profile, BASE_IMAGE_NAME};
use tracing::{debug, info};

/// What a profile is being built as.
#[derive(Debug, Clone, Copy)]
pub enum PlanTarget<'p> {
    /// The global profile: a standalone image starting from its OS mod.
    Global,
    /// A project profile layered on the image built from `base`.
    Project { base: &'p Profile },
}

/// A validated resolution ready to be emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub layer: Layer,
    /// Mods this build installs, in order.
    pub resolved: ResolvedSet,
    /// The base closure a project layer builds on.
    pub base: Option<ResolvedSet>,
    /// Requested mods skipped because the base already has them.
    pub inherited: Vec<ModId>,
    /// OS of the resulting image, inherited from the base for project layers.
    pub selected_os: Option<ModId>,
}

/// An emitted Dockerfile and its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub text: String,
    pub digest: ArtifactDigest,
}

/// Drives resolution, validation, emission and drift checks over one catalog.
pub struct Engine {
    registry: ModRegistry,
    catalog: Catalog,
}

impl Engine {
    /// Load every visible mod from `registry` into a catalog.
    pub fn new(registry: ModRegistry) -> Result<Self, CoreError> {
        let catalog = Catalog::from_registry(&registry)?;
        debug!("catalog loaded with {} mod(s)", catalog.mods().len());
        Ok(Self { registry, catalog })
    }

    pub fn registry(&self) -> &ModRegistry {
        &self.registry
    }

    /// Resolve and validate a profile for the given target.
    pub fn plan(&self, profile: &Profile, target: PlanTarget<'_>) -> Result<BuildPlan, CoreError> {
        let requested = profile.mod_ids();
        match target {
            PlanTarget::Global => {
                info!("planning standalone build of {} mod(s)", requested.len());
                let resolved = Resolver::new(&self.catalog).resolve(&requested)?;
                let selected_os = validate(&resolved, &self.catalog)?.map(|m| m.id.clone());
                Ok(BuildPlan {
                    layer: Layer::Standalone,
                    resolved,
                    base: None,
                    inherited: Vec::new(),
                    selected_os,
                })
            }
            PlanTarget::Project { base } => {
                let parent_image = parent_image(base);
                info!(
                    "planning layer of {} mod(s) on top of {parent_image}",
                    requested.len()
                );
                let layered = filter_for_layer(&self.catalog, &requested, &base.mod_ids())?;
                let selected_os = validate_layer(&layered.project, &layered.base, &self.catalog)?
                    .map(|m| m.id.clone());
                Ok(BuildPlan {
                    layer: Layer::Dependent { parent_image },
                    resolved: layered.project,
                    base: Some(layered.base),
                    inherited: layered.inherited,
                    selected_os,
                })
            }
        }
    }

    /// Render a plan.
    pub fn generate(&self, plan: &BuildPlan) -> Artifact {
        let text = emit(&plan.resolved, &plan.layer);
        let digest = digest(&text);
        debug!("emitted {} bytes, digest {}", text.len(), &digest[..12]);
        Artifact { text, digest }
    }

    /// Stamp `profile` with a successful emission, timestamped now.
    pub fn record_build(&self, profile: &mut Profile, artifact: &Artifact, image_name: &str) {
        let built_at = chrono::Utc::now().to_rfc3339();
        info!("recording build of {image_name} at {built_at}");
        profile.record_build(artifact.digest.clone(), image_name, &built_at);
    }

    /// Compare the profile's recorded build against a fresh emission and the
    /// artifact on disk.
    pub fn status(
        &self,
        profile: &Profile,
        target: PlanTarget<'_>,
        on_disk: Option<&str>,
    ) -> Result<DriftReport, CoreError> {
        let plan = self.plan(profile, target)?;
        let artifact = self.generate(&plan);
        Ok(drift::check(profile, &artifact.text, on_disk))
    }
}

/// Image a project layer starts from: the base profile's recorded image name,
/// or the default base name if it was never built.
pub fn parent_image(base: &Profile) -> String {
    base.build
        .image_name
        .clone()
        .unwrap_or_else(|| BASE_IMAGE_NAME.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::ArtifactState;
    use crate::ResolveError;

    fn profile(mods: &[&str]) -> Profile {
        let mut p = Profile::new();
        for m in mods {
            p.add_mod(m);
        }
        p.seal();
        p
    }

    fn engine() -> Engine {
        Engine::new(ModRegistry::builtin()).unwrap()
    }

    #[test]
    fn global_plan_is_standalone() {
        let engine = engine();
        let plan = engine
            .plan(&profile(&["os/ubuntu", "tools/mise"]), PlanTarget::Global)
            .unwrap();
        assert_eq!(plan.layer, Layer::Standalone);
        assert_eq!(plan.selected_os, Some(ModId::from("os/ubuntu")));
        assert!(plan.resolved.contains("tools/homebrew"));
    }

    #[test]
    fn project_plan_layers_on_base() {
        let engine = engine();
        let mut base = profile(&["os/ubuntu", "tools/homebrew"]);
        base.build.image_name = Some("my-base".to_owned());
        let plan = engine
            .plan(&profile(&["tools/mise"]), PlanTarget::Project { base: &base })
            .unwrap();
        assert_eq!(
            plan.layer,
            Layer::Dependent {
                parent_image: "my-base".to_owned()
            }
        );
        assert_eq!(plan.resolved.ids(), vec![&ModId::from("tools/mise")]);
        assert_eq!(plan.selected_os, Some(ModId::from("os/ubuntu")));
    }

    #[test]
    fn unbuilt_base_defaults_parent_image() {
        assert_eq!(parent_image(&Profile::new()), BASE_IMAGE_NAME);
    }

    #[test]
    fn plan_surfaces_resolution_errors() {
        let engine = engine();
        let err = engine
            .plan(&profile(&["os/ubuntu", "os/fedora"]), PlanTarget::Global)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Resolve(ResolveError::MultipleOsMods { .. })
        ));
    }

    #[test]
    fn generate_then_status_is_clean() {
        let engine = engine();
        let mut p = profile(&["os/fedora", "tools/git"]);
        let plan = engine.plan(&p, PlanTarget::Global).unwrap();
        let artifact = engine.generate(&plan);
        assert_eq!(artifact.digest, digest(&artifact.text));

        engine.record_build(&mut p, &artifact, "modbox-base");
        assert!(p.build.last_built_at.is_some());

        let report = engine
            .status(&p, PlanTarget::Global, Some(&artifact.text))
            .unwrap();
        assert_eq!(report.artifact, ArtifactState::UpToDate);
        assert!(report.is_clean());
    }

    #[test]
    fn status_detects_stale_after_profile_change() {
        let engine = engine();
        let mut p = profile(&["os/fedora"]);
        let artifact = engine.generate(&engine.plan(&p, PlanTarget::Global).unwrap());
        engine.record_build(&mut p, &artifact, "modbox-base");

        p.add_mod("tools/git");
        p.seal();
        let report = engine
            .status(&p, PlanTarget::Global, Some(&artifact.text))
            .unwrap();
        assert_eq!(report.artifact, ArtifactState::Stale);
        assert!(!report.profile_edited);
    }
}

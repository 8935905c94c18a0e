use super::{colorize_state, json_pretty, plan_target, Context, EXIT_SUCCESS};
use modbox_core::ArtifactState;

pub fn run(ctx: &Context, global: bool) -> Result<u8, String> {
    let scope = Context::scope(global);
    let profile = ctx.load_profile(scope)?;
    let base = ctx.load_base(scope)?;
    let engine = ctx.engine()?;
    let on_disk = ctx.layout.read_artifact(scope).map_err(|e| e.to_string())?;

    let report = engine
        .status(&profile, plan_target(base.as_ref()), on_disk.as_deref())
        .map_err(|e| e.to_string())?;

    if ctx.json {
        let payload = serde_json::json!({
            "scope": scope,
            "profile": ctx.profile_path(scope).display().to_string(),
            "artifact_path": ctx.layout.artifact_path(scope).display().to_string(),
            "last_built_at": profile.build.last_built_at,
            "image_name": profile.build.image_name,
            "clean": report.is_clean(),
            "stale": report.is_stale(),
            "report": report,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    let profile_state = if report.profile_edited {
        "edited"
    } else {
        "clean"
    };
    println!("profile:    {}", colorize_state(profile_state));
    println!(
        "dockerfile: {}",
        colorize_state(&report.artifact.to_string())
    );
    if let Some(at) = &profile.build.last_built_at {
        println!("last built: {at}");
    }
    if report.profile_edited {
        println!("the profile was changed outside modbox since it was last saved");
    }
    match report.artifact {
        ArtifactState::NeverBuilt | ArtifactState::Missing | ArtifactState::Stale => {
            let flag = if global { " --global" } else { "" };
            println!("run `modbox generate{flag}` to bring the Dockerfile up to date");
        }
        ArtifactState::ManuallyEdited => {
            println!("the Dockerfile was edited by hand; `modbox generate --force` discards those edits");
            if report.is_stale() {
                println!("the profile also changed since that build");
            }
        }
        ArtifactState::UpToDate => {
            if report.is_clean() {
                println!("nothing to do");
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

use super::{json_pretty, plan_target, Context, EXIT_SUCCESS};
use modbox_core::{drift, ArtifactState};
use modbox_schema::digest;
use tracing::info;

pub fn run(ctx: &Context, global: bool, force: bool) -> Result<u8, String> {
    let scope = Context::scope(global);
    let _lock = ctx.lock(scope)?;
    let mut profile = ctx.load_profile(scope)?;
    let base = ctx.load_base(scope)?;
    let engine = ctx.engine()?;

    let plan = engine
        .plan(&profile, plan_target(base.as_ref()))
        .map_err(|e| e.to_string())?;
    let artifact = engine.generate(&plan);

    let on_disk = ctx.layout.read_artifact(scope).map_err(|e| e.to_string())?;
    let report = drift::check(&profile, &artifact.text, on_disk.as_deref());
    let hand_written = match (&on_disk, &profile.build.artifact_digest) {
        (Some(text), None) => digest(text) != artifact.digest,
        _ => report.artifact == ArtifactState::ManuallyEdited,
    };
    if hand_written && !force {
        return Err(format!(
            "drift: {} was edited by hand; pass --force to overwrite it",
            ctx.layout.artifact_path(scope).display()
        ));
    }

    if report.profile_edited && !ctx.json {
        eprintln!(
            "warning: {} was edited outside modbox since it was last saved; recording it as the new baseline",
            ctx.profile_path(scope).display()
        );
    }

    let path = ctx
        .layout
        .write_artifact(scope, &artifact.text)
        .map_err(|e| e.to_string())?;
    info!("wrote {} ({})", path.display(), artifact.digest);
    let image_name = ctx.image_name(&profile, scope);
    engine.record_build(&mut profile, &artifact, &image_name);
    profile
        .save(ctx.profile_path(scope))
        .map_err(|e| format!("profile error: {e}"))?;

    if ctx.json {
        let payload = serde_json::json!({
            "status": "generated",
            "scope": scope,
            "path": path.display().to_string(),
            "digest": artifact.digest,
            "profile_edited": report.profile_edited,
            "image_name": image_name,
            "mods": plan.resolved.ids(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote {} ({} mod(s))", path.display(), plan.resolved.len());
        println!("digest: {}", artifact.digest);
        let context_dir = path
            .parent()
            .map_or_else(|| ".".to_owned(), |p| p.display().to_string());
        println!(
            "build with: docker build -t {image_name} -f {} {context_dir}",
            path.display()
        );
    }
    Ok(EXIT_SUCCESS)
}

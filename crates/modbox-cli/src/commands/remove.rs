use super::{json_pretty, Context, EXIT_SUCCESS};

pub fn run(ctx: &Context, mods: &[String], global: bool) -> Result<u8, String> {
    let scope = Context::scope(global);
    let _lock = ctx.lock(scope)?;
    let mut profile = ctx.load_profile(scope)?;

    let mut removed = Vec::new();
    let mut absent = Vec::new();
    for id in mods {
        if profile.remove_mod(id) {
            removed.push(id.trim());
        } else {
            absent.push(id.trim());
        }
    }
    profile
        .save(ctx.profile_path(scope))
        .map_err(|e| format!("profile error: {e}"))?;

    if ctx.json {
        let payload = serde_json::json!({
            "scope": scope,
            "removed": removed,
            "not_present": absent,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for id in &removed {
            println!("removed {id}");
        }
        for id in &absent {
            println!("{id} is not in the {scope} profile");
        }
    }
    Ok(EXIT_SUCCESS)
}

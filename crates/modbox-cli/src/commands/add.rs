use super::{json_pretty, Context, EXIT_SUCCESS};

pub fn run(ctx: &Context, mods: &[String], global: bool) -> Result<u8, String> {
    let scope = Context::scope(global);
    let engine = ctx.engine()?;
    for id in mods {
        engine
            .registry()
            .load(id.trim())
            .map_err(|e| format!("resolution error: {e}"))?;
    }

    let _lock = ctx.lock(scope)?;
    let mut profile = ctx.load_profile(scope)?;
    let mut added = Vec::new();
    let mut present = Vec::new();
    for id in mods {
        if profile.add_mod(id) {
            added.push(id.trim());
        } else {
            present.push(id.trim());
        }
    }
    profile
        .save(ctx.profile_path(scope))
        .map_err(|e| format!("profile error: {e}"))?;

    if ctx.json {
        let payload = serde_json::json!({
            "scope": scope,
            "added": added,
            "already_present": present,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for id in &added {
            println!("added {id}");
        }
        for id in &present {
            println!("{id} is already in the {scope} profile");
        }
    }
    Ok(EXIT_SUCCESS)
}

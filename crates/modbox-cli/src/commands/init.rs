use super::{json_pretty, Context, EXIT_SUCCESS};
use modbox_schema::{get_preset, list_presets, Profile, ProfileScope};

fn load_template(name: &str) -> Result<Profile, String> {
    let preset = get_preset(name).ok_or_else(|| {
        let known: Vec<&str> = list_presets().iter().map(|p| p.name).collect();
        format!("unknown template '{name}' (expected: {})", known.join(", "))
    })?;
    Profile::parse_str(preset.profile).map_err(|e| format!("template parse error: {e}"))
}

pub fn run(ctx: &Context, global: bool, template: Option<&str>, force: bool) -> Result<u8, String> {
    let scope = Context::scope(global);
    let path = ctx.profile_path(scope);

    let mut profile = match template {
        Some(name) => load_template(name)?,
        None => Profile::new(),
    };

    let _lock = ctx.lock(scope)?;
    if path.exists() && !force {
        return Err(format!(
            "refusing to overwrite existing {} (pass --force)",
            path.display()
        ));
    }

    if let Some(name) = template {
        let engine = ctx.engine()?;
        for id in &profile.mods {
            engine
                .registry()
                .load(id)
                .map_err(|e| format!("resolution error: template '{name}': {e}"))?;
        }
    }

    profile
        .save(&path)
        .map_err(|e| format!("profile error: {e}"))?;

    if ctx.json {
        let payload = serde_json::json!({
            "status": "written",
            "scope": scope,
            "path": path.display().to_string(),
            "template": template,
            "mods": profile.mods,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote {scope} profile {}", path.display());
        if let Some(name) = template {
            println!("template: {name}");
        }
        if profile.mods.is_empty() {
            println!("no mods yet; add some with `modbox add <mod>`");
        }
        if scope == ProfileScope::Project && !ctx.layout.global_profile().exists() {
            println!("note: project layers build on the global profile; run `modbox init --global`");
        }
    }
    Ok(EXIT_SUCCESS)
}

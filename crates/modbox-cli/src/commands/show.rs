use super::{json_pretty, plan_target, Context, EXIT_SUCCESS};
use console::Style;
use modbox_core::Layer;

pub fn run(ctx: &Context, global: bool) -> Result<u8, String> {
    let scope = Context::scope(global);
    let profile = ctx.load_profile(scope)?;
    let base = ctx.load_base(scope)?;
    let engine = ctx.engine()?;
    let plan = engine
        .plan(&profile, plan_target(base.as_ref()))
        .map_err(|e| e.to_string())?;

    if ctx.json {
        let parent = match &plan.layer {
            Layer::Standalone => None,
            Layer::Dependent { parent_image } => Some(parent_image.as_str()),
        };
        let payload = serde_json::json!({
            "scope": scope,
            "parent_image": parent,
            "selected_os": plan.selected_os,
            "mods": plan.resolved,
            "base": plan.base.as_ref().map(|b| b.ids()),
            "inherited": plan.inherited,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    let dim = Style::new().dim();
    match &plan.layer {
        Layer::Standalone => match &plan.selected_os {
            Some(os) => println!("{scope} profile, standalone image on {os}"),
            None => println!("{scope} profile, standalone image without an os mod"),
        },
        Layer::Dependent { parent_image } => {
            println!("{scope} profile, layer on top of {parent_image}");
        }
    }

    if plan.resolved.is_empty() {
        println!("nothing to install");
    }
    let requested = profile.mod_ids();
    for (i, m) in plan.resolved.iter().enumerate() {
        let note = if requested.contains(&m.id) {
            String::new()
        } else {
            dim.apply_to("  (dependency)").to_string()
        };
        println!("{:>3}. {:<22} {}{note}", i + 1, m.id, m.description);
    }
    for id in &plan.inherited {
        println!("     {}", dim.apply_to(format!("{id} (already in base)")));
    }
    Ok(EXIT_SUCCESS)
}

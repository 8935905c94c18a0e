use super::{json_pretty, Context, EXIT_SUCCESS};
use console::Style;
use modbox_core::ModSource;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ModEntry {
    id: String,
    category: String,
    source: Option<ModSource>,
    description: String,
    requires: Vec<String>,
    provides: Vec<String>,
}

pub fn run(ctx: &Context) -> Result<u8, String> {
    let registry = ctx.layout.registry();
    let listing = registry.list_all().map_err(|e| e.to_string())?;

    let mut entries = Vec::new();
    for (category, ids) in &listing {
        for id in ids {
            let (description, requires, provides) = match registry.load(id) {
                Ok(m) => (m.description, m.requires, m.provides),
                Err(e) => (format!("(invalid: {e})"), Vec::new(), Vec::new()),
            };
            entries.push(ModEntry {
                id: id.to_string(),
                category: category.clone(),
                source: registry.source_of(id),
                description,
                requires,
                provides,
            });
        }
    }

    if ctx.json {
        println!("{}", json_pretty(&entries)?);
        return Ok(EXIT_SUCCESS);
    }

    let heading = Style::new().bold();
    let dim = Style::new().dim();
    let mut current: Option<&str> = None;
    for entry in &entries {
        if current != Some(entry.category.as_str()) {
            if current.is_some() {
                println!();
            }
            println!("{}", heading.apply_to(&entry.category));
            current = Some(entry.category.as_str());
        }
        let source = entry
            .source
            .filter(|s| *s != ModSource::Builtin)
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        println!("  {:<22} {}{}", entry.id, entry.description, source);
        if !entry.requires.is_empty() {
            println!(
                "  {:<22} {}",
                "",
                dim.apply_to(format!("requires: {}", entry.requires.join(", ")))
            );
        }
    }
    Ok(EXIT_SUCCESS)
}

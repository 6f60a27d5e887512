use anyhow::Result;
use crate::context::Context;

/// Affiche un document, ou la valeur à un chemin imbriqué
pub fn execute(context: &Context, key: &str, path: Option<&str>) -> Result<()> {
    let store = context.store();
    let value = match path {
        Some(path) => context.block_on(store.get_at(key, path))?,
        None => context.block_on(store.get(key))?,
    };

    match value {
        Some(value) => println!("{}", context.formatter().format_document(&value)?),
        None => {
            let location = path.map(|p| format!(" à `{}`", p)).unwrap_or_default();
            println!("{}", context.formatter().format_info(&format!("Aucune donnée pour `{}`{}", key, location)));
        }
    }

    Ok(())
}

use anyhow::Result;
use serde_json::Value;
use crate::context::Context;
use crate::utils::error::CliError;

/// Fusionne une valeur JSON dans un document (éventuellement à un chemin)
pub fn execute(context: &Context, key: &str, raw: &str, path: Option<&str>) -> Result<()> {
    let value: Value = serde_json::from_str(raw).map_err(CliError::InvalidJson)?;

    let store = context.store();
    match path {
        Some(path) => context.block_on(store.set_at(key, path, &value))?,
        None => context.block_on(store.set(key, &value))?,
    };

    let location = path.map(|p| format!(" à `{}`", p)).unwrap_or_default();
    println!("{}", context.formatter().format_success(&format!("Données enregistrées dans `{}`{}", key, location)));

    Ok(())
}

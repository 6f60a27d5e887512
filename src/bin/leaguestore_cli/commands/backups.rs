use anyhow::Result;
use crate::context::Context;

/// Affiche l'état des sauvegardes, globalement ou pour une clé
pub fn execute(context: &Context, key: Option<&str>) -> Result<()> {
    let store = context.store();

    match key {
        Some(key) => {
            let names = context.block_on(store.list_backups(key))?;
            if names.is_empty() {
                println!("{}", context.formatter().format_info(&format!("Aucune sauvegarde pour `{}`", key)));
            } else {
                println!("{}", context.formatter().format_list(&names)?);
            }
        }
        None => {
            let status = context.block_on(store.backup_status())?;
            println!("{}", context.formatter().format_backups(&status)?);
        }
    }

    Ok(())
}

use anyhow::Result;
use crate::context::Context;

/// Restaure un document depuis une sauvegarde nommée
pub fn execute(context: &Context, key: &str, backup: &str) -> Result<()> {
    let restored = context.block_on(context.store().restore_from_backup(key, backup))?;

    if restored {
        println!("{}", context.formatter().format_success(&format!("`{}` restauré depuis {}", key, backup)));
    } else {
        println!("{}", context.formatter().format_error(&format!("Impossible de restaurer `{}` depuis {}", key, backup)));
    }

    Ok(())
}

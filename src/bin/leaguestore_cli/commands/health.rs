use anyhow::Result;
use crate::context::Context;

/// Vérifie l'intégrité de la base et récupère les fichiers corrompus
pub fn execute(context: &Context) -> Result<()> {
    let report = context.block_on(context.store().verify_integrity());
    println!("{}", context.formatter().format_report(&report)?);
    Ok(())
}

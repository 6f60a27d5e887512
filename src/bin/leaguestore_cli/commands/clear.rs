use anyhow::Result;
use crate::context::Context;
use crate::utils::error::CliError;

/// Supprime tous les documents; sauvegardes et verrous sont conservés
pub fn execute(context: &Context, confirmed: bool) -> Result<()> {
    if !confirmed {
        return Err(CliError::ConfirmationRequired("supprimer TOUTES les données".to_string()).into());
    }

    let deleted = context.block_on(context.store().clear_all())?;
    println!("{}", context.formatter().format_success(&format!("{} documents supprimés", deleted)));
    println!("{}", context.formatter().format_info("Les sauvegardes et les verrous ont été conservés"));

    Ok(())
}

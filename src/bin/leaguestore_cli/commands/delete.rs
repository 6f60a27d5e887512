use anyhow::Result;
use leaguestore::DeleteOutcome;
use crate::context::Context;
use crate::utils::error::CliError;

/// Supprime un document entier (avec confirmation) ou une valeur imbriquée
pub fn execute(context: &Context, key: &str, path: Option<&str>, confirmed: bool) -> Result<()> {
    let store = context.store();

    let outcome = match path {
        Some(path) => context.block_on(store.delete_at(key, path))?,
        None => {
            if !confirmed {
                return Err(CliError::ConfirmationRequired(format!("supprimer le document `{}`", key)).into());
            }
            context.block_on(store.delete(key))?
        }
    };

    let target = match path {
        Some(path) => format!("`{}` à `{}`", key, path),
        None => format!("`{}`", key),
    };

    match outcome {
        Some(DeleteOutcome::Removed) | Some(DeleteOutcome::Updated(_)) => {
            println!("{}", context.formatter().format_success(&format!("{} supprimé", target)));
        }
        None => {
            println!("{}", context.formatter().format_info(&format!("Rien à supprimer pour {}", target)));
        }
    }

    Ok(())
}

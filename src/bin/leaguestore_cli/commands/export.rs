use std::path::Path;
use anyhow::Result;
use crate::context::Context;
use crate::utils::error::CliError;

/// Exporte toute la base dans un seul fichier JSON
pub fn execute(context: &Context, output: Option<&Path>) -> Result<()> {
    let written = context
        .block_on(context.store().export_all(output))
        .ok_or(CliError::ExportFailed)?;

    println!("{}", context.formatter().format_success(&format!("Base exportée dans {}", written.display())));

    Ok(())
}

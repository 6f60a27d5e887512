use anyhow::Result;
use crate::context::Context;
use crate::formatters::{summarize, KeyEntry};

/// Liste les documents avec un résumé de leur contenu
pub fn execute(context: &Context, prefix: Option<&str>) -> Result<()> {
    let store = context.store();
    let documents = match prefix {
        Some(prefix) => context.block_on(store.get_prefix(prefix))?,
        None => context.block_on(store.get_all())?,
    };

    let entries: Vec<KeyEntry> = documents
        .iter()
        .map(|(key, doc)| KeyEntry {
            key: key.clone(),
            summary: summarize(Some(doc)),
        })
        .collect();

    println!("{}", context.formatter().format_keys(&entries)?);

    Ok(())
}

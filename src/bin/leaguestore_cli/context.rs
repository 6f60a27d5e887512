use std::future::Future;
use anyhow::{Result, anyhow};
use tokio::runtime::Runtime;
use leaguestore::{DocumentStore, StoreConfig};
use crate::formatters::{OutputFormat, Formatter};
use crate::formatters::text::TextFormatter;
use crate::formatters::json::JsonFormatter;
use crate::formatters::table::TableFormatter;

/// Contexte d'exécution du CLI
pub struct Context {
    /// Base de documents ouverte
    store: DocumentStore,

    /// Format de sortie
    format: OutputFormat,

    /// Formateur actuel
    formatter: Box<dyn Formatter>,

    /// Runtime Tokio pour les appels asynchrones
    runtime: Runtime,
}

impl Context {
    /// Ouvre la base et prépare le formateur
    pub fn new(config: StoreConfig, format: OutputFormat) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| anyhow!("Failed to create Tokio runtime: {}", e))?;

        let store = runtime.block_on(DocumentStore::open(config))?;

        Ok(Context {
            store,
            format,
            formatter: formatter_for(format),
            runtime,
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Exécute une opération asynchrone sur le runtime du contexte
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Change le format de sortie
    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
        self.formatter = formatter_for(format);
    }
}

fn formatter_for(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new()),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
        OutputFormat::Table => Box::new(TableFormatter::new()),
    }
}

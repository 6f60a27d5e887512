use std::collections::BTreeMap;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use leaguestore::{BackupInfo, IntegrityReport};

/// Une clé accompagnée du résumé de son document
#[derive(Debug, Clone, Serialize)]
pub struct KeyEntry {
    pub key: String,
    pub summary: String,
}

/// Trait définissant un formateur de sortie
pub trait Formatter {
    /// Formate un document ou une valeur imbriquée
    fn format_document(&self, value: &Value) -> Result<String>;

    /// Formate la liste des clés avec leur résumé
    fn format_keys(&self, entries: &[KeyEntry]) -> Result<String>;

    /// Formate une liste de noms (sauvegardes, etc.)
    fn format_list(&self, items: &[String]) -> Result<String>;

    /// Formate le rapport d'intégrité
    fn format_report(&self, report: &IntegrityReport) -> Result<String>;

    /// Formate l'état des sauvegardes par clé
    fn format_backups(&self, status: &BTreeMap<String, BackupInfo>) -> Result<String>;

    /// Formate un message d'erreur
    fn format_error(&self, error: &str) -> String;

    /// Formate un message d'information
    fn format_info(&self, info: &str) -> String;

    /// Formate un message de succès
    fn format_success(&self, success: &str) -> String;
}

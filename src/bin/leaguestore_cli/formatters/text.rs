use std::collections::BTreeMap;
use anyhow::Result;
use colored::*;
use serde_json::Value;
use leaguestore::{BackupInfo, IntegrityReport};
use crate::formatters::{Formatter, KeyEntry, MAX_LISTED_ERRORS};

/// Formateur au format texte
pub struct TextFormatter {
    /// Indique si les couleurs sont activées
    colored: bool,
}

impl TextFormatter {
    /// Crée un nouveau formateur texte
    pub fn new() -> Self {
        TextFormatter {
            colored: true,
        }
    }

    /// Désactive les couleurs
    #[allow(dead_code)]
    pub fn without_colors() -> Self {
        TextFormatter {
            colored: false,
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.colored {
            format!("{}", text.bold())
        } else {
            text.to_string()
        }
    }
}

impl Formatter for TextFormatter {
    fn format_document(&self, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Array(_) | Value::Object(_) => Ok(serde_json::to_string_pretty(value)?),
            other => Ok(other.to_string()),
        }
    }

    fn format_keys(&self, entries: &[KeyEntry]) -> Result<String> {
        if entries.is_empty() {
            return Ok("Aucune clé trouvée: le répertoire `database/` est vide.".to_string());
        }

        let lines: Vec<String> = entries
            .iter()
            .map(|e| format!("{}  {}", self.heading(&e.key), e.summary))
            .collect();
        Ok(lines.join("\n"))
    }

    fn format_list(&self, items: &[String]) -> Result<String> {
        Ok(items.join("\n"))
    }

    fn format_report(&self, report: &IntegrityReport) -> Result<String> {
        let mut out = vec![
            self.heading("Vérification de la base"),
            format!("Fichiers vérifiés:   {}", report.checked),
            format!("Fichiers corrompus:  {}", report.corrupted),
            format!("Fichiers récupérés:  {}", report.recovered),
        ];

        if !report.degraded_reads.is_empty() {
            out.push(format!("Lectures dégradées:  {}", report.degraded_reads.join(", ")));
        }

        if report.removed_temp_files > 0 {
            out.push(format!("Fichiers temporaires supprimés: {}", report.removed_temp_files));
        }

        if report.errors.is_empty() {
            out.push(self.format_success("Toutes les bases sont saines"));
        } else {
            out.push(self.heading("Erreurs:"));
            for error in report.errors.iter().take(MAX_LISTED_ERRORS) {
                out.push(format!("  {}", self.format_error(error)));
            }
            if report.errors.len() > MAX_LISTED_ERRORS {
                out.push(format!("  ... et {} de plus", report.errors.len() - MAX_LISTED_ERRORS));
            }
        }

        Ok(out.join("\n"))
    }

    fn format_backups(&self, status: &BTreeMap<String, BackupInfo>) -> Result<String> {
        if status.is_empty() {
            return Ok("Aucune sauvegarde trouvée".to_string());
        }

        let mut out = Vec::new();
        for (key, info) in status {
            out.push(self.heading(key));
            out.push(format!("  Nombre:   {}", info.count));
            out.push(format!("  Récente:  {}", info.latest.as_deref().unwrap_or("Aucune")));
            out.push(format!("  Ancienne: {}", info.oldest.as_deref().unwrap_or("Aucune")));
        }
        Ok(out.join("\n"))
    }

    fn format_error(&self, error: &str) -> String {
        if self.colored {
            format!("{}", error.red().bold())
        } else {
            format!("Erreur: {}", error)
        }
    }

    fn format_info(&self, info: &str) -> String {
        if self.colored {
            format!("{}", info.blue())
        } else {
            format!("Info: {}", info)
        }
    }

    fn format_success(&self, success: &str) -> String {
        if self.colored {
            format!("{}", success.green().bold())
        } else {
            format!("Succès: {}", success)
        }
    }
}

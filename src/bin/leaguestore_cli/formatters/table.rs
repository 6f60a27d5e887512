use std::collections::BTreeMap;
use anyhow::Result;
use colored::*;
use prettytable::{Table, Row, Cell};
use serde_json::Value;
use leaguestore::{BackupInfo, IntegrityReport};
use crate::formatters::{Formatter, KeyEntry, MAX_LISTED_ERRORS, type_name, truncate};

/// Formateur au format tableau
pub struct TableFormatter {
    /// Indique si les couleurs sont activées
    colored: bool,
}

impl TableFormatter {
    /// Crée un nouveau formateur tableau
    pub fn new() -> Self {
        TableFormatter {
            colored: true,
        }
    }

    /// Désactive les couleurs
    #[allow(dead_code)]
    pub fn without_colors() -> Self {
        TableFormatter {
            colored: false,
        }
    }
}

/// Valeur d'une cellule: scalaires affichés, structures résumées
fn cell_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("\"{}\"", truncate(s, 50)),
        Value::Array(items) => format!("[{} éléments]", items.len()),
        Value::Object(map) => format!("{{{} clés}}", map.len()),
    }
}

fn header(cells: &[&str]) -> Row {
    Row::new(cells.iter().map(|c| Cell::new(c)).collect())
}

impl Formatter for TableFormatter {
    fn format_document(&self, value: &Value) -> Result<String> {
        let mut table = Table::new();

        match value {
            Value::Object(map) => {
                table.add_row(header(&["Clé", "Type", "Valeur"]));
                for (key, item) in map {
                    table.add_row(Row::new(vec![
                        Cell::new(key),
                        Cell::new(type_name(item)),
                        Cell::new(&cell_value(item)),
                    ]));
                }
            }
            Value::Array(items) => {
                table.add_row(header(&["Index", "Type", "Valeur"]));
                for (i, item) in items.iter().enumerate() {
                    table.add_row(Row::new(vec![
                        Cell::new(&i.to_string()),
                        Cell::new(type_name(item)),
                        Cell::new(&cell_value(item)),
                    ]));
                }
            }
            scalar => {
                table.add_row(header(&["Type", "Valeur"]));
                table.add_row(Row::new(vec![
                    Cell::new(type_name(scalar)),
                    Cell::new(&cell_value(scalar)),
                ]));
            }
        }

        Ok(table.to_string())
    }

    fn format_keys(&self, entries: &[KeyEntry]) -> Result<String> {
        let mut table = Table::new();
        table.add_row(header(&["Clé", "Résumé"]));
        for entry in entries {
            table.add_row(Row::new(vec![Cell::new(&entry.key), Cell::new(&entry.summary)]));
        }
        Ok(table.to_string())
    }

    fn format_list(&self, items: &[String]) -> Result<String> {
        let mut table = Table::new();
        table.add_row(header(&["#", "Nom"]));
        for (i, item) in items.iter().enumerate() {
            table.add_row(Row::new(vec![Cell::new(&(i + 1).to_string()), Cell::new(item)]));
        }
        Ok(table.to_string())
    }

    fn format_report(&self, report: &IntegrityReport) -> Result<String> {
        let mut table = Table::new();
        table.add_row(header(&["Mesure", "Valeur"]));
        table.add_row(Row::new(vec![Cell::new("Fichiers vérifiés"), Cell::new(&report.checked.to_string())]));
        table.add_row(Row::new(vec![Cell::new("Fichiers corrompus"), Cell::new(&report.corrupted.to_string())]));
        table.add_row(Row::new(vec![Cell::new("Fichiers récupérés"), Cell::new(&report.recovered.to_string())]));
        table.add_row(Row::new(vec![
            Cell::new("Lectures dégradées"),
            Cell::new(&report.degraded_reads.join(", ")),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Fichiers temporaires supprimés"),
            Cell::new(&report.removed_temp_files.to_string()),
        ]));

        let mut errors: Vec<String> = report.errors.iter().take(MAX_LISTED_ERRORS).cloned().collect();
        if report.errors.len() > MAX_LISTED_ERRORS {
            errors.push(format!("... et {} de plus", report.errors.len() - MAX_LISTED_ERRORS));
        }
        let status = if errors.is_empty() {
            "Toutes les bases sont saines".to_string()
        } else {
            errors.join("\n")
        };
        table.add_row(Row::new(vec![Cell::new("Statut"), Cell::new(&status)]));

        Ok(table.to_string())
    }

    fn format_backups(&self, status: &BTreeMap<String, BackupInfo>) -> Result<String> {
        let mut table = Table::new();
        table.add_row(header(&["Clé", "Nombre", "Plus récente", "Plus ancienne"]));
        for (key, info) in status {
            table.add_row(Row::new(vec![
                Cell::new(key),
                Cell::new(&info.count.to_string()),
                Cell::new(info.latest.as_deref().unwrap_or("Aucune")),
                Cell::new(info.oldest.as_deref().unwrap_or("Aucune")),
            ]));
        }
        Ok(table.to_string())
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

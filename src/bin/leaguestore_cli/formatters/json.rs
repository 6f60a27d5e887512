use std::collections::BTreeMap;
use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use leaguestore::{BackupInfo, IntegrityReport};
use crate::formatters::{Formatter, KeyEntry};

/// Formateur au format JSON
pub struct JsonFormatter {
    /// Indique si l'indentation est activée
    pretty: bool,
}

impl JsonFormatter {
    /// Crée un nouveau formateur JSON
    pub fn new() -> Self {
        JsonFormatter {
            pretty: true,
        }
    }

    /// Désactive l'indentation
    #[allow(dead_code)]
    pub fn without_pretty() -> Self {
        JsonFormatter {
            pretty: false,
        }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }

    fn message(&self, kind: &str, text: &str) -> String {
        let mut map = serde_json::Map::new();
        map.insert(kind.to_string(), Value::String(text.to_string()));
        self.render(&map)
            .unwrap_or_else(|_| json!({ kind: text }).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_document(&self, value: &Value) -> Result<String> {
        self.render(value)
    }

    fn format_keys(&self, entries: &[KeyEntry]) -> Result<String> {
        self.render(entries)
    }

    fn format_list(&self, items: &[String]) -> Result<String> {
        self.render(items)
    }

    fn format_report(&self, report: &IntegrityReport) -> Result<String> {
        self.render(report)
    }

    fn format_backups(&self, status: &BTreeMap<String, BackupInfo>) -> Result<String> {
        self.render(status)
    }

    fn format_error(&self, error: &str) -> String {
        self.message("error", error)
    }

    fn format_info(&self, info: &str) -> String {
        self.message("info", info)
    }

    fn format_success(&self, success: &str) -> String {
        self.message("success", success)
    }
}

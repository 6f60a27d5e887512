pub mod formatter;
pub mod text;
pub mod json;
pub mod table;

pub use formatter::{Formatter, KeyEntry};
use clap::ValueEnum;
use serde_json::Value;

/// Formats de sortie disponibles
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Format texte
    Text,

    /// Format JSON
    Json,

    /// Format tableau
    Table,
}

/// Nombre d'erreurs affichées avant de résumer le reste
pub const MAX_LISTED_ERRORS: usize = 5;

/// Résumé court d'un document pour les listes de clés
pub fn summarize(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "vide".to_string(),
        Some(Value::Object(map)) => {
            let preview: Vec<&str> = map.keys().take(5).map(String::as_str).collect();
            let suffix = if map.len() > 5 {
                format!(", +{}", map.len() - 5)
            } else {
                String::new()
            };
            format!("objet ({} clés: {}{})", map.len(), preview.join(", "), suffix)
        }
        Some(Value::Array(items)) => format!("liste ({} éléments)", items.len()),
        Some(Value::String(s)) => format!("texte: {}", truncate(s, 40)),
        Some(other) => format!("{}: {}", type_name(other), truncate(&other.to_string(), 40)),
    }
}

/// Nom lisible du type JSON
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Tronque une chaîne sur une frontière de caractère
pub fn truncate(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        return s.to_string();
    }
    let cut: String = s.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", cut)
}

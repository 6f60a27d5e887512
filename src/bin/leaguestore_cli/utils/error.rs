use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("JSON invalide: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Confirmation requise: relancez avec --yes pour {0}")]
    ConfirmationRequired(String),

    #[error("Commande inconnue: {0}")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Échec de l'export de la base de données")]
    ExportFailed,
}

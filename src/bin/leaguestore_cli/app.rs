use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use leaguestore::StoreConfig;

use crate::commands;
use crate::context::Context;
use crate::formatters::OutputFormat;
use crate::repl::Repl;

#[derive(Parser)]
#[command(name = "leaguestore")]
#[command(about = "Outil de maintenance de la base JSON de la ligue", long_about = None)]
pub struct Cli {
    /// Niveau de verbosité
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Format de sortie (text, json, table)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Répertoire contenant `database/` (sinon LEAGUESTORE_DIR ou le répertoire courant)
    #[arg(short, long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Commande à exécuter
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Afficher un document ou une valeur imbriquée
    Get {
        key: String,
        /// Chemin imbriqué, ex. 123/456/contract
        path: Option<String>,
    },

    /// Fusionner du JSON dans un document
    Set {
        key: String,
        /// Valeur JSON
        value: String,
        /// Chemin où fusionner la valeur
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Supprimer un document ou une valeur imbriquée
    Delete {
        key: String,
        path: Option<String>,
        /// Confirmer la suppression d'un document entier
        #[arg(long)]
        yes: bool,
    },

    /// Lister les documents
    Keys {
        /// Préfixe pour filtrer les clés
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Vérifier l'intégrité et récupérer les fichiers corrompus
    Health,

    /// Afficher les sauvegardes
    Backups {
        /// Limiter à une clé
        key: Option<String>,
    },

    /// Exporter toute la base dans un seul fichier JSON
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restaurer un document depuis une sauvegarde
    Restore {
        key: String,
        /// Nom du fichier de sauvegarde
        backup: String,
    },

    /// Supprimer tous les documents (les sauvegardes sont conservées)
    Clear {
        #[arg(long)]
        yes: bool,
    },

    /// Mode interactif
    Shell,
}

/// Exécute l'application CLI
pub fn run(cli: Cli) -> Result<()> {
    let mut config = StoreConfig::from_env()?;
    if let Some(dir) = cli.base_dir {
        config = config.with_base_dir(dir);
    }

    let context = Context::new(config, cli.format)?;

    match cli.command {
        Commands::Get { key, path } => commands::get::execute(&context, &key, path.as_deref()),
        Commands::Set { key, value, path } => {
            commands::set::execute(&context, &key, &value, path.as_deref())
        }
        Commands::Delete { key, path, yes } => {
            commands::delete::execute(&context, &key, path.as_deref(), yes)
        }
        Commands::Keys { prefix } => commands::keys::execute(&context, prefix.as_deref()),
        Commands::Health => commands::health::execute(&context),
        Commands::Backups { key } => commands::backups::execute(&context, key.as_deref()),
        Commands::Export { output } => commands::export::execute(&context, output.as_deref()),
        Commands::Restore { key, backup } => commands::restore::execute(&context, &key, &backup),
        Commands::Clear { yes } => commands::clear::execute(&context, yes),
        Commands::Shell => Repl::new(context).run(),
    }
}

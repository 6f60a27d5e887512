mod history;

use std::path::PathBuf;
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use crate::commands;
use crate::context::Context;
use crate::formatters::OutputFormat;
use crate::utils::error::CliError;
use self::history::History;

const HISTORY_FILE: &str = ".leaguestore_history";
const CLEAR_CONFIRMATION: &str = "CLEAR ALL DATA";

/// Mode interactif (REPL)
pub struct Repl {
    /// Contexte d'exécution
    context: Context,

    /// Historique persistant
    history: History,
}

impl Repl {
    /// Crée un nouveau REPL
    pub fn new(context: Context) -> Self {
        let history_path: PathBuf = context.store().config().base_dir.join(HISTORY_FILE);
        let mut history = History::new(history_path, 1000);

        // Charger l'historique s'il existe
        let _ = history.load();

        Repl { context, history }
    }

    /// Exécute le REPL
    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        for cmd in self.history.get_all() {
            let _ = editor.add_history_entry(cmd.as_str());
        }

        println!("{}", self.context.formatter().format_info("leaguestore - mode interactif"));
        println!("{}", self.context.formatter().format_info("Tapez .help pour l'aide ou .exit pour quitter"));

        loop {
            match editor.readline("leaguestore> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    self.history.add(&line);

                    match self.process_line(&mut editor, line.trim()) {
                        Ok(true) => continue,
                        Ok(false) => break,
                        Err(e) => println!("{}", self.context.formatter().format_error(&e.to_string())),
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    println!("Interruption (Ctrl-C)");
                    continue;
                },
                Err(ReadlineError::Eof) => {
                    println!("Fin de l'entrée (Ctrl-D)");
                    break;
                },
                Err(err) => {
                    println!("{}", self.context.formatter().format_error(&format!("Erreur: {}", err)));
                    break;
                }
            }
        }

        self.history.save()?;

        Ok(())
    }

    /// Traite une ligne; `false` pour quitter
    fn process_line(&mut self, editor: &mut DefaultEditor, line: &str) -> Result<bool> {
        if line.is_empty() {
            return Ok(true);
        }

        if let Some(special) = line.strip_prefix('.') {
            return self.process_special_command(special);
        }

        let (verb, rest) = split_word(line);
        let context = &self.context;

        match verb {
            "get" => {
                let (key, path) = split_word(rest);
                require(key, "get <clé> [chemin]")?;
                commands::get::execute(context, key, non_empty(path))?;
            },
            "set" => {
                let (key, json) = split_word(rest);
                require(key, "set <clé> <json>")?;
                require(json, "set <clé> <json>")?;
                commands::set::execute(context, key, json, None)?;
            },
            "setat" => {
                let (key, rest) = split_word(rest);
                let (path, json) = split_word(rest);
                require(json, "setat <clé> <chemin> <json>")?;
                commands::set::execute(context, key, json, Some(path))?;
            },
            "delete" => {
                let (key, path) = split_word(rest);
                require(key, "delete <clé> [chemin]")?;
                let path = non_empty(path);
                let confirmed = path.is_some()
                    || confirm(editor, &format!("Supprimer le document `{}` ? (o/N) ", key), "o")?;
                if confirmed {
                    commands::delete::execute(context, key, path, true)?;
                } else {
                    println!("{}", context.formatter().format_info("Suppression annulée"));
                }
            },
            "keys" => commands::keys::execute(context, non_empty(rest))?,
            "health" => commands::health::execute(context)?,
            "backups" => commands::backups::execute(context, non_empty(rest))?,
            "export" => {
                let output = non_empty(rest).map(PathBuf::from);
                commands::export::execute(context, output.as_deref())?;
            },
            "restore" => {
                let (key, backup) = split_word(rest);
                require(backup, "restore <clé> <sauvegarde>")?;
                commands::restore::execute(context, key, backup)?;
            },
            "clear" => {
                let prompt = format!("Tapez '{}' pour confirmer: ", CLEAR_CONFIRMATION);
                if confirm(editor, &prompt, CLEAR_CONFIRMATION)? {
                    commands::clear::execute(context, true)?;
                } else {
                    println!("{}", context.formatter().format_info("Effacement de la base annulé"));
                }
            },
            other => return Err(CliError::UnknownCommand(other.to_string()).into()),
        }

        Ok(true)
    }

    /// Traite les commandes spéciales (commençant par '.')
    fn process_special_command(&mut self, cmd: &str) -> Result<bool> {
        let (name, arg) = split_word(cmd);

        match name {
            "help" => self.print_help(),
            "exit" | "quit" => {
                println!("Au revoir !");
                return Ok(false);
            },
            "format" => {
                let format = match arg {
                    "text" => OutputFormat::Text,
                    "json" => OutputFormat::Json,
                    "table" => OutputFormat::Table,
                    _ => return Err(CliError::Usage(".format <text|json|table>".to_string()).into()),
                };
                self.context.set_format(format);
                println!("{}", self.context.formatter().format_success(&format!("Format défini à {:?}", self.context.format())));
            },
            "history" => {
                let commands = match non_empty(arg) {
                    Some(pattern) => self.history.search(pattern),
                    None => self.history.get_all().to_vec(),
                };

                if commands.is_empty() {
                    println!("Aucune commande dans l'historique.");
                } else {
                    for (i, cmd) in commands.iter().enumerate() {
                        println!("{}: {}", i + 1, cmd);
                    }
                }
            },
            other => return Err(CliError::UnknownCommand(format!(".{}", other)).into()),
        }

        Ok(true)
    }

    /// Affiche l'aide
    fn print_help(&self) {
        println!("Commandes disponibles:");
        println!("  get <clé> [chemin]              Affiche un document ou une valeur imbriquée");
        println!("  set <clé> <json>                Fusionne du JSON dans un document");
        println!("  setat <clé> <chemin> <json>     Fusionne du JSON à un chemin");
        println!("  delete <clé> [chemin]           Supprime un document ou une valeur");
        println!("  keys [préfixe]                  Liste les documents");
        println!("  health                          Vérifie l'intégrité de la base");
        println!("  backups [clé]                   Affiche les sauvegardes");
        println!("  export [fichier]                Exporte toute la base");
        println!("  restore <clé> <sauvegarde>      Restaure un document");
        println!("  clear                           Supprime tous les documents");
        println!("  .format <text|json|table>       Définit le format de sortie");
        println!("  .history [motif]                Affiche l'historique des commandes");
        println!("  .help                           Affiche cette aide");
        println!("  .exit, .quit                    Quitte le mode interactif");
    }
}

/// Sépare le premier mot du reste de la ligne
fn split_word(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

fn require(arg: &str, usage: &str) -> Result<()> {
    if arg.is_empty() {
        return Err(CliError::Usage(usage.to_string()).into());
    }
    Ok(())
}

fn confirm(editor: &mut DefaultEditor, prompt: &str, expected: &str) -> Result<bool> {
    match editor.readline(prompt) {
        Ok(answer) => Ok(answer.trim().eq_ignore_ascii_case(expected)),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

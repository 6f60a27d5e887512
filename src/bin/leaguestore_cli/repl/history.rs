use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use anyhow::Result;

/// Historique des commandes du mode interactif
pub struct History {
    /// Chemin du fichier d'historique
    file_path: PathBuf,

    /// Commandes en mémoire
    commands: Vec<String>,

    /// Taille maximale de l'historique
    max_size: usize,
}

impl History {
    /// Crée un nouvel historique
    pub fn new<P: Into<PathBuf>>(file_path: P, max_size: usize) -> Self {
        History {
            file_path: file_path.into(),
            commands: Vec::new(),
            max_size,
        }
    }

    /// Charge l'historique depuis le fichier, s'il existe
    pub fn load(&mut self) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }

        let reader = BufReader::new(File::open(&self.file_path)?);

        self.commands.clear();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                self.commands.push(line);
            }
        }

        if self.commands.len() > self.max_size {
            self.commands.drain(..self.commands.len() - self.max_size);
        }

        Ok(())
    }

    /// Sauvegarde l'historique dans le fichier
    pub fn save(&self) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.file_path)?;

        for cmd in &self.commands {
            writeln!(file, "{}", cmd)?;
        }

        Ok(())
    }

    /// Ajoute une commande à l'historique
    pub fn add(&mut self, command: &str) {
        let command = command.trim();
        if command.is_empty() {
            return;
        }

        // Éviter les doublons consécutifs
        if self.commands.last().map(String::as_str) == Some(command) {
            return;
        }

        self.commands.push(command.to_string());

        if self.commands.len() > self.max_size {
            self.commands.remove(0);
        }
    }

    /// Récupère toutes les commandes
    pub fn get_all(&self) -> &[String] {
        &self.commands
    }

    /// Recherche des commandes correspondant à un motif
    pub fn search(&self, pattern: &str) -> Vec<String> {
        self.commands
            .iter()
            .filter(|cmd| cmd.contains(pattern))
            .cloned()
            .collect()
    }
}

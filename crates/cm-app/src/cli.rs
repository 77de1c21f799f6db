use std::path::PathBuf;

use clap::Parser;
use cm_core::config::OutputFormat;

/// casemap — Génère des tables de correspondance de casse compressées.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier d'entrées JSON : {"legacy": [...], "unicode": [...]}.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Construire le domaine Unicode depuis les tables de casse de Rust.
    #[arg(long, default_value_t = false)]
    pub unicode_from_std: bool,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Fichier de sortie. Défaut : sortie standard.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Format de sortie : json, bincode (remplace la configuration).
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Désactiver la recherche parallèle.
    #[arg(long, default_value_t = false)]
    pub sequential: bool,

    /// Un échec de vérification est journalisé au lieu d'être fatal.
    #[arg(long, default_value_t = false)]
    pub no_check: bool,

    /// Calculer et vérifier les tables sans rien écrire.
    #[arg(long, default_value_t = false)]
    pub dry: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one input source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or both sources are specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        match (self.input.is_some(), self.unicode_from_std) {
            (true, true) => anyhow::bail!(
                "Une seule source d'entrées à la fois. Spécifiez --input OU --unicode-from-std."
            ),
            (false, false) => anyhow::bail!(
                "Aucune source d'entrées spécifiée. Utilisez --input ou --unicode-from-std."
            ),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_source() {
        let cli = Cli::parse_from(["casemap-tables", "--input", "entries.json"]);
        assert!(cli.validate_source().is_ok());
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));

        let both = Cli::parse_from(["casemap-tables", "--input", "e.json", "--unicode-from-std"]);
        assert!(both.validate_source().is_err());

        let none = Cli::parse_from(["casemap-tables"]);
        assert!(none.validate_source().is_err());
    }

    #[test]
    fn format_override_parses() {
        let cli = Cli::parse_from(["casemap-tables", "--unicode-from-std", "--format", "bincode"]);
        assert_eq!(cli.format, Some(OutputFormat::Bincode));
        assert!(Cli::try_parse_from(["casemap-tables", "--format", "xml"]).is_err());
    }
}

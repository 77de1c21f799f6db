use anyhow::Result;
use clap::Parser;
use cm_core::config::CompressionConfig;
use cm_core::input::InputEntries;

pub mod cli;
pub mod generate;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config et appliquer les overrides CLI
    let config = resolve_config(&cli)?;

    // 5. Charger les entrées
    let input = load_input(&cli)?;

    // 6. Rechercher, vérifier, écrire
    generate::run(&input, &config, cli.output.as_deref(), cli.dry)
}

/// Resolve config: file (or defaults), then CLI overrides.
fn resolve_config(cli: &cli::Cli) -> Result<CompressionConfig> {
    let mut config = if cli.config.exists() {
        cm_core::config::load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        CompressionConfig::default()
    };
    if cli.sequential {
        config.parallel = false;
    }
    if cli.no_check {
        config.check_error = false;
    }
    if let Some(format) = cli.format {
        config.output_format = format;
    }
    Ok(config)
}

/// Load entries from --input or from the standard library's case tables.
fn load_input(cli: &cli::Cli) -> Result<InputEntries> {
    if let Some(ref path) = cli.input {
        cm_core::input::load_entries(path)
    } else {
        log::info!("Domaine Unicode construit depuis les tables de casse de Rust...");
        Ok(InputEntries {
            legacy: None,
            unicode: Some(cm_core::unicode::unicode_entries_from_std()?),
        })
    }
}

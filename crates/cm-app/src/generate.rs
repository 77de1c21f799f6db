use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use cm_core::config::{CompressionConfig, OutputFormat};
use cm_core::entry::Domain;
use cm_core::error::TableError;
use cm_core::input::{DomainEntries, InputEntries};
use cm_table::{CaseMappingTables, Optimizer, Solution, verify};

/// Recherche puis vérifie la meilleure table d'un domaine.
///
/// Returns `None` when verification fails and `check_error` is off.
///
/// # Errors
/// Returns an error if the search is exhausted, or if verification fails
/// while `check_error` is on.
pub fn solve_domain(entries: &DomainEntries, config: &CompressionConfig) -> Result<Option<Solution>> {
    let domain = entries.domain;
    let (solution, report) = Optimizer::from_config(config)
        .optimize(entries)
        .with_context(|| format!("Recherche échouée pour {domain}"))?;
    log::info!(
        "{domain} : {} candidats réalisables, {} bits au lieu de {} ({:.1} %)",
        report.feasible_count(),
        solution.total(),
        report.bound,
        100.0 * solution.total() as f64 / report.bound as f64
    );
    let verified = check_verification(domain, verify(&solution, entries), config.check_error)?;
    Ok(verified.then_some(solution))
}

/// Apply the `check_error` policy to a verification result.
fn check_verification(
    domain: Domain,
    result: Result<(), TableError>,
    check_error: bool,
) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if check_error => {
            Err(e).with_context(|| format!("Vérification échouée pour {domain}"))
        }
        Err(e) => {
            log::error!("Vérification échouée pour {domain} : {e}. Aucune sortie ne sera écrite.");
            Ok(false)
        }
    }
}

/// Tables de tous les domaines présents, `None` si l'un d'eux n'a pas été vérifié.
///
/// # Errors
/// Returns an error if no domain is present or a domain fails.
pub fn build_tables(
    input: &InputEntries,
    config: &CompressionConfig,
) -> Result<Option<CaseMappingTables>> {
    if input.iter().next().is_none() {
        anyhow::bail!("Aucun domaine dans les entrées.");
    }
    let solve = |d: Option<&DomainEntries>| d.map(|d| solve_domain(d, config)).transpose();
    let legacy = solve(input.legacy.as_ref())?;
    let unicode = solve(input.unicode.as_ref())?;

    // Some(None) : domaine présent mais non vérifié.
    if matches!(legacy, Some(None)) || matches!(unicode, Some(None)) {
        return Ok(None);
    }
    let tables =
        CaseMappingTables::from_solutions(legacy.flatten().as_ref(), unicode.flatten().as_ref());
    log::info!(
        "Total : {} bits ({} octets)",
        tables.total_bits(),
        tables.total_bits().div_ceil(8)
    );
    Ok(Some(tables))
}

/// Sérialise les tables dans `writer`.
///
/// # Errors
/// Returns an error if serialization or the write fails.
pub fn write_tables<W: Write>(
    tables: &CaseMappingTables,
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, tables).context("Écriture JSON échouée")?;
            writeln!(writer)?;
        }
        OutputFormat::Bincode => {
            bincode::serialize_into(&mut writer, tables).context("Écriture bincode échouée")?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Point d'entrée : construit, vérifie et écrit les tables.
///
/// Nothing is written in `dry` mode or when a domain failed verification.
///
/// # Errors
/// Returns an error if a domain fails or the output cannot be written.
pub fn run(
    input: &InputEntries,
    config: &CompressionConfig,
    output: Option<&Path>,
    dry: bool,
) -> Result<()> {
    let Some(tables) = build_tables(input, config)? else {
        log::warn!("Tables non vérifiées : rien n'est écrit.");
        return Ok(());
    };
    if dry {
        log::info!("Mode --dry : rien n'est écrit.");
        return Ok(());
    }
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Impossible de créer {}", path.display()))?;
            write_tables(&tables, config.output_format, BufWriter::new(file))?;
            log::info!("Tables écrites dans {}", path.display());
        }
        None => write_tables(&tables, config.output_format, std::io::stdout().lock())?,
    }
    Ok(())
}

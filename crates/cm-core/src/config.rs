use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Largest block-size exponent accepted for either level.
pub const MAX_BLOCK_LOG2: u32 = 12;

/// Configuration complète de la recherche et de la sortie.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use cm_core::config::CompressionConfig;
/// let config = CompressionConfig::default();
/// assert_eq!(config.data_block_range(), 1..=8);
/// assert_eq!(config.offsets_block_exponents(), vec![7, 6, 5, 4, 3, 2]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompressionConfig {
    // === Recherche ===
    /// Plus petit exposant de bloc pour le tableau de données.
    pub data_block_log2_min: u32,
    /// Plus grand exposant de bloc pour le tableau de données.
    pub data_block_log2_max: u32,
    /// Plus petit exposant de bloc pour le tableau d'offsets.
    pub offsets_block_log2_min: u32,
    /// Plus grand exposant de bloc pour le tableau d'offsets (essayé en premier).
    pub offsets_block_log2_max: u32,
    /// Paralléliser la boucle externe avec rayon.
    pub parallel: bool,

    // === Vérification ===
    /// Un échec de l'aller-retour est fatal (sinon journalisé, et rien n'est écrit).
    pub check_error: bool,

    // === Sortie ===
    /// Format du fichier de sortie.
    pub output_format: OutputFormat,
}

/// Output serialization format.
///
/// # Example
/// ```
/// use cm_core::config::OutputFormat;
/// assert_eq!(OutputFormat::default(), OutputFormat::Json);
/// assert_eq!("bincode".parse::<OutputFormat>().ok(), Some(OutputFormat::Bincode));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// bincode 1.x.
    Bincode,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "bincode" | "bin" => Ok(Self::Bincode),
            other => Err(format!("format de sortie inconnu : {other}")),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            data_block_log2_min: 1,
            data_block_log2_max: 8,
            offsets_block_log2_min: 2,
            offsets_block_log2_max: 7,
            parallel: true,
            check_error: true,
            output_format: OutputFormat::Json,
        }
    }
}

impl CompressionConfig {
    /// Clamp all exponents to their valid ranges and order the bounds.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.data_block_log2_min = self.data_block_log2_min.min(MAX_BLOCK_LOG2);
        self.data_block_log2_max = self.data_block_log2_max.min(MAX_BLOCK_LOG2);
        self.offsets_block_log2_min = self.offsets_block_log2_min.min(MAX_BLOCK_LOG2);
        self.offsets_block_log2_max = self.offsets_block_log2_max.min(MAX_BLOCK_LOG2);
        if self.data_block_log2_min > self.data_block_log2_max {
            std::mem::swap(&mut self.data_block_log2_min, &mut self.data_block_log2_max);
        }
        if self.offsets_block_log2_min > self.offsets_block_log2_max {
            std::mem::swap(
                &mut self.offsets_block_log2_min,
                &mut self.offsets_block_log2_max,
            );
        }
    }

    /// Data block exponents, in search order.
    #[must_use]
    pub fn data_block_range(&self) -> RangeInclusive<u32> {
        self.data_block_log2_min..=self.data_block_log2_max
    }

    /// Offsets block exponents, in search order (coarsest first).
    #[must_use]
    pub fn offsets_block_exponents(&self) -> Vec<u32> {
        (self.offsets_block_log2_min..=self.offsets_block_log2_max)
            .rev()
            .collect()
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    search: Option<SearchSection>,
    check: Option<CheckSection>,
    output: Option<OutputSection>,
}

/// Search section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct SearchSection {
    data_block_log2_min: Option<u32>,
    data_block_log2_max: Option<u32>,
    offsets_block_log2_min: Option<u32>,
    offsets_block_log2_max: Option<u32>,
    parallel: Option<bool>,
}

#[derive(Deserialize)]
struct CheckSection {
    enabled: Option<bool>,
}

#[derive(Deserialize)]
struct OutputSection {
    format: Option<OutputFormat>,
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the document is not valid TOML for this schema.
///
/// # Example
/// ```
/// use cm_core::config::parse_config;
/// let config = parse_config("[search]\nparallel = false\ndata_block_log2_max = 4\n").unwrap();
/// assert!(!config.parallel);
/// assert_eq!(config.data_block_range(), 1..=4);
/// ```
pub fn parse_config(content: &str) -> Result<CompressionConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = CompressionConfig::default();

    if let Some(s) = file.search {
        if let Some(v) = s.data_block_log2_min {
            config.data_block_log2_min = v;
        }
        if let Some(v) = s.data_block_log2_max {
            config.data_block_log2_max = v;
        }
        if let Some(v) = s.offsets_block_log2_min {
            config.offsets_block_log2_min = v;
        }
        if let Some(v) = s.offsets_block_log2_max {
            config.offsets_block_log2_max = v;
        }
        if let Some(v) = s.parallel {
            config.parallel = v;
        }
    }
    if let Some(v) = file.check.and_then(|c| c.enabled) {
        config.check_error = v;
    }
    if let Some(v) = file.output.and_then(|o| o.format) {
        config.output_format = v;
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use cm_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<CompressionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Configuration invalide : {}", path.display()))
}

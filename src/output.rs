// ============================================================================
// Output Writer
// ============================================================================
// Écrit les lignes calculées dans un fichier CSV par ticker :
//
//   ~/Desktop/Bloomberg_Output/{ticker}_{start}_{end}.csv
//
// CONCEPTS RUST :
// 1. csv::Writer : sérialise directement les OutputRow (serde)
// 2. PathBuf : chemins possédés, construits avec join()
// 3. create_dir_all : idempotent, plusieurs workers peuvent l'appeler
// ============================================================================

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::{DateRange, OutputRow};

/// Nom du dossier de sortie sur le bureau
pub const OUTPUT_FOLDER: &str = "Bloomberg_Output";

/// En-tête des fichiers CSV
pub const CSV_HEADER: [&str; 5] = ["ticker", "date", "nav", "aum", "flow_factor"];

/// Où écrire les fichiers de sortie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub directory: PathBuf,
}

impl OutputSettings {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// ~/Desktop/Bloomberg_Output
    pub fn desktop() -> Result<Self> {
        let home = dirs::home_dir().context("Impossible de déterminer le dossier personnel")?;
        Ok(Self::new(home.join("Desktop").join(OUTPUT_FOLDER)))
    }

    /// Crée le dossier s'il n'existe pas (sans erreur s'il existe déjà)
    pub fn ensure_directory(&self) -> Result<()> {
        std::fs::create_dir_all(&self.directory).with_context(|| {
            format!(
                "Échec de la création du dossier de sortie {}",
                self.directory.display()
            )
        })
    }

    /// Chemin complet du fichier d'un ticker
    pub fn file_path(&self, ticker: &str, range: &DateRange) -> PathBuf {
        self.directory.join(output_file_name(ticker, range))
    }
}

/// Nom du fichier de sortie : {ticker}_{start}_{end}.csv
///
/// Les séparateurs de chemin dans le ticker sont remplacés par '-'.
pub fn output_file_name(ticker: &str, range: &DateRange) -> String {
    let safe_ticker: String = ticker
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();

    format!(
        "{}_{}_{}.csv",
        safe_ticker,
        range.start_compact(),
        range.end_compact()
    )
}

/// Writer CSV d'un ticker
pub struct FlowWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: usize,
}

impl FlowWriter {
    /// Crée (ou écrase) le fichier du ticker et écrit l'en-tête
    pub fn create(settings: &OutputSettings, ticker: &str, range: &DateRange) -> Result<Self> {
        settings.ensure_directory()?;
        let path = settings.file_path(ticker, range);

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .with_context(|| format!("Impossible de créer {}", path.display()))?;
        writer
            .write_record(CSV_HEADER)
            .with_context(|| format!("Échec d'écriture dans {}", path.display()))?;

        debug!(path = %path.display(), "Output file created");
        Ok(Self {
            writer,
            path,
            rows: 0,
        })
    }

    /// Ajoute une ligne au fichier
    pub fn write_row(&mut self, row: &OutputRow) -> Result<()> {
        self.writer
            .serialize(row)
            .with_context(|| format!("Échec d'écriture dans {}", self.path.display()))?;
        self.rows += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Vide le buffer et ferme le fichier
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .with_context(|| format!("Échec d'écriture dans {}", self.path.display()))?;
        Ok(self.path)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

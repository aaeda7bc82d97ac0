// ============================================================================
// Batch Input Loader
// ============================================================================
// Lit la liste de tickers d'un fichier texte : un symbole par ligne.
// Les lignes sont nettoyées (trim) et les lignes vides ignorées.
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Extrait les tickers d'un contenu texte
pub fn parse_tickers(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lit le fichier de tickers
pub fn load_tickers(path: &Path) -> Result<Vec<String>> {
    if !has_txt_extension(path) {
        warn!(path = %path.display(), "Ticker file is not a .txt file, reading anyway");
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire le fichier de tickers {}", path.display()))?;
    let tickers = parse_tickers(&content);

    debug!(path = %path.display(), count = tickers.len(), "Ticker file loaded");
    Ok(tickers)
}

/// Vrai si le fichier porte l'extension .txt
pub fn has_txt_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

/// Remplace un "~" initial par le dossier personnel
///
/// Les chemins saisis dans le TUI ne passent pas par un shell.
pub fn expand_home(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

// ============================================================================
// Tests unitaires
// ============================================================================

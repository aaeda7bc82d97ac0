// ============================================================================
// Structure : DateRange
// ============================================================================
// Plage de dates d'une requête historique (début et fin inclus)
//
// CONCEPTS RUST :
// 1. NaiveDate : date chrono sans fuseau horaire (le service raisonne en jours)
// 2. Copy : deux NaiveDate se copient sans allocation, DateRange aussi
// 3. Aucune validation de l'ordre : le service décide quoi faire
// ============================================================================

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Format compact utilisé par le service et dans les noms de fichiers
pub const COMPACT_FORMAT: &str = "%Y%m%d";

/// Format lisible affiché dans l'interface
pub const DISPLAY_FORMAT: &str = "%Y / %m / %d";

/// Plage de dates [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse deux dates au format compact (ex: "20230101", "20230131")
    pub fn parse_compact(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_compact_date(start)?,
            end: parse_compact_date(end)?,
        })
    }

    /// Date de début au format YYYYMMDD
    pub fn start_compact(&self) -> String {
        self.start.format(COMPACT_FORMAT).to_string()
    }

    /// Date de fin au format YYYYMMDD
    pub fn end_compact(&self) -> String {
        self.end.format(COMPACT_FORMAT).to_string()
    }

    /// Vrai si le début est après la fin
    ///
    /// La plage est quand même envoyée telle quelle, on se contente d'un warning.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// Parse une date au format YYYYMMDD
pub fn parse_compact_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), COMPACT_FORMAT)
        .with_context(|| format!("Date invalide '{}' (format attendu : YYYYMMDD)", value))
}

// ============================================================================
// Tests unitaires
// ============================================================================

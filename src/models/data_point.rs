// ============================================================================
// Structures : DataPoint, OutputRow, TickerRequest
// ============================================================================
// Les entités transitoires d'une requête historique
//
// CONCEPTS RUST :
// 1. Option<f64> : le flow factor n'existe pas pour le premier point
// 2. Serialize : OutputRow est écrit directement par le writer CSV
// ============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::DateRange;

/// Un point de la série renvoyée par le service (NAV et AUM d'une journée)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub timestamp: NaiveDate,
    /// Net Asset Value (valeur liquidative par part)
    pub nav: f64,
    /// Assets Under Management (encours total du fonds)
    pub aum: f64,
}

impl DataPoint {
    pub fn new(timestamp: NaiveDate, nav: f64, aum: f64) -> Self {
        Self { timestamp, nav, aum }
    }
}

/// Ligne écrite dans le fichier CSV d'un ticker
///
/// L'ordre des champs donne l'ordre des colonnes :
/// `ticker,date,nav,aum,flow_factor`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub ticker: String,
    #[serde(rename = "date")]
    pub timestamp: NaiveDate,
    pub nav: f64,
    pub aum: f64,
    /// None pour le premier point (colonne vide dans le CSV)
    pub flow_factor: Option<f64>,
}

/// Une requête à exécuter : un symbole et sa plage de dates
///
/// Consommée une seule fois, jamais rejouée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRequest {
    pub symbol: String,
    pub range: DateRange,
}

impl TickerRequest {
    pub fn new(symbol: impl Into<String>, range: DateRange) -> Self {
        Self {
            symbol: symbol.into(),
            range,
        }
    }
}

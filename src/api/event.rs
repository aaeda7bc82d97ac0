// ============================================================================
// Requête historique et événements de réponse
// ============================================================================
// Les structures échangées avec le service de données de référence.
// Les noms JSON (camelCase) sont ceux du service : serde fait la conversion.
//
// CONCEPT RUST : #[serde(flatten)]
// - Les valeurs des champs demandés (FUND_NET_ASSET_VAL, ...) arrivent à plat
//   à côté de "date" : flatten les récupère dans une HashMap
// ============================================================================

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{DataPoint, DateRange};

/// Champ NAV demandé au service
pub const NAV_FIELD: &str = "FUND_NET_ASSET_VAL";

/// Champ AUM demandé au service
pub const AUM_FIELD: &str = "FUND_TOTAL_ASSETS";

/// Nombre maximum de points par requête
pub const MAX_DATA_POINTS: u32 = 10_000;

/// Requête HistoricalDataRequest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataRequest {
    pub securities: Vec<String>,
    pub fields: Vec<String>,
    pub periodicity_adjustment: String,
    pub periodicity_selection: String,
    pub start_date: String,
    pub end_date: String,
    pub max_data_points: u32,
}

impl HistoricalDataRequest {
    /// Requête NAV + AUM quotidienne pour un ticker
    pub fn nav_aum(ticker: &str, range: &DateRange) -> Self {
        Self {
            securities: vec![ticker.to_string()],
            fields: vec![NAV_FIELD.to_string(), AUM_FIELD.to_string()],
            periodicity_adjustment: "ACTUAL".to_string(),
            periodicity_selection: "DAILY".to_string(),
            start_date: range.start_compact(),
            end_date: range.end_compact(),
            max_data_points: MAX_DATA_POINTS,
        }
    }
}

/// Type d'un événement reçu de la session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// Morceau de réponse, d'autres vont suivre
    PartialResponse,
    /// Dernier morceau : la réponse est complète
    Response,
    /// Rien reçu pendant le délai de poll
    Timeout,
}

/// Un événement : un type et zéro ou plusieurs messages
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: EventType,
    pub messages: Vec<Message>,
}

impl Event {
    pub fn timeout() -> Self {
        Self {
            event_type: EventType::Timeout,
            messages: Vec::new(),
        }
    }

    pub fn is_final(&self) -> bool {
        self.event_type == EventType::Response
    }
}

/// Message de réponse (un par titre et par morceau)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub security_data: Option<SecurityData>,
}

/// Données d'un titre
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityData {
    pub security: String,

    #[serde(default)]
    pub field_data: Vec<FieldData>,

    /// Présent quand le titre est inconnu ou refusé
    #[serde(default)]
    pub security_error: Option<SecurityError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SecurityError {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub message: String,
}

/// Une ligne de fieldData : une date et les valeurs des champs demandés
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldData {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    #[serde(flatten)]
    pub values: HashMap<String, serde_json::Value>,
}

impl FieldData {
    /// Valeur numérique d'un champ, None si absent ou non numérique
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field)?.as_f64()
    }

    /// Convertit la ligne en DataPoint (None s'il manque la NAV ou l'AUM)
    pub fn to_data_point(&self) -> Option<DataPoint> {
        Some(DataPoint::new(
            self.date,
            self.value(NAV_FIELD)?,
            self.value(AUM_FIELD)?,
        ))
    }
}

/// Accepte "2023-01-03" comme "2023-01-03T00:00:00.000Z"
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

// ============================================================================
// Tests unitaires
// ============================================================================

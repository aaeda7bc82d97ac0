// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod calendar;   // État du calendrier (mois affiché, sélection)
pub mod data_point; // DataPoint, OutputRow, TickerRequest
pub mod date_range; // Plage de dates et formats YYYYMMDD
pub mod flow;       // Calcul du flow factor

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use navflow::models::flow::FlowTracker;
// On peut faire : use navflow::models::FlowTracker;
pub use calendar::DatePicker;
pub use data_point::{DataPoint, OutputRow, TickerRequest};
pub use date_range::DateRange;
pub use flow::{flow_factor, FlowTracker};

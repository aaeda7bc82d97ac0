// ============================================================================
// Module : api
// ============================================================================
// Tout ce qui touche au service de données de marché : le trait Session,
// ses transports (passerelle HTTP, replay) et la boucle de requête historique
// ============================================================================

pub mod bridge;     // Transport HTTP (passerelle JSON)
pub mod error;      // SessionError
pub mod event;      // Requête historique, événements, messages
pub mod historical; // Boucle requête → flow factor → CSV
pub mod replay;     // Transport replay (fichier enregistré)
pub mod session;    // Trait Session et options de connexion

// Re-export des éléments principaux
pub use bridge::{HttpSession, HttpSessionFactory};
pub use error::SessionError;
pub use event::{Event, EventType, HistoricalDataRequest};
pub use historical::{run_historical_request, RequestSummary};
pub use replay::{ReplayFactory, ReplaySession};
pub use session::{Session, SessionFactory, SessionOptions};

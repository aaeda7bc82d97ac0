// ============================================================================
// Trait : Session
// ============================================================================
// Frontière avec le service de données de marché
//
// Le protocole du fournisseur n'est pas réimplémenté : on décrit seulement
// le cycle de vie dont la boucle de requête a besoin
// (start → open_service → send_request → next_event... → stop).
//
// CONCEPTS RUST :
// 1. Traits : interface commune à plusieurs transports (HTTP, replay)
// 2. async-trait : méthodes async dans un trait utilisable en dyn
// 3. Box<dyn Session> : le driver ne connaît pas le transport concret
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;

use crate::api::error::SessionError;
use crate::api::event::{Event, HistoricalDataRequest};

/// Service de données de référence (historique)
pub const REFDATA_SERVICE: &str = "//blp/refdata";

/// Hôte par défaut du service
pub const DEFAULT_HOST: &str = "localhost";

/// Port par défaut du service
pub const DEFAULT_PORT: u16 = 8194;

/// Délai d'attente de chaque appel à next_event
pub const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Adresse du service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
}

impl SessionOptions {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// "host:port", pour les logs et les messages d'erreur
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Session avec le service de données
///
/// Une session par requête : elles ne sont jamais partagées entre workers.
#[async_trait]
pub trait Session: Send {
    /// Établit la connexion
    async fn start(&mut self) -> Result<(), SessionError>;

    /// Ouvre un service (ex: "//blp/refdata")
    async fn open_service(&mut self, service: &str) -> Result<(), SessionError>;

    /// Envoie une requête historique sur le service ouvert
    async fn send_request(&mut self, request: &HistoricalDataRequest) -> Result<(), SessionError>;

    /// Attend le prochain événement, au plus `timeout`
    ///
    /// Retourne un événement Timeout si rien n'est arrivé entre-temps.
    async fn next_event(&mut self, timeout: Duration) -> Result<Event, SessionError>;

    /// Libère les ressources de la session (idempotent)
    async fn stop(&mut self);
}

/// Fabrique de sessions : chaque worker crée la sienne
pub trait SessionFactory: Send + Sync {
    fn create(&self) -> Box<dyn Session>;
}

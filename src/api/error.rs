// ============================================================================
// Erreurs de la couche session
// ============================================================================
// CONCEPT RUST : thiserror
// - Génère Display et Error à partir des attributs #[error(...)]
// - #[from] : conversion automatique avec l'opérateur ?
// - Le reste de l'application utilise anyhow ; ici on garde des variants
//   précis car chaque étape (start, service, requête) est rapportée à part
// ============================================================================

use thiserror::Error;

/// Erreurs possibles lors d'un échange avec le service de données
#[derive(Debug, Error)]
pub enum SessionError {
    /// La session n'a pas pu démarrer (service injoignable)
    #[error("Failed to start session on {endpoint}: {reason}")]
    Start { endpoint: String, reason: String },

    /// Le service demandé n'a pas pu être ouvert
    #[error("Failed to open {0}")]
    ServiceUnavailable(String),

    /// Opération appelée avant start() / open_service()
    #[error("Session not ready: {0}")]
    NotReady(&'static str),

    /// Le service a refusé la requête
    #[error("Request rejected by service: {0}")]
    Rejected(String),

    /// Le service a répondu par une erreur sur le titre (inconnu, non autorisé)
    #[error("Security error for {security}: {category} ({message})")]
    Security {
        security: String,
        category: String,
        message: String,
    },

    /// Réponse illisible
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Erreur de transport HTTP
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// NavFlow - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;       // Session, transports, requête historique
pub mod app;       // État de l'application
pub mod config;    // Arguments de la ligne de commande
pub mod driver;    // Lancement concurrent des requêtes
pub mod input;     // Fichier de tickers
pub mod models;    // Structures de données
pub mod output;    // Écriture CSV
pub mod ui;        // Interface utilisateur

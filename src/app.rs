// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Traits : DateRangeSelector expose la plage choisie sans exposer App
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// ============================================================================

use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::Weekday;

use crate::models::{DatePicker, DateRange};

/// Nombre maximum de lignes conservées dans le journal de statut
pub const STATUS_CAPACITY: usize = 200;

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : calendrier, dates et options
    Dashboard,

    /// Mode saisie : la ligne du bas capture le texte
    /// - Enter valide, ESC annule
    InputMode,
}

/// Ce que la saisie en cours va renseigner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    /// Option 1 : un seul ticker
    Ticker,
    /// Option 2 : chemin du fichier de tickers
    TickerFile,
}

impl InputTarget {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputTarget::Ticker => "Ticker (ex: MSFT US Equity): ",
            InputTarget::TickerFile => "Ticker file (.txt): ",
        }
    }
}

/// Niveau d'une ligne du journal de statut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Ligne du journal de statut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub text: String,
}

// ============================================================================
// Trait : DateRangeSelector
// ============================================================================
// Fournit la plage de dates choisie dans l'interface. Le driver n'a besoin
// que de ça, pas de tout l'état de l'application.
// ============================================================================

/// Source d'une plage de dates (start / stop au format YYYYMMDD)
pub trait DateRangeSelector {
    /// Date de début, format compact
    fn start_date(&self) -> Option<&str>;

    /// Date de fin, format compact
    fn end_date(&self) -> Option<&str>;

    /// Plage complète, si les deux dates sont choisies et valides
    fn date_range(&self) -> Option<DateRange> {
        DateRange::parse_compact(self.start_date()?, self.end_date()?).ok()
    }
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Calendrier (semaine commençant le dimanche)
    pub picker: DatePicker,

    /// Date de début choisie, format YYYYMMDD
    pub start_date: Option<String>,

    /// Date de fin choisie, format YYYYMMDD
    pub end_date: Option<String>,

    /// Fichier de tickers choisi pour l'option 2
    pub ticker_file: Option<PathBuf>,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Cible de la saisie en cours
    pub input_target: Option<InputTarget>,

    /// Buffer de saisie (vidé après validation ou annulation)
    pub input_buffer: String,

    /// Prompt affiché en mode Input
    pub input_prompt: String,

    /// Two-step quit : première pression de 'q' = confirmation
    pub confirm_quit: bool,

    /// Une requête tourne en arrière-plan
    pub is_loading: bool,

    /// Message affiché pendant le chargement
    pub loading_message: Option<String>,

    /// Journal de statut (les plus récents à la fin)
    pub status: VecDeque<StatusLine>,
}

impl App {
    /// Crée l'application sur le mois courant
    pub fn new() -> Self {
        Self::with_picker(DatePicker::current(Weekday::Sun))
    }

    /// Crée l'application avec un calendrier donné
    pub fn with_picker(picker: DatePicker) -> Self {
        Self {
            running: true,
            picker,
            start_date: None,
            end_date: None,
            ticker_file: None,
            current_screen: Screen::Dashboard,
            input_target: None,
            input_buffer: String::new(),
            input_prompt: String::new(),
            confirm_quit: false,
            is_loading: false,
            loading_message: None,
            status: VecDeque::new(),
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Dates
    // ========================================================================

    /// Enregistre la sélection du calendrier comme date de début
    ///
    /// Retourne la date affichée ("2023 / 01 / 15"), ou None sans sélection.
    pub fn set_start_from_selection(&mut self) -> Option<String> {
        let (compact, display) = self.picker.current_selection()?;
        self.start_date = Some(compact);
        self.push_status(StatusLevel::Info, format!("Start date: {}", display));
        Some(display)
    }

    /// Enregistre la sélection du calendrier comme date de fin
    pub fn set_stop_from_selection(&mut self) -> Option<String> {
        let (compact, display) = self.picker.current_selection()?;
        self.end_date = Some(compact);
        self.push_status(StatusLevel::Info, format!("Stop date: {}", display));
        Some(display)
    }

    /// Vrai si les deux dates sont choisies
    pub fn has_date_range(&self) -> bool {
        self.date_range().is_some()
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    /// Entre en mode input pour une cible donnée
    pub fn start_input(&mut self, target: InputTarget) {
        self.current_screen = Screen::InputMode;
        self.input_target = Some(target);
        self.input_buffer.clear();
        self.input_prompt = target.prompt().to_string();
    }

    /// Annule le mode input et retourne au dashboard
    pub fn cancel_input(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.input_target = None;
        self.input_buffer.clear();
        self.input_prompt.clear();
    }

    /// Récupère la cible et la valeur saisie, puis retourne au dashboard
    pub fn submit_input(&mut self) -> Option<(InputTarget, String)> {
        let target = self.input_target.take()?;
        let value = self.input_buffer.trim().to_string();
        self.current_screen = Screen::Dashboard;
        self.input_buffer.clear();
        self.input_prompt.clear();
        Some((target, value))
    }

    /// Ajoute un caractère au buffer d'input
    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    /// Supprime le dernier caractère du buffer
    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    /// Vérifie si on est en mode input
    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }

    // ========================================================================
    // Quit / chargement
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Démarre le chargement avec un message optionnel
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    /// Termine le chargement
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    // ========================================================================
    // Journal de statut
    // ========================================================================

    /// Ajoute une ligne au journal (les plus anciennes sont supprimées)
    pub fn push_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        if self.status.len() == STATUS_CAPACITY {
            self.status.pop_front();
        }
        self.status.push_back(StatusLine {
            level,
            text: text.into(),
        });
    }

    /// Les `count` dernières lignes, de la plus ancienne à la plus récente
    pub fn recent_status(&self, count: usize) -> impl Iterator<Item = &StatusLine> {
        self.status.iter().skip(self.status.len().saturating_sub(count))
    }
}

impl DateRangeSelector for App {
    fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn january_app() -> App {
        App::with_picker(DatePicker::for_month(2023, 1, Weekday::Sun).unwrap())
    }

    #[test]
    fn test_app_creation() {
        let app = App::new();
        assert!(app.is_running());
        assert!(app.start_date.is_none());
        assert!(app.end_date.is_none());
        assert_eq!(app.picker.first_weekday(), Weekday::Sun);
    }

    #[test]
    fn test_app_quit() {
        let mut app = App::new();
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_start_and_stop_from_selection() {
        let mut app = january_app();

        // Sans sélection : rien ne change
        assert!(app.set_start_from_selection().is_none());
        assert!(app.start_date.is_none());

        app.picker.select_day(15);
        assert_eq!(app.set_start_from_selection().as_deref(), Some("2023 / 01 / 15"));
        assert_eq!(app.start_date.as_deref(), Some("20230115"));
        assert!(!app.has_date_range());

        app.picker.select_day(31);
        app.set_stop_from_selection();
        assert_eq!(app.end_date.as_deref(), Some("20230131"));

        let range = app.date_range().unwrap();
        assert_eq!(range.start_compact(), "20230115");
        assert_eq!(range.end_compact(), "20230131");
    }

    #[test]
    fn test_latest_selection_wins() {
        let mut app = january_app();
        app.picker.select_day(3);
        app.set_start_from_selection();
        app.picker.select_day(9);
        app.set_start_from_selection();
        assert_eq!(app.start_date.as_deref(), Some("20230109"));
    }

    #[test]
    fn test_input_mode() {
        let mut app = App::new();
        app.start_input(InputTarget::Ticker);
        assert!(app.is_in_input_mode());
        assert_eq!(app.input_prompt, InputTarget::Ticker.prompt());

        for c in " MSFT US Equity ".chars() {
            app.append_char(c);
        }
        app.backspace();
        app.append_char(' ');

        let (target, value) = app.submit_input().unwrap();
        assert_eq!(target, InputTarget::Ticker);
        assert_eq!(value, "MSFT US Equity");
        assert!(!app.is_in_input_mode());
        assert!(app.input_buffer.is_empty());
    }

    #[test]
    fn test_cancel_input() {
        let mut app = App::new();
        app.start_input(InputTarget::TickerFile);
        app.append_char('x');
        app.cancel_input();

        assert!(!app.is_in_input_mode());
        assert!(app.submit_input().is_none());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = App::new();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        assert!(app.is_running());
    }

    #[test]
    fn test_status_is_bounded() {
        let mut app = App::new();
        for i in 0..STATUS_CAPACITY + 5 {
            app.push_status(StatusLevel::Info, format!("line {}", i));
        }
        assert_eq!(app.status.len(), STATUS_CAPACITY);
        assert_eq!(app.status[0].text, "line 5");

        let recent: Vec<_> = app.recent_status(2).map(|l| l.text.as_str()).collect();
        assert_eq!(
            recent,
            vec![
                format!("line {}", STATUS_CAPACITY + 3),
                format!("line {}", STATUS_CAPACITY + 4)
            ]
        );
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching : une fonction prédicat par action
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Clic gauche (colonne, ligne du terminal)
    Click { column: u16, row: u16 },

    /// Tick régulier (rafraîchissement)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Crée un gestionnaire avec un tick de 250ms
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// Sans événement avant le timeout, retourne Event::Tick.
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                // Sur certains OS, on reçoit Press ET Release
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                CrosstermEvent::Mouse(mouse) => Ok(click_from_mouse(mouse).unwrap_or(Event::Tick)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Seul le clic gauche est gardé (sélection d'un jour)
pub fn click_from_mouse(mouse: MouseEvent) -> Option<Event> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Event::Click {
            column: mouse.column,
            row: mouse.row,
        }),
        _ => None,
    }
}

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Click { .. } | Event::Tick => None,
    }
}

// ============================================================================
// Prédicats : une touche → une action
// ============================================================================

/// 'q' (quitter, two-step)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Échap
pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

/// Entrée
pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

/// Entrée ou Espace : sélectionne le jour sous le curseur
pub fn is_select_day_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter | KeyCode::Char(' ')))
}

/// Backspace
pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Déplacement du curseur du calendrier, en jours
///
/// Flèches ou hjkl (vim) : ←/h = -1, →/l = +1, ↑/k = -7, ↓/j = +7
pub fn cursor_delta(event: &Event) -> Option<i32> {
    match key_code(event)? {
        KeyCode::Left | KeyCode::Char('h') => Some(-1),
        KeyCode::Right | KeyCode::Char('l') => Some(1),
        KeyCode::Up | KeyCode::Char('k') => Some(-7),
        KeyCode::Down | KeyCode::Char('j') => Some(7),
        _ => None,
    }
}

/// '[' ou PageUp : mois précédent
pub fn is_previous_month_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('[') | KeyCode::PageUp))
}

/// ']' ou PageDown : mois suivant
pub fn is_next_month_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(']') | KeyCode::PageDown))
}

/// 's' : la sélection devient la date de début
pub fn is_start_date_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('s') | KeyCode::Char('S')))
}

/// 'e' : la sélection devient la date de fin
pub fn is_stop_date_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('e') | KeyCode::Char('E')))
}

/// 't' : saisie d'un ticker (option 1)
pub fn is_ticker_input_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('t') | KeyCode::Char('T')))
}

/// 'f' : saisie du fichier de tickers (option 2)
pub fn is_file_input_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('f') | KeyCode::Char('F')))
}

/// 'r' : lance le batch sur le fichier choisi (option 2)
pub fn is_run_batch_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event)? {
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_cursor_delta() {
        assert_eq!(cursor_delta(&key(KeyCode::Left)), Some(-1));
        assert_eq!(cursor_delta(&key(KeyCode::Char('l'))), Some(1));
        assert_eq!(cursor_delta(&key(KeyCode::Up)), Some(-7));
        assert_eq!(cursor_delta(&key(KeyCode::Char('j'))), Some(7));
        assert_eq!(cursor_delta(&key(KeyCode::Char('x'))), None);
        assert_eq!(cursor_delta(&Event::Tick), None);
    }

    #[test]
    fn test_month_navigation() {
        assert!(is_previous_month_event(&key(KeyCode::Char('['))));
        assert!(is_previous_month_event(&key(KeyCode::PageUp)));
        assert!(is_next_month_event(&key(KeyCode::Char(']'))));
        assert!(is_next_month_event(&key(KeyCode::PageDown)));
    }

    #[test]
    fn test_select_day() {
        assert!(is_select_day_event(&key(KeyCode::Enter)));
        assert!(is_select_day_event(&key(KeyCode::Char(' '))));
        assert!(!is_select_day_event(&key(KeyCode::Char('s'))));
    }

    #[test]
    fn test_only_left_click_is_kept() {
        let mouse = |kind| MouseEvent {
            kind,
            column: 12,
            row: 7,
            modifiers: KeyModifiers::empty(),
        };

        match click_from_mouse(mouse(MouseEventKind::Down(MouseButton::Left))) {
            Some(Event::Click { column, row }) => assert_eq!((column, row), (12, 7)),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(click_from_mouse(mouse(MouseEventKind::Down(MouseButton::Right))).is_none());
        assert!(click_from_mouse(mouse(MouseEventKind::Moved)).is_none());
        assert!(!is_quit_event(&Event::Click { column: 0, row: 0 }));
    }

    #[test]
    fn test_get_char() {
        assert_eq!(get_char_from_event(&key(KeyCode::Char('M'))), Some('M'));
        assert_eq!(get_char_from_event(&key(KeyCode::Enter)), None);
    }
}

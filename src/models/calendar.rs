// ============================================================================
// Structure : DatePicker
// ============================================================================
// État du calendrier : mois affiché, curseur clavier et jour sélectionné
//
// Aucune dépendance à ratatui ici : le rendu est fait par ui::calendar.
// On peut donc tester toute la logique sans terminal.
//
// CONCEPTS RUST :
// 1. chrono::Months : arithmétique calendaire (ajouter un mois, pas 30 jours)
// 2. Option<NaiveDate> : pas de sélection tant que l'utilisateur n'a rien choisi
// 3. Tableaux fixes [Option<u32>; 7] : une semaine de la grille
// ============================================================================

use chrono::{Datelike, Local, Months, NaiveDate, Weekday};

use crate::models::date_range::{COMPACT_FORMAT, DISPLAY_FORMAT};

/// Une ligne de la grille : 7 cases, None hors du mois
pub type Week = [Option<u32>; 7];

/// Calendrier affichant un mois à la fois avec sélection d'un seul jour
#[derive(Debug, Clone)]
pub struct DatePicker {
    /// Premier jour du mois affiché (toujours normalisé au 1er)
    displayed: NaiveDate,

    /// Premier jour de la semaine (colonne de gauche)
    first_weekday: Weekday,

    /// Jour sous le curseur clavier (dans le mois affiché)
    cursor: u32,

    /// Date sélectionnée (remplacée à chaque nouvelle sélection)
    selection: Option<NaiveDate>,
}

impl DatePicker {
    /// Crée un calendrier pour un mois donné
    ///
    /// Retourne None si (year, month) n'est pas une date valide.
    pub fn for_month(year: i32, month: u32, first_weekday: Weekday) -> Option<Self> {
        let displayed = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self {
            displayed,
            first_weekday,
            cursor: 1,
            selection: None,
        })
    }

    /// Crée un calendrier sur le mois courant
    pub fn current(first_weekday: Weekday) -> Self {
        let today = Local::now().date_naive();
        let displayed = today.with_day(1).unwrap_or(today);
        Self {
            displayed,
            first_weekday,
            cursor: today.day(),
            selection: None,
        }
    }

    pub fn year(&self) -> i32 {
        self.displayed.year()
    }

    pub fn month(&self) -> u32 {
        self.displayed.month()
    }

    /// Premier jour du mois affiché
    pub fn displayed_month(&self) -> NaiveDate {
        self.displayed
    }

    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Affiche le mois suivant (normalisé au 1er du mois)
    pub fn next_month(&mut self) {
        if let Some(next) = self.displayed.checked_add_months(Months::new(1)) {
            self.displayed = next;
            self.clamp_cursor();
        }
    }

    /// Affiche le mois précédent (normalisé au 1er du mois)
    pub fn prev_month(&mut self) {
        if let Some(previous) = self.displayed.checked_sub_months(Months::new(1)) {
            self.displayed = previous;
            self.clamp_cursor();
        }
    }

    /// Déplace le curseur de `days` jours, borné au mois affiché
    pub fn move_cursor(&mut self, days: i32) {
        let last = self.days_in_month() as i32;
        self.cursor = (self.cursor as i32 + days).clamp(1, last) as u32;
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.clamp(1, self.days_in_month());
    }

    // ========================================================================
    // Sélection
    // ========================================================================

    /// Sélectionne un jour du mois affiché
    ///
    /// Retourne false (et ne change rien) si le jour n'existe pas dans ce mois,
    /// comme un clic sur une case vide.
    pub fn select_day(&mut self, day: u32) -> bool {
        match self.displayed.with_day(day) {
            Some(date) => {
                self.selection = Some(date);
                self.cursor = day;
                true
            }
            None => false,
        }
    }

    /// Sélectionne le jour sous le curseur
    pub fn select_cursor(&mut self) -> bool {
        self.select_day(self.cursor)
    }

    /// Date sélectionnée, si l'utilisateur en a choisi une
    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selection
    }

    /// Sélection courante sous ses deux formes : (compact, affichage)
    ///
    /// Exemple : ("20230115", "2023 / 01 / 15")
    pub fn current_selection(&self) -> Option<(String, String)> {
        self.selection.map(|date| {
            (
                date.format(COMPACT_FORMAT).to_string(),
                date.format(DISPLAY_FORMAT).to_string(),
            )
        })
    }

    /// Jour à surligner dans le mois affiché
    ///
    /// La sélection reste mémorisée quand on change de mois, mais elle
    /// n'est surlignée que dans son propre mois.
    pub fn highlighted_day(&self) -> Option<u32> {
        self.selection
            .filter(|date| date.year() == self.year() && date.month() == self.month())
            .map(|date| date.day())
    }

    // ========================================================================
    // Grille d'affichage
    // ========================================================================

    /// Nombre de jours du mois affiché
    pub fn days_in_month(&self) -> u32 {
        match self.displayed.checked_add_months(Months::new(1)) {
            Some(next) => next.signed_duration_since(self.displayed).num_days() as u32,
            // Décembre de l'année maximale supportée par chrono
            None => 31,
        }
    }

    /// Titre du mois (ex: "October 2026")
    pub fn header(&self) -> String {
        self.displayed.format("%B %Y").to_string()
    }

    /// Noms courts des jours, en commençant par first_weekday
    pub fn weekday_header(&self) -> Vec<String> {
        let mut day = self.first_weekday;
        let mut names = Vec::with_capacity(7);
        for _ in 0..7 {
            names.push(day.to_string());
            day = day.succ();
        }
        names
    }

    /// Grille du mois : une ligne par semaine, None hors du mois
    pub fn weeks(&self) -> Vec<Week> {
        let offset = (self.displayed.weekday().num_days_from_monday() + 7
            - self.first_weekday.num_days_from_monday())
            % 7;

        let mut weeks = Vec::new();
        let mut week: Week = [None; 7];
        let mut column = offset as usize;

        for day in 1..=self.days_in_month() {
            week[column] = Some(day);
            column += 1;
            if column == 7 {
                weeks.push(week);
                week = [None; 7];
                column = 0;
            }
        }

        if column > 0 {
            weeks.push(week);
        }

        weeks
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn picker(year: i32, month: u32) -> DatePicker {
        DatePicker::for_month(year, month, Weekday::Sun).unwrap()
    }

    #[test]
    fn test_invalid_month() {
        assert!(DatePicker::for_month(2023, 13, Weekday::Sun).is_none());
    }

    #[test]
    fn test_next_month_wraps_year() {
        let mut cal = picker(2023, 12);
        cal.next_month();
        assert_eq!(cal.displayed_month(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_prev_month_wraps_year() {
        let mut cal = picker(2023, 1);
        cal.prev_month();
        assert_eq!(cal.displayed_month(), NaiveDate::from_ymd_opt(2022, 12, 1).unwrap());
    }

    #[test]
    fn test_forward_then_backward_returns_to_same_month() {
        let mut cal = picker(2023, 5);
        let original = cal.displayed_month();

        for n in 1..=30 {
            for _ in 0..n {
                cal.next_month();
            }
            for _ in 0..n {
                cal.prev_month();
            }
            assert_eq!(cal.displayed_month(), original);
        }
    }

    #[test]
    fn test_navigation_normalizes_to_first_day() {
        let mut cal = picker(2023, 1);
        cal.move_cursor(30); // 31 janvier
        cal.next_month();
        assert_eq!(cal.displayed_month().day(), 1);
        // Le curseur est ramené dans février
        assert_eq!(cal.cursor(), 28);
    }

    #[test]
    fn test_no_selection_initially() {
        let cal = picker(2023, 1);
        assert!(cal.current_selection().is_none());
        assert!(cal.selected_date().is_none());
    }

    #[test]
    fn test_selection_formats() {
        let mut cal = picker(2023, 1);
        assert!(cal.select_day(5));
        let (compact, display) = cal.current_selection().unwrap();
        assert_eq!(compact, "20230105");
        assert_eq!(display, "2023 / 01 / 05");
    }

    #[test]
    fn test_new_selection_replaces_previous() {
        let mut cal = picker(2023, 1);
        cal.select_day(5);
        cal.select_day(20);
        assert_eq!(cal.selected_date(), NaiveDate::from_ymd_opt(2023, 1, 20));
    }

    #[test]
    fn test_select_day_outside_month() {
        let mut cal = picker(2023, 2);
        assert!(!cal.select_day(30));
        assert!(!cal.select_day(0));
        assert!(cal.selected_date().is_none());
    }

    #[test]
    fn test_highlight_only_in_selected_month() {
        let mut cal = picker(2023, 1);
        cal.select_day(15);
        assert_eq!(cal.highlighted_day(), Some(15));

        cal.next_month();
        assert_eq!(cal.highlighted_day(), None);
        // La sélection est conservée
        assert_eq!(cal.selected_date(), NaiveDate::from_ymd_opt(2023, 1, 15));

        cal.prev_month();
        assert_eq!(cal.highlighted_day(), Some(15));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(picker(2023, 2).days_in_month(), 28);
        assert_eq!(picker(2024, 2).days_in_month(), 29);
        assert_eq!(picker(2023, 4).days_in_month(), 30);
        assert_eq!(picker(2023, 12).days_in_month(), 31);
    }

    #[test]
    fn test_weeks_grid_sunday_first() {
        // Le 1er janvier 2023 est un dimanche
        let weeks = picker(2023, 1).weeks();
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0][0], Some(1));
        assert_eq!(weeks[4][2], Some(31));
        assert_eq!(weeks[4][3], None);
    }

    #[test]
    fn test_weeks_grid_monday_first() {
        let cal = DatePicker::for_month(2023, 1, Weekday::Mon).unwrap();
        let weeks = cal.weeks();
        // Dimanche 1er en dernière colonne, 6 lignes au total
        assert_eq!(weeks[0][6], Some(1));
        assert_eq!(weeks[0][0], None);
        assert_eq!(weeks.len(), 6);
    }

    #[test]
    fn test_headers() {
        let cal = picker(2023, 1);
        assert_eq!(cal.header(), "January 2023");
        assert_eq!(cal.weekday_header()[0], "Sun");
        assert_eq!(cal.weekday_header()[6], "Sat");
    }

    #[test]
    fn test_move_cursor_is_clamped() {
        let mut cal = picker(2023, 2);
        cal.move_cursor(-10);
        assert_eq!(cal.cursor(), 1);
        cal.move_cursor(100);
        assert_eq!(cal.cursor(), 28);
        assert!(cal.select_cursor());
        assert_eq!(cal.selected_date(), NaiveDate::from_ymd_opt(2023, 2, 28));
    }
}

// ============================================================================
// Calendrier - Rendu du DatePicker
// ============================================================================
// Dessine le mois affiché sous forme de grille :
// - ligne de titre (mois + année) et noms des jours
// - une ligne par semaine, chaque case sur 4 colonnes
// - curseur en vidéo inverse, jour sélectionné surligné
//
// CONCEPTS RATATUI :
// 1. Span par case : chaque jour a son propre style
// 2. Color::Rgb : couleurs exactes du surlignage
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::models::calendar::Week;
use crate::models::DatePicker;

/// Fond du jour sélectionné
pub const SELECTION_BG: Color = Color::Rgb(0xF2, 0x07, 0x4E);

/// Texte du jour sélectionné
pub const SELECTION_FG: Color = Color::Rgb(0x05, 0x64, 0x0E);

/// Largeur d'une case
const CELL_WIDTH: usize = 4;

/// Lignes avant la première semaine (noms des jours + ligne vide)
const GRID_TOP: u16 = 2;

/// Dessine le calendrier dans la zone donnée
pub fn render_calendar(frame: &mut Frame, picker: &DatePicker, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" 📅 {} ", picker.header()))
        .title_alignment(Alignment::Center);

    let mut lines = vec![weekday_line(picker), Line::from("")];
    lines.extend(picker.weeks().iter().map(|week| week_line(picker, week)));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Jour affiché sous la position (colonne, ligne) d'un clic
///
/// Refait le calcul du rendu : bordure d'une case, grille centrée,
/// semaines sous l'en-tête. Une case vide ou hors grille donne None.
pub fn day_at(picker: &DatePicker, area: Rect, column: u16, row: u16) -> Option<u32> {
    let inner = Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    let grid_width = (CELL_WIDTH * 7) as u16;
    let left = inner.x + (inner.width / 2).saturating_sub(grid_width / 2);
    let top = inner.y + GRID_TOP;

    if column < left
        || column >= left + grid_width
        || row < top
        || row >= inner.y + inner.height
    {
        return None;
    }

    let week = usize::from(row - top);
    let cell = usize::from(column - left) / CELL_WIDTH;
    picker.weeks().get(week).and_then(|days| days[cell])
}

fn weekday_line(picker: &DatePicker) -> Line<'static> {
    let spans: Vec<Span> = picker
        .weekday_header()
        .into_iter()
        .map(|name| {
            Span::styled(
                format!("{:>width$}", name, width = CELL_WIDTH),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    Line::from(spans)
}

fn week_line(picker: &DatePicker, week: &Week) -> Line<'static> {
    let spans: Vec<Span> = week
        .iter()
        .map(|cell| match cell {
            Some(day) => Span::styled(
                format!("{:>width$}", day, width = CELL_WIDTH),
                day_style(picker, *day),
            ),
            None => Span::raw(" ".repeat(CELL_WIDTH)),
        })
        .collect();
    Line::from(spans)
}

/// Style d'un jour : sélection, curseur, ou normal
pub fn day_style(picker: &DatePicker, day: u32) -> Style {
    let mut style = Style::default();

    if picker.highlighted_day() == Some(day) {
        style = style
            .bg(SELECTION_BG)
            .fg(SELECTION_FG)
            .add_modifier(Modifier::BOLD);
    }

    if picker.cursor() == day {
        style = style.add_modifier(Modifier::REVERSED);
    }

    style
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_day_style() {
        let mut picker = DatePicker::for_month(2023, 1, Weekday::Sun).unwrap();
        picker.select_day(15);
        picker.move_cursor(1);

        let selected = day_style(&picker, 15);
        assert_eq!(selected.bg, Some(SELECTION_BG));
        assert_eq!(selected.fg, Some(SELECTION_FG));

        let cursor = day_style(&picker, 16);
        assert!(cursor.add_modifier.contains(Modifier::REVERSED));
        assert_eq!(cursor.bg, None);

        assert_eq!(day_style(&picker, 3), Style::default());
    }

    #[test]
    fn test_selection_not_highlighted_in_other_month() {
        let mut picker = DatePicker::for_month(2023, 1, Weekday::Sun).unwrap();
        picker.select_day(15);
        picker.next_month();
        assert_eq!(day_style(&picker, 15).bg, None);
    }

    #[test]
    fn test_day_at_matches_rendered_cell() {
        let backend = TestBackend::new(34, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        let picker = DatePicker::for_month(2023, 1, Weekday::Sun).unwrap();
        let area = Rect::new(0, 0, 34, 12);

        terminal
            .draw(|frame| render_calendar(frame, &picker, area))
            .unwrap();
        let buffer = terminal.backend().buffer();

        // Janvier 2023 commence un dimanche : "15" est en tête de 3e semaine
        let (column, row) = (0..area.height)
            .flat_map(|y| (0..area.width - 1).map(move |x| (x, y)))
            .find(|&(x, y)| {
                buffer.get(x, y).symbol() == "1" && buffer.get(x + 1, y).symbol() == "5"
            })
            .unwrap();

        assert_eq!(day_at(&picker, area, column, row), Some(15));
        assert_eq!(day_at(&picker, area, column + 1, row), Some(15));
    }

    #[test]
    fn test_day_at_outside_grid() {
        let picker = DatePicker::for_month(2023, 2, Weekday::Sun).unwrap();
        let area = Rect::new(0, 0, 34, 12);

        // Bordure, en-tête des jours, ligne vide
        assert_eq!(day_at(&picker, area, 0, 5), None);
        assert_eq!(day_at(&picker, area, 10, 1), None);
        assert_eq!(day_at(&picker, area, 10, 2), None);
        // Février 2023 commence un mercredi : le dimanche de la 1re semaine est vide
        assert_eq!(day_at(&picker, area, 3, 3), None);
        assert_eq!(day_at(&picker, area, 33, 3), None);
    }

    #[test]
    fn test_render_calendar() {
        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        let picker = DatePicker::for_month(2023, 1, Weekday::Sun).unwrap();

        terminal
            .draw(|frame| render_calendar(frame, &picker, frame.size()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(content.contains("January 2023"));
        assert!(content.contains("Sun"));
        assert!(content.contains("31"));
    }
}

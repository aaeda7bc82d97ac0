// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
//  ┌──────────────── header ────────────────┐
//  │ calendrier      │ dates choisies        │
//  │                 │ Option 1 : ticker     │
//  │                 │ Option 2 : fichier    │
//  ├──────────────── statut ────────────────┤
//  └──────────────── footer ────────────────┘
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones (vertical puis horizontal)
// 3. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DateRangeSelector, Screen, StatusLevel};
use crate::models::date_range::{parse_compact_date, DISPLAY_FORMAT};
use crate::ui::calendar::render_calendar;

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);

    match app.current_screen {
        Screen::Dashboard => render_footer(frame, app, chunks[3]),
        Screen::InputMode => render_input_footer(frame, app, chunks[3]),
    }
}

/// Crée le layout principal (header, content, statut, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // Header
            Constraint::Min(12),    // Calendrier + options
            Constraint::Length(7),  // Statut
            Constraint::Length(4),  // Footer
        ])
        .split(area)
        .to_vec()
}

/// Dessine le header : accueil et mode d'emploi
fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" NavFlow ")
        .title_alignment(Alignment::Center);

    let text = vec![
        Line::from(Span::styled(
            "Welcome to the NAV / AUM flow downloader",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Pick a start and a stop date, then fetch one ticker (Option 1) or a ticker file (Option 2)",
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Découpe la zone centrale : calendrier à gauche, panneaux à droite
fn split_main_content(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(30)])
        .split(area)
        .to_vec()
}

/// Zone du calendrier pour un terminal de cette taille (clics souris)
pub fn calendar_area(size: Rect) -> Rect {
    split_main_content(create_layout(size)[1])[0]
}

/// Calendrier à gauche, dates et options à droite
fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let columns = split_main_content(area);

    render_calendar(frame, &app.picker, columns[0]);

    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Min(4),
        ])
        .split(columns[1]);

    render_dates(frame, app, panels[0]);
    render_option_single(frame, app, panels[1]);
    render_option_batch(frame, app, panels[2]);
}

/// Affiche une date compacte au format lisible ("2023 / 01 / 15")
fn display_date(compact: Option<&str>) -> String {
    compact
        .and_then(|value| parse_compact_date(value).ok())
        .map(|date| date.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| "not set".to_string())
}

fn render_dates(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Dates ");

    let value_style = |set: bool| {
        if set {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Start: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                display_date(app.start_date()),
                value_style(app.start_date().is_some()),
            ),
        ]),
        Line::from(vec![
            Span::styled("Stop:  ", Style::default().fg(Color::Yellow)),
            Span::styled(
                display_date(app.end_date()),
                value_style(app.end_date().is_some()),
            ),
        ]),
    ];

    if app.date_range().is_some_and(|range| range.is_inverted()) {
        lines[1].spans.push(Span::styled(
            "  (before start)",
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_option_single(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Option 1: single ticker ");

    let lines = vec![Line::from(vec![
        Span::styled("[t]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" type a ticker and press Enter to fetch it"),
    ])];

    frame.render_widget(paragraph_with_loading(lines, app).block(block), area);
}

fn render_option_batch(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Option 2: ticker file ");

    let file = app
        .ticker_file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "no file chosen".to_string());

    let mut lines = vec![
        Line::from(vec![
            Span::styled("File: ", Style::default().fg(Color::Yellow)),
            Span::raw(file),
        ]),
        Line::from(vec![
            Span::styled("[f]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" choose file  "),
            Span::styled("[r]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" run batch"),
        ]),
    ];

    if !app.has_date_range() {
        lines.push(Line::from(Span::styled(
            "Set a start and a stop date first",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(paragraph_with_loading(lines, app).block(block), area);
}

/// Ajoute le message de chargement sous les lignes d'une option
fn paragraph_with_loading<'a>(mut lines: Vec<Line<'a>>, app: &'a App) -> Paragraph<'a> {
    if app.is_loading_data() {
        let message = app.loading_message.as_deref().unwrap_or("Loading...");
        lines.push(Line::from(Span::styled(
            format!("⏳ {}", message),
            Style::default().fg(Color::Magenta),
        )));
    }
    Paragraph::new(lines).wrap(Wrap { trim: true })
}

/// Dessine le journal de statut (les lignes les plus récentes)
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Status ");

    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .recent_status(visible)
        .map(|line| {
            let color = match line.level {
                StatusLevel::Info => Color::White,
                StatusLevel::Success => Color::Green,
                StatusLevel::Warning => Color::Yellow,
                StatusLevel::Error => Color::Red,
            };
            Line::from(Span::styled(line.text.as_str(), Style::default().fg(color)))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ============================================================================
// Footer : Instructions
// ============================================================================

/// Dessine le footer avec les raccourcis clavier
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let lines = if app.is_awaiting_quit_confirmation() {
        vec![Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])]
    } else {
        vec![
            Line::from(vec![
                Span::styled("[←→↑↓ / hjkl]", key),
                Span::raw(" Move  "),
                Span::styled("[ [ ] ]", key),
                Span::raw(" Month  "),
                Span::styled("[Enter/Space]", key),
                Span::raw(" Select day  "),
                Span::styled("[s]", key),
                Span::raw(" Set start  "),
                Span::styled("[e]", key),
                Span::raw(" Set stop"),
            ]),
            Line::from(vec![
                Span::styled("[t]", key),
                Span::raw(" Ticker  "),
                Span::styled("[f]", key),
                Span::raw(" File  "),
                Span::styled("[r]", key),
                Span::raw(" Run batch  "),
                Span::styled("[q]", key),
                Span::raw(" Quit"),
            ]),
        ]
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Dessine le footer en mode input avec la ligne de saisie
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let input_line = Line::from(vec![
        Span::styled(
            app.input_prompt.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let help_line = Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Confirm  "),
        Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel"),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::InputTarget;
    use crate::models::DatePicker;
    use chrono::Weekday;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &App) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date(Some("20230115")), "2023 / 01 / 15");
        assert_eq!(display_date(None), "not set");
    }

    #[test]
    fn test_render_dates_and_status() {
        let mut app = App::with_picker(DatePicker::for_month(2023, 1, Weekday::Sun).unwrap());
        app.picker.select_day(15);
        app.set_start_from_selection();

        let content = screen(&app);
        assert!(content.contains("2023 / 01 / 15"));
        assert!(content.contains("Start date: 2023 / 01 / 15"));
        assert!(content.contains("Option 1"));
        assert!(content.contains("Option 2"));
    }

    #[test]
    fn test_date_hint_until_range_is_set() {
        let mut app = App::with_picker(DatePicker::for_month(2023, 1, Weekday::Sun).unwrap());
        assert!(screen(&app).contains("Set a start and a stop date first"));

        app.picker.select_day(3);
        app.set_start_from_selection();
        app.picker.select_day(31);
        app.set_stop_from_selection();
        assert!(!screen(&app).contains("Set a start and a stop date first"));
    }

    #[test]
    fn test_calendar_area_is_left_column() {
        let size = Rect::new(0, 0, 120, 40);
        let area = calendar_area(size);
        assert_eq!((area.x, area.y, area.width), (0, 4, 34));
        assert_eq!(area.height, 40 - 4 - 7 - 4);
    }

    #[test]
    fn test_render_input_mode() {
        let mut app = App::with_picker(DatePicker::for_month(2023, 1, Weekday::Sun).unwrap());
        app.start_input(InputTarget::Ticker);
        app.append_char('M');

        let content = screen(&app);
        assert!(content.contains(InputTarget::Ticker.prompt().trim_end()));
        assert!(content.contains("Confirm"));
    }
}

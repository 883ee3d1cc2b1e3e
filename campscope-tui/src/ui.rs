//! UI rendering for the TUI.

use campscope_core::registry;
use campscope_core::render::SessionRow;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Focus, ResultsTab};

/// Border color for the input form
const BORDER_FORM: Color = Color::Rgb(0, 150, 150);
/// Border color for the model panel
const BORDER_MODEL: Color = Color::Rgb(80, 160, 80);
/// Border color for the results panel
const BORDER_RESULTS: Color = Color::Rgb(180, 100, 180);
/// Label color for form fields
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Session header row color
const HEADER_ROW: Color = Color::Rgb(0, 180, 180);
/// Dim gray for hints
const DIM: Color = Color::Rgb(128, 128, 128);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1),  // Title
        Constraint::Length(14), // Form + model panel top section
        Constraint::Min(8),     // Results tabs
        Constraint::Length(1),  // Footer
    ])
    .split(area);

    render_title(frame, app, chunks[0]);

    let top = Layout::horizontal([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(chunks[1]);
    render_form(frame, app, top[0]);
    render_model_panel(frame, app, top[1]);

    render_results(frame, app, chunks[2]);
    render_footer(frame, chunks[3]);
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let status = Span::styled(&app.status_line, Style::default().fg(DIM));
    let line = Line::from(vec![
        Span::styled(
            " campscope ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        status,
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let value_style = if focused {
        Style::default().fg(Color::White).bg(Color::Rgb(40, 60, 60))
    } else {
        Style::default().fg(Color::White)
    };
    let marker = if focused { "> " } else { "  " };
    Line::from(vec![
        Span::raw(marker),
        Span::styled(format!("{label:<12}"), Style::default().fg(LABEL_COLOR)),
        Span::styled(value, value_style),
    ])
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let masked_password = "*".repeat(app.password.chars().count());
    let masked_key = if app.api_key.is_empty() {
        String::new()
    } else {
        format!("{}...", app.api_key.chars().take(6).collect::<String>())
    };

    let mut lines = vec![
        field_line("Username", app.username.clone(), app.focus == Focus::Username),
        field_line("Password", masked_password, app.focus == Focus::Password),
        field_line(
            "Campaign ID",
            app.campaign_id.clone(),
            app.focus == Focus::CampaignId,
        ),
        field_line("From", app.from_date.clone(), app.focus == Focus::FromDate),
        field_line("To", app.to_date.clone(), app.focus == Focus::ToDate),
        field_line("API Key", masked_key, app.focus == Focus::ApiKey),
        Line::from(Span::styled(
            "  Tables (space toggles):",
            Style::default().fg(LABEL_COLOR),
        )),
    ];

    for (i, (name, selected)) in app.tables.iter().enumerate() {
        let cursor = app.focus == Focus::Tables && i == app.table_cursor;
        let marker = if *selected { "[x]" } else { "[ ]" };
        let style = if cursor {
            Style::default().fg(Color::White).bg(Color::Rgb(40, 60, 60))
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(
            format!("   {} {}", marker, registry::display_name(name)),
            style,
        )));
    }

    if !app.connection_line.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {}", app.connection_line),
            Style::default().fg(DIM),
        )));
    }

    let block = Block::default()
        .title(" Analysis Parameters ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_FORM));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_model_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" AI Analysis ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_MODEL));

    let text = if app.ai_text.is_empty() {
        "Press Enter to analyze campaign changes...".to_string()
    } else {
        app.ai_text.clone()
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.ai_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = format!(
        " {} (ctrl-t to switch) ",
        app.results_tab.title()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_RESULTS));

    match app.results_tab {
        ResultsTab::Sessions => render_session_table(frame, app, block, area),
        ResultsTab::Stats => {
            let paragraph = Paragraph::new(app.stats_text.clone())
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((app.results_scroll, 0));
            frame.render_widget(paragraph, area);
        }
        ResultsTab::ModelInput => {
            let paragraph = Paragraph::new(app.model_input.clone())
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((app.results_scroll, 0));
            frame.render_widget(paragraph, area);
        }
    }
}

fn render_session_table(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let header = Row::new(vec![
        "Date", "Time", "User", "Table", "Field", "Old Value", "New Value",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let skip = app.results_scroll as usize;
    let rows: Vec<Row> = app
        .session_rows
        .iter()
        .skip(skip)
        .map(|row| match row {
            SessionRow::Header {
                date,
                time,
                actor,
                table,
                change_note,
            } => Row::new(vec![
                Cell::from(date.clone()),
                Cell::from(time.clone()),
                Cell::from(actor.clone()),
                Cell::from(table.clone()),
                Cell::from(""),
                Cell::from(""),
                Cell::from(change_note.clone()),
            ])
            .style(
                Style::default()
                    .fg(HEADER_ROW)
                    .add_modifier(Modifier::BOLD),
            ),
            SessionRow::Change {
                field,
                old_value,
                new_value,
            } => Row::new(vec![
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
                Cell::from(field.clone()),
                Cell::from(old_value.clone()),
                Cell::from(new_value.clone()),
            ]),
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Length(22),
        Constraint::Length(18),
        Constraint::Percentage(25),
        Constraint::Percentage(25),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Line::from(Span::styled(
        " tab: next field | space: toggle table | enter: analyze | ctrl-t: results tab | up/down: scroll | esc: quit",
        Style::default().fg(DIM),
    ));
    frame.render_widget(Paragraph::new(footer), area);
}

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::{App, InputMode};
use crate::form::Field;
use crate::state::{Phase, ResultState};

const FIELD_HEIGHT: u16 = 3;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, form, button, results, footer
    let [header_area, form_area, button_area, results_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(FIELD_HEIGHT * Field::all().len() as u16),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_form(app, frame, form_area);
    render_button(app, frame, button_area);
    render_results(app, frame, results_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" LinkUp: Smart Networking ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let rows = Layout::vertical(
        Field::all().map(|_| Constraint::Length(FIELD_HEIGHT)),
    )
    .split(area);

    for (field, field_area) in Field::all().into_iter().zip(rows.iter()) {
        render_field(app, frame, field, *field_area);
    }
}

fn render_field(app: &App, frame: &mut Frame, field: Field, area: Rect) {
    let focused = app.focus == field;
    let border_color = match (focused, app.input_mode) {
        (true, InputMode::Editing) => Color::Yellow,
        (true, InputMode::Normal) => Color::Cyan,
        (false, _) => Color::DarkGray,
    };

    let title = if field.is_required() {
        format!(" {} * ", field.label())
    } else {
        format!(" {} ", field.label())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let value = app.form.get(field);
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor = if focused { app.cursor } else { 0 };
    let (visible, cursor_x) = visible_window(value, cursor, inner_width);

    let content = if value.is_empty() {
        Paragraph::new(Span::styled(
            field.placeholder(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(visible).style(Style::default().fg(Color::White))
    };

    frame.render_widget(content.block(block), area);

    if focused && app.input_mode == InputMode::Editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Slice of `value` that fits in `width` columns with the cursor (a char
/// index) kept on screen, plus the cursor's column within that slice.
///
/// Columns are display width, so wide CJK/emoji characters take two.
fn visible_window(value: &str, cursor: usize, width: usize) -> (String, u16) {
    let widths: Vec<usize> = value.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // Drop characters from the left until the cursor cell fits
    let mut start = 0;
    let mut before_cursor: usize = widths[..cursor].iter().sum();
    while width > 0 && start < cursor && before_cursor >= width {
        before_cursor -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible: String = value
        .chars()
        .zip(widths.iter())
        .skip(start)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, before_cursor as u16)
}

fn render_button(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.submission.is_loading();
    let style = if loading {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(Span::styled(format!(" {} ", app.button_label()), style))];
    if let Some(message) = &app.validation {
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }

    let button = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(button, area);
}

/// Lines for the results panel: the error on its own, or one block per
/// recommendation.
pub fn result_lines(result: &ResultState) -> Vec<Line<'static>> {
    match result {
        ResultState::Error(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))],
        ResultState::Recommendations(recs) if recs.is_empty() => vec![Line::from(Span::styled(
            "No one to recommend yet.",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))],
        ResultState::Recommendations(recs) => {
            let mut lines = Vec::new();
            for (idx, rec) in recs.iter().enumerate() {
                if idx > 0 {
                    lines.push(Line::default());
                }
                lines.push(Line::from(Span::styled(
                    format!("Meet: {}", rec.name),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    rec.why.clone(),
                    Style::default().fg(Color::Gray),
                )));
                lines.push(Line::from(Span::styled(
                    "Conversation Starters:",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                for starter in &rec.conversation_starters {
                    lines.push(Line::from(format!("  • {}", starter)));
                }
            }
            lines
        }
    }
}

fn render_results(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Who to Meet ");

    let text = match (app.submission.phase(), app.submission.result()) {
        (Phase::Settled, Some(result)) => Text::from(result_lines(result)),
        (Phase::Loading, _) => Text::from(Span::styled(
            "Waiting for recommendations...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        _ => Text::from(Span::styled(
            "Fill in the form and press Enter.",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let results = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.results_scroll, 0));

    frame.render_widget(results, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" field ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" s ", key_style),
            Span::styled(" submit ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Tab ", key_style),
            Span::styled(" next field ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" submit ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

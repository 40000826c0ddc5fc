use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::editor::{Editor, Mode, Position};

/// Parse "#rrggbb" theme colors, falling back to the terminal default.
fn parse_color(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    if hex.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return Color::Rgb(r, g, b);
        }
    }
    Color::Reset
}

pub fn render<B: Backend>(f: &mut Frame<B>, editor: &Editor) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)].as_ref())
        .split(f.size());

    render_text_area(f, editor, chunks[0]);
    render_status_line(f, editor, chunks[1]);

    if editor.mode == Mode::Help {
        render_help_panel(f, editor, f.size());
    }
}

fn render_text_area<B: Backend>(f: &mut Frame<B>, editor: &Editor, area: Rect) {
    let theme = &editor.config.theme;
    let text_style = Style::default()
        .fg(parse_color(&theme.foreground))
        .bg(parse_color(&theme.background));
    let caret_style = Style::default()
        .bg(parse_color(&theme.cursor))
        .add_modifier(Modifier::REVERSED);

    let height = area.height as usize;
    let primary = editor.selections.primary().end;
    let top = if primary.line >= height && height > 0 {
        primary.line - height + 1
    } else {
        0
    };

    let number_width = if editor.config.line_numbers {
        editor.buffer.line_count().to_string().len().max(3) + 1
    } else {
        0
    };

    let mut lines: Vec<Line> = Vec::new();
    for y in top..(top + height).min(editor.buffer.line_count()) {
        let mut spans: Vec<Span> = Vec::new();
        if number_width > 0 {
            spans.push(Span::styled(
                format!("{:>width$} ", y + 1, width = number_width - 1),
                Style::default().fg(Color::DarkGray),
            ));
        }

        // Caret columns on this row
        let mut caret_cols: Vec<usize> = editor
            .selections
            .iter()
            .filter(|s| s.end.line == y)
            .map(|s| s.end.col)
            .collect();
        caret_cols.sort_unstable();
        caret_cols.dedup();

        let row: Vec<char> = editor.buffer.line(y).chars().collect();
        let mut segment = String::new();
        for (col, c) in row.iter().enumerate() {
            if caret_cols.contains(&col) {
                if !segment.is_empty() {
                    spans.push(Span::styled(segment.clone(), text_style));
                    segment.clear();
                }
                spans.push(Span::styled(c.to_string(), caret_style));
            } else {
                segment.push(*c);
            }
        }
        if !segment.is_empty() {
            spans.push(Span::styled(segment, text_style));
        }
        // Caret sitting at end of line renders as a highlighted cell
        if caret_cols.contains(&row.len()) {
            spans.push(Span::styled(" ".to_string(), caret_style));
        }

        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines).style(text_style);
    f.render_widget(paragraph, area);
}

fn render_status_line<B: Backend>(f: &mut Frame<B>, editor: &Editor, area: Rect) {
    let theme = &editor.config.theme;
    let status_style = Style::default()
        .fg(parse_color(&theme.status_line_fg))
        .bg(parse_color(&theme.status_line_bg));

    let file_info = match &editor.buffer.file_path {
        Some(path) => {
            if editor.buffer.is_modified {
                format!("{} [+]", path)
            } else {
                path.clone()
            }
        }
        None => "untitled".to_string(),
    };
    let Position { line, col } = editor.selections.primary().end;

    let mut spans = vec![Span::styled(
        format!(" {} | Ln {}, Col {} ", file_info, line + 1, col + 1),
        status_style,
    )];

    if editor.mode == Mode::Help {
        spans.push(Span::styled(
            " Enter to insert, Esc to close ",
            status_style.add_modifier(Modifier::BOLD),
        ));
    } else if let Some(label) = editor.prefix.mode_label() {
        spans.push(Span::styled(
            format!(" Prefix Mode: {} ", label),
            Style::default()
                .fg(parse_color(&theme.prefix_mode_fg))
                .bg(parse_color(&theme.status_line_bg))
                .add_modifier(Modifier::BOLD),
        ));
    }

    let status = Paragraph::new(Line::from(spans)).style(status_style);
    f.render_widget(status, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn render_help_panel<B: Backend>(f: &mut Frame<B>, editor: &Editor, area: Rect) {
    let area = centered_rect(60, 60, area);
    f.render_widget(Clear, area);

    let mode = editor.prefix.mode_label().unwrap_or("prefix");
    let block = Block::default()
        .title(format!(" {} bindings ", mode))
        .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let selected = editor.help.selected_index();
    let items: Vec<ListItem> = if editor.help.entries().is_empty() {
        vec![ListItem::new("No bindings for this mode")]
    } else {
        editor
            .help
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if i == selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<10}", entry.display_key), style.add_modifier(Modifier::BOLD)),
                    Span::styled(entry.label.clone(), style),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

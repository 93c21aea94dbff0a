use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use chatbox_core::{Entry, Message, Sender, Theme};
use crate::app::App;

/// Colors for one theme
struct Palette {
    background: Color,
    text: Color,
    muted: Color,
    user: Color,
    bot: Color,
    accent: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                background: Color::White,
                text: Color::Black,
                muted: Color::Gray,
                user: Color::Blue,
                bot: Color::Magenta,
                accent: Color::LightBlue,
            },
            Theme::Dark => Palette {
                background: Color::Black,
                text: Color::White,
                muted: Color::DarkGray,
                user: Color::Cyan,
                bot: Color::Yellow,
                accent: Color::Cyan,
            },
        }
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.session.theme());

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        area,
    );

    // Main layout: header, chat log, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(app.input_rows() + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, &palette, frame, header_area);
    render_chat(app, &palette, frame, chat_area);
    render_input(app, &palette, frame, input_area);
    render_footer(app, &palette, frame, footer_area);
}

fn render_header(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let theme = app.session.theme();
    let title = Line::from(vec![
        Span::styled(" chatbox ", Style::default().fg(palette.accent).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[{}] ", theme.icon()),
            Style::default().fg(palette.accent),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(palette.muted).fg(palette.text));
    frame.render_widget(header, area);
}

/// Lines for one message: avatar paired with the content block
fn message_lines(message: &Message, palette: &Palette) -> Vec<Line<'static>> {
    let (color, alignment) = match message.sender {
        Sender::User => (palette.user, Alignment::Right),
        Sender::Bot => (palette.bot, Alignment::Left),
    };

    let mut lines = Vec::new();
    for (i, text) in message.display_lines().enumerate() {
        let prefix = if i == 0 {
            Span::styled(
                format!("{} ", message.sender.avatar()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("   ")
        };
        let line = match message.sender {
            Sender::User => Line::from(vec![Span::raw(text.to_string()), Span::raw(" "), prefix]),
            Sender::Bot => Line::from(vec![prefix, Span::raw(text.to_string())]),
        };
        lines.push(line.alignment(alignment));
    }
    lines.push(Line::default());
    lines
}

fn loading_lines(frame_idx: u8, palette: &Palette) -> Vec<Line<'static>> {
    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat((frame_idx as usize) + 1);
    vec![
        Line::from(vec![
            Span::styled(
                format!("{} ", Sender::Bot.avatar()),
                Style::default().fg(palette.bot).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::default(),
    ]
}

fn render_chat(app: &mut App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for entry in app.session.surface().entries() {
        match entry {
            Entry::Message(message) => lines.extend(message_lines(message, palette)),
            Entry::Loading(_) => lines.extend(loading_lines(app.animation_frame, palette)),
        }
    }

    // Store chat area height for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);

    // Row count must come from the same word wrapping the widget draws with
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let total_lines = u16::try_from(chat.line_count(inner_width)).unwrap_or(u16::MAX);
    app.fit_scroll(total_lines);

    let title = if app.follow {
        " Chat ".to_string()
    } else {
        " Chat (scrolled, Ctrl+End to follow) ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(title);

    let chat = chat.block(block).scroll((app.scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Message (Enter to send, Shift+Enter for newline) ");

    // Keep the cursor visible: scroll vertically by rows, horizontally by columns
    let inner_width = area.width.saturating_sub(2) as usize;
    let visible_rows = app.input_rows() as usize;
    let (row, col) = app.input_cursor_position();
    let row_offset = (row + 1).saturating_sub(visible_rows);
    let col_offset = if inner_width == 0 {
        0
    } else if col >= inner_width {
        col - inner_width + 1
    } else {
        0
    };

    let visible: Vec<Line> = app
        .input
        .split('\n')
        .skip(row_offset)
        .take(visible_rows)
        .map(|line| {
            Line::from(
                line.chars()
                    .skip(col_offset)
                    .take(inner_width)
                    .collect::<String>(),
            )
        })
        .collect();

    let input = Paragraph::new(Text::from(visible))
        .style(Style::default().fg(palette.user))
        .block(block);
    frame.render_widget(input, area);

    let cursor_x = (col - col_offset) as u16;
    let cursor_y = (row - row_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + cursor_y + 1));
}

fn render_footer(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let waiting = app.session.pending_count();
    let status = if waiting > 0 {
        format!(" waiting for {} repl{} ", waiting, if waiting == 1 { "y" } else { "ies" })
    } else {
        String::new()
    };

    let footer = Line::from(vec![
        Span::styled(" CHAT ", Style::default().bg(palette.accent).fg(palette.background)),
        Span::styled(status, Style::default().fg(palette.bot)),
        Span::styled(
            " Ctrl+T theme  Ctrl+L clear  PgUp/PgDn scroll  Ctrl+End follow  Esc quit ",
            Style::default().fg(palette.muted),
        ),
        Span::styled(app.endpoint.clone(), Style::default().fg(palette.muted)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

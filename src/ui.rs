use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::App;
use crate::assistant::{OPENING_HOURS, STUDIO_ADDRESS, STUDIO_NAME, TREATMENTS};
use crate::widget::{ChatWidget, Message, Sender, StyleHint};

const USER_MARKER: &str = "you 🧍";
const BOT_MARKER: &str = "🤖 bot";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_host_screen(frame, body_area);
    render_footer(app, frame, footer_area);

    if app.widget.is_open() {
        render_chat_widget(&mut app.widget, frame, body_area);
    } else {
        render_toggle_badge(frame, body_area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", STUDIO_NAME),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_host_screen(frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "Welcome to our studio",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::default(),
        Line::from(Span::styled("Treatments", Style::default().bold())),
    ];
    for treatment in TREATMENTS {
        lines.push(Line::from(format!("  • {}", treatment)));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Opening hours",
        Style::default().bold(),
    )));
    lines.push(Line::from(format!("  {}", OPENING_HOURS)));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Address", Style::default().bold())));
    lines.push(Line::from(format!("  {}", STUDIO_ADDRESS)));

    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::NONE))
        .wrap(Wrap { trim: false });
    frame.render_widget(body, area.inner(ratatui::layout::Margin::new(2, 0)));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hint = if app.widget.is_open() {
        " Enter send │ Esc close │ ↑/↓ scroll │ Ctrl-C quit "
    } else {
        " c chat │ q quit "
    };

    let footer = Paragraph::new(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(footer, area);
}

/// The toggle control, shown only while the widget is closed.
fn render_toggle_badge(frame: &mut Frame, area: Rect) {
    let label = " 💬 chat (c) ";
    let width = label.chars().count() as u16 + 1;
    let badge_area = Rect {
        x: area.right().saturating_sub(width + 1),
        y: area.bottom().saturating_sub(2),
        width: width.min(area.width),
        height: 1,
    };

    let badge = Paragraph::new(label).style(Style::default().bg(Color::Cyan).fg(Color::Black));
    frame.render_widget(Clear, badge_area);
    frame.render_widget(badge, badge_area);
}

fn widget_area(area: Rect) -> Rect {
    let width = area.width.min(46);
    let height = area.height.min(20);
    Rect {
        x: area.right().saturating_sub(width),
        y: area.bottom().saturating_sub(height),
        width,
        height,
    }
}

fn render_chat_widget(widget: &mut ChatWidget, frame: &mut Frame, area: Rect) {
    let area = widget_area(area);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Studio Chat ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [log_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(inner);

    // Store log dimensions for scroll calculations
    widget.log_height = log_area.height;
    widget.log_width = log_area.width;

    let log = Paragraph::new(log_lines(
        &widget.messages,
        widget.typing,
        widget.animation_frame,
    ))
    .wrap(Wrap { trim: false })
    .scroll((widget.scroll, 0));
    frame.render_widget(log, log_area);

    render_input(widget, frame, input_area);
}

fn render_input(widget: &ChatWidget, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Message ");
    let inner = block.inner(area);

    // Keep the cursor in view when the input outgrows the field
    let width = inner.width.saturating_sub(1) as usize;
    let skip = widget.cursor.saturating_sub(width);
    let visible: String = widget.input.chars().skip(skip).collect();

    let input = Paragraph::new(visible).block(block);
    frame.render_widget(input, area);

    let cursor_x = inner.x + (widget.cursor - skip) as u16;
    frame.set_cursor_position(Position::new(cursor_x.min(inner.right()), inner.y));
}

/// Lay out the message log: every message is an identity marker plus a
/// bubble, bot messages marker-first and left-aligned, user messages
/// bubble-first and right-aligned. Newlines in the text become visual
/// line breaks. The typing indicator hangs off the end while a reply is
/// pending.
fn log_lines(messages: &[Message], typing: bool, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in messages {
        match msg.sender {
            Sender::Bot => {
                lines.push(bot_marker_line());
                let style = match msg.style {
                    Some(StyleHint::Notice) => Style::default().fg(Color::Red),
                    Some(StyleHint::Confirm) => Style::default().fg(Color::Green),
                    None => Style::default(),
                };
                for line in msg.text.lines() {
                    lines.push(Line::from(Span::styled(line.to_string(), style)));
                }
            }
            Sender::User => {
                for line in msg.text.lines() {
                    lines.push(
                        Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(Color::Cyan),
                        ))
                        .alignment(Alignment::Right),
                    );
                }
                lines.push(
                    Line::from(Span::styled(
                        USER_MARKER,
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Right),
                );
            }
        }
        lines.push(Line::default());
    }

    if typing {
        lines.push(bot_marker_line());
        let dots = ".".repeat(animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn bot_marker_line() -> Line<'static> {
    Line::from(Span::styled(
        BOT_MARKER,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn newlines_render_as_separate_lines() {
        let lines = log_lines(&[Message::bot("line1\nline2")], false, 0);
        // marker, two bubble lines, trailing blank
        assert_eq!(lines.len(), 4);
        assert_eq!(plain_text(&lines[1]), "line1");
        assert_eq!(plain_text(&lines[2]), "line2");
    }

    #[test]
    fn bot_is_marker_first_and_user_is_bubble_first() {
        let lines = log_lines(
            &[Message::bot("hello"), Message::user("hi back")],
            false,
            0,
        );
        assert_eq!(plain_text(&lines[0]), BOT_MARKER);
        assert_eq!(plain_text(&lines[1]), "hello");
        // user bubble precedes the user marker
        assert_eq!(plain_text(&lines[3]), "hi back");
        assert_eq!(plain_text(&lines[4]), USER_MARKER);
        assert_eq!(lines[4].alignment, Some(Alignment::Right));
    }

    #[test]
    fn style_hints_tint_bot_bubbles() {
        let lines = log_lines(
            &[Message::bot_styled("careful", StyleHint::Notice)],
            false,
            0,
        );
        assert_eq!(lines[1].spans[0].style.fg, Some(Color::Red));

        let lines = log_lines(
            &[Message::bot_styled("done", StyleHint::Confirm)],
            false,
            0,
        );
        assert_eq!(lines[1].spans[0].style.fg, Some(Color::Green));
    }

    #[test]
    fn typing_indicator_appends_animated_dots() {
        let lines = log_lines(&[], true, 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(plain_text(&lines[1]), "typing...");

        let lines = log_lines(&[], false, 2);
        assert!(lines.is_empty());
    }
}

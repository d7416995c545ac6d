//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};

use super::runtime::App;
use super::style;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(3), // load gauge
            Constraint::Min(8),    // devices | sources
            Constraint::Length(7), // last pass
            Constraint::Length(6), // log
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_load_gauge(frame, app, chunks[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    render_devices(frame, app, middle[0]);
    render_sources(frame, app, middle[1]);

    render_last_pass(frame, app, chunks[3]);
    render_log(frame, app, chunks[4]);
    render_footer(frame, app, chunks[5]);
}

/// Header bar: active source, service order and total draw.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let coordinator = app.coordinator();
    let active = coordinator
        .active_source()
        .map_or("none", |s| s.kind().label());

    let header = Line::from(vec![
        Span::styled(
            " SMART HOUSE ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(active, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " │ order={} │ draw={:.0} W ",
            coordinator.balancer().order().key(),
            coordinator.total_consumption(),
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Total consumption against the active source's rated capacity.
fn render_load_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let ratio = app.load_ratio();
    let label = if ratio.is_finite() {
        format!("{:.0}%", ratio * 100.0)
    } else {
        "no capacity".to_string()
    };
    let gauge = Gauge::default()
        .block(Block::default().title(" Load ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::load_color(ratio)))
        .ratio(if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 1.0 })
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_devices(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .coordinator()
        .devices()
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let color = if d.is_on() {
                style::DEVICE_ON
            } else {
                style::DEVICE_OFF
            };
            let mut line_style = Style::default().fg(color);
            if i == app.selected {
                line_style = line_style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(Span::styled(
                format!(
                    " {:<14} {:>3} {:>7.0} W",
                    d.name(),
                    if d.is_on() { "on" } else { "off" },
                    d.rated_watts()
                ),
                line_style,
            )))
        })
        .collect();

    let list = List::new(items).block(Block::default().title(" Devices ").borders(Borders::ALL));
    frame.render_widget(list, area);
}

/// Sources panel: rated and remaining capacity, active one marked.
fn render_sources(frame: &mut Frame, app: &App, area: Rect) {
    let coordinator = app.coordinator();
    let lines: Vec<Line> = coordinator
        .sources()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let is_active = coordinator.active_index() == Some(i);
            let marker = if is_active { "*" } else { " " };
            let text = format!(
                "{marker}{}. {:<17} {:>6.0}/{:<6.0} W",
                i + 1,
                s.kind().label(),
                s.remaining_capacity(),
                s.rated_capacity()
            );
            if is_active {
                Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(style::ACTIVE_SOURCE)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(text)
            }
        })
        .collect();

    let paragraph =
        Paragraph::new(lines).block(Block::default().title(" Sources ").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_last_pass(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.coordinator().last_pass() {
        Some(pass) => pass
            .outcomes
            .iter()
            .map(|o| {
                Line::from(Span::styled(
                    format!("  {o}"),
                    Style::default().fg(style::outcome_color(&o.outcome)),
                ))
            })
            .collect(),
        None => vec![Line::from("  No balancing pass yet.")],
    };

    let block = Block::default().title(" Last Pass ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_log(frame: &mut Frame, app: &App, area: Rect) {
    // only as many lines as fit inside the border
    let visible = usize::from(area.height.saturating_sub(2));
    let tail = app.log_tail();
    let skip = tail.len().saturating_sub(visible);
    let lines: Vec<Line> = tail
        .iter()
        .skip(skip)
        .map(|r| {
            Line::from(Span::styled(
                format!(" {}", r.message),
                Style::default().fg(style::severity_color(r.severity)),
            ))
        })
        .collect();

    let block = Block::default().title(" Log ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Footer with the last status line and keybinding hints.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::raw(format!(" {} ", app.status)),
        Span::styled(
            "│ q:Quit  ↑↓:Select  Space:Toggle  1-9:Source  b:Balance  d:Remove  o:Order  \
             r:Restart",
            Style::default().fg(style::FOOTER_FG),
        ),
    ]));
    frame.render_widget(footer, area);
}

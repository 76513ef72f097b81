use crate::app::{App, InputMode};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
    Frame,
};
use risk_map::braille::BrailleCanvas;
use risk_map::map::MapLayers;
use risk_map::risk::{classify, Rgb};
use risk_map::{LevelFilter, RiskLevel};

/// Width of the sidebar holding the details and alerts panels
const SIDEBAR_WIDTH: u16 = 34;

fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Screen regions, top to bottom
struct Areas {
    header: Rect,
    stats: Rect,
    body: Rect,
    legend: Rect,
    controls: Option<Rect>,
    status: Rect,
}

fn split(area: Rect, show_controls: bool) -> Areas {
    let mut constraints = vec![
        Constraint::Length(1), // Header
        Constraint::Length(1), // Stats bar
        Constraint::Min(3),    // Map + sidebar
        Constraint::Length(1), // Legend
    ];
    if show_controls {
        constraints.push(Constraint::Length(1)); // Search / controls
    }
    constraints.push(Constraint::Length(1)); // Status bar

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    Areas {
        header: chunks[0],
        stats: chunks[1],
        body: chunks[2],
        legend: chunks[3],
        controls: show_controls.then(|| chunks[4]),
        status: chunks[chunks.len() - 1],
    }
}

/// Body regions: map on the left, details and alerts stacked in the sidebar
struct BodyAreas {
    map: Rect,
    details: Option<Rect>,
    alerts: Option<Rect>,
}

fn split_body(body: Rect, app: &App) -> BodyAreas {
    let has_details = app.view.selected_location().is_some();
    if !(has_details || app.show_alerts) || body.width < SIDEBAR_WIDTH * 2 {
        return BodyAreas {
            map: body,
            details: None,
            alerts: None,
        };
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SIDEBAR_WIDTH)])
        .split(body);
    let sidebar = columns[1];

    let (details, alerts) = match (has_details, app.show_alerts) {
        (true, true) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(8), Constraint::Percentage(40)])
                .split(sidebar);
            (Some(rows[0]), Some(rows[1]))
        }
        (true, false) => (Some(sidebar), None),
        (false, _) => (None, Some(sidebar)),
    };

    BodyAreas {
        map: columns[0],
        details,
        alerts,
    }
}

fn map_block(app: &App) -> Block<'static> {
    let state = app.view.state();
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Facility Risk Map [{}] ", state.layout_mode.label()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Inner rectangle of the map block for a given screen; shared with mouse hit testing
pub fn map_inner(screen: Rect, app: &App) -> Rect {
    let areas = split(screen, app.controls_enabled());
    map_block(app).inner(split_body(areas.body, app).map)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let areas = split(frame.area(), app.controls_enabled());

    render_header(frame, app, areas.header);
    render_stats_bar(frame, app, areas.stats);

    let body = split_body(areas.body, app);
    render_map(frame, app, body.map);
    if let Some(area) = body.details {
        render_details(frame, app, area);
    }
    if let Some(area) = body.alerts {
        render_alerts(frame, app, area);
    }

    render_legend(frame, app, areas.legend);
    if let Some(area) = areas.controls {
        render_controls(frame, app, area);
    }
    render_status_bar(frame, app, areas.status);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " Facility Risk Map ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if let Some(stats) = app.view.statistics() {
        spans.push(Span::styled(
            format!("({} locations, Avg: {:.1}%, Min: {:.1}%, Max: {:.1}%)", stats.total, stats.average, stats.min, stats.max),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_stats_bar(frame: &mut Frame, app: &App, area: Rect) {
    let Some(stats) = app.view.statistics() else {
        return;
    };
    let mut spans = Vec::new();
    for level in RiskLevel::ALL.iter().rev() {
        spans.push(Span::styled(format!(" {} ", level.label()), Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            stats.distribution.count(*level).to_string(),
            Style::default().fg(rgb(level.color())).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("  "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = map_block(app);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.view.filtered_len() == 0 {
        render_empty_state(frame, app, inner);
        return;
    }

    let layers = app.map_renderer.render(
        &app.view.markers(),
        app.view.state().layout_mode,
        inner.width as usize,
        inner.height as usize,
        app.frame,
    );
    frame.render_widget(MapWidget { layers }, inner);
}

fn render_empty_state(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        "No locations found matching your criteria",
        Style::default().fg(Color::Gray),
    ))];
    if !app.view.state().search_query.is_empty() && app.controls_enabled() {
        lines.push(Line::from(Span::styled(
            "r: reset filters",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let top = area.y + area.height / 2;
    let centered = Rect::new(area.x, top.saturating_sub(1), area.width, area.height.min(2));
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered);
}

/// Custom widget that renders braille layers with marker glyphs on top
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..canvas.height().min(area.height as usize) {
            for col in 0..canvas.width().min(area.width as usize) {
                if let Some(ch) = canvas.glyph(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: grid, cluster guides, pulse rings, markers
        Self::render_layer(&self.layers.grid, Color::Rgb(40, 40, 48), area, buf);
        Self::render_layer(&self.layers.guides, Color::DarkGray, area, buf);
        for level in RiskLevel::ALL {
            Self::render_layer(&self.layers.pulses[level.ordinal()], rgb(level.color()), area, buf);
        }

        for marker in &self.layers.markers {
            if marker.row >= area.height || marker.col >= area.width {
                continue;
            }
            let x = area.x + marker.col;
            let y = area.y + marker.row;

            let mut style = Style::default().fg(rgb(marker.color));
            if marker.selected || marker.hovered {
                style = style.add_modifier(Modifier::BOLD);
            }
            buf[(x, y)].set_char(marker.glyph).set_style(style);

            let Some(label) = &marker.label else {
                continue;
            };
            let label_style = if marker.selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let max_len = area.width.saturating_sub(marker.col + 2) as usize;
            for (i, ch) in label.chars().take(max_len).enumerate() {
                buf[(x + 2 + i as u16, y)].set_char(ch).set_style(label_style);
            }
        }
    }
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let Some(location) = app.view.selected_location() else {
        return;
    };
    let level = classify(location.risk_score);
    let color = rgb(level.color());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", location.name),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let ratio = (location.risk_score / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Rgb(60, 60, 60)))
        .ratio(ratio)
        .label(format!("{}%", location.risk_score.round()));
    frame.render_widget(gauge, chunks[0]);

    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{}: ", name), Style::default().fg(Color::DarkGray)),
            Span::raw(value),
        ])
    };
    let mut lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::styled("Risk Level: ", Style::default().fg(Color::DarkGray)),
            Span::styled(level.as_str(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]),
        field("Location ID", location.id.to_string()),
    ];
    if let Some(description) = &location.description {
        lines.push(field("Description", description.clone()));
    }
    if let Some(incident) = &location.last_incident {
        lines.push(field("Last Incident", incident.clone()));
    }
    if let Some(updated) = &location.last_updated {
        lines.push(field("Updated", updated.clone()));
    }
    if app.view.selected_index().is_none() {
        lines.push(Line::styled("(hidden by current filter)", Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Enter: full details  ←/→: next  Esc: close",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[1]);
}

fn render_alerts(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.alerts.iter().filter(|a| a.is_active()).count();
    let border = if active > 0 { Color::Red } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" Recent Alerts ({}) ", app.alerts.len()),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));

    if app.alerts.is_empty() {
        let empty = Paragraph::new(Line::styled("No recent alerts", Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Feed appends, newest shown first
    let mut lines = Vec::new();
    for alert in app.alerts.iter().rev() {
        let mut header = vec![Span::styled(
            alert.location.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )];
        if let Some(time) = alert.time_of_day() {
            header.push(Span::styled(format!("  {}", time), Style::default().fg(Color::DarkGray)));
        }
        let status_style = if alert.is_active() {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        header.push(Span::styled(format!("  {}", alert.status.as_str()), status_style));

        lines.push(Line::from(header));
        lines.push(Line::styled(alert.message.clone(), Style::default().fg(Color::Gray)));
        if alert.is_active() {
            if let Some(action) = alert.actions.first() {
                lines.push(Line::styled(format!("> {}", action), Style::default().fg(Color::Yellow)));
            }
        }
        lines.push(Line::raw(""));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(" Risk Levels ", Style::default().fg(Color::DarkGray))];
    for (slot, entry) in app.view.legend().iter().enumerate() {
        let mut label_style = Style::default().fg(Color::Gray);
        if entry.active {
            label_style = label_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        spans.push(Span::styled(format!(" {} ", entry.count), Style::default().fg(Color::Black).bg(rgb(entry.color))));
        spans.push(Span::styled(format!(" {}", entry.label), label_style));
        spans.push(Span::styled(format!(" {}", entry.range), Style::default().fg(Color::DarkGray)));
        if app.controls_enabled() {
            spans.push(Span::styled(format!(" [{}]", slot + 1), Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::raw("  "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_controls(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.view.state();
    let searching = app.input_mode == InputMode::Search;

    let query_style = if searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let query = if state.search_query.is_empty() && !searching {
        Span::styled("Search locations...", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(format!("{}{}", state.search_query, if searching { "▏" } else { "" }), query_style)
    };

    let filter_color = match state.filter {
        LevelFilter::All => Color::Gray,
        LevelFilter::Only(level) => rgb(level.color()),
    };

    let line = Line::from(vec![
        Span::styled(" / ", Style::default().fg(Color::DarkGray)),
        query,
        Span::styled("  | Filter: ", Style::default().fg(Color::DarkGray)),
        Span::styled(state.filter.label(), Style::default().fg(filter_color)),
        Span::styled(" | View: ", Style::default().fg(Color::DarkGray)),
        Span::styled(state.layout_mode.label(), Style::default().fg(Color::Magenta)),
        Span::styled(" | Animation: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            if state.animation_enabled { "on" } else { "off" },
            Style::default().fg(if state.animation_enabled { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            format!("  ({} of {} shown)", app.view.filtered_len(), app.view.locations().len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Hover tooltip wins over notices and key help
    let line = if let Some(hovered) = app.view.hovered_location() {
        let level = classify(hovered.risk_score);
        let mut spans = vec![
            Span::styled(format!(" {} ", hovered.name), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::styled(format!("{} ", level.as_str()), Style::default().fg(rgb(level.color()))),
            Span::styled(format!("Risk Score: {}%  ID: {}", hovered.risk_score.round(), hovered.id), Style::default().fg(Color::Gray)),
        ];
        if let Some(updated) = &hovered.last_updated {
            spans.push(Span::styled(format!("  Updated: {}", updated), Style::default().fg(Color::DarkGray)));
        }
        Line::from(spans)
    } else if let Some(notice) = &app.notice {
        Line::from(Span::styled(format!(" {}", notice), Style::default().fg(Color::Yellow)))
    } else {
        let help = if app.input_mode == InputMode::Search {
            " type to search | Enter/Esc: done | Ctrl-U: clear"
        } else if app.controls_enabled() {
            " click/←→: select | /: search | 1-4: level 0: all | g/s/c: view | space: animate | r: reset | R: refresh | a: alerts | q: quit"
        } else {
            " click/←→: select | Enter: details | Esc: deselect | R: refresh | a: alerts | q: quit"
        };
        Line::from(Span::styled(help, Style::default().fg(Color::DarkGray)))
    };
    frame.render_widget(Paragraph::new(line), area);
}

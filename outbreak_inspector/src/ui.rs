use std::collections::VecDeque;

use outbreak_core::{
    describe_feature, ArticleShelf, FeatureCollection, JsonFileStore, RenderSink, RiskLevel,
    SinkError,
};
use outbreak_schema::{DiseaseFilter, Geometry};
use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Map, MapResolution};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::InspectorPanel;

const LON_BOUNDS: [f64; 2] = [38.5, 49.0];
const LAT_BOUNDS: [f64; 2] = [29.0, 37.5];

/// Holds the last collection handed over by the panel; the map canvas draws
/// from it. Reports not-ready until the first frame has been drawn.
#[derive(Debug, Default)]
pub struct TerminalSink {
    attached: bool,
    latest: FeatureCollection,
}

impl TerminalSink {
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn latest(&self) -> &FeatureCollection {
        &self.latest
    }
}

impl RenderSink for TerminalSink {
    fn is_ready(&self) -> bool {
        self.attached
    }

    fn set_data(&mut self, data: &FeatureCollection) -> Result<(), SinkError> {
        self.latest = data.clone();
        Ok(())
    }
}

pub struct UiState {
    pub logs: VecDeque<String>,
    pub max_logs: usize,
    pub selected_city: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logs: VecDeque::new(),
            max_logs: 6,
            selected_city: 0,
        }
    }
}

impl UiState {
    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }

    /// Move the city cursor, wrapping over `count` rows.
    pub fn select_city(&mut self, delta: i64, count: usize) {
        if count == 0 {
            self.selected_city = 0;
            return;
        }
        let current = self.selected_city.min(count - 1) as i64;
        self.selected_city = (current + delta).rem_euclid(count as i64) as usize;
    }
}

pub fn draw_ui(
    frame: &mut Frame,
    panel: &InspectorPanel,
    shelf: &ArticleShelf<JsonFileStore>,
    state: &UiState,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(4),
            Constraint::Length(8),
        ])
        .split(frame.size());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(5),
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Length(5),
        ])
        .split(body[1]);

    draw_header(frame, rows[0], panel);
    draw_map(frame, body[0], panel);
    draw_stats(frame, side[0], panel);
    draw_cities(frame, side[1], panel, state);
    draw_details(frame, side[2], panel, state);
    draw_disease_info(frame, side[3], panel);
    draw_articles(frame, side[4], shelf);
    draw_timeline(frame, rows[2], panel);
    draw_logs(frame, rows[3], state);
}

fn legend_color(filter: DiseaseFilter) -> Color {
    let (r, g, b) = filter.legend_rgb();
    Color::Rgb(r, g, b)
}

fn risk_color(risk: RiskLevel) -> Color {
    match risk {
        RiskLevel::High => Color::Red,
        RiskLevel::Mid => Color::Yellow,
        RiskLevel::Low => Color::Green,
    }
}

fn render_boxed(frame: &mut Frame, area: Rect, title: String, paragraph: Paragraph) {
    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_header(frame: &mut Frame, area: Rect, panel: &InspectorPanel) {
    let selection = panel.selection();
    let (status, status_color) = if panel.is_playing() {
        ("Playing", Color::Green)
    } else {
        ("Paused", Color::Yellow)
    };
    let refreshed = panel
        .last_refresh_at()
        .map(|at| at.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let status_line = Line::from(vec![
        Span::styled(status, Style::default().fg(status_color)),
        Span::raw(format!(" {:.2}x", selection.play_speed)),
        Span::raw(" | disease "),
        Span::styled(
            selection.disease.name(),
            Style::default().fg(legend_color(selection.disease)),
        ),
        Span::raw(" | refreshed "),
        Span::raw(refreshed),
    ]);
    let keys = Line::from(vec![
        Span::styled("p", Style::default().fg(Color::Yellow)),
        Span::raw(" play  "),
        Span::styled("←/→", Style::default().fg(Color::Yellow)),
        Span::raw(" step  "),
        Span::styled("[/]", Style::default().fg(Color::Yellow)),
        Span::raw(" speed  "),
        Span::styled("d/D", Style::default().fg(Color::Yellow)),
        Span::raw(" disease  "),
        Span::styled("s/S e/E r", Style::default().fg(Color::Yellow)),
        Span::raw(" range  "),
        Span::styled("n/N", Style::default().fg(Color::Yellow)),
        Span::raw(" article  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);
    let paragraph = Paragraph::new(vec![status_line, keys]).wrap(Wrap { trim: true });
    render_boxed(frame, area, "Outbreak Map".to_string(), paragraph);
}

fn draw_map(frame: &mut Frame, area: Rect, panel: &InspectorPanel) {
    let collection = panel.sink().latest();
    let title = match panel.current_date() {
        Some(date) => format!("Map | {date}"),
        None => "Map | no data".to_string(),
    };
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds(LON_BOUNDS)
        .y_bounds(LAT_BOUNDS)
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: Color::DarkGray,
            });
            ctx.layer();
            for feature in &collection.features {
                let Geometry::Point {
                    coordinates: [lon, lat],
                } = feature.geometry;
                let props = &feature.properties;
                let color = legend_color(props.disease);
                ctx.draw(&Circle {
                    x: lon,
                    y: lat,
                    radius: 0.05 + (props.cases as f64).sqrt() * 0.015,
                    color,
                });
                ctx.print(
                    lon + 0.15,
                    lat,
                    Span::styled(
                        format!("{} {}", props.city, props.cases),
                        Style::default().fg(color),
                    ),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_stats(frame: &mut Frame, area: Rect, panel: &InspectorPanel) {
    let stats = panel.stats();
    let date = stats
        .date
        .map(|date| date.to_string())
        .unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::from(vec![Span::raw("Date            "), Span::raw(date)]),
        Line::from(vec![
            Span::raw("Total cases     "),
            Span::styled(stats.total_cases.to_string(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("High-risk cities "),
            Span::styled(
                stats.high_risk_count.to_string(),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            Span::raw("Diseases        "),
            Span::raw(stats.tracked_diseases().to_string()),
        ]),
    ];
    render_boxed(frame, area, "Stats".to_string(), Paragraph::new(lines));
}

fn draw_cities(frame: &mut Frame, area: Rect, panel: &InspectorPanel, state: &UiState) {
    let cities = &panel.stats().cities;
    let lines: Vec<Line> = cities
        .iter()
        .enumerate()
        .map(|(index, summary)| {
            let mut name_style = Style::default();
            if index == state.selected_city.min(cities.len().saturating_sub(1)) {
                name_style = name_style.add_modifier(Modifier::REVERSED);
            }
            Line::from(vec![
                Span::styled(format!("{:<10}", summary.city), name_style),
                Span::raw(format!(" {:>6} ", summary.cases)),
                Span::styled(
                    summary.risk.label(),
                    Style::default().fg(risk_color(summary.risk)),
                ),
            ])
        })
        .collect();
    render_boxed(frame, area, "Cities".to_string(), Paragraph::new(lines));
}

fn draw_details(frame: &mut Frame, area: Rect, panel: &InspectorPanel, state: &UiState) {
    let features = panel.features();
    let lines: Vec<Line> = match features.get(state.selected_city.min(features.len().saturating_sub(1))) {
        Some(feature) => describe_feature(feature)
            .lines()
            .map(|line| Line::from(line.to_string()))
            .collect(),
        None => vec![Line::from("No cases for this selection")],
    };
    render_boxed(frame, area, "Details".to_string(), Paragraph::new(lines));
}

fn draw_disease_info(frame: &mut Frame, area: Rect, panel: &InspectorPanel) {
    let info = panel.disease_info();
    let label = Style::default().fg(Color::Gray);
    let lines = vec![
        Line::from(vec![Span::styled("Incubation   ", label), Span::raw(info.incubation)]),
        Line::from(vec![Span::styled("Transmission ", label), Span::raw(info.transmission)]),
        Line::from(vec![Span::styled("Vaccination  ", label), Span::raw(info.vaccination)]),
        Line::from(vec![Span::styled("Prevention   ", label), Span::raw(info.prevention)]),
    ];
    let title = format!("About {}", panel.selection().disease);
    render_boxed(
        frame,
        area,
        title,
        Paragraph::new(lines).wrap(Wrap { trim: true }),
    );
}

fn draw_articles(frame: &mut Frame, area: Rect, shelf: &ArticleShelf<JsonFileStore>) {
    let totals = shelf.totals();
    let mut lines = Vec::new();
    if let Some(article) = shelf.current() {
        lines.push(Line::from(Span::styled(
            article.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(format!(
            "{} | {} | {} views",
            if article.tag.is_empty() { "General" } else { article.tag.as_str() },
            article.author,
            article.views
        )));
    }
    lines.push(Line::from(Span::styled(
        format!(
            "{} articles, {} views, avg {}",
            totals.total, totals.views, totals.average_views
        ),
        Style::default().fg(Color::Gray),
    )));
    render_boxed(
        frame,
        area,
        "Articles".to_string(),
        Paragraph::new(lines).wrap(Wrap { trim: true }),
    );
}

fn draw_timeline(frame: &mut Frame, area: Rect, panel: &InspectorPanel) {
    let timeline = panel.timeline();
    let window = timeline.window(&panel.range());
    let current = panel.selection().time_index;
    let mut spans = Vec::with_capacity(timeline.len() * 2);
    for (index, date) in timeline.steps().iter().enumerate() {
        let mut style = if window.contains(&index) {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if index == current {
            style = style.fg(Color::Black).bg(Color::Cyan);
        }
        spans.push(Span::styled(date.format("%m-%d").to_string(), style));
        spans.push(Span::raw(" "));
    }
    let range = panel.range();
    let bound = |date: Option<chrono::NaiveDate>| {
        date.map(|d| d.to_string()).unwrap_or_else(|| "open".to_string())
    };
    let title = format!("Timeline | {} .. {}", bound(range.start), bound(range.end));
    let axis = Line::from(Span::styled(
        format!(
            "first {}  mid {}  last {}",
            bound(timeline.first()),
            bound(timeline.midpoint()),
            bound(timeline.last())
        ),
        Style::default().fg(Color::Gray),
    ));
    render_boxed(
        frame,
        area,
        title,
        Paragraph::new(vec![Line::from(spans), axis]),
    );
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry)))
        .collect();
    render_boxed(
        frame,
        area,
        "Logs".to_string(),
        Paragraph::new(lines).wrap(Wrap { trim: false }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_cursor_wraps() {
        let mut state = UiState::default();
        state.select_city(-1, 3);
        assert_eq!(state.selected_city, 2);
        state.select_city(1, 3);
        assert_eq!(state.selected_city, 0);
        state.select_city(1, 0);
        assert_eq!(state.selected_city, 0);
    }

    #[test]
    fn log_pane_keeps_newest_lines() {
        let mut state = UiState::default();
        for index in 0..10 {
            state.push_log(format!("line {index}\n"));
        }
        state.push_log("");
        assert_eq!(state.logs.len(), state.max_logs);
        assert_eq!(state.logs.front().map(String::as_str), Some("line 9"));
    }

    #[test]
    fn sink_holds_latest_collection_once_attached() {
        let mut sink = TerminalSink::default();
        assert!(!sink.is_ready());
        sink.attach();
        sink.set_data(&FeatureCollection::empty()).unwrap();
        assert!(sink.latest().is_empty());
    }
}

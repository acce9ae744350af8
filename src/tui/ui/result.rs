//! Result view: probability gauge, force plot and factor lists.

use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::application::{report::format_contribution, Assessment, FactorSummary};
use crate::domain::{ChartSegment, Direction};
use crate::tui::styles::MedicalTheme;

/// Width reserved for the feature name column.
const NAME_WIDTH: usize = 18;
/// Width reserved for the signed contribution column.
const VALUE_WIDTH: usize = 9;

/// Result state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Completed assessment
    Complete { assessment: Box<Assessment> },
    /// Scoring failed
    Error { message: String },
}

/// Map the x-interval `[start, end]` onto `width` columns spanning `[lo, hi]`.
///
/// Returns `(offset, length)`. Non-empty intervals get at least one column so
/// small contributions stay visible.
#[must_use]
pub fn bar_columns(start: f64, end: f64, lo: f64, hi: f64, width: usize) -> (usize, usize) {
    if width == 0 {
        return (0, 0);
    }
    let range = hi - lo;
    if range.is_nan() || range <= 0.0 {
        return (0, usize::from(start != end).min(width));
    }

    let scale = |x: f64| -> usize {
        let t = ((x - lo) / range).clamp(0.0, 1.0);
        (t * width as f64).round() as usize
    };

    let (a, b) = if start <= end { (start, end) } else { (end, start) };
    let mut left = scale(a).min(width - 1);
    let right = scale(b).min(width);
    let mut len = right.saturating_sub(left);

    if len == 0 && a != b {
        len = 1;
    }
    if left + len > width {
        left = width - len;
    }
    (left, len)
}

/// Render the result view
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete { assessment } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2]);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Assessment Result", MedicalTheme::title()),
        Span::styled(" │ Feature Attribution", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No assessment yet",
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let result = &assessment.result;
    let shift = Direction::of(result.final_probability - result.baseline);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    format!(
                        " Frailty Probability (baseline {}) ",
                        assessment.report.baseline
                    ),
                    MedicalTheme::subtitle(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border_focused()),
        )
        .gauge_style(MedicalTheme::direction(shift))
        .ratio(result.final_probability.clamp(0.0, 1.0))
        .label(assessment.report.probability.clone());
    f.render_widget(gauge, chunks[0]);

    let columns = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_waterfall(f, columns[0], assessment);

    let right = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(9)])
        .split(columns[1]);

    render_tornado(f, right[0], assessment);
    render_factor_lists(f, right[1], assessment);
}

fn bar_line(segment: &ChartSegment, lo: f64, hi: f64, width: usize) -> Line<'static> {
    let (offset, len) = bar_columns(segment.start, segment.end, lo, hi, width);
    let glyph = if len == 0 { "·" } else { "█" };
    let len = len.max(1);
    let style = MedicalTheme::direction(segment.direction);

    Line::from(vec![
        Span::styled(
            format!(
                "{:<NAME_WIDTH$}",
                truncate(segment.display_name, NAME_WIDTH - 1)
            ),
            MedicalTheme::text_secondary(),
        ),
        Span::raw(" ".repeat(offset.min(width.saturating_sub(1)))),
        Span::styled(glyph.repeat(len), style),
        Span::raw(" ".repeat(width.saturating_sub(offset + len))),
        Span::styled(
            format!(
                "{:>VALUE_WIDTH$}",
                format_contribution(segment.contribution)
            ),
            style,
        ),
    ])
}

fn marker_line(label: &str, x: f64, lo: f64, hi: f64, width: usize) -> Line<'static> {
    let (offset, _) = bar_columns(x, x, lo, hi, width);
    Line::from(vec![
        Span::styled(format!("{label:<NAME_WIDTH$}"), MedicalTheme::text()),
        Span::raw(" ".repeat(offset.min(width.saturating_sub(1)))),
        Span::styled("▲", MedicalTheme::focused()),
        Span::raw(" ".repeat(width.saturating_sub(offset + 1))),
        Span::styled(format!("{:>VALUE_WIDTH$.4}", x), MedicalTheme::text()),
    ])
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn chart_width(area: Rect) -> usize {
    (area.width as usize).saturating_sub(2 + NAME_WIDTH + VALUE_WIDTH)
}

fn render_waterfall(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let chart = &assessment.waterfall;
    let width = chart_width(area);
    let (lo, hi) = chart.x_extent();

    let mut lines = vec![marker_line("Base value", chart.baseline, lo, hi, width)];
    lines.extend(chart.segments.iter().map(|s| bar_line(s, lo, hi, width)));
    lines.push(marker_line("Prediction", chart.final_probability, lo, hi, width));

    let block = Block::default()
        .title(Span::styled(" Force Plot ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_tornado(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let chart = &assessment.tornado;
    let width = chart_width(area);
    let (lo, hi) = chart.x_extent();

    let lines: Vec<Line> = chart
        .bars
        .iter()
        .map(|b| bar_line(b, lo, hi, width))
        .collect();

    let block = Block::default()
        .title(Span::styled(" Ranked Impact ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn factor_lines(
    title: &'static str,
    marker: &'static str,
    direction: Direction,
    items: &[FactorSummary],
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(title, MedicalTheme::text()))];
    if items.is_empty() {
        lines.push(Line::from(Span::styled("  none", MedicalTheme::text_muted())));
    }
    for item in items {
        lines.push(Line::from(vec![
            Span::styled(format!("  {marker} "), MedicalTheme::direction(direction)),
            Span::styled(item.label, MedicalTheme::text()),
            Span::styled(
                format!(" {}", format_contribution(item.contribution)),
                MedicalTheme::direction(direction),
            ),
        ]));
    }
    lines
}

fn render_factor_lists(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let report = &assessment.report;
    let mut lines = factor_lines(
        "Risk factors",
        "▲",
        Direction::IncreasesRisk,
        &report.risk_factors,
    );
    lines.extend(factor_lines(
        "Protective factors",
        "▼",
        Direction::DecreasesRisk,
        &report.protective_factors,
    ));

    let block = Block::default()
        .title(Span::styled(" Summary ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_result_footer(f: &mut Frame, area: Rect) {
    let content = Line::from(vec![
        Span::styled("[Enter] ", MedicalTheme::key_hint()),
        Span::styled("New Assessment ", MedicalTheme::key_desc()),
        Span::styled("[Q] ", MedicalTheme::key_hint()),
        Span::styled("Quit", MedicalTheme::key_desc()),
    ]);

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

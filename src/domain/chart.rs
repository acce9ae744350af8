//! Force-chart projection of attribution results.
//!
//! Two renderings are derived from the same [`AttributionResult`]:
//! - a cumulative waterfall walking from the baseline to the prediction
//! - a tornado chart with one independent bar per feature, ranked by size

use serde::Serialize;

use super::attribution::{AttributionResult, Contribution, Direction};
use super::patient::Feature;

/// One drawable segment or bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSegment {
    pub feature: Feature,
    pub display_name: &'static str,
    /// Input value the contribution was computed from
    pub value: f64,
    pub contribution: f64,
    /// Row index in the chart (0 = top)
    pub row: usize,
    pub start: f64,
    pub end: f64,
    pub direction: Direction,
    /// Hover text, e.g. `Age = 71: +0.0800 (increases risk)`
    pub label: String,
}

impl ChartSegment {
    fn from_contribution(c: &Contribution, row: usize, start: f64) -> Self {
        let direction = c.direction();
        let value_text = c.feature.domain().format_value(c.value);
        let label = format!(
            "{} = {}: {:+.4} ({})",
            c.feature.display_name(),
            value_text,
            c.contribution,
            direction.label()
        );

        Self {
            feature: c.feature,
            display_name: c.feature.display_name(),
            value: c.value,
            contribution: c.contribution,
            row,
            start,
            end: start + c.contribution,
            direction,
            label,
        }
    }

    /// Signed length (`end - start`).
    #[must_use]
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        self.direction.color()
    }
}

/// Cumulative walk from the baseline to the prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallChart {
    pub baseline: f64,
    /// Marker position; may differ from the last segment end when clamped
    pub final_probability: f64,
    pub segments: Vec<ChartSegment>,
}

impl WaterfallChart {
    /// Sum of signed segment lengths.
    #[must_use]
    pub fn net_length(&self) -> f64 {
        self.segments.iter().map(ChartSegment::length).sum()
    }

    /// Running total after the last segment.
    #[must_use]
    pub fn walk_end(&self) -> f64 {
        self.segments.last().map_or(self.baseline, |s| s.end)
    }

    /// Horizontal extent covering the baseline, every segment and the marker.
    #[must_use]
    pub fn x_extent(&self) -> (f64, f64) {
        extent(
            self.segments
                .iter()
                .flat_map(|s| [s.start, s.end])
                .chain([self.baseline, self.final_probability]),
        )
    }
}

/// Independent per-feature bars, largest effect first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TornadoChart {
    pub bars: Vec<ChartSegment>,
}

impl TornadoChart {
    /// Horizontal extent covering zero and every bar.
    #[must_use]
    pub fn x_extent(&self) -> (f64, f64) {
        extent(
            self.bars
                .iter()
                .flat_map(|b| [b.start, b.end])
                .chain(std::iter::once(0.0)),
        )
    }
}

fn extent(points: impl Iterator<Item = f64>) -> (f64, f64) {
    points.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    })
}

/// Project a result onto waterfall segments, in display order.
#[must_use]
pub fn project_waterfall(result: &AttributionResult) -> WaterfallChart {
    let mut running = result.baseline;
    let segments = result
        .contributions
        .iter()
        .enumerate()
        .map(|(row, c)| {
            let segment = ChartSegment::from_contribution(c, row, running);
            running = segment.end;
            segment
        })
        .collect();

    WaterfallChart {
        baseline: result.baseline,
        final_probability: result.final_probability,
        segments,
    }
}

/// Project a result onto tornado bars sorted by absolute contribution.
#[must_use]
pub fn project_tornado(result: &AttributionResult) -> TornadoChart {
    let bars = result
        .ranked()
        .iter()
        .enumerate()
        .map(|(row, c)| ChartSegment::from_contribution(c, row, 0.0))
        .collect();

    TornadoChart { bars }
}

//! Shapes a [`SeriesResponse`] into labelled line series for rendering.
//!
//! Output is pure data: a label per bar plus three price series (close, high, low)
//! with style hints the renderer may honour.

use serde::Serialize;

use crate::config::AXIS_LABEL_CAP;
use crate::{Bar, SeriesResponse};

/// Rendering hints attached to one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleHints {
    pub color: &'static str,
    pub border_width: u8,
    pub tension: f64,
    pub fill: bool,
    pub point_radius: u8,
    pub axis: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<[u8; 2]>,
}

/// One named numeric series, aligned index-for-index with [`ChartSeries::labels`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesLine {
    pub name: &'static str,
    pub values: Vec<f64>,
    pub style: StyleHints,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub series: Vec<SeriesLine>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn line(&self, name: &str) -> Option<&SeriesLine> {
        self.series.iter().find(|line| line.name == name)
    }

    /// Tick labels for the time axis, see [`axis_tick_labels`].
    pub fn axis_labels(&self) -> Vec<String> {
        axis_tick_labels(&self.labels, AXIS_LABEL_CAP)
    }
}

pub const CLOSE_SERIES: &str = "Close Price";
pub const HIGH_SERIES: &str = "High Price";
pub const LOW_SERIES: &str = "Low Price";

struct LineSpec {
    name: &'static str,
    color: &'static str,
    dash: Option<[u8; 2]>,
    value: fn(&Bar) -> f64,
}

const LINES: [LineSpec; 3] = [
    LineSpec {
        name: CLOSE_SERIES,
        color: "#2196f3",
        dash: None,
        value: |bar| bar.close,
    },
    LineSpec {
        name: HIGH_SERIES,
        color: "#4caf50",
        dash: Some([5, 5]),
        value: |bar| bar.high,
    },
    LineSpec {
        name: LOW_SERIES,
        color: "#f44336",
        dash: Some([5, 5]),
        value: |bar| bar.low,
    },
];

/// Map bars to close/high/low series, preserving bar order.
///
/// Returns `None` when there is nothing to render.
pub fn transform(response: &SeriesResponse) -> Option<ChartSeries> {
    if response.bars.is_empty() {
        return None;
    }

    let labels = response
        .bars
        .iter()
        .map(|bar| bar.ts.format_chart_label())
        .collect();

    let series = LINES
        .iter()
        .map(|spec| SeriesLine {
            name: spec.name,
            values: response.bars.iter().map(spec.value).collect(),
            style: StyleHints {
                color: spec.color,
                border_width: 1,
                tension: 0.4,
                fill: false,
                point_radius: 0,
                axis: "price",
                dash: spec.dash,
            },
        })
        .collect();

    Some(ChartSeries { labels, series })
}

/// Subsample axis labels: keep every `step`-th label starting at index 0, where
/// `step = ceil(len / cap)`, and blank the rest. Output has the input's length.
pub fn axis_tick_labels(labels: &[String], cap: usize) -> Vec<String> {
    let step = tick_step(labels.len(), cap);
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            if index % step == 0 {
                label.clone()
            } else {
                String::new()
            }
        })
        .collect()
}

fn tick_step(total: usize, cap: usize) -> usize {
    total.div_ceil(cap.max(1)).max(1)
}

// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Pixel geometry for the two report charts.
//!
//! Both layouts are pure: coordinates depend only on the series values and the
//! fixed canvas parameters, never on text measurement at render time. The
//! returned geometry carries labels for convenience but no other meaning.

use serde::Serialize;

/// One `(label, value)` entry of a chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    /// Category or period label.
    pub label: String,
    /// Non-negative value.
    pub value: u64
}

impl SeriesPoint {
    /// Creates a series entry.
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value
        }
    }
}

/// Fixed parameters of the ranked bar chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarCanvas {
    /// Total canvas width.
    pub width:       f64,
    /// Padding around the drawing area.
    pub padding:     f64,
    /// Column reserved for labels left of the bars.
    pub label_width: f64,
    /// Column reserved for values right of the bars.
    pub value_width: f64,
    /// Height of one bar.
    pub bar_height:  f64,
    /// Vertical gap between bars.
    pub gap:         f64
}

/// Canvas used for author rankings.
pub const BAR_CANVAS: BarCanvas = BarCanvas {
    width:       760.0,
    padding:     16.0,
    label_width: 180.0,
    value_width: 60.0,
    bar_height:  22.0,
    gap:         8.0
};

impl BarCanvas {
    /// Horizontal space available to the longest bar.
    pub fn usable_width(&self) -> f64 {
        (self.width - 2.0 * self.padding - self.label_width - self.value_width).max(0.0)
    }

    /// Canvas height needed for `count` bars.
    pub fn height_for(&self, count: usize) -> f64 {
        let bars = count as f64;
        let gaps = count.saturating_sub(1) as f64;
        2.0 * self.padding + bars * self.bar_height + gaps * self.gap
    }
}

/// One horizontal bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    /// Series label.
    pub label:  String,
    /// Series value.
    pub value:  u64,
    /// Left edge of the bar.
    pub x:      f64,
    /// Top edge of the bar.
    pub y:      f64,
    /// Bar length, proportional to the value.
    pub width:  f64,
    /// Bar thickness.
    pub height: f64
}

/// Geometry of a ranked bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarLayout {
    /// Canvas width.
    pub width:  f64,
    /// Canvas height, linear in the number of bars.
    pub height: f64,
    /// Bars in input order, top to bottom.
    pub bars:   Vec<Bar>
}

/// Lays out an already ranked series as horizontal bars.
///
/// Widths are `value / max * usable_width`. The denominator is clamped to 1 so
/// an all-zero series yields zero-width bars.
///
/// # Examples
///
/// ```
/// use repopulse::{BAR_CANVAS, SeriesPoint, layout_bars};
///
/// let layout = layout_bars(&[SeriesPoint::new("a", 4), SeriesPoint::new("b", 2)], &BAR_CANVAS);
/// assert_eq!(layout.bars[0].width, BAR_CANVAS.usable_width());
/// assert_eq!(layout.bars[1].width, BAR_CANVAS.usable_width() / 2.0);
/// ```
pub fn layout_bars(series: &[SeriesPoint], canvas: &BarCanvas) -> BarLayout {
    let max = series.iter().map(|point| point.value).max().unwrap_or(0).max(1) as f64;
    let usable = canvas.usable_width();
    let x = canvas.padding + canvas.label_width;

    let bars = series
        .iter()
        .enumerate()
        .map(|(index, point)| Bar {
            label: point.label.clone(),
            value: point.value,
            x,
            y: canvas.padding + index as f64 * (canvas.bar_height + canvas.gap),
            width: point.value as f64 / max * usable,
            height: canvas.bar_height
        })
        .collect();

    BarLayout {
        width: canvas.width,
        height: canvas.height_for(series.len()),
        bars
    }
}

/// Fixed parameters of the monthly line chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineCanvas {
    /// Total canvas width.
    pub width:          f64,
    /// Total canvas height.
    pub height:         f64,
    /// Left padding, holds the value labels.
    pub padding_left:   f64,
    /// Right padding.
    pub padding_right:  f64,
    /// Top padding.
    pub padding_top:    f64,
    /// Bottom padding, holds the period labels.
    pub padding_bottom: f64
}

/// Canvas used for monthly trends.
pub const LINE_CANVAS: LineCanvas = LineCanvas {
    width:          760.0,
    height:         280.0,
    padding_left:   48.0,
    padding_right:  24.0,
    padding_top:    20.0,
    padding_bottom: 40.0
};

impl LineCanvas {
    /// Width of the plotting area.
    pub fn usable_width(&self) -> f64 {
        (self.width - self.padding_left - self.padding_right).max(0.0)
    }

    /// Height of the plotting area.
    pub fn usable_height(&self) -> f64 {
        (self.height - self.padding_top - self.padding_bottom).max(0.0)
    }
}

/// Number of horizontal gridlines, including the baseline and the top line.
pub const GRIDLINE_COUNT: usize = 6;
/// Approximate number of period labels kept on the x axis.
pub const TARGET_X_TICKS: usize = 6;

/// Plotted data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    /// Period label.
    pub label: String,
    /// Series value.
    pub value: u64,
    /// Horizontal position.
    pub x:     f64,
    /// Vertical position; larger values sit higher.
    pub y:     f64
}

/// Horizontal gridline at a fraction of the maximum value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gridline {
    /// Vertical position.
    pub y:     f64,
    /// Left end.
    pub x1:    f64,
    /// Right end.
    pub x2:    f64,
    /// Value at this level, formatted.
    pub label: String
}

/// X axis label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLabel {
    /// Horizontal anchor.
    pub x:    f64,
    /// Baseline.
    pub y:    f64,
    /// Label text.
    pub text: String
}

/// Geometry of the time-series line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineLayout {
    /// Canvas width.
    pub width:     f64,
    /// Canvas height.
    pub height:    f64,
    /// Points in series order.
    pub points:    Vec<LinePoint>,
    /// Path data (`M x y L x y ...`) through all points; empty for an empty
    /// series.
    pub path:      String,
    /// Gridlines from the baseline (0%) up to the maximum (100%).
    pub gridlines: Vec<Gridline>,
    /// Thinned x axis labels.
    pub x_labels:  Vec<AxisLabel>
}

/// Lays out an ordered series as a line with markers, gridlines, and labels.
///
/// x interpolates the index across the usable width (a single point is
/// centered); y interpolates the value across `[0, max]` onto
/// `[usable_height, 0]`.
pub fn layout_line(series: &[SeriesPoint], canvas: &LineCanvas) -> LineLayout {
    let max_value = series.iter().map(|point| point.value).max().unwrap_or(0);
    let max = max_value.max(1) as f64;
    let usable_width = canvas.usable_width();
    let usable_height = canvas.usable_height();
    let baseline = canvas.padding_top + usable_height;

    let x_at = |index: usize| {
        if series.len() <= 1 {
            canvas.padding_left + usable_width / 2.0
        } else {
            canvas.padding_left + index as f64 * usable_width / (series.len() - 1) as f64
        }
    };

    let points: Vec<LinePoint> = series
        .iter()
        .enumerate()
        .map(|(index, point)| LinePoint {
            label: point.label.clone(),
            value: point.value,
            x:     x_at(index),
            y:     baseline - point.value as f64 / max * usable_height
        })
        .collect();

    let path = points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let command = if index == 0 { 'M' } else { 'L' };
            format!("{command} {:.2} {:.2}", point.x, point.y)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let steps = (GRIDLINE_COUNT - 1) as f64;
    let gridlines = (0..GRIDLINE_COUNT)
        .map(|level| {
            let fraction = level as f64 / steps;
            Gridline {
                y:     baseline - fraction * usable_height,
                x1:    canvas.padding_left,
                x2:    canvas.padding_left + usable_width,
                label: format_level(max_value as f64 * fraction)
            }
        })
        .collect();

    let label_y = canvas.height - canvas.padding_bottom + 18.0;
    let x_labels = thin_label_indices(series.len(), TARGET_X_TICKS)
        .into_iter()
        .map(|index| AxisLabel {
            x:    points[index].x,
            y:    label_y,
            text: points[index].label.clone()
        })
        .collect();

    LineLayout {
        width: canvas.width,
        height: canvas.height,
        points,
        path,
        gridlines,
        x_labels
    }
}

/// Picks the indices of labels to show on an axis of `count` entries.
///
/// Every `ceil(count / target)`-th index is kept, plus the first and the last.
/// The label just before the last one is dropped when it would sit closer
/// than half a step.
///
/// # Examples
///
/// ```
/// use repopulse::thin_label_indices;
///
/// assert_eq!(thin_label_indices(4, 6), vec![0, 1, 2, 3]);
/// assert_eq!(thin_label_indices(24, 6), vec![0, 4, 8, 12, 16, 20, 23]);
/// ```
pub fn thin_label_indices(count: usize, target: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let step = count.div_ceil(target.max(1)).max(1);
    let mut indices: Vec<usize> = (0..count).step_by(step).collect();
    let last = count - 1;
    if indices.last() != Some(&last) {
        if let Some(&previous) = indices.last()
            && previous != 0
            && (last - previous) * 2 < step
        {
            indices.pop();
        }
        indices.push(last);
    }
    indices
}

fn format_level(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as u64)
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn series(values: &[u64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| SeriesPoint::new(format!("p{index}"), *value))
            .collect()
    }

    #[test]
    fn bars_stack_vertically_with_fixed_gap() {
        let layout = layout_bars(&series(&[10, 5, 0]), &BAR_CANVAS);
        assert_eq!(layout.bars.len(), 3);
        assert_eq!(layout.bars[0].y, 16.0);
        assert_eq!(layout.bars[1].y, 46.0);
        assert_eq!(layout.bars[2].y, 76.0);
        assert_eq!(layout.height, 16.0 * 2.0 + 3.0 * 22.0 + 2.0 * 8.0);
        assert!(layout.bars.iter().all(|bar| bar.x == 196.0));
        assert_eq!(layout.bars[0].width, 488.0);
        assert_eq!(layout.bars[1].width, 244.0);
        assert_eq!(layout.bars[2].width, 0.0);
    }

    #[test]
    fn all_zero_bars_have_zero_width() {
        let layout = layout_bars(&series(&[0, 0]), &BAR_CANVAS);
        assert!(layout.bars.iter().all(|bar| bar.width == 0.0));
    }

    #[test]
    fn empty_bar_chart_keeps_padding() {
        let layout = layout_bars(&[], &BAR_CANVAS);
        assert!(layout.bars.is_empty());
        assert_eq!(layout.height, 32.0);
    }

    #[test]
    fn canvas_height_grows_linearly() {
        let one = BAR_CANVAS.height_for(1);
        let two = BAR_CANVAS.height_for(2);
        let three = BAR_CANVAS.height_for(3);
        assert_eq!(two - one, three - two);
    }

    #[test]
    fn single_point_is_centered() {
        let layout = layout_line(&series(&[3]), &LINE_CANVAS);
        assert_eq!(layout.points[0].x, 48.0 + 688.0 / 2.0);
        assert_eq!(layout.points[0].y, 20.0);
        assert_eq!(layout.path, "M 392.00 20.00");
    }

    #[test]
    fn line_spans_usable_width() {
        let layout = layout_line(&series(&[0, 2, 4]), &LINE_CANVAS);
        assert_eq!(layout.points[0].x, 48.0);
        assert_eq!(layout.points[2].x, 736.0);
        assert_eq!(layout.points[0].y, 240.0);
        assert_eq!(layout.points[1].y, 130.0);
        assert_eq!(layout.points[2].y, 20.0);
        assert!(layout.path.starts_with("M 48.00 240.00 L "));
    }

    #[test]
    fn gridlines_cover_six_levels() {
        let layout = layout_line(&series(&[0, 10]), &LINE_CANVAS);
        let labels: Vec<&str> = layout.gridlines.iter().map(|line| line.label.as_str()).collect();
        assert_eq!(labels, vec!["0", "2", "4", "6", "8", "10"]);
        assert_eq!(layout.gridlines[0].y, 240.0);
        assert_eq!(layout.gridlines[5].y, 20.0);

        let fractional = layout_line(&series(&[3]), &LINE_CANVAS);
        assert_eq!(fractional.gridlines[1].label, "0.6");
    }

    #[test]
    fn zero_series_stays_on_baseline() {
        let layout = layout_line(&series(&[0, 0, 0]), &LINE_CANVAS);
        assert!(layout.points.iter().all(|point| point.y == 240.0));
        assert!(layout.gridlines.iter().all(|line| line.label == "0"));
    }

    #[test]
    fn empty_line_chart_has_no_points() {
        let layout = layout_line(&[], &LINE_CANVAS);
        assert!(layout.points.is_empty());
        assert!(layout.path.is_empty());
        assert!(layout.x_labels.is_empty());
        assert_eq!(layout.gridlines.len(), GRIDLINE_COUNT);
    }

    #[test]
    fn long_series_labels_are_thinned() {
        let layout = layout_line(&series(&[1; 36]), &LINE_CANVAS);
        let texts: Vec<&str> = layout.x_labels.iter().map(|label| label.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"p0"));
        assert_eq!(texts.last(), Some(&"p35"));
        assert!(texts.len() <= TARGET_X_TICKS + 1);
    }

    #[test]
    fn thinning_keeps_first_and_last() {
        assert_eq!(thin_label_indices(0, 6), Vec::<usize>::new());
        assert_eq!(thin_label_indices(1, 6), vec![0]);
        assert_eq!(thin_label_indices(7, 6), vec![0, 2, 4, 6]);
        assert_eq!(thin_label_indices(13, 6), vec![0, 3, 6, 9, 12]);
        assert_eq!(thin_label_indices(31, 6), vec![0, 6, 12, 18, 24, 30]);
        assert_eq!(thin_label_indices(32, 6), vec![0, 6, 12, 18, 24, 31]);
    }

    proptest! {
        #[test]
        fn larger_values_get_longer_bars(values in prop::collection::vec(0u64..10_000, 1..40)) {
            let layout = layout_bars(&series(&values), &BAR_CANVAS);
            for a in &layout.bars {
                if a.value == 0 {
                    prop_assert_eq!(a.width, 0.0);
                }
                for b in &layout.bars {
                    if a.value > b.value {
                        prop_assert!(a.width > b.width);
                    }
                }
            }
        }

        #[test]
        fn increasing_values_rise_on_canvas(start in 0u64..100, deltas in prop::collection::vec(1u64..50, 1..30)) {
            let mut values = vec![start];
            for delta in deltas {
                let next = values[values.len() - 1] + delta;
                values.push(next);
            }
            let layout = layout_line(&series(&values), &LINE_CANVAS);
            prop_assert!(layout.points.windows(2).all(|pair| pair[1].y < pair[0].y));
        }
    }
}

// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Inline SVG serialization of chart geometry.

use std::fmt::Write as _;

use crate::{
    chart::{BarLayout, LineLayout},
    markup::{Fragments, escape_xml}
};

const FONT: &str = "font-family=\"'Segoe UI', 'SF Pro Display', sans-serif\"";
const BAR_FILL: &str = "#2f81f7";
const LINE_STROKE: &str = "#1f883d";
const GRID_STROKE: &str = "#d0d7de";
const TEXT_FILL: &str = "#57606a";

/// Serializes a ranked bar chart with one label and value per bar.
pub fn bar_chart_svg(layout: &BarLayout, title: &str) -> String {
    let mut svg = Fragments::new();
    open_svg(&mut svg, layout.width, layout.height, title);

    if layout.bars.is_empty() {
        empty_notice(&mut svg, layout.width, layout.height);
    }

    for bar in &layout.bars {
        let label = escape_xml(&bar.label);
        let middle = bar.y + bar.height / 2.0 + 4.0;
        let _ = writeln!(
            svg,
            "  <text x=\"{:.2}\" y=\"{middle:.2}\" text-anchor=\"end\" {FONT} font-size=\"12\" fill=\"{TEXT_FILL}\">{label}</text>",
            bar.x - 8.0,
        );
        let _ = writeln!(
            svg,
            "  <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"3\" fill=\"{BAR_FILL}\"><title>{label}: {}</title></rect>",
            bar.x, bar.y, bar.width, bar.height, bar.value,
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.2}\" y=\"{middle:.2}\" {FONT} font-size=\"12\" fill=\"{TEXT_FILL}\">{}</text>",
            bar.x + bar.width + 6.0,
            bar.value,
        );
    }

    svg.push("</svg>\n");
    svg.finish()
}

/// Serializes the monthly line chart: gridlines, polyline, markers, labels.
pub fn line_chart_svg(layout: &LineLayout, title: &str) -> String {
    let mut svg = Fragments::new();
    open_svg(&mut svg, layout.width, layout.height, title);

    for gridline in &layout.gridlines {
        let _ = writeln!(
            svg,
            "  <line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"{GRID_STROKE}\" stroke-width=\"1\"/>",
            gridline.x1,
            gridline.x2,
            y = gridline.y,
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\" {FONT} font-size=\"11\" fill=\"{TEXT_FILL}\">{}</text>",
            gridline.x1 - 6.0,
            gridline.y + 4.0,
            escape_xml(&gridline.label),
        );
    }

    if layout.points.is_empty() {
        empty_notice(&mut svg, layout.width, layout.height);
    } else {
        let _ = writeln!(
            svg,
            "  <path d=\"{}\" fill=\"none\" stroke=\"{LINE_STROKE}\" stroke-width=\"2\" stroke-linejoin=\"round\"/>",
            layout.path,
        );
    }

    for point in &layout.points {
        let _ = writeln!(
            svg,
            "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"3.5\" fill=\"{LINE_STROKE}\"><title>{}: {}</title></circle>",
            point.x,
            point.y,
            escape_xml(&point.label),
            point.value,
        );
    }

    for label in &layout.x_labels {
        let _ = writeln!(
            svg,
            "  <text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" {FONT} font-size=\"11\" fill=\"{TEXT_FILL}\">{}</text>",
            label.x,
            label.y,
            escape_xml(&label.text),
        );
    }

    svg.push("</svg>\n");
    svg.finish()
}

fn open_svg(svg: &mut Fragments, width: f64, height: f64, title: &str) {
    let title = escape_xml(title);
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-label=\"{title}\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.0} {height:.0}\">",
    );
    let _ = writeln!(svg, "  <title>{title}</title>");
}

fn empty_notice(svg: &mut Fragments, width: f64, height: f64) {
    let _ = writeln!(
        svg,
        "  <text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" {FONT} font-size=\"13\" fill=\"{TEXT_FILL}\">No data</text>",
        width / 2.0,
        (height / 2.0).max(20.0),
    );
}

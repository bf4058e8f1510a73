//! Bar chart rendering.
//!
//! Charts are plain data ([`BarChart`]); a [`ChartRenderer`] turns one into
//! markup. Documents embed SVG, the dashboard prints text bars.

use crate::magnitude::format_magnitude;
use serde::Serialize;
use std::fmt::Write;

/// A titled bar chart: one bar per label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color: String,
    pub bars: Vec<(String, f64)>,
}

impl BarChart {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        color: impl Into<String>,
        bars: Vec<(String, f64)>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            color: color.into(),
            bars,
        }
    }

    /// Lowest and highest value, always including zero.
    fn value_range(&self) -> (f64, f64) {
        self.bars
            .iter()
            .map(|(_, v)| *v)
            .filter(|v| v.is_finite())
            .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }
}

/// Turns a bar chart into a rendered form.
pub trait ChartRenderer {
    fn render(&self, chart: &BarChart) -> String;
}

/// Renders charts as standalone SVG images.
#[derive(Debug, Clone, Copy)]
pub struct SvgChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            width: 640,
            height: 400,
        }
    }
}

const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 64.0;
const TICK_COUNT: f64 = 5.0;

impl ChartRenderer for SvgChartRenderer {
    #[allow(clippy::cast_precision_loss)]
    fn render(&self, chart: &BarChart) -> String {
        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;

        let (lo, hi) = chart.value_range();
        let (axis_lo, axis_hi, step) = nice_axis(lo, hi);
        let span = axis_hi - axis_lo;
        let y_of = |v: f64| MARGIN_TOP + (axis_hi - v) / span * plot_h;

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="Helvetica Neue, Helvetica, Arial, sans-serif" font-size="12">"#,
            w = self.width,
            h = self.height
        );
        let _ = write!(
            svg,
            r#"<rect width="{width}" height="{height}" fill="white"/>"#
        );
        let _ = write!(
            svg,
            r#"<text x="{x}" y="24" text-anchor="middle" font-size="15">{t}</text>"#,
            x = width / 2.0,
            t = escape_xml(&chart.title)
        );

        // Gridlines and y tick labels
        let mut tick = axis_lo;
        while tick <= axis_hi + step / 2.0 {
            let y = y_of(tick);
            let _ = write!(
                svg,
                r##"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#dddddd"/><text x="{tx}" y="{ty:.1}" text-anchor="end">{label}</text>"##,
                x1 = MARGIN_LEFT,
                x2 = MARGIN_LEFT + plot_w,
                tx = MARGIN_LEFT - 6.0,
                ty = y + 4.0,
                label = escape_xml(&format_magnitude(tick))
            );
            tick += step;
        }

        if !chart.bars.is_empty() {
            let slot = plot_w / chart.bars.len() as f64;
            let bar_w = slot * 0.7;
            let zero_y = y_of(0.0);
            for (idx, (label, value)) in chart.bars.iter().enumerate() {
                let value = if value.is_finite() { *value } else { 0.0 };
                let x = MARGIN_LEFT + slot * idx as f64 + (slot - bar_w) / 2.0;
                let top = y_of(value.max(0.0));
                let bar_h = (y_of(value.min(0.0)) - top).max(0.0);
                let _ = write!(
                    svg,
                    r#"<rect x="{x:.1}" y="{top:.1}" width="{bar_w:.1}" height="{bar_h:.1}" fill="{fill}"><title>{tip}</title></rect>"#,
                    fill = escape_xml(&chart.color),
                    tip = escape_xml(&format!("{label}: {}", format_magnitude(value)))
                );
                let _ = write!(
                    svg,
                    r#"<text x="{cx:.1}" y="{ly:.1}" text-anchor="middle">{l}</text>"#,
                    cx = x + bar_w / 2.0,
                    ly = MARGIN_TOP + plot_h + 16.0,
                    l = escape_xml(label)
                );
            }
            let _ = write!(
                svg,
                r##"<line x1="{x1}" y1="{zero_y:.1}" x2="{x2}" y2="{zero_y:.1}" stroke="#333333"/>"##,
                x1 = MARGIN_LEFT,
                x2 = MARGIN_LEFT + plot_w
            );
        }

        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y}" text-anchor="middle">{l}</text>"#,
            x = MARGIN_LEFT + plot_w / 2.0,
            y = height - 16.0,
            l = escape_xml(&chart.x_label)
        );
        let _ = write!(
            svg,
            r#"<text x="16" y="{y}" text-anchor="middle" transform="rotate(-90 16 {y})">{l}</text>"#,
            y = MARGIN_TOP + plot_h / 2.0,
            l = escape_xml(&chart.y_label)
        );
        svg.push_str("</svg>");
        svg
    }
}

/// Axis bounds and tick step that cover `lo..=hi` with round numbers.
fn nice_axis(lo: f64, hi: f64) -> (f64, f64, f64) {
    let span = hi - lo;
    if span <= 0.0 {
        return (0.0, 1.0, 0.2);
    }
    let raw = span / TICK_COUNT;
    let magnitude = 10_f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let step = magnitude
        * if residual > 5.0 {
            10.0
        } else if residual > 2.0 {
            5.0
        } else if residual > 1.0 {
            2.0
        } else {
            1.0
        };
    ((lo / step).floor() * step, (hi / step).ceil() * step, step)
}

/// Escape text for inclusion in XML or HTML.
#[must_use]
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders charts as horizontal text bars for the terminal.
#[derive(Debug, Clone, Copy)]
pub struct TextChartRenderer {
    /// Width of the longest bar in characters.
    pub bar_width: usize,
}

impl Default for TextChartRenderer {
    fn default() -> Self {
        Self { bar_width: 40 }
    }
}

impl ChartRenderer for TextChartRenderer {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn render(&self, chart: &BarChart) -> String {
        let mut out = format!("{}\n", chart.title);
        if chart.bars.is_empty() {
            out.push_str("  (no data)\n");
            return out;
        }

        let label_w = chart
            .bars
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);
        let (lo, hi) = chart.value_range();
        let largest = hi.max(-lo);

        for (label, value) in &chart.bars {
            let len = if largest > 0.0 && value.is_finite() {
                (value.abs() / largest * self.bar_width as f64).round() as usize
            } else {
                0
            };
            let glyph = if *value < 0.0 { "▒" } else { "█" };
            let _ = writeln!(
                out,
                "  {label:>label_w$} │{} {}",
                glyph.repeat(len),
                format_magnitude(*value)
            );
        }
        out
    }
}

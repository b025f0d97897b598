//! Minimal SVG line and density charts.

use std::fmt::Write;

/// Chart size in SVG user units (100 per inch).
pub const VIEW_WIDTH: f64 = 600.0;
pub const VIEW_HEIGHT: f64 = 400.0;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 110.0;
const MARGIN_TOP: f64 = 25.0;
const MARGIN_BOTTOM: f64 = 60.0;

const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    LineWithMarkers,
    /// Area under the curve filled at half opacity.
    FilledArea,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub x_label: String,
    pub y_label: String,
    pub style: Style,
    /// Categorical tick labels at x = 0, 1, ...; numeric ticks when `None`.
    pub x_categories: Option<Vec<String>>,
    pub traces: Vec<Trace>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Round tick step covering `span` in about five intervals.
fn tick_step(span: f64) -> f64 {
    if span <= 0.0 || !span.is_finite() {
        return 1.0;
    }
    let raw = span / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let nice = if residual < 1.5 {
        1.0
    } else if residual < 3.0 {
        2.0
    } else if residual < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn ticks(lo: f64, hi: f64) -> Vec<f64> {
    let step = tick_step(hi - lo);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

fn tick_label(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_string() } else { text.to_string() }
}

struct Bounds {
    x: (f64, f64),
    y: (f64, f64),
}

impl Bounds {
    fn px(&self, x: f64) -> f64 {
        let width = VIEW_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (x - self.x.0) / (self.x.1 - self.x.0) * width
    }

    fn py(&self, y: f64) -> f64 {
        let height = VIEW_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        VIEW_HEIGHT - MARGIN_BOTTOM - (y - self.y.0) / (self.y.1 - self.y.0) * height
    }
}

impl Chart {
    fn bounds(&self) -> Bounds {
        let points = self.traces.iter().flat_map(|t| t.points.iter());
        let (mut x_lo, mut x_hi, mut y_hi) = (f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(x, y) in points {
            x_lo = x_lo.min(x);
            x_hi = x_hi.max(x);
            y_hi = y_hi.max(y);
        }
        if let Some(categories) = &self.x_categories {
            x_lo = -0.5;
            x_hi = categories.len() as f64 - 0.5;
        }
        if !x_lo.is_finite() || x_hi <= x_lo {
            (x_lo, x_hi) = (0.0, 1.0);
        }
        if !y_hi.is_finite() || y_hi <= 0.0 {
            y_hi = 1.0;
        }
        Bounds {
            x: (x_lo, x_hi),
            y: (0.0, y_hi * 1.05),
        }
    }

    /// Renders the chart as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let b = self.bounds();
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{VIEW_WIDTH}" height="{VIEW_HEIGHT}" viewBox="0 0 {VIEW_WIDTH} {VIEW_HEIGHT}" font-family="DejaVu Sans, Arial, sans-serif">"#
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

        let (left, right) = (b.px(b.x.0), b.px(b.x.1));
        let (top, bottom) = (b.py(b.y.1), b.py(b.y.0));

        for y in ticks(b.y.0, b.y.1) {
            let py = b.py(y);
            let _ = writeln!(
                svg,
                r##"<line x1="{left:.2}" y1="{py:.2}" x2="{right:.2}" y2="{py:.2}" stroke="#e5e5e5" stroke-width="0.6"/><text x="{:.2}" y="{:.2}" font-size="9" text-anchor="end">{}</text>"##,
                left - 5.0,
                py + 3.0,
                tick_label(y)
            );
        }
        let x_ticks: Vec<(f64, String)> = match &self.x_categories {
            Some(categories) => categories
                .iter()
                .enumerate()
                .map(|(i, label)| (i as f64, label.clone()))
                .collect(),
            None => ticks(b.x.0, b.x.1)
                .into_iter()
                .map(|x| (x, tick_label(x)))
                .collect(),
        };
        for (x, label) in x_ticks {
            let px = b.px(x);
            let _ = writeln!(
                svg,
                r#"<line x1="{px:.2}" y1="{bottom:.2}" x2="{px:.2}" y2="{:.2}" stroke="black" stroke-width="0.8"/><text x="{px:.2}" y="{:.2}" font-size="8" text-anchor="middle">{}</text>"#,
                bottom + 4.0,
                bottom + 14.0,
                escape(&label)
            );
        }
        let _ = writeln!(
            svg,
            r#"<rect x="{left:.2}" y="{top:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black" stroke-width="0.8"/>"#,
            right - left,
            bottom - top
        );

        for (i, trace) in self.traces.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let path: Vec<String> = trace
                .points
                .iter()
                .map(|&(x, y)| format!("{:.2},{:.2}", b.px(x), b.py(y)))
                .collect();
            if path.is_empty() {
                continue;
            }
            match self.style {
                Style::LineWithMarkers => {
                    let _ = writeln!(
                        svg,
                        r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="1.6"/>"#,
                        path.join(" ")
                    );
                    for &(x, y) in &trace.points {
                        let _ = writeln!(
                            svg,
                            r#"<circle cx="{:.2}" cy="{:.2}" r="3" fill="{color}"/>"#,
                            b.px(x),
                            b.py(y)
                        );
                    }
                }
                Style::FilledArea => {
                    let (first, last) = (trace.points[0].0, trace.points[trace.points.len() - 1].0);
                    let _ = writeln!(
                        svg,
                        r#"<polygon points="{:.2},{bottom:.2} {} {:.2},{bottom:.2}" fill="{color}" fill-opacity="0.5" stroke="{color}" stroke-width="1"/>"#,
                        b.px(first),
                        path.join(" "),
                        b.px(last)
                    );
                }
            }
            let ly = top + 12.0 + 16.0 * i as f64;
            let lx = right + 12.0;
            let _ = writeln!(
                svg,
                r#"<rect x="{lx:.2}" y="{:.2}" width="12" height="8" fill="{color}"/><text x="{:.2}" y="{ly:.2}" font-size="9">{}</text>"#,
                ly - 7.5,
                lx + 17.0,
                escape(&trace.label)
            );
        }

        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" font-size="11" text-anchor="middle">{}</text>"#,
            (left + right) / 2.0,
            VIEW_HEIGHT - 15.0,
            escape(&self.x_label)
        );
        let (cx, cy) = (18.0, (top + bottom) / 2.0);
        let _ = writeln!(
            svg,
            r#"<text x="{cx}" y="{cy:.2}" font-size="11" text-anchor="middle" transform="rotate(-90 {cx} {cy:.2})">{}</text>"#,
            escape(&self.y_label)
        );
        svg.push_str("</svg>\n");
        svg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_steps_are_round() {
        assert!((tick_step(1.0) - 0.2).abs() < 1e-12);
        assert!((tick_step(0.5) - 0.1).abs() < 1e-12);
        assert!((tick_step(35.0) - 10.0).abs() < 1e-12);
        assert!((tick_step(20.0) - 5.0).abs() < 1e-12);
        assert_eq!(tick_label(0.30000000000000004), "0.3");
    }

    #[test]
    fn svg_contains_traces_and_labels() {
        let chart = Chart {
            x_label: "artifact_burden quintile".into(),
            y_label: "Pr(ΔDx=1)".into(),
            style: Style::LineWithMarkers,
            x_categories: Some(vec!["Q1".into(), "Q2".into()]),
            traces: vec![Trace {
                label: "ICD".into(),
                points: vec![(0.0, 0.2), (1.0, 0.4)],
            }],
        };
        let svg = chart.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("Pr(ΔDx=1)"));
        assert!(svg.contains(">ICD</text>"));
    }
}

//! Static SVG plots: histograms, line charts, bar charts and interval tracks.
//!
//! Plots are rendered on the server so a page is a self-contained HTML
//! fragment; the browser only has to insert it.

use crate::utils::{escape_html, format_float};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 260.0;
const LEFT: f64 = 64.0;
const RIGHT: f64 = 24.0;
const TOP: f64 = 32.0;
const BOTTOM: f64 = 44.0;
const TICKS: usize = 5;
/// Height of one row of an [`Intervals`] plot.
const TRACK_HEIGHT: f64 = 14.0;

const FILL: &str = "#0072B5";

// ----------------------------------------------------------------------------
// Plot

/// Any plot that can be placed on a page.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Plot {
    Histogram(Histogram),
    Line(Line),
    Bar(Bar),
    Intervals(Intervals),
}

impl Plot {
    pub fn title(&self) -> &str {
        match self {
            Plot::Histogram(p) => &p.title,
            Plot::Line(p) => &p.title,
            Plot::Bar(p) => &p.title,
            Plot::Intervals(p) => &p.title,
        }
    }

    /// Render the plot as an inline `<svg>` element.
    pub fn to_svg(&self) -> String {
        match self {
            Plot::Histogram(p) => p.to_svg(),
            Plot::Line(p) => p.to_svg(),
            Plot::Bar(p) => p.to_svg(),
            Plot::Intervals(p) => p.to_svg(),
        }
    }
}

#[rustfmt::skip]
impl From<Histogram> for Plot { fn from(p: Histogram) -> Self { Plot::Histogram(p) } }
#[rustfmt::skip]
impl From<Line> for Plot { fn from(p: Line) -> Self { Plot::Line(p) } }
#[rustfmt::skip]
impl From<Bar> for Plot { fn from(p: Bar) -> Self { Plot::Bar(p) } }
#[rustfmt::skip]
impl From<Intervals> for Plot { fn from(p: Intervals) -> Self { Plot::Intervals(p) } }

// ----------------------------------------------------------------------------
// Histogram

/// Counts of values in equal-width bins.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Histogram {
    pub title: String,
    pub x_label: String,
    pub values: Vec<f64>,
    bins: usize,
}

impl Histogram {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, values: Vec<f64>) -> Self {
        Histogram { title: title.into(), x_label: x_label.into(), values, bins: 40 }
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins.max(1);
        self
    }

    /// Bins the finite values, returning `(left, right, count)` per bin.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::content::Histogram;
    /// let histogram = Histogram::new("Spans", "span", vec![0.0, 1.0, 1.0, 4.0]).bins(2);
    /// assert_eq!(histogram.counts(), [(0.0, 2.0, 3), (2.0, 4.0, 1)]);
    /// ```
    pub fn counts(&self) -> Vec<(f64, f64, usize)> {
        let values = self.values.iter().copied().filter(|v| v.is_finite()).collect_vec();
        let Some((min, max)) = min_max(&values) else {
            return Vec::new();
        };
        let (min, max) = match min == max {
            true => (min - 0.5, max + 0.5),
            false => (min, max),
        };
        // deserialized histograms bypass `bins()`
        let bins = self.bins.max(1);
        let width = (max - min) / bins as f64;
        let mut counts: Vec<usize> = vec![0; bins];
        for v in values {
            // the maximum belongs to the last bin
            let i = (((v - min) / width) as usize).min(bins - 1);
            counts[i] += 1;
        }
        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| {
                let left = min + i as f64 * width;
                let right = if i + 1 == bins { max } else { left + width };
                (left, right, count)
            })
            .collect()
    }

    fn to_svg(&self) -> String {
        let counts = self.counts();
        if counts.is_empty() {
            return empty_svg(&self.title);
        }
        let x = (counts[0].0, counts[counts.len() - 1].1);
        let y_max = counts.iter().map(|c| c.2).max().unwrap_or_default().max(1) as f64;
        let frame = Frame::new(x, (0.0, y_max));

        let mut svg = frame.open(&self.title);
        for (left, right, count) in counts {
            let (x0, x1) = (frame.px(left), frame.px(right));
            let (y0, y1) = (frame.py(count as f64), frame.py(0.0));
            svg.push_str(&format!(
                "<rect x=\"{x0:.1}\" y=\"{y0:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{FILL}\" stroke=\"#fff\" stroke-width=\"0.5\"><title>[{}, {}): {count}</title></rect>",
                (x1 - x0).max(0.5),
                y1 - y0,
                format_float(left),
                format_float(right),
            ));
        }
        svg.push_str(&frame.axes(&self.x_label, "count"));
        svg.push_str("</svg>");
        svg
    }
}

// ----------------------------------------------------------------------------
// Line

/// A line through `(x, y)` points, in the given order.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Line {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
}

impl Line {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        points: Vec<(f64, f64)>,
    ) -> Self {
        Line { title: title.into(), x_label: x_label.into(), y_label: y_label.into(), points }
    }

    fn to_svg(&self) -> String {
        let points = self.points.iter().filter(|(x, y)| x.is_finite() && y.is_finite()).collect_vec();
        let xs = points.iter().map(|p| p.0).collect_vec();
        let ys = points.iter().map(|p| p.1).collect_vec();
        let (Some(x), Some(y)) = (min_max(&xs), min_max(&ys)) else {
            return empty_svg(&self.title);
        };
        let frame = Frame::new(x, (y.0.min(0.0), y.1));

        let mut svg = frame.open(&self.title);
        let path = points.iter().map(|(x, y)| format!("{:.1},{:.1}", frame.px(*x), frame.py(*y))).join(" ");
        svg.push_str(&format!(
            "<polyline points=\"{path}\" fill=\"none\" stroke=\"{FILL}\" stroke-width=\"1.5\"/>"
        ));
        svg.push_str(&frame.axes(&self.x_label, &self.y_label));
        svg.push_str("</svg>");
        svg
    }
}

// ----------------------------------------------------------------------------
// Bar

/// One labelled bar per category.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Bar {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
}

impl Bar {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        bars: Vec<(String, f64)>,
    ) -> Self {
        Bar { title: title.into(), x_label: x_label.into(), y_label: y_label.into(), bars }
    }

    fn to_svg(&self) -> String {
        if self.bars.is_empty() {
            return empty_svg(&self.title);
        }
        let n = self.bars.len() as f64;
        let y_max = self.bars.iter().map(|b| b.1).filter(|v| v.is_finite()).fold(0.0, f64::max);
        let frame = Frame::new((0.0, n), (0.0, if y_max > 0.0 { y_max } else { 1.0 }));

        let mut svg = frame.open(&self.title);
        for (i, (label, value)) in self.bars.iter().enumerate() {
            let (x0, x1) = (frame.px(i as f64 + 0.1), frame.px(i as f64 + 0.9));
            let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
            let (y0, y1) = (frame.py(value), frame.py(0.0));
            svg.push_str(&format!(
                "<rect x=\"{x0:.1}\" y=\"{y0:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{FILL}\"><title>{}: {}</title></rect>",
                x1 - x0,
                y1 - y0,
                escape_html(label),
                format_float(value),
            ));
            // label every bar while they fit, otherwise every few
            let every = (self.bars.len() / 20).max(1);
            if i % every == 0 {
                svg.push_str(&format!(
                    "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" text-anchor=\"middle\">{}</text>",
                    (x0 + x1) / 2.0,
                    y1 + 12.0,
                    escape_html(label)
                ));
            }
        }
        svg.push_str(&frame.axis_titles(&self.x_label, &self.y_label));
        svg.push_str(&frame.y_ticks());
        svg.push_str("</svg>");
        svg
    }
}

// ----------------------------------------------------------------------------
// Intervals

/// Horizontal tracks of genome intervals, one row per label.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Intervals {
    pub title: String,
    /// Length of the genome, the extent of the x axis.
    pub length: f64,
    pub tracks: Vec<(String, Vec<(f64, f64)>)>,
}

impl Intervals {
    pub fn new(title: impl Into<String>, length: f64) -> Self {
        Intervals { title: title.into(), length, tracks: Vec::new() }
    }

    pub fn add_track(&mut self, label: impl Into<String>, intervals: Vec<(f64, f64)>) {
        self.tracks.push((label.into(), intervals));
    }

    fn to_svg(&self) -> String {
        if self.tracks.is_empty() || !(self.length > 0.0) {
            return empty_svg(&self.title);
        }
        let height = TOP + BOTTOM + TRACK_HEIGHT * self.tracks.len() as f64;
        let frame = Frame::new((0.0, self.length), (0.0, self.tracks.len() as f64)).height(height);

        let mut svg = frame.open(&self.title);
        for (row, (label, intervals)) in self.tracks.iter().enumerate() {
            let y = TOP + row as f64 * TRACK_HEIGHT;
            let label = escape_html(label);
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" text-anchor=\"end\">{}</text>",
                LEFT - 6.0,
                y + TRACK_HEIGHT * 0.75,
                label
            ));
            for (left, right) in intervals {
                let (x0, x1) = (frame.px(*left), frame.px(*right));
                svg.push_str(&format!(
                    "<rect x=\"{x0:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{FILL}\"><title>{label}: [{}, {})</title></rect>",
                    y + 2.0,
                    (x1 - x0).max(0.5),
                    TRACK_HEIGHT - 4.0,
                    format_float(*left),
                    format_float(*right),
                ));
            }
        }
        svg.push_str(&frame.x_ticks());
        svg.push_str(&frame.axis_titles("genome position", ""));
        svg.push_str("</svg>");
        svg
    }
}

// ----------------------------------------------------------------------------
// Frame

/// Maps data coordinates onto the drawing area of an SVG.
struct Frame {
    x: (f64, f64),
    y: (f64, f64),
    height: f64,
}

impl Frame {
    fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Frame { x: widen(x), y: widen(y), height: HEIGHT }
    }

    fn height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    fn plot_width(&self) -> f64 {
        WIDTH - LEFT - RIGHT
    }

    fn plot_height(&self) -> f64 {
        self.height - TOP - BOTTOM
    }

    fn px(&self, x: f64) -> f64 {
        LEFT + (x - self.x.0) / (self.x.1 - self.x.0) * self.plot_width()
    }

    fn py(&self, y: f64) -> f64 {
        TOP + self.plot_height() - (y - self.y.0) / (self.y.1 - self.y.0) * self.plot_height()
    }

    fn open(&self, title: &str) -> String {
        format!(
            "<svg class=\"plot\" xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{h}\" viewBox=\"0 0 {WIDTH} {h}\" role=\"img\"><title>{t}</title><text x=\"{cx}\" y=\"18\" font-size=\"14\" font-weight=\"bold\" text-anchor=\"middle\">{t}</text>",
            h = self.height,
            t = escape_html(title),
            cx = WIDTH / 2.0,
        )
    }

    fn axes(&self, x_label: &str, y_label: &str) -> String {
        [self.x_ticks(), self.y_ticks(), self.axis_titles(x_label, y_label)].concat()
    }

    fn x_ticks(&self) -> String {
        let bottom = TOP + self.plot_height();
        let mut svg = format!(
            "<line x1=\"{LEFT}\" y1=\"{bottom}\" x2=\"{}\" y2=\"{bottom}\" stroke=\"#444\"/>",
            WIDTH - RIGHT
        );
        for i in 0..=TICKS {
            let value = self.x.0 + (self.x.1 - self.x.0) * i as f64 / TICKS as f64;
            let x = self.px(value);
            svg.push_str(&format!(
                "<line x1=\"{x:.1}\" y1=\"{bottom}\" x2=\"{x:.1}\" y2=\"{}\" stroke=\"#444\"/><text x=\"{x:.1}\" y=\"{}\" font-size=\"10\" text-anchor=\"middle\">{}</text>",
                bottom + 4.0,
                bottom + 15.0,
                format_float(value)
            ));
        }
        svg
    }

    fn y_ticks(&self) -> String {
        let bottom = TOP + self.plot_height();
        let mut svg = format!("<line x1=\"{LEFT}\" y1=\"{TOP}\" x2=\"{LEFT}\" y2=\"{bottom}\" stroke=\"#444\"/>");
        for i in 0..=TICKS {
            let value = self.y.0 + (self.y.1 - self.y.0) * i as f64 / TICKS as f64;
            let y = self.py(value);
            svg.push_str(&format!(
                "<line x1=\"{}\" y1=\"{y:.1}\" x2=\"{LEFT}\" y2=\"{y:.1}\" stroke=\"#444\"/><text x=\"{}\" y=\"{:.1}\" font-size=\"10\" text-anchor=\"end\">{}</text>",
                LEFT - 4.0,
                LEFT - 6.0,
                y + 3.0,
                format_float(value)
            ));
        }
        svg
    }

    fn axis_titles(&self, x_label: &str, y_label: &str) -> String {
        let mut svg = format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" text-anchor=\"middle\">{}</text>",
            LEFT + self.plot_width() / 2.0,
            self.height - 8.0,
            escape_html(x_label)
        );
        if !y_label.is_empty() {
            let cy = TOP + self.plot_height() / 2.0;
            svg.push_str(&format!(
                "<text x=\"14\" y=\"{cy:.1}\" font-size=\"12\" text-anchor=\"middle\" transform=\"rotate(-90 14 {cy:.1})\">{}</text>",
                escape_html(y_label)
            ));
        }
        svg
    }
}

fn empty_svg(title: &str) -> String {
    let frame = Frame::new((0.0, 1.0), (0.0, 1.0));
    let mut svg = frame.open(title);
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"middle\" fill=\"#888\">No data</text></svg>",
        WIDTH / 2.0,
        HEIGHT / 2.0
    ));
    svg
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().copied().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}

/// Avoid a zero-width range, which cannot be scaled.
fn widen(range: (f64, f64)) -> (f64, f64) {
    match range.0 < range.1 {
        true => range,
        false => (range.0 - 0.5, range.0 + 0.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_single_value() {
        let histogram = Histogram::new("Times", "time", vec![3.0, 3.0]).bins(4);
        let counts = histogram.counts();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts.iter().map(|c| c.2).sum::<usize>(), 2);
        assert_eq!(counts[0].0, 2.5);
        assert_eq!(counts[3].1, 3.5);
    }

    #[test]
    fn histogram_ignores_nan() {
        let histogram = Histogram::new("Times", "time", vec![f64::NAN, 1.0, 2.0]).bins(1);
        assert_eq!(histogram.counts(), [(1.0, 2.0, 2)]);
    }

    #[test]
    fn histogram_zero_bins() -> Result<(), serde_json::Error> {
        let histogram = Histogram::new("Spans", "span", vec![1.0, 2.0]).bins(0);
        assert_eq!(histogram.counts(), [(1.0, 2.0, 2)]);

        let json = r#"{"title": "Spans", "x_label": "span", "values": [1.0, 2.0], "bins": 0}"#;
        let histogram: Histogram = serde_json::from_str(json)?;
        assert_eq!(histogram.counts(), [(1.0, 2.0, 2)]);
        Ok(())
    }

    #[test]
    fn empty_plots_say_so() {
        let plots: Vec<Plot> = vec![
            Histogram::new("h", "x", vec![]).into(),
            Line::new("l", "x", "y", vec![]).into(),
            Bar::new("b", "x", "y", vec![]).into(),
            Intervals::new("i", 10.0).into(),
        ];
        for plot in plots {
            let svg = plot.to_svg();
            assert!(svg.starts_with("<svg"), "{}", plot.title());
            assert!(svg.contains("No data"), "{}", plot.title());
        }
    }

    #[test]
    fn intervals_escape_labels() {
        let mut plot = Intervals::new("Edges", 10.0);
        plot.add_track("<node 4>", vec![(0.0, 5.0)]);
        let svg = Plot::from(plot).to_svg();
        assert!(svg.contains("&lt;node 4&gt;"));
        assert!(svg.contains("<rect"));
        assert!(svg.ends_with("</svg>"));
    }
}

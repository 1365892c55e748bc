//! Declarative chart specification handed to the renderer.
//!
//! A [`ChartSpec`] is built fresh for every render and never mutated
//! afterwards. Per-point styling is carried as a [`PointColorRule`] that the
//! renderer evaluates by index at draw time.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use super::input::AlertType;

/// Label of the primary measurement series.
pub const VALUE_LABEL: &str = "Value";
/// Label of the optional average line.
pub const AVERAGE_LABEL: &str = "Average";
/// Label of the upper anomaly threshold line.
pub const UPPER_THRESHOLD_LABEL: &str = "Upper Threshold";
/// Label of the lower anomaly threshold line.
pub const LOWER_THRESHOLD_LABEL: &str = "Lower Threshold";
/// Label of the per-point status series consulted by the tooltip footer.
pub const SUCCESS_LABEL: &str = "Success";
/// Label of the bar series of a home chart.
pub const CHANGE_LABEL: &str = "% Change from Avg";
/// Title of the secondary axis the change bars are plotted against.
pub const MOVING_AVERAGE_TITLE: &str = "Moving Average";

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// A color with an explicit alpha in `0.0..=1.0`.
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color: {0}")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parse `#rrggbb` or `rgba(r, g, b, a)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseColorError(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(err());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
            return Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?));
        }

        let inner = s
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        let [r, g, b, a] = parts.as_slice() else {
            return Err(err());
        };
        let a: f32 = a.parse().map_err(|_| err())?;
        if !(0.0..=1.0).contains(&a) {
            return Err(err());
        }
        Ok(Color::rgba(
            r.parse().map_err(|_| err())?,
            g.parse().map_err(|_| err())?,
            b.parse().map_err(|_| err())?,
            a,
        ))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Colors used by the configuration builder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Line and default point color of the value series.
    pub base: Color,
    /// Area under the value series.
    pub base_background: Color,
    /// Point color for samples whose check failed.
    pub failure: Color,
    /// Point color for the latest sample under a diff alert.
    pub diff_alert: Color,
    /// Point color for the latest sample under an anomaly alert.
    pub anomaly_alert: Color,
    pub average: Color,
    pub threshold: Color,
    /// Shaded corridor between the threshold lines.
    pub threshold_band: Color,
    /// Line of a home chart.
    pub home_line: Color,
    /// Change bars within the warning limit.
    pub change_good: Color,
    pub change_warning: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            base: Color::rgb(0x5c, 0x6a, 0xc4),
            base_background: Color::rgba(92, 106, 196, 0.1),
            failure: Color::rgb(0xfb, 0xbe, 0x23),
            diff_alert: Color::rgb(0xf8, 0x72, 0x72),
            anomaly_alert: Color::rgb(0xfb, 0xbd, 0x23),
            average: Color::rgb(0x6c, 0x75, 0x7d),
            threshold: Color::rgba(251, 189, 35, 0.7),
            threshold_band: Color::rgba(251, 189, 35, 0.05),
            home_line: Color::rgb(59, 130, 246),
            change_good: Color::rgb(0x00, 0xd3, 0x90),
            change_warning: Color::rgb(0xfc, 0xb7, 0x00),
        }
    }
}

/// Per-point color, resolved lazily by index.
#[derive(Debug, Clone, PartialEq)]
pub enum PointColorRule {
    /// Every point has the same color.
    Solid(Color),
    /// One color per point, `fallback` past the end.
    Each { colors: Arc<[Color]>, fallback: Color },
    /// Color depends on the point's success flag and on whether it is the
    /// latest sample under an alert.
    Status {
        success: Arc<[u8]>,
        alert_type: AlertType,
        base: Color,
        failure: Color,
        diff_alert: Color,
        anomaly_alert: Color,
    },
}

impl PointColorRule {
    /// Resolve the color of the point at `index`.
    ///
    /// A failed sample always takes the failure color; alert coloring only
    /// applies to the last sample.
    pub fn color_at(&self, index: usize) -> Color {
        match self {
            PointColorRule::Solid(color) => *color,
            PointColorRule::Each { colors, fallback } => colors.get(index).copied().unwrap_or(*fallback),
            PointColorRule::Status {
                success,
                alert_type,
                base,
                failure,
                diff_alert,
                anomaly_alert,
            } => {
                if success.get(index) == Some(&0) {
                    return *failure;
                }
                let is_last = index + 1 == success.len();
                match alert_type {
                    AlertType::Diff if is_last => *diff_alert,
                    AlertType::Anomaly if is_last => *anomaly_alert,
                    _ => *base,
                }
            }
        }
    }
}

/// Region filled beneath a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    None,
    /// Fill down to the origin.
    Origin(Color),
    /// Fill the region between this series and the one immediately before it.
    ToPreceding(Color),
}

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesKind {
    #[default]
    Line,
    /// One bar per point, from zero to the value.
    Bar,
}

impl SeriesKind {
    pub fn name(&self) -> &'static str {
        match self {
            SeriesKind::Line => "line",
            SeriesKind::Bar => "bar",
        }
    }
}

/// Vertical axis a series is plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YAxis {
    #[default]
    Primary,
    Secondary,
}

/// One renderable series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub label: String,
    pub kind: SeriesKind,
    pub y_axis: YAxis,
    pub data: Vec<f64>,
    pub color: Color,
    pub border_width: f32,
    /// Dash and gap lengths; `None` draws a solid line.
    pub dash: Option<[u16; 2]>,
    pub fill: Fill,
    pub tension: f32,
    pub point_radius: f32,
    pub point_hover_radius: f32,
    pub point_color: PointColorRule,
}

/// Fixed-range axis drawn on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryAxis {
    pub title: String,
    pub min: f64,
    pub max: f64,
}

impl SecondaryAxis {
    /// Map `value` from this axis onto the primary range `lo..hi`.
    pub fn project(&self, value: f64, lo: f64, hi: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return lo;
        }
        lo + (value - self.min) / span * (hi - lo)
    }
}

/// Vertical axis settings. The horizontal axis is categorical over the labels.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    pub y_title: Option<String>,
    pub begin_at_zero: bool,
    pub show_x_title: bool,
    pub secondary: Option<SecondaryAxis>,
}

/// Decides which series appear in the legend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendFilterRule {
    alert_type: AlertType,
}

impl LegendFilterRule {
    pub fn new(alert_type: AlertType) -> Self {
        Self { alert_type }
    }

    /// Threshold entries are hidden unless the chart is under an anomaly alert.
    pub fn shows(&self, label: &str) -> bool {
        let is_threshold = label == UPPER_THRESHOLD_LABEL || label == LOWER_THRESHOLD_LABEL;
        !(is_threshold && self.alert_type != AlertType::Anomaly)
    }
}

/// One series entry of a tooltip for the hovered index.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipItem {
    pub label: String,
    pub raw: f64,
}

/// Builds the tooltip footer from the hovered items.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TooltipFooterRule;

impl TooltipFooterRule {
    pub fn footer(&self, items: &[TooltipItem]) -> String {
        match items.iter().find(|item| item.label == SUCCESS_LABEL) {
            Some(item) if item.raw == 1.0 => "Status: Success".to_string(),
            Some(_) => "Status: Failure".to_string(),
            None => String::new(),
        }
    }
}

/// Renderer behaviour that is independent of the data.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub animation_ms: u32,
    pub resize_delay_ms: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            animation_ms: 500,
            resize_delay_ms: 200,
        }
    }
}

/// Complete chart description for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub labels: Vec<String>,
    pub series: Vec<SeriesSpec>,
    pub axis: AxisConfig,
    pub legend: LegendFilterRule,
    pub tooltip: TooltipFooterRule,
    pub options: RenderOptions,
}

impl ChartSpec {
    /// Look up a series by label.
    pub fn series(&self, label: &str) -> Option<&SeriesSpec> {
        self.series.iter().find(|s| s.label == label)
    }

    /// Tooltip items for the hovered index, one per series with a value there.
    pub fn tooltip_items(&self, index: usize) -> Vec<TooltipItem> {
        self.series
            .iter()
            .filter_map(|s| {
                s.data.get(index).map(|&raw| TooltipItem {
                    label: s.label.clone(),
                    raw,
                })
            })
            .collect()
    }

    /// Export the spec as JSON with point colors resolved for every index.
    pub fn to_json(&self) -> serde_json::Value {
        let series: Vec<serde_json::Value> = self
            .series
            .iter()
            .map(|s| {
                let point_colors: Vec<String> =
                    (0..s.data.len()).map(|i| s.point_color.color_at(i).to_string()).collect();
                let fill = match s.fill {
                    Fill::None => serde_json::Value::Null,
                    Fill::Origin(c) => serde_json::json!({ "target": "origin", "color": c.to_string() }),
                    Fill::ToPreceding(c) => {
                        serde_json::json!({ "target": "preceding", "color": c.to_string() })
                    }
                };
                let y_axis = match s.y_axis {
                    YAxis::Primary => "y",
                    YAxis::Secondary => "y1",
                };
                serde_json::json!({
                    "label": s.label,
                    "kind": s.kind.name(),
                    "y_axis": y_axis,
                    "data": s.data,
                    "color": s.color.to_string(),
                    "border_width": s.border_width,
                    "dash": s.dash,
                    "fill": fill,
                    "tension": s.tension,
                    "point_radius": s.point_radius,
                    "point_hover_radius": s.point_hover_radius,
                    "point_colors": point_colors,
                    "in_legend": self.legend.shows(&s.label),
                })
            })
            .collect();

        let y1_axis = self.axis.secondary.as_ref().map(|axis| {
            serde_json::json!({ "title": axis.title, "min": axis.min, "max": axis.max })
        });

        serde_json::json!({
            "labels": self.labels,
            "series": series,
            "x_axis": {
                "show_title": self.axis.show_x_title,
            },
            "y_axis": {
                "title": self.axis.y_title,
                "begin_at_zero": self.axis.begin_at_zero,
            },
            "y1_axis": y1_axis,
            "responsive": self.options.responsive,
            "maintain_aspect_ratio": self.options.maintain_aspect_ratio,
            "animation_ms": self.options.animation_ms,
            "resize_delay_ms": self.options.resize_delay_ms,
        })
    }
}

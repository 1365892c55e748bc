//! Terminal chart renderer.
//!
//! [`TerminalRenderer`] is the external renderer behind chart hooks. It keeps
//! every live chart instance keyed by handle and draws them with the ratatui
//! `Chart` widget. Per-point colors, dashed overlays, area fills and bars are
//! resolved at draw time from the spec. Series on the secondary axis are
//! projected onto the primary range.

use std::collections::BTreeMap;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::chart::{ChartSpec, Color, Fill, SeriesKind, SeriesSpec, YAxis};
use crate::hook::{MountId, RenderError, Renderer, Sizing, Surface};
use crate::ui::Theme;

/// Pixel height of one terminal row.
pub const PX_PER_ROW: u32 = 16;

/// Horizontal sampling step for dashes and fills, in label units.
const SAMPLE_STEP: f64 = 0.05;

/// Vertical samples drawn inside a filled region.
const FILL_ROWS: usize = 6;

/// Vertical samples per bar.
const BAR_ROWS: usize = 8;

/// Rows a surface occupies, given its sizing and the rows available.
pub fn rows_for(sizing: Option<Sizing>, available: u16) -> u16 {
    let sizing = sizing.unwrap_or_default();
    let rows = (sizing.effective_height_px() / PX_PER_ROW).min(u16::MAX as u32) as u16;
    rows.min(available)
}

/// Handle to a chart instance owned by a [`TerminalRenderer`].
#[derive(Debug, PartialEq, Eq)]
pub struct ChartHandle(u64);

#[derive(Debug)]
struct Instance {
    mount: MountId,
    spec: ChartSpec,
}

/// Renderer drawing charts into terminal frames.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    next_id: u64,
    instances: BTreeMap<u64, Instance>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances.
    pub fn live(&self) -> usize {
        self.instances.len()
    }

    /// Spec of the instance bound to `mount`, if any.
    pub fn spec_for(&self, mount: &MountId) -> Option<&ChartSpec> {
        self.instances.values().find(|i| &i.mount == mount).map(|i| &i.spec)
    }

    /// Draw the instance bound to `mount` into `area`.
    pub fn draw(&self, frame: &mut Frame, area: Rect, mount: &MountId, hovered: usize, theme: &Theme) {
        let block = Block::default()
            .title(format!(" {} ", mount))
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border));

        let Some(spec) = self.spec_for(mount) else {
            let placeholder = Paragraph::new("Waiting for data...")
                .style(Style::default().add_modifier(Modifier::DIM))
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        };

        let block = match spec.axis.secondary {
            Some(ref axis) => block.title_bottom(
                Line::from(format!(
                    " {}: {}..{} ",
                    axis.title,
                    format_value(axis.min),
                    format_value(axis.max)
                ))
                .right_aligned(),
            ),
            None => block,
        };

        let layers = layers(spec, hovered, theme);
        let datasets: Vec<Dataset> = layers
            .iter()
            .map(|layer| {
                let dataset = Dataset::default()
                    .marker(layer.marker)
                    .graph_type(layer.graph_type)
                    .style(layer.style)
                    .data(&layer.points);
                match layer.name {
                    Some(ref name) => dataset.name(name.clone()),
                    None => dataset,
                }
            })
            .collect();

        let (x_min, x_max) = x_bounds(spec);
        let (y_min, y_max) = y_bounds(spec);
        let x_labels = x_labels(spec);
        let y_title = spec.axis.y_title.clone().unwrap_or_default();

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([x_min, x_max])
                    .labels(x_labels)
                    .style(Style::default().fg(theme.border)),
            )
            .y_axis(
                Axis::default()
                    .title(y_title)
                    .bounds([y_min, y_max])
                    .labels(vec![format_value(y_min), format_value((y_min + y_max) / 2.0), format_value(y_max)])
                    .style(Style::default().fg(theme.border)),
            );

        frame.render_widget(chart, area);
    }

    /// Draw the tooltip for the hovered index of `mount`'s chart.
    pub fn draw_tooltip(&self, frame: &mut Frame, area: Rect, mount: &MountId, hovered: usize, theme: &Theme) {
        let Some(tooltip) = self.spec_for(mount).and_then(|spec| Tooltip::at(spec, hovered)) else {
            return;
        };

        let mut spans = vec![Span::styled(format!(" {} ", tooltip.title), theme.header)];
        for (label, value) in &tooltip.items {
            spans.push(Span::raw(format!("│ {}: {} ", label, value)));
        }
        if !tooltip.footer.is_empty() {
            spans.push(Span::styled(format!("│ {}", tooltip.footer), theme.footer_style(&tooltip.footer)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Renderer for TerminalRenderer {
    type Handle = ChartHandle;

    fn create(&mut self, surface: &Surface, spec: ChartSpec) -> Result<ChartHandle, RenderError> {
        if !surface.is_laid_out() {
            return Err(RenderError::ZeroSizedSurface(surface.mount().clone()));
        }
        if self.instances.values().any(|i| &i.mount == surface.mount()) {
            return Err(RenderError::SurfaceInUse(surface.mount().clone()));
        }
        self.next_id += 1;
        self.instances.insert(
            self.next_id,
            Instance {
                mount: surface.mount().clone(),
                spec,
            },
        );
        Ok(ChartHandle(self.next_id))
    }

    fn destroy(&mut self, handle: ChartHandle) {
        self.instances.remove(&handle.0);
    }
}

/// Tooltip contents for one hovered index.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub title: String,
    pub items: Vec<(String, String)>,
    pub footer: String,
}

impl Tooltip {
    /// `None` when the index is out of range.
    pub fn at(spec: &ChartSpec, index: usize) -> Option<Self> {
        let title = spec.labels.get(index)?.clone();
        let items = spec.tooltip_items(index);
        let footer = spec.tooltip.footer(&items);
        Some(Self {
            title,
            items: items.into_iter().map(|item| (item.label, format_value(item.raw))).collect(),
            footer,
        })
    }
}

/// One drawable dataset with owned points.
#[derive(Debug, Clone)]
struct Layer {
    name: Option<String>,
    marker: symbols::Marker,
    graph_type: GraphType,
    style: Style,
    points: Vec<(f64, f64)>,
}

fn layers(spec: &ChartSpec, hovered: usize, theme: &Theme) -> Vec<Layer> {
    let (y_min, y_max) = y_bounds(spec);
    let mut fills = Vec::new();
    let mut lines = Vec::new();
    let mut points = Vec::new();

    for (i, series) in spec.series.iter().enumerate() {
        let name = spec.legend.shows(&series.label).then(|| series.label.clone());

        if series.kind == SeriesKind::Bar {
            let (data, base) = match (series.y_axis, &spec.axis.secondary) {
                (YAxis::Secondary, Some(axis)) => (
                    series.data.iter().map(|v| axis.project(*v, y_min, y_max)).collect(),
                    axis.project(0.0, y_min, y_max),
                ),
                _ => (series.data.clone(), 0.0),
            };
            for (n, (color, pts)) in bar_groups(series, &data, base).into_iter().enumerate() {
                fills.push(Layer {
                    name: if n == 0 { name.clone() } else { None },
                    marker: symbols::Marker::HalfBlock,
                    graph_type: GraphType::Scatter,
                    style: Style::default().fg(theme.chart_color(color)),
                    points: pts,
                });
            }
            continue;
        }

        let region = match series.fill {
            Fill::None => None,
            Fill::Origin(color) => Some((color, vec![0.0; series.data.len()])),
            Fill::ToPreceding(color) => i
                .checked_sub(1)
                .and_then(|p| spec.series.get(p))
                .map(|prev| (color, prev.data.clone())),
        };
        if let Some((color, bound)) = region {
            fills.push(Layer {
                name: None,
                marker: symbols::Marker::Dot,
                graph_type: GraphType::Scatter,
                style: Style::default().fg(theme.chart_color(color)),
                points: fill_points(&series.data, &bound),
            });
        }

        let style = Style::default().fg(theme.chart_color(series.color));
        lines.push(match series.dash {
            Some(dash) => Layer {
                name,
                marker: symbols::Marker::Braille,
                graph_type: GraphType::Scatter,
                style,
                points: dashed_points(&series.data, dash),
            },
            None => Layer {
                name,
                marker: symbols::Marker::Braille,
                graph_type: GraphType::Line,
                style,
                points: indexed(&series.data),
            },
        });

        if series.point_radius > 0.0 {
            for (color, pts) in point_groups(series) {
                points.push(Layer {
                    name: None,
                    marker: symbols::Marker::Block,
                    graph_type: GraphType::Scatter,
                    style: Style::default().fg(theme.chart_color(color)),
                    points: pts,
                });
            }
        }
    }

    let hovered_value = spec
        .series
        .iter()
        .find(|s| s.kind == SeriesKind::Line)
        .and_then(|s| s.data.get(hovered));
    if let Some(value) = hovered_value {
        points.push(Layer {
            name: None,
            marker: symbols::Marker::HalfBlock,
            graph_type: GraphType::Scatter,
            style: Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD),
            points: vec![(hovered as f64, *value)],
        });
    }

    fills.into_iter().chain(lines).chain(points).collect()
}

fn indexed(data: &[f64]) -> Vec<(f64, f64)> {
    data.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect()
}

/// Linear interpolation of `data` at fractional index `x`.
fn value_at(data: &[f64], x: f64) -> Option<f64> {
    let i = x.floor() as usize;
    let a = *data.get(i)?;
    match data.get(i + 1) {
        Some(b) => Some(a + (b - a) * (x - i as f64)),
        None => Some(a),
    }
}

/// Sample positions along the x range of `len` points.
fn samples(len: usize) -> impl Iterator<Item = (usize, f64)> {
    let last = len.saturating_sub(1) as f64;
    let count = if len == 0 { 0 } else { (last / SAMPLE_STEP).round() as usize + 1 };
    (0..count).map(|k| (k, k as f64 * SAMPLE_STEP))
}

/// Points of a dashed line: `dash[0]` samples on, `dash[1]` samples off.
fn dashed_points(data: &[f64], dash: [u16; 2]) -> Vec<(f64, f64)> {
    let period = (dash[0] as usize + dash[1] as usize).max(1);
    samples(data.len())
        .filter(|(k, _)| k % period < dash[0] as usize)
        .filter_map(|(_, x)| value_at(data, x).map(|y| (x, y)))
        .collect()
}

/// Points strictly between two lines.
fn fill_points(data: &[f64], bound: &[f64]) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for (k, x) in samples(data.len()) {
        if k % 5 != 0 {
            continue;
        }
        let (Some(a), Some(b)) = (value_at(data, x), value_at(bound, x)) else {
            continue;
        };
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let step = (hi - lo) / (FILL_ROWS + 1) as f64;
        if step <= 0.0 {
            continue;
        }
        points.extend((1..=FILL_ROWS).map(|r| (x, lo + step * r as f64)));
    }
    points
}

/// Series points grouped by their resolved color.
fn point_groups(series: &SeriesSpec) -> Vec<(Color, Vec<(f64, f64)>)> {
    let mut groups: Vec<(Color, Vec<(f64, f64)>)> = Vec::new();
    for (i, value) in series.data.iter().enumerate() {
        let color = series.point_color.color_at(i);
        let point = (i as f64, *value);
        match groups.iter_mut().find(|(c, _)| *c == color) {
            Some((_, pts)) => pts.push(point),
            None => groups.push((color, vec![point])),
        }
    }
    groups
}

/// Bars drawn as point columns from `base` to each value, grouped by color.
fn bar_groups(series: &SeriesSpec, data: &[f64], base: f64) -> Vec<(Color, Vec<(f64, f64)>)> {
    let mut groups: Vec<(Color, Vec<(f64, f64)>)> = Vec::new();
    for (i, value) in data.iter().enumerate() {
        let color = series.point_color.color_at(i);
        let column = (0..=BAR_ROWS).map(|r| (i as f64, base + (value - base) * r as f64 / BAR_ROWS as f64));
        match groups.iter_mut().find(|(c, _)| *c == color) {
            Some((_, pts)) => pts.extend(column),
            None => groups.push((color, column.collect())),
        }
    }
    groups
}

fn x_bounds(spec: &ChartSpec) -> (f64, f64) {
    match spec.labels.len() {
        0 | 1 => (-0.5, 0.5),
        n => (0.0, (n - 1) as f64),
    }
}

fn y_bounds(spec: &ChartSpec) -> (f64, f64) {
    let values = spec
        .series
        .iter()
        .filter(|s| s.y_axis == YAxis::Primary)
        .flat_map(|s| s.data.iter().copied());
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let lo = if spec.axis.begin_at_zero { lo.min(0.0) } else { lo };
    let hi = if spec.axis.begin_at_zero { hi.max(0.0) } else { hi };
    if hi <= lo {
        return (lo, lo + 1.0);
    }
    (lo, hi + (hi - lo) * 0.05)
}

fn x_labels(spec: &ChartSpec) -> Vec<Span<'static>> {
    match spec.labels.as_slice() {
        [] => Vec::new(),
        [only] => vec![Span::raw(only.clone())],
        [first, .., last] => {
            let mid = &spec.labels[spec.labels.len() / 2];
            vec![Span::raw(first.clone()), Span::raw(mid.clone()), Span::raw(last.clone())]
        }
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::build;
    use crate::chart::input::tests::{attrs, sample_attrs};
    use crate::chart::{decode, AVERAGE_LABEL, CHANGE_LABEL, VALUE_LABEL};

    fn spec() -> ChartSpec {
        build(&decode(&sample_attrs()).unwrap())
    }

    fn anomaly_spec() -> ChartSpec {
        build(
            &decode(&attrs(&[
                ("labels", r#"["a","b","c"]"#),
                ("values", "[1,2,3]"),
                ("success", "[1,1,1]"),
                ("average", "2"),
                ("alertThreshold", r#"{"upper": 4, "lower": 1}"#),
                ("alertType", "anomaly"),
            ]))
            .unwrap(),
        )
    }

    fn surface(width: u16, height: u16) -> Surface {
        let mut surface = Surface::new("chart".into());
        surface.set_size(width, height);
        surface
    }

    #[test]
    fn test_rows_for_sizing() {
        assert_eq!(rows_for(Some(Sizing::default()), 100), 16);
        assert_eq!(rows_for(Some(Sizing::default()), 10), 10);
        let tall = Sizing {
            height_px: 1000,
            ..Sizing::default()
        };
        assert_eq!(rows_for(Some(tall), 100), 25);
    }

    #[test]
    fn test_create_rejects_zero_sized_surface() {
        let mut renderer = TerminalRenderer::new();
        let err = renderer.create(&surface(80, 0), spec()).unwrap_err();
        assert_eq!(err, RenderError::ZeroSizedSurface("chart".into()));
        assert_eq!(renderer.live(), 0);
    }

    #[test]
    fn test_create_rejects_bound_surface() {
        let mut renderer = TerminalRenderer::new();
        let handle = renderer.create(&surface(80, 16), spec()).unwrap();
        let err = renderer.create(&surface(80, 16), spec()).unwrap_err();
        assert_eq!(err, RenderError::SurfaceInUse("chart".into()));

        renderer.destroy(handle);
        assert_eq!(renderer.live(), 0);
        assert!(renderer.create(&surface(80, 16), spec()).is_ok());
    }

    #[test]
    fn test_tooltip_at_index() {
        let tooltip = Tooltip::at(&spec(), 1).unwrap();
        assert_eq!(tooltip.title, "b");
        assert_eq!(
            tooltip.items,
            vec![
                (VALUE_LABEL.to_string(), "2".to_string()),
                (AVERAGE_LABEL.to_string(), "2".to_string())
            ]
        );
        // No status series is emitted, so the footer stays empty
        assert_eq!(tooltip.footer, "");
        assert!(Tooltip::at(&spec(), 3).is_none());
    }

    #[test]
    fn test_legend_hides_thresholds_without_anomaly() {
        let theme = Theme::dark();
        let names: Vec<String> = layers(&spec(), 0, &theme).into_iter().filter_map(|l| l.name).collect();
        assert_eq!(names, vec![VALUE_LABEL, AVERAGE_LABEL]);

        let names: Vec<String> =
            layers(&anomaly_spec(), 0, &theme).into_iter().filter_map(|l| l.name).collect();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_failed_points_get_their_own_group() {
        let spec = spec();
        let groups = point_groups(spec.series(VALUE_LABEL).unwrap());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1, vec![(0.0, 1.0), (1.0, 2.0)]);
        assert_eq!(groups[1].1, vec![(2.0, 3.0)]);
    }

    #[test]
    fn test_dashed_points_skip_gaps() {
        let points = dashed_points(&[2.0, 2.0], [5, 5]);
        // 21 samples over one label step, half of each period drawn
        assert_eq!(points.len(), 11);
        assert!(points.iter().all(|(_, y)| *y == 2.0));
        assert!((points[5].0 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_fill_points_stay_between_lines() {
        let points = fill_points(&[1.0, 1.0], &[4.0, 4.0]);
        assert!(!points.is_empty());
        assert!(points.iter().all(|(_, y)| *y > 1.0 && *y < 4.0));
        assert!(fill_points(&[2.0], &[2.0]).is_empty());
    }

    #[test]
    fn test_y_bounds_begin_at_zero() {
        let (lo, hi) = y_bounds(&spec());
        assert_eq!(lo, 0.0);
        assert!(hi > 3.0);
    }

    #[test]
    fn test_value_at_interpolates() {
        assert_eq!(value_at(&[0.0, 10.0], 0.5), Some(5.0));
        assert_eq!(value_at(&[0.0, 10.0], 1.0), Some(10.0));
        assert_eq!(value_at(&[], 0.0), None);
    }

    fn home_spec() -> ChartSpec {
        crate::chart::resolve(
            crate::chart::ChartKind::Home,
            &attrs(&[
                ("labels", r#"["Mon","Tue","Wed"]"#),
                ("values", "[100,120,80]"),
                ("changes", "[0,20,-60]"),
            ]),
            &crate::chart::Palette::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_secondary_series_do_not_stretch_primary_bounds() {
        let (lo, hi) = y_bounds(&home_spec());
        assert_eq!(lo, 0.0);
        assert!(hi > 120.0 && hi < 130.0);
    }

    #[test]
    fn test_bars_are_projected_and_colored() {
        let spec = home_spec();
        let (lo, hi) = y_bounds(&spec);
        let axis = spec.axis.secondary.clone().unwrap();
        let bars = spec.series(CHANGE_LABEL).unwrap();
        let projected: Vec<f64> = bars.data.iter().map(|v| axis.project(*v, lo, hi)).collect();
        let base = axis.project(0.0, lo, hi);

        let groups = bar_groups(bars, &projected, base);
        // Two within the limit, one beyond it
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.len(), 2 * (BAR_ROWS + 1));
        assert!(groups[1].1.iter().all(|(x, y)| *x == 2.0 && *y <= base));

        let names: Vec<String> = layers(&spec, 0, &Theme::dark()).into_iter().filter_map(|l| l.name).collect();
        assert_eq!(names, vec![CHANGE_LABEL.to_string(), VALUE_LABEL.to_string()]);
    }
}

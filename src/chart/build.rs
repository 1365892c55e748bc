//! Chart configuration builder.
//!
//! Maps decoded [`ChartInput`] to a [`ChartSpec`]. Series are always emitted
//! in the order Value, Average, Upper Threshold, Lower Threshold, with the
//! optional ones skipped. Home charts get a line plus change bars on a
//! secondary axis.

use super::input::{decode, decode_home, AlertType, ChartInput, DecodeError, HomeInput, RawAttributes};
use super::spec::{
    AxisConfig, ChartSpec, Color, Fill, LegendFilterRule, Palette, PointColorRule, RenderOptions,
    SecondaryAxis, SeriesKind, SeriesSpec, TooltipFooterRule, YAxis, AVERAGE_LABEL, CHANGE_LABEL,
    LOWER_THRESHOLD_LABEL, MOVING_AVERAGE_TITLE, UPPER_THRESHOLD_LABEL, VALUE_LABEL,
};

/// Dash pattern shared by the overlay lines.
const OVERLAY_DASH: [u16; 2] = [5, 5];

/// Changes beyond this many percent get the warning color.
pub const CHANGE_WARNING_PERCENT: f64 = 50.0;

/// Chart flavours a chart hook can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    /// Check results with status points, average and anomaly band.
    #[default]
    Check,
    /// Values with their change from the average as bars.
    Home,
}

/// Decode `attrs` for `kind` and build its spec.
pub fn resolve(kind: ChartKind, attrs: &RawAttributes, palette: &Palette) -> Result<ChartSpec, DecodeError> {
    match kind {
        ChartKind::Check => Ok(build_with(&decode(attrs)?, palette)),
        ChartKind::Home => Ok(build_home(&decode_home(attrs)?, palette)),
    }
}

/// Build a chart spec with the default palette.
pub fn build(input: &ChartInput) -> ChartSpec {
    build_with(input, &Palette::default())
}

/// Build a chart spec with an explicit palette.
pub fn build_with(input: &ChartInput, palette: &Palette) -> ChartSpec {
    let mut series = vec![value_series(input, palette)];

    if let Some(average) = input.average {
        series.push(constant_series(
            AVERAGE_LABEL,
            average,
            input.labels.len(),
            palette.average,
            Fill::None,
        ));
    }

    if input.alert_type == AlertType::Anomaly {
        if let Some((upper, lower)) = input.alert_threshold.and_then(|t| t.bounds()) {
            series.push(constant_series(
                UPPER_THRESHOLD_LABEL,
                upper,
                input.labels.len(),
                palette.threshold,
                Fill::None,
            ));
            series.push(constant_series(
                LOWER_THRESHOLD_LABEL,
                lower,
                input.labels.len(),
                palette.threshold,
                Fill::ToPreceding(palette.threshold_band),
            ));
        }
    }

    ChartSpec {
        labels: input.labels.clone(),
        series,
        axis: AxisConfig {
            y_title: Some(VALUE_LABEL.to_string()),
            begin_at_zero: true,
            show_x_title: false,
            secondary: None,
        },
        legend: LegendFilterRule::new(input.alert_type),
        tooltip: TooltipFooterRule,
        options: RenderOptions::default(),
    }
}

fn value_series(input: &ChartInput, palette: &Palette) -> SeriesSpec {
    SeriesSpec {
        label: VALUE_LABEL.to_string(),
        kind: SeriesKind::Line,
        y_axis: YAxis::Primary,
        data: input.values.clone(),
        color: palette.base,
        border_width: 1.0,
        dash: None,
        fill: Fill::Origin(palette.base_background),
        tension: 0.4,
        point_radius: 4.0,
        point_hover_radius: 6.0,
        point_color: PointColorRule::Status {
            success: input.success.as_slice().into(),
            alert_type: input.alert_type,
            base: palette.base,
            failure: palette.failure,
            diff_alert: palette.diff_alert,
            anomaly_alert: palette.anomaly_alert,
        },
    }
}

fn constant_series(
    label: &str,
    value: f64,
    len: usize,
    color: Color,
    fill: Fill,
) -> SeriesSpec {
    SeriesSpec {
        label: label.to_string(),
        kind: SeriesKind::Line,
        y_axis: YAxis::Primary,
        data: vec![value; len],
        color,
        border_width: 2.0,
        dash: Some(OVERLAY_DASH),
        fill,
        tension: 0.0,
        point_radius: 0.0,
        point_hover_radius: 0.0,
        point_color: PointColorRule::Solid(color),
    }
}

/// Build a home chart: the value line and one change bar per label.
pub fn build_home(input: &HomeInput, palette: &Palette) -> ChartSpec {
    let line = SeriesSpec {
        label: input.label.clone().unwrap_or_else(|| VALUE_LABEL.to_string()),
        kind: SeriesKind::Line,
        y_axis: YAxis::Primary,
        data: input.values.clone(),
        color: palette.home_line,
        border_width: 3.0,
        dash: None,
        fill: Fill::None,
        tension: 0.4,
        point_radius: 3.0,
        point_hover_radius: 4.0,
        point_color: PointColorRule::Solid(palette.home_line),
    };

    let bar_colors: Vec<Color> = input
        .changes
        .iter()
        .map(|change| {
            if change.abs() > CHANGE_WARNING_PERCENT {
                palette.change_warning
            } else {
                palette.change_good
            }
        })
        .collect();
    let bars = SeriesSpec {
        label: CHANGE_LABEL.to_string(),
        kind: SeriesKind::Bar,
        y_axis: YAxis::Secondary,
        data: input.changes.clone(),
        color: palette.change_good,
        border_width: 0.0,
        dash: None,
        fill: Fill::None,
        tension: 0.0,
        point_radius: 0.0,
        point_hover_radius: 0.0,
        point_color: PointColorRule::Each {
            colors: bar_colors.into(),
            fallback: palette.change_good,
        },
    };

    ChartSpec {
        labels: input.labels.clone(),
        series: vec![line, bars],
        axis: AxisConfig {
            y_title: None,
            begin_at_zero: true,
            show_x_title: false,
            secondary: Some(SecondaryAxis {
                title: MOVING_AVERAGE_TITLE.to_string(),
                min: -100.0,
                max: 100.0,
            }),
        },
        legend: LegendFilterRule::new(AlertType::None),
        tooltip: TooltipFooterRule,
        options: RenderOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::input::tests::attrs;
    use crate::chart::input::AlertThreshold;

    fn input(values: &[f64], success: &[u8]) -> ChartInput {
        ChartInput {
            labels: (0..values.len()).map(|i| format!("t{}", i)).collect(),
            values: values.to_vec(),
            success: success.to_vec(),
            average: None,
            alert_threshold: None,
            alert_type: AlertType::None,
        }
    }

    fn labels(spec: &ChartSpec) -> Vec<&str> {
        spec.series.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_value_series_is_first_and_unchanged() {
        let spec = build(&input(&[3.0, 1.0, 2.0], &[1, 1, 1]));
        assert_eq!(spec.series[0].label, VALUE_LABEL);
        assert_eq!(spec.series[0].data, vec![3.0, 1.0, 2.0]);
        assert_eq!(spec.series.len(), 1);
    }

    #[test]
    fn test_average_and_failure_scenario() {
        let mut data = input(&[1.0, 2.0, 3.0], &[1, 1, 0]);
        data.labels = vec!["a".into(), "b".into(), "c".into()];
        data.average = Some(2.0);

        let spec = build(&data);
        assert_eq!(labels(&spec), vec![VALUE_LABEL, AVERAGE_LABEL]);

        let average = spec.series(AVERAGE_LABEL).unwrap();
        assert_eq!(average.data, vec![2.0; 3]);
        assert_eq!(average.dash, Some(OVERLAY_DASH));
        assert_eq!(average.fill, Fill::None);
        assert_eq!(average.point_radius, 0.0);

        let palette = Palette::default();
        assert_eq!(spec.series[0].point_color.color_at(2), palette.failure);
        assert_eq!(spec.series[0].point_color.color_at(0), palette.base);
    }

    #[test]
    fn test_anomaly_band_scenario() {
        let mut data = input(&[10.0, 20.0, 15.0], &[1, 1, 1]);
        data.alert_type = AlertType::Anomaly;
        data.alert_threshold = Some(AlertThreshold {
            upper: Some(18.0),
            lower: Some(5.0),
        });

        let spec = build(&data);
        assert_eq!(
            labels(&spec),
            vec![VALUE_LABEL, UPPER_THRESHOLD_LABEL, LOWER_THRESHOLD_LABEL]
        );

        let palette = Palette::default();
        assert_eq!(spec.series[0].point_color.color_at(2), palette.anomaly_alert);
        assert_eq!(spec.series[1].data, vec![18.0; 3]);
        assert_eq!(spec.series[2].data, vec![5.0; 3]);
        assert_eq!(spec.series[1].fill, Fill::None);
        assert_eq!(spec.series[2].fill, Fill::ToPreceding(palette.threshold_band));
    }

    #[test]
    fn test_full_ordering() {
        let mut data = input(&[1.0, 2.0], &[1, 1]);
        data.average = Some(1.5);
        data.alert_type = AlertType::Anomaly;
        data.alert_threshold = Some(AlertThreshold {
            upper: Some(3.0),
            lower: Some(0.5),
        });

        let spec = build(&data);
        assert_eq!(
            labels(&spec),
            vec![
                VALUE_LABEL,
                AVERAGE_LABEL,
                UPPER_THRESHOLD_LABEL,
                LOWER_THRESHOLD_LABEL
            ]
        );
    }

    #[test]
    fn test_band_requires_anomaly_and_both_bounds() {
        let threshold = AlertThreshold {
            upper: Some(18.0),
            lower: Some(5.0),
        };

        let mut diff = input(&[1.0], &[1]);
        diff.alert_type = AlertType::Diff;
        diff.alert_threshold = Some(threshold);
        assert_eq!(build(&diff).series.len(), 1);

        let mut half = input(&[1.0], &[1]);
        half.alert_type = AlertType::Anomaly;
        half.alert_threshold = Some(AlertThreshold {
            upper: Some(18.0),
            lower: None,
        });
        assert_eq!(build(&half).series.len(), 1);

        let mut missing = input(&[1.0], &[1]);
        missing.alert_type = AlertType::Anomaly;
        assert_eq!(build(&missing).series.len(), 1);
    }

    #[test]
    fn test_diff_alert_colors_last_point() {
        let mut data = input(&[1.0, 2.0, 3.0], &[1, 1, 1]);
        data.alert_type = AlertType::Diff;

        let spec = build(&data);
        let palette = Palette::default();
        assert_eq!(spec.series[0].point_color.color_at(2), palette.diff_alert);
        assert_eq!(spec.series[0].point_color.color_at(1), palette.base);
    }

    #[test]
    fn test_custom_palette() {
        let palette = Palette {
            failure: "#ff0000".parse().unwrap(),
            ..Palette::default()
        };
        let spec = build_with(&input(&[1.0], &[0]), &palette);
        assert_eq!(spec.series[0].point_color.color_at(0), palette.failure);
    }

    #[test]
    fn test_empty_input() {
        let mut data = input(&[], &[]);
        data.average = Some(4.0);
        let spec = build(&data);
        assert!(spec.series[0].data.is_empty());
        assert!(spec.series(AVERAGE_LABEL).unwrap().data.is_empty());
    }

    #[test]
    fn test_axis_and_options() {
        let spec = build(&input(&[1.0], &[1]));
        assert!(spec.axis.begin_at_zero);
        assert_eq!(spec.axis.y_title.as_deref(), Some(VALUE_LABEL));
        assert!(!spec.options.maintain_aspect_ratio);
    }

    fn home(values: &[f64], changes: &[f64]) -> HomeInput {
        HomeInput {
            labels: (0..values.len()).map(|i| format!("d{}", i)).collect(),
            label: None,
            values: values.to_vec(),
            changes: changes.to_vec(),
        }
    }

    #[test]
    fn test_home_chart_series_and_axes() {
        let spec = build_home(&home(&[124.0, 98.0, 45.0], &[-9.0, 33.0, -60.0]), &Palette::default());
        assert_eq!(labels(&spec), vec![VALUE_LABEL, CHANGE_LABEL]);

        let bars = spec.series(CHANGE_LABEL).unwrap();
        assert_eq!(bars.kind, SeriesKind::Bar);
        assert_eq!(bars.y_axis, YAxis::Secondary);
        assert_eq!(spec.series[0].kind, SeriesKind::Line);
        assert_eq!(spec.series[0].fill, Fill::None);

        let secondary = spec.axis.secondary.as_ref().unwrap();
        assert_eq!((secondary.min, secondary.max), (-100.0, 100.0));
        assert_eq!(secondary.title, MOVING_AVERAGE_TITLE);
        assert!(build(&input(&[1.0], &[1])).axis.secondary.is_none());
    }

    #[test]
    fn test_home_bar_colors() {
        let palette = Palette::default();
        let spec = build_home(&home(&[1.0, 1.0, 1.0], &[-9.0, 33.0, -60.0]), &palette);
        let bars = spec.series(CHANGE_LABEL).unwrap();
        assert_eq!(bars.point_color.color_at(0), palette.change_good);
        assert_eq!(bars.point_color.color_at(1), palette.change_good);
        assert_eq!(bars.point_color.color_at(2), palette.change_warning);
    }

    #[test]
    fn test_resolve_by_kind() {
        let palette = Palette::default();
        let check = resolve(ChartKind::Check, &crate::chart::input::tests::sample_attrs(), &palette).unwrap();
        assert!(check.series(CHANGE_LABEL).is_none());

        let raw = attrs(&[("labels", r#"["a","b"]"#), ("values", "[1,3]"), ("label", "Signups")]);
        let spec = resolve(ChartKind::Home, &raw, &palette).unwrap();
        assert_eq!(spec.series[0].label, "Signups");
        assert_eq!(spec.series[1].data, vec![-50.0, 50.0]);

        // Check attributes are not enough for a home chart and vice versa
        assert!(resolve(ChartKind::Check, &raw, &palette).is_err());
    }

    #[test]
    fn test_export_carries_every_option() {
        let spec = build(&input(&[1.0], &[1]));
        let json = spec.to_json();

        let series = &json["series"][0];
        assert_eq!(series["kind"], "line");
        assert_eq!(series["y_axis"], "y");
        assert!((series["tension"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert_eq!(series["border_width"], 1.0);
        assert_eq!(series["point_hover_radius"], 6.0);

        assert_eq!(json["responsive"], true);
        assert_eq!(json["animation_ms"], 500);
        assert_eq!(json["resize_delay_ms"], 200);
        assert_eq!(json["x_axis"]["show_title"], false);
        assert!(json["y1_axis"].is_null());

        let home_json = build_home(&home(&[2.0], &[0.0]), &Palette::default()).to_json();
        assert_eq!(home_json["series"][1]["kind"], "bar");
        assert_eq!(home_json["series"][1]["y_axis"], "y1");
        assert_eq!(home_json["y1_axis"]["min"], -100.0);
        assert_eq!(home_json["y1_axis"]["title"], MOVING_AVERAGE_TITLE);
    }
}

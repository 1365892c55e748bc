//! Chart data decoding and configuration building.
//!
//! ```text
//! RawAttributes ──decode()──▶ ChartInput ──build()──▶ ChartSpec ──▶ Renderer
//!               ──decode_home()──▶ HomeInput ──build_home()──▶
//! ```
//!
//! - [`input`]: typed chart data and the attribute decoders
//! - [`build`]: the pure configuration builders, selected by [`ChartKind`]
//! - [`spec`]: the declarative spec, colors and per-point/legend/tooltip rules

pub mod build;
pub mod input;
pub mod spec;

pub use build::{build, build_home, build_with, resolve, ChartKind, CHANGE_WARNING_PERCENT};
pub use input::{
    changes_from_average, decode, decode_home, AlertThreshold, AlertType, ChartInput, DecodeError,
    HomeInput, RawAttributes,
};
pub use spec::{
    AxisConfig, ChartSpec, Color, Fill, LegendFilterRule, Palette, PointColorRule, RenderOptions,
    SecondaryAxis, SeriesKind, SeriesSpec, TooltipFooterRule, TooltipItem, YAxis, AVERAGE_LABEL,
    CHANGE_LABEL, LOWER_THRESHOLD_LABEL, MOVING_AVERAGE_TITLE, SUCCESS_LABEL,
    UPPER_THRESHOLD_LABEL, VALUE_LABEL,
};

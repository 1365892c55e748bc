//! Decoding of mount-point attributes into typed chart input.
//!
//! Every attribute except `alertType` holds a JSON-encoded value, the way the
//! server writes them onto the mount point.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// String attributes attached to a mount point, keyed by attribute name.
pub type RawAttributes = BTreeMap<String, String>;

/// Alert classification of the latest sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertType {
    #[default]
    None,
    Diff,
    Anomaly,
}

impl AlertType {
    /// Unknown classifications behave like no alert.
    pub fn from_attribute(raw: &str) -> Self {
        match raw {
            "diff" => AlertType::Diff,
            "anomaly" => AlertType::Anomaly,
            _ => AlertType::None,
        }
    }
}

/// Upper and lower bounds of the anomaly band.
///
/// Either bound may be null upstream, in which case no band is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AlertThreshold {
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

impl AlertThreshold {
    /// Both bounds, if both are present.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        Some((self.upper?, self.lower?))
    }
}

/// Decoded chart data for one mount point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartInput {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Per-point check status, `1` for success and `0` for failure.
    pub success: Vec<u8>,
    pub average: Option<f64>,
    pub alert_threshold: Option<AlertThreshold>,
    pub alert_type: AlertType,
}

/// Errors produced while decoding chart attributes.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A required attribute is absent from the mount point.
    #[error("missing attribute `{field}`")]
    MissingAttribute { field: &'static str },

    /// An attribute did not parse as its expected JSON type.
    #[error("malformed JSON in attribute `{field}`: {source}")]
    MalformedJson {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Labels, values and success flags must have equal lengths.
    #[error("length mismatch: {labels} labels, {values} values, {success} success flags")]
    LengthMismatch {
        labels: usize,
        values: usize,
        success: usize,
    },

    /// A success flag other than 0 or 1.
    #[error("success flag at index {index} is {value}, expected 0 or 1")]
    InvalidFlag { index: usize, value: u8 },

    /// A home chart attribute does not have one entry per label.
    #[error("attribute `{field}` has {found} entries, expected {expected}")]
    SeriesLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

impl DecodeError {
    /// Attribute the error refers to, if it concerns a single one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DecodeError::MissingAttribute { field } | DecodeError::MalformedJson { field, .. } => {
                Some(*field)
            }
            DecodeError::InvalidFlag { .. } => Some("success"),
            DecodeError::SeriesLength { field, .. } => Some(*field),
            DecodeError::LengthMismatch { .. } => None,
        }
    }
}

fn field<T: DeserializeOwned>(attrs: &RawAttributes, name: &'static str) -> Result<T, DecodeError> {
    let raw = attrs
        .get(name)
        .ok_or(DecodeError::MissingAttribute { field: name })?;
    serde_json::from_str(raw).map_err(|source| DecodeError::MalformedJson {
        field: name,
        source,
    })
}

/// Decode the chart attributes of a mount point.
///
/// `alertType` is read verbatim and may be absent; all other attributes are
/// required.
pub fn decode(attrs: &RawAttributes) -> Result<ChartInput, DecodeError> {
    let labels: Vec<String> = field(attrs, "labels")?;
    let values: Vec<f64> = field(attrs, "values")?;
    let success: Vec<u8> = field(attrs, "success")?;
    let average: Option<f64> = field(attrs, "average")?;
    let alert_threshold: Option<AlertThreshold> = field(attrs, "alertThreshold")?;
    let alert_type = attrs
        .get("alertType")
        .map(|raw| AlertType::from_attribute(raw))
        .unwrap_or_default();

    if labels.len() != values.len() || values.len() != success.len() {
        return Err(DecodeError::LengthMismatch {
            labels: labels.len(),
            values: values.len(),
            success: success.len(),
        });
    }

    if let Some((index, &value)) = success.iter().enumerate().find(|(_, v)| **v > 1) {
        return Err(DecodeError::InvalidFlag { index, value });
    }

    Ok(ChartInput {
        labels,
        values,
        success,
        average,
        alert_threshold,
        alert_type,
    })
}

/// Decoded data for a home chart mount point.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeInput {
    pub labels: Vec<String>,
    /// Legend label of the line series.
    pub label: Option<String>,
    pub values: Vec<f64>,
    /// Percent change of each value from the average.
    pub changes: Vec<f64>,
}

/// Percent change of every value from the mean, rounded to whole percent.
///
/// All zero when the mean is zero.
pub fn changes_from_average(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| ((v - mean) / mean * 100.0).round()).collect()
}

/// Decode the attributes of a home chart.
///
/// `labels` and `values` are required. `changes` is computed from the values
/// when absent. `label` is read verbatim.
pub fn decode_home(attrs: &RawAttributes) -> Result<HomeInput, DecodeError> {
    let labels: Vec<String> = field(attrs, "labels")?;
    let values: Vec<f64> = field(attrs, "values")?;
    let changes: Vec<f64> = match attrs.get("changes") {
        Some(_) => field(attrs, "changes")?,
        None => changes_from_average(&values),
    };

    for (name, found) in [("values", values.len()), ("changes", changes.len())] {
        if found != labels.len() {
            return Err(DecodeError::SeriesLength {
                field: name,
                expected: labels.len(),
                found,
            });
        }
    }

    Ok(HomeInput {
        labels,
        label: attrs.get("label").cloned(),
        values,
        changes,
    })
}

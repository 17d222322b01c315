//! JSON schema types for declarative histogram definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hb_expr::{Defs, Real};

use crate::axis::{Axis, Binning, Grouping};
use crate::config::CountType;
use crate::error::{Error, Result};

fn yes() -> bool {
    true
}

/// Axis definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AxisSpec {
    /// groupby: one category per distinct value
    Groupby {
        /// Expression.
        expr: String,
    },

    /// groupbin: categories on a regular numeric grid
    Groupbin {
        /// Expression.
        expr: String,
        /// Grid spacing.
        binwidth: f64,
        /// A grid edge.
        #[serde(default)]
        origin: f64,
        /// Intervals closed on the low side.
        #[serde(default = "yes")]
        closedlow: bool,
    },

    /// bin: regular bins
    Bin {
        /// Expression.
        expr: String,
        /// Number of regular bins.
        numbins: usize,
        /// Low edge.
        low: f64,
        /// High edge.
        high: f64,
        /// Underflow bin.
        #[serde(default = "yes")]
        underflow: bool,
        /// Overflow bin.
        #[serde(default = "yes")]
        overflow: bool,
        /// NaN bin.
        #[serde(default = "yes")]
        nanflow: bool,
        /// Intervals closed on the low side.
        #[serde(default = "yes")]
        closedlow: bool,
    },

    /// intbin: one bin per integer
    Intbin {
        /// Expression.
        expr: String,
        /// Smallest integer.
        min: i64,
        /// Largest integer.
        max: i64,
        /// Underflow bin.
        #[serde(default = "yes")]
        underflow: bool,
        /// Overflow bin.
        #[serde(default = "yes")]
        overflow: bool,
    },

    /// split: irregular bins
    Split {
        /// Expression.
        expr: String,
        /// Bin edges.
        edges: Vec<f64>,
        /// Underflow bin.
        #[serde(default = "yes")]
        underflow: bool,
        /// Overflow bin.
        #[serde(default = "yes")]
        overflow: bool,
        /// NaN bin.
        #[serde(default = "yes")]
        nanflow: bool,
        /// Intervals closed on the low side.
        #[serde(default = "yes")]
        closedlow: bool,
    },

    /// cut: boolean selection
    Cut {
        /// Expression.
        expr: String,
    },

    /// profile: Σx and Σx² accumulation
    Profile {
        /// Expression.
        expr: String,
    },
}

impl From<&AxisSpec> for Axis {
    fn from(spec: &AxisSpec) -> Axis {
        match spec.clone() {
            AxisSpec::Groupby { expr } => Axis::groupby(expr),
            AxisSpec::Groupbin { expr, binwidth, origin, closedlow } => {
                Axis::groupbin(expr, binwidth, origin).closedlow(closedlow)
            }
            AxisSpec::Bin { expr, numbins, low, high, underflow, overflow, nanflow, closedlow } => {
                Axis::bin(expr, numbins, low, high)
                    .underflow(underflow)
                    .overflow(overflow)
                    .nanflow(nanflow)
                    .closedlow(closedlow)
            }
            AxisSpec::Intbin { expr, min, max, underflow, overflow } => {
                Axis::intbin(expr, min, max).underflow(underflow).overflow(overflow)
            }
            AxisSpec::Split { expr, edges, underflow, overflow, nanflow, closedlow } => {
                Axis::split(expr, &edges)
                    .underflow(underflow)
                    .overflow(overflow)
                    .nanflow(nanflow)
                    .closedlow(closedlow)
            }
            AxisSpec::Cut { expr } => Axis::cut(expr),
            AxisSpec::Profile { expr } => Axis::profile(expr),
        }
    }
}

impl From<&Axis> for AxisSpec {
    fn from(axis: &Axis) -> AxisSpec {
        let expr = axis.expr().to_owned();
        match axis {
            Axis::Group { grouping: Grouping::Distinct, .. } => AxisSpec::Groupby { expr },
            Axis::Group { grouping: Grouping::Bin { binwidth, origin, closedlow }, .. } => {
                AxisSpec::Groupbin { expr, binwidth: binwidth.get(), origin: origin.get(), closedlow: *closedlow }
            }
            Axis::Fixed { binning, .. } => match binning {
                Binning::Regular { numbins, low, high, underflow, overflow, nanflow, closedlow } => {
                    AxisSpec::Bin {
                        expr,
                        numbins: *numbins,
                        low: low.get(),
                        high: high.get(),
                        underflow: *underflow,
                        overflow: *overflow,
                        nanflow: *nanflow,
                        closedlow: *closedlow,
                    }
                }
                Binning::Integer { min, max, underflow, overflow } => AxisSpec::Intbin {
                    expr,
                    min: *min,
                    max: *max,
                    underflow: *underflow,
                    overflow: *overflow,
                },
                Binning::Edges { edges, underflow, overflow, nanflow, closedlow } => AxisSpec::Split {
                    expr,
                    edges: edges.iter().copied().map(Real::get).collect(),
                    underflow: *underflow,
                    overflow: *overflow,
                    nanflow: *nanflow,
                    closedlow: *closedlow,
                },
                Binning::Cut => AxisSpec::Cut { expr },
            },
            Axis::Profile { .. } => AxisSpec::Profile { expr },
        }
    }
}

/// Keyword options accepted next to the axes of a histogram.
pub const OPTION_KEYS: [&str; 4] = ["weight", "defs", "count_type", "fields"];

/// Histogram options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistOptions {
    /// Weight expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    /// Named sub-expressions usable in axis and weight expressions
    #[serde(default, skip_serializing_if = "Defs::is_empty")]
    pub defs: Defs,
    /// Accumulator precision
    #[serde(default)]
    pub count_type: CountType,
    /// Readable input columns (any when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl HistOptions {
    /// Parse keyword options, rejecting unknown keys.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        check_keys(map, &OPTION_KEYS)?;
        Ok(serde_json::from_value(Value::Object(map.clone()))?)
    }
}

/// Histogram definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistSpec {
    /// Axes in declaration order
    pub axes: Vec<AxisSpec>,
    /// Options
    #[serde(flatten)]
    pub options: HistOptions,
}

impl HistSpec {
    /// Parse a histogram definition, rejecting unknown top-level keys.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::TypeMismatch("histogram definition must be a JSON object".into()))?;
        let mut allowed = OPTION_KEYS.to_vec();
        allowed.push("axes");
        check_keys(map, &allowed)?;
        Ok(serde_json::from_value(value.clone())?)
    }
}

fn check_keys(map: &Map<String, Value>, allowed: &[&str]) -> Result<()> {
    let unknown: Vec<&str> =
        map.keys().map(String::as_str).filter(|k| !allowed.contains(k)).collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(Error::UnrecognizedOption(unknown.join(", ")))
    }
}

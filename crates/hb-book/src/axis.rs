//! Axis definitions and their binning arithmetic.
//!
//! Three kinds of axes exist:
//!
//! - **group** axes ([`Grouping`]) partition events by category; every distinct
//!   category gets its own sub-store;
//! - **fixed** axes ([`Binning`]) map each event to one of a fixed number of
//!   bins, or mask it out;
//! - **profile** axes accumulate Σx·w and Σx²·w of an expression per bin.

use std::collections::BTreeMap;
use std::fmt;

use hb_expr::{Column, Expr, ExprError, Real};

use crate::error::{Error, Result};
use crate::goal::Goal;

/// Most bins a single histogram leaf may hold, counting flow bins and
/// statistics.
pub const MAX_BINS: usize = 1 << 24;

/// A category key of a group axis.
///
/// Numeric keys compare by total order, so NaN is a category of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Numeric category.
    Num(Real),
    /// String category.
    Str(String),
}

impl Category {
    fn num(x: f64) -> Category {
        // -0.0 and 0.0 are the same category; all NaNs are one category.
        let x = if x == 0.0 {
            0.0
        } else if x.is_nan() {
            f64::NAN
        } else {
            x
        };
        Category::Num(Real(x))
    }
}

impl From<f64> for Category {
    fn from(x: f64) -> Self {
        Category::num(x)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::Str(s.to_owned())
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::Str(s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Num(x) => write!(f, "{}", x.get()),
            Category::Str(s) => f.write_str(s),
        }
    }
}

// ── Group axes ─────────────────────────────────────────────────

/// How a group axis turns values into categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Grouping {
    /// Every distinct value is a category.
    Distinct,
    /// Numeric values snapped to the edge of a regular grid.
    Bin {
        /// Grid spacing.
        binwidth: Real,
        /// A grid edge.
        origin: Real,
        /// `true`: intervals are `[edge, edge + binwidth)` and the key is the low
        /// edge; `false`: `(edge - binwidth, edge]` keyed by the low edge too.
        closedlow: bool,
    },
}

/// Result of grouping a column: sorted distinct keys and, per event, the
/// position of its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped {
    /// Distinct categories, sorted.
    pub keys: Vec<Category>,
    /// Per event index into `keys`.
    pub inverse: Vec<usize>,
}

impl Grouping {
    /// Partition the values of `column` into categories.
    pub fn apply(&self, column: &Column) -> Result<Grouped> {
        let cats: Vec<Category> = match (self, column) {
            (Grouping::Distinct, Column::Num(v)) => v.iter().map(|&x| Category::num(x)).collect(),
            (Grouping::Distinct, Column::Cat(v)) => v.iter().map(|s| Category::from(s.as_str())).collect(),
            (Grouping::Bin { binwidth, origin, closedlow }, Column::Num(v)) => {
                let (w, o) = (binwidth.get(), origin.get());
                v.iter()
                    .map(|&x| {
                        let k = (x - o) / w;
                        let k = if *closedlow { k.floor() } else { k.ceil() - 1.0 };
                        Category::num(o + w * k)
                    })
                    .collect()
            }
            (Grouping::Bin { .. }, Column::Cat(_)) => {
                return Err(ExprError::Type("groupbin expects a numeric expression".into()).into());
            }
        };

        let mut positions: BTreeMap<&Category, usize> = cats.iter().map(|c| (c, 0)).collect();
        for (i, pos) in positions.values_mut().enumerate() {
            *pos = i;
        }
        let inverse = cats.iter().map(|c| positions[c]).collect();
        let keys = positions.into_keys().cloned().collect();
        Ok(Grouped { keys, inverse })
    }
}

// ── Fixed axes ─────────────────────────────────────────────────

/// How a fixed axis maps values to bins.
///
/// Bin layout is `[underflow] regular… [overflow] [nanflow]`, with each
/// bracketed bin present only when enabled. An event that would land in a
/// disabled flow bin is masked out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binning {
    /// `numbins` equal-width bins over `[low, high)`.
    Regular {
        /// Number of regular bins.
        numbins: usize,
        /// Low edge.
        low: Real,
        /// High edge.
        high: Real,
        /// Keep an underflow bin.
        underflow: bool,
        /// Keep an overflow bin.
        overflow: bool,
        /// Keep a bin for NaN.
        nanflow: bool,
        /// Bins closed on the low side (`[a, b)`) or the high side (`(a, b]`).
        closedlow: bool,
    },
    /// One bin per integer in `min..=max` (values are rounded).
    Integer {
        /// Smallest integer with a bin.
        min: i64,
        /// Largest integer with a bin.
        max: i64,
        /// Keep an underflow bin.
        underflow: bool,
        /// Keep an overflow bin.
        overflow: bool,
    },
    /// Irregular bins between sorted edges.
    Edges {
        /// Strictly increasing edges.
        edges: Vec<Real>,
        /// Keep an underflow bin.
        underflow: bool,
        /// Keep an overflow bin.
        overflow: bool,
        /// Keep a bin for NaN.
        nanflow: bool,
        /// Bins closed on the low side (`[a, b)`) or the high side (`(a, b]`).
        closedlow: bool,
    },
    /// Two bins: false (`x <= 0`) and true (`x > 0`).
    Cut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Position {
    Under,
    In(usize),
    Over,
    Nan,
}

#[derive(Debug, Clone, Copy)]
struct Flows {
    underflow: bool,
    overflow: bool,
    nanflow: bool,
}

/// Result of binning a column: per-event bin and validity.
#[derive(Debug, Clone, PartialEq)]
pub struct Binned {
    /// Bin per event; meaningless where `valid` is false.
    pub index: Vec<usize>,
    /// Whether the event lands in a representable bin.
    pub valid: Vec<bool>,
}

impl Binning {
    /// Number of regular (non-flow) bins.
    pub fn numbins(&self) -> usize {
        match self {
            Binning::Regular { numbins, .. } => *numbins,
            Binning::Integer { min, max, .. } => {
                (i128::from(*max) - i128::from(*min) + 1).clamp(0, MAX_BINS as i128 + 1) as usize
            }
            Binning::Edges { edges, .. } => edges.len() - 1,
            Binning::Cut => 2,
        }
    }

    /// Total number of bins, flow bins included.
    pub fn totbins(&self) -> usize {
        let f = self.flows();
        self.numbins() + f.underflow as usize + f.overflow as usize + f.nanflow as usize
    }

    fn flows(&self) -> Flows {
        match self {
            Binning::Regular { underflow, overflow, nanflow, .. }
            | Binning::Edges { underflow, overflow, nanflow, .. } => {
                Flows { underflow: *underflow, overflow: *overflow, nanflow: *nanflow }
            }
            Binning::Integer { underflow, overflow, .. } => {
                Flows { underflow: *underflow, overflow: *overflow, nanflow: false }
            }
            Binning::Cut => Flows { underflow: false, overflow: false, nanflow: false },
        }
    }

    fn position(&self, x: f64) -> Option<Position> {
        if x.is_nan() {
            return match self {
                Binning::Integer { .. } | Binning::Cut => None,
                _ => Some(Position::Nan),
            };
        }
        Some(match self {
            Binning::Regular { numbins, low, high, closedlow, .. } => {
                let t = (x - low.get()) / (high.get() - low.get()) * *numbins as f64;
                let b = if *closedlow { t.floor() } else { t.ceil() - 1.0 };
                if b < 0.0 {
                    Position::Under
                } else if b >= *numbins as f64 {
                    Position::Over
                } else {
                    Position::In(b as usize)
                }
            }
            Binning::Integer { min, max, .. } => {
                let r = x.round();
                if r < *min as f64 {
                    Position::Under
                } else if r > *max as f64 {
                    Position::Over
                } else {
                    Position::In((r - *min as f64) as usize)
                }
            }
            Binning::Edges { edges, closedlow, .. } => {
                let first = edges[0].get();
                let last = edges[edges.len() - 1].get();
                if *closedlow {
                    if x < first {
                        Position::Under
                    } else if x >= last {
                        Position::Over
                    } else {
                        Position::In(edges.partition_point(|e| e.get() <= x) - 1)
                    }
                } else if x <= first {
                    Position::Under
                } else if x > last {
                    Position::Over
                } else {
                    Position::In(edges.partition_point(|e| e.get() < x) - 1)
                }
            }
            Binning::Cut => Position::In(usize::from(x > 0.0)),
        })
    }

    /// Bin of a single value, or `None` if it is masked out.
    pub fn locate(&self, x: f64) -> Option<usize> {
        let f = self.flows();
        let off = f.underflow as usize;
        let n = self.numbins();
        match self.position(x)? {
            Position::Under => f.underflow.then_some(0),
            Position::In(b) => Some(off + b),
            Position::Over => f.overflow.then_some(off + n),
            Position::Nan => f.nanflow.then_some(off + n + f.overflow as usize),
        }
    }

    /// Bin every value.
    pub fn apply(&self, values: &[f64]) -> Binned {
        let mut index = Vec::with_capacity(values.len());
        let mut valid = Vec::with_capacity(values.len());
        for &x in values {
            match self.locate(x) {
                Some(b) => {
                    index.push(b);
                    valid.push(true);
                }
                None => {
                    index.push(0);
                    valid.push(false);
                }
            }
        }
        Binned { index, valid }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Binning::Regular { numbins, low, high, .. } => {
                if *numbins == 0 || *numbins > MAX_BINS {
                    return Err(Error::InvalidAxis(format!(
                        "bin: numbins must be in 1..={MAX_BINS}, got {numbins}"
                    )));
                }
                if !(low.get().is_finite() && high.get().is_finite() && low.get() < high.get()) {
                    return Err(Error::InvalidAxis(format!(
                        "bin: need finite low < high, got [{}, {}]",
                        low.get(),
                        high.get()
                    )));
                }
            }
            Binning::Integer { min, max, .. } => {
                if min > max {
                    return Err(Error::InvalidAxis(format!("intbin: min {min} > max {max}")));
                }
                if self.numbins() > MAX_BINS {
                    return Err(Error::InvalidAxis(format!(
                        "intbin: [{min}, {max}] spans more than {MAX_BINS} bins"
                    )));
                }
            }
            Binning::Edges { edges, .. } => {
                if edges.len() < 2 || edges.len() > MAX_BINS + 1 {
                    return Err(Error::InvalidAxis(format!("split: need 2..={} edges", MAX_BINS + 1)));
                }
                let ok = edges.iter().all(|e| e.get().is_finite())
                    && edges.windows(2).all(|w| w[0].get() < w[1].get());
                if !ok {
                    return Err(Error::InvalidAxis(
                        "split: edges must be finite and strictly increasing".into(),
                    ));
                }
            }
            Binning::Cut => {}
        }
        Ok(())
    }
}

// ── Axis ───────────────────────────────────────────────────────

/// Kind of an axis; also the order kinds take inside a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AxisKind {
    /// Categorical partition.
    Group,
    /// Fixed binning.
    Fixed,
    /// Running Σx, Σx² accumulation.
    Profile,
}

/// A histogram axis: an expression plus what to do with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum Axis {
    /// Categorical axis.
    Group {
        /// Expression source.
        expr: String,
        /// Category mapping.
        grouping: Grouping,
    },
    /// Fixed-binning axis.
    Fixed {
        /// Expression source.
        expr: String,
        /// Bin mapping.
        binning: Binning,
    },
    /// Profile axis.
    Profile {
        /// Expression source.
        expr: String,
    },
}

impl Axis {
    /// Group by distinct values of `expr`.
    pub fn groupby(expr: impl Into<String>) -> Axis {
        Axis::Group { expr: expr.into(), grouping: Grouping::Distinct }
    }

    /// Group numeric `expr` into categories of width `binwidth` aligned on `origin`.
    pub fn groupbin(expr: impl Into<String>, binwidth: f64, origin: f64) -> Axis {
        Axis::Group {
            expr: expr.into(),
            grouping: Grouping::Bin { binwidth: Real(binwidth), origin: Real(origin), closedlow: true },
        }
    }

    /// `numbins` regular bins over `[low, high)` with all flow bins enabled.
    pub fn bin(expr: impl Into<String>, numbins: usize, low: f64, high: f64) -> Axis {
        Axis::Fixed {
            expr: expr.into(),
            binning: Binning::Regular {
                numbins,
                low: Real(low),
                high: Real(high),
                underflow: true,
                overflow: true,
                nanflow: true,
                closedlow: true,
            },
        }
    }

    /// One bin per integer in `min..=max`, with underflow and overflow bins.
    pub fn intbin(expr: impl Into<String>, min: i64, max: i64) -> Axis {
        Axis::Fixed {
            expr: expr.into(),
            binning: Binning::Integer { min, max, underflow: true, overflow: true },
        }
    }

    /// Irregular bins between `edges`, with all flow bins enabled.
    pub fn split(expr: impl Into<String>, edges: &[f64]) -> Axis {
        Axis::Fixed {
            expr: expr.into(),
            binning: Binning::Edges {
                edges: edges.iter().copied().map(Real).collect(),
                underflow: true,
                overflow: true,
                nanflow: true,
                closedlow: true,
            },
        }
    }

    /// Two bins for a boolean expression.
    pub fn cut(expr: impl Into<String>) -> Axis {
        Axis::Fixed { expr: expr.into(), binning: Binning::Cut }
    }

    /// Accumulate Σx·w and Σx²·w of `expr`.
    pub fn profile(expr: impl Into<String>) -> Axis {
        Axis::Profile { expr: expr.into() }
    }

    /// Enable or disable the underflow bin (fixed axes with flows only).
    pub fn underflow(mut self, on: bool) -> Axis {
        if let Axis::Fixed { binning, .. } = &mut self {
            match binning {
                Binning::Regular { underflow, .. }
                | Binning::Integer { underflow, .. }
                | Binning::Edges { underflow, .. } => *underflow = on,
                Binning::Cut => {}
            }
        }
        self
    }

    /// Enable or disable the overflow bin (fixed axes with flows only).
    pub fn overflow(mut self, on: bool) -> Axis {
        if let Axis::Fixed { binning, .. } = &mut self {
            match binning {
                Binning::Regular { overflow, .. }
                | Binning::Integer { overflow, .. }
                | Binning::Edges { overflow, .. } => *overflow = on,
                Binning::Cut => {}
            }
        }
        self
    }

    /// Enable or disable the NaN bin (`bin` and `split` only).
    pub fn nanflow(mut self, on: bool) -> Axis {
        if let Axis::Fixed { binning, .. } = &mut self {
            match binning {
                Binning::Regular { nanflow, .. } | Binning::Edges { nanflow, .. } => *nanflow = on,
                Binning::Integer { .. } | Binning::Cut => {}
            }
        }
        self
    }

    /// Choose which side of each interval is closed.
    pub fn closedlow(mut self, on: bool) -> Axis {
        match &mut self {
            Axis::Fixed {
                binning: Binning::Regular { closedlow, .. } | Binning::Edges { closedlow, .. },
                ..
            }
            | Axis::Group { grouping: Grouping::Bin { closedlow, .. }, .. } => *closedlow = on,
            _ => {}
        }
        self
    }

    /// Kind of the axis.
    pub fn kind(&self) -> AxisKind {
        match self {
            Axis::Group { .. } => AxisKind::Group,
            Axis::Fixed { .. } => AxisKind::Fixed,
            Axis::Profile { .. } => AxisKind::Profile,
        }
    }

    /// Expression source as given.
    pub fn expr(&self) -> &str {
        match self {
            Axis::Group { expr, .. } | Axis::Fixed { expr, .. } | Axis::Profile { expr } => expr,
        }
    }

    /// Total bins for fixed axes.
    pub fn totbins(&self) -> Option<usize> {
        match self {
            Axis::Fixed { binning, .. } => Some(binning.totbins()),
            _ => None,
        }
    }

    /// Goals this axis needs evaluated for every fill, given its parsed expression.
    pub fn goals(&self, parsed: &Expr) -> Vec<Goal> {
        match self {
            Axis::Group { grouping, .. } => vec![Goal::Group(grouping.clone(), parsed.clone())],
            Axis::Fixed { binning, .. } => vec![Goal::Bin(binning.clone(), parsed.clone())],
            Axis::Profile { .. } => vec![Goal::Value(parsed.clone()), Goal::Value(parsed.squared())],
        }
    }

    /// Check the axis parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Axis::Fixed { binning, .. } => binning.validate(),
            Axis::Group { grouping: Grouping::Bin { binwidth, origin, .. }, .. } => {
                let ok = binwidth.get().is_finite() && binwidth.get() > 0.0 && origin.get().is_finite();
                if ok {
                    Ok(())
                } else {
                    Err(Error::InvalidAxis(format!(
                        "groupbin: need finite positive binwidth and finite origin, got {} / {}",
                        binwidth.get(),
                        origin.get()
                    )))
                }
            }
            Axis::Group { .. } | Axis::Profile { .. } => Ok(()),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Group { expr, grouping: Grouping::Distinct } => write!(f, "groupby({expr:?})"),
            Axis::Group { expr, grouping: Grouping::Bin { binwidth, origin, .. } } => {
                write!(f, "groupbin({expr:?}, {}, {})", binwidth.get(), origin.get())
            }
            Axis::Fixed { expr, binning } => match binning {
                Binning::Regular { numbins, low, high, .. } => {
                    write!(f, "bin({expr:?}, {numbins}, {}, {})", low.get(), high.get())
                }
                Binning::Integer { min, max, .. } => write!(f, "intbin({expr:?}, {min}, {max})"),
                Binning::Edges { edges, .. } => {
                    let e: Vec<f64> = edges.iter().map(|e| e.get()).collect();
                    write!(f, "split({expr:?}, {e:?})")
                }
                Binning::Cut => write!(f, "cut({expr:?})"),
            },
            Axis::Profile { expr } => write!(f, "profile({expr:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binning(axis: Axis) -> Binning {
        match axis {
            Axis::Fixed { binning, .. } => binning,
            _ => unreachable!(),
        }
    }

    #[test]
    fn regular_layout_with_all_flows() {
        let b = binning(Axis::bin("x", 10, 0.0, 10.0));
        assert_eq!(b.totbins(), 13);
        assert_eq!(b.locate(-0.1), Some(0));
        assert_eq!(b.locate(0.0), Some(1));
        assert_eq!(b.locate(9.9), Some(10));
        assert_eq!(b.locate(10.0), Some(11));
        assert_eq!(b.locate(f64::INFINITY), Some(11));
        assert_eq!(b.locate(f64::NEG_INFINITY), Some(0));
        assert_eq!(b.locate(f64::NAN), Some(12));
    }

    #[test]
    fn regular_without_flows_masks() {
        let b = binning(Axis::bin("x", 10, 0.0, 10.0).underflow(false).overflow(false).nanflow(false));
        assert_eq!(b.totbins(), 10);
        assert_eq!(b.locate(0.5), Some(0));
        assert_eq!(b.locate(1.5), Some(1));
        assert_eq!(b.locate(9.9), Some(9));
        assert_eq!(b.locate(-1.0), None);
        assert_eq!(b.locate(10.0), None);
        assert_eq!(b.locate(f64::NAN), None);
        assert_eq!(b.locate(f64::INFINITY), None);
    }

    #[test]
    fn regular_closed_high() {
        let b = binning(
            Axis::bin("x", 2, 0.0, 2.0).closedlow(false).underflow(false).overflow(false),
        );
        assert_eq!(b.locate(0.0), None);
        assert_eq!(b.locate(1.0), Some(0));
        assert_eq!(b.locate(1.5), Some(1));
        assert_eq!(b.locate(2.0), Some(1));
        assert_eq!(b.locate(2.1), None);
    }

    #[test]
    fn overflow_only_shifts_nanflow() {
        let b = binning(Axis::bin("x", 3, 0.0, 3.0).underflow(false));
        assert_eq!(b.totbins(), 5);
        assert_eq!(b.locate(-1.0), None);
        assert_eq!(b.locate(0.5), Some(0));
        assert_eq!(b.locate(7.0), Some(3));
        assert_eq!(b.locate(f64::NAN), Some(4));
    }

    #[test]
    fn integer_bins() {
        let b = binning(Axis::intbin("n", 0, 4));
        assert_eq!(b.totbins(), 7);
        assert_eq!(b.locate(-1.0), Some(0));
        assert_eq!(b.locate(0.0), Some(1));
        assert_eq!(b.locate(2.2), Some(3));
        assert_eq!(b.locate(4.0), Some(5));
        assert_eq!(b.locate(5.0), Some(6));
        assert_eq!(b.locate(f64::NAN), None);
    }

    #[test]
    fn edges_bins() {
        let b = binning(Axis::split("x", &[0.0, 1.0, 5.0]).nanflow(false));
        assert_eq!(b.totbins(), 4);
        assert_eq!(b.locate(-0.5), Some(0));
        assert_eq!(b.locate(0.0), Some(1));
        assert_eq!(b.locate(1.0), Some(2));
        assert_eq!(b.locate(4.99), Some(2));
        assert_eq!(b.locate(5.0), Some(3));
        assert_eq!(b.locate(f64::NAN), None);

        let hi = binning(Axis::split("x", &[0.0, 1.0, 5.0]).closedlow(false));
        assert_eq!(hi.locate(0.0), Some(0));
        assert_eq!(hi.locate(1.0), Some(1));
        assert_eq!(hi.locate(5.0), Some(2));
        assert_eq!(hi.locate(5.5), Some(3));
    }

    #[test]
    fn cut_bins() {
        let b = Binning::Cut;
        assert_eq!(b.totbins(), 2);
        assert_eq!(b.apply(&[0.0, 1.0, f64::NAN, -2.0]), Binned {
            index: vec![0, 1, 0, 0],
            valid: vec![true, true, false, true],
        });
    }

    #[test]
    fn groupby_sorted_keys_and_inverse() {
        let g = Grouping::Distinct.apply(&Column::from(vec!["b", "a", "b", "c"])).unwrap();
        assert_eq!(g.keys, vec![Category::from("a"), Category::from("b"), Category::from("c")]);
        assert_eq!(g.inverse, vec![1, 0, 1, 2]);

        let g = Grouping::Distinct.apply(&Column::from(vec![2.0, -0.0, 0.0, f64::NAN])).unwrap();
        assert_eq!(g.keys.len(), 3);
        assert_eq!(g.inverse[1], g.inverse[2]);
    }

    #[test]
    fn groupbin_snaps_to_low_edge() {
        let grouping = Grouping::Bin { binwidth: Real(10.0), origin: Real(5.0), closedlow: true };
        let g = grouping.apply(&Column::from(vec![5.0, 14.9, 15.0, -1.0])).unwrap();
        assert_eq!(g.keys, vec![Category::from(-5.0), Category::from(5.0), Category::from(15.0)]);
        assert_eq!(g.inverse, vec![1, 1, 2, 0]);

        assert!(grouping.apply(&Column::from(vec!["a"])).is_err());
    }

    #[test]
    fn validation() {
        assert!(Axis::bin("x", 0, 0.0, 1.0).validate().is_err());
        assert!(Axis::bin("x", 3, 1.0, 1.0).validate().is_err());
        assert!(Axis::bin("x", 3, 0.0, f64::INFINITY).validate().is_err());
        assert!(Axis::intbin("x", 3, 2).validate().is_err());
        assert!(Axis::split("x", &[1.0]).validate().is_err());
        assert!(Axis::split("x", &[0.0, 2.0, 1.0]).validate().is_err());
        assert!(Axis::groupbin("x", 0.0, 0.0).validate().is_err());
        assert!(Axis::bin("x", 3, 0.0, 1.0).validate().is_ok());
        assert!(Axis::profile("y").validate().is_ok());
    }

    #[test]
    fn extreme_integer_ranges_are_rejected() {
        for (min, max) in [(i64::MIN, i64::MAX), (i64::MIN, 0), (0, i64::MAX)] {
            let axis = Axis::intbin("n", min, max);
            assert!(matches!(axis.validate(), Err(Error::InvalidAxis(_))), "[{min}, {max}]");
            assert_eq!(binning(axis).numbins(), MAX_BINS + 1);
        }
        let widest = Axis::intbin("n", 1, MAX_BINS as i64);
        assert!(widest.validate().is_ok());
        assert_eq!(binning(widest).numbins(), MAX_BINS);
        assert!(Axis::bin("x", MAX_BINS + 1, 0.0, 1.0).validate().is_err());
    }

    #[test]
    fn profile_goals_share_the_value() {
        let e = Expr::name("y");
        let goals = Axis::profile("y").goals(&e);
        assert_eq!(goals, vec![Goal::Value(e.clone()), Goal::Value(e.squared())]);
    }
}

//! Goals: values a fill must produce.
//!
//! A goal is content-addressed: it hashes and compares by the normalized
//! expression tree plus the axis parameters applied to it, so requests from
//! different axes or histograms for the same value collapse into one.

use std::fmt;

use hb_expr::Expr;

use crate::axis::{Binning, Grouping};

/// A value that must be computed once per fill.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Goal {
    /// The raw per-event value of an expression.
    Value(Expr),
    /// Categories of an expression (group axis).
    Group(Grouping, Expr),
    /// Bin indices of an expression (fixed axis).
    Bin(Binning, Expr),
}

impl Goal {
    /// The expression the goal is computed from.
    pub fn expr(&self) -> &Expr {
        match self {
            Goal::Value(e) | Goal::Group(_, e) | Goal::Bin(_, e) => e,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Value(e) => write!(f, "{e}"),
            Goal::Group(Grouping::Distinct, e) => write!(f, "groupby({e})"),
            Goal::Group(Grouping::Bin { binwidth, origin, .. }, e) => {
                write!(f, "groupbin({e}, {}, {})", binwidth.get(), origin.get())
            }
            Goal::Bin(b, e) => write!(f, "bin[{}]({e})", b.totbins()),
        }
    }
}

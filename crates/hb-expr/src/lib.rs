//! # hb-expr
//!
//! Expression language for histogram axes and weights.
//!
//! Expressions are parsed once into structurally comparable trees
//! ([`Expr`]): equal computations compare and hash equal, which lets a
//! planner share work between every histogram that asks for the same value.
//! Evaluation is column-at-a-time over a table of bound [`Column`]s.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use hb_expr::{Column, Defs, evaluate, parse};
//!
//! let mut defs = Defs::new();
//! defs.insert("r".into(), "sqrt(x**2 + y**2)".into());
//! let expr = parse("r > 1", &defs).unwrap();
//!
//! let mut symbols = HashMap::new();
//! symbols.insert("x".to_string(), Column::Num(vec![0.5, 3.0]));
//! symbols.insert("y".to_string(), Column::Num(vec![0.5, 4.0]));
//! assert_eq!(evaluate(&expr, &symbols).unwrap(), Column::Num(vec![0.0, 1.0]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod column;
pub mod error;
pub mod eval;
pub mod parse;

pub use ast::{BinOp, Expr, Func, Real};
pub use column::{Column, broadcast_len};
pub use error::{ExprError, Result};
pub use eval::{Symbols, evaluate};
pub use parse::{Defs, MAX_DEPTH, parse};

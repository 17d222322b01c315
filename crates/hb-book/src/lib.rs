//! # hb-book
//!
//! Multi-dimensional histograms filled from columnar batches through a
//! compiled, shared evaluation plan.
//!
//! A [`Hist`] is declared from axes: group axes ([`Axis::groupby`],
//! [`Axis::groupbin`]) partition events into categories, fixed axes
//! ([`Axis::bin`], [`Axis::intbin`], [`Axis::split`], [`Axis::cut`]) map them
//! to bins, and profile axes ([`Axis::profile`]) accumulate running sums.
//! The first fill compiles every axis and weight expression into a
//! [`Plan`] that evaluates each distinct sub-expression once; later fills
//! reuse it. A [`Book`] compiles one plan for all of its members.
//!
//! ## Example
//!
//! ```
//! use hb_book::{Axis, Batch, Book, Hist};
//!
//! let mut book = Book::new();
//! book.insert("pt", Hist::new([Axis::bin("sqrt(px**2 + py**2)", 10, 0.0, 10.0)]).unwrap());
//! book.insert(
//!     "pt_by_channel",
//!     Hist::new([Axis::groupby("channel"), Axis::bin("sqrt(px**2 + py**2)", 10, 0.0, 10.0)]).unwrap(),
//! );
//!
//! let batch = Batch::new()
//!     .with("px", vec![3.0, 0.5]).unwrap()
//!     .with("py", vec![4.0, 0.5]).unwrap()
//!     .with("channel", vec!["ee", "mm"]).unwrap();
//! book.fill(&batch).unwrap();
//!
//! let pt = book.get("pt").unwrap().content().unwrap().as_dense().unwrap();
//! assert_eq!(pt.total(0), 2.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod axis;
pub mod batch;
pub mod book;
pub mod config;
pub mod content;
pub mod error;
pub mod exec;
pub mod goal;
pub mod hist;
pub mod plan;
pub mod schema;

pub use axis::{Axis, AxisKind, Binned, Binning, Category, Grouped, Grouping, MAX_BINS};
pub use batch::Batch;
pub use book::Book;
pub use config::{CountType, HistConfig};
pub use content::{Content, DenseArray};
pub use error::{Error, Result};
pub use exec::{FillReport, Value, execute};
pub use goal::Goal;
pub use hist::{Hist, HistBuilder};
pub use plan::{Destination, Instruction, Plan, Request, Step, compile};
pub use schema::{AxisSpec, HistOptions, HistSpec};

pub use hb_expr::{Column, Defs, Expr};

//! Plan executor: runs a compiled [`Plan`] over one [`Batch`] and fills
//! per-histogram staging tables.

use std::collections::HashMap;
use std::sync::Arc;

use hb_expr::{Column, ExprError, Symbols, evaluate};

use crate::axis::{Binned, Grouped};
use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::plan::{Instruction, Plan, Step};

/// A value bound to a plan symbol.
///
/// Values are reference counted: exporting one to several destinations
/// shares it instead of copying the column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Per-event data.
    Data(Arc<Column>),
    /// Categories and per-event inverse indices.
    Grouped(Arc<Grouped>),
    /// Bin indices and validity mask.
    Binned(Arc<Binned>),
}

impl Value {
    /// Per-event data, if this is a data value.
    pub fn as_data(&self) -> Option<&Column> {
        match self {
            Value::Data(c) => Some(c),
            _ => None,
        }
    }

    /// Grouping result, if this is one.
    pub fn as_grouped(&self) -> Option<&Grouped> {
        match self {
            Value::Grouped(g) => Some(g),
            _ => None,
        }
    }

    /// Binning result, if this is one.
    pub fn as_binned(&self) -> Option<&Binned> {
        match self {
            Value::Binned(b) => Some(b),
            _ => None,
        }
    }
}

/// Per-histogram slots filled by exports, indexed `[hist][slot]`.
pub type Staging = Vec<Vec<Option<Value>>>;

/// Counters from one execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Events in the batch.
    pub entries: usize,
    /// `Assign` instructions executed.
    pub evaluations: usize,
    /// Largest number of symbols bound at once.
    pub peak_symbols: usize,
}

#[derive(Default)]
struct SymbolTable {
    values: HashMap<String, Value>,
}

impl SymbolTable {
    fn get(&self, name: &str) -> Result<&Value> {
        self.values.get(name).ok_or_else(|| ExprError::UnboundSymbol(name.to_owned()).into())
    }

    fn data(&self, name: &str) -> Result<&Column> {
        self.get(name)?.as_data().ok_or_else(|| {
            Error::Expression(ExprError::Type(format!("symbol {name} does not hold event data")))
        })
    }
}

impl Symbols for SymbolTable {
    fn lookup(&self, name: &str) -> Option<&Column> {
        self.values.get(name)?.as_data()
    }
}

/// Execute `plan` over `batch`.
///
/// `slots[h]` is the staging width of histogram `h`. On error nothing is
/// returned, so no caller state can be left half-filled.
pub fn execute(plan: &Plan, batch: &Batch, slots: &[usize]) -> Result<(Staging, FillReport)> {
    let mut staging: Staging = slots.iter().map(|&n| vec![None; n]).collect();
    let mut table = SymbolTable::default();
    let mut report = FillReport { entries: batch.len(), ..FillReport::default() };

    for ins in plan.instructions() {
        match ins {
            Instruction::Param { name, column } => {
                let data = batch.get(column).ok_or_else(|| Error::MissingColumn(column.clone()))?;
                table.values.insert(name.clone(), Value::Data(Arc::clone(data)));
            }
            Instruction::Assign { name, step } => {
                let value = match step {
                    Step::Eval(e) => Value::Data(Arc::new(evaluate(e, &table)?)),
                    Step::Group(grouping, arg) => {
                        Value::Grouped(Arc::new(grouping.apply(table.data(arg)?)?))
                    }
                    Step::Bin(binning, arg) => {
                        let column = table.data(arg)?;
                        let values = column.as_num().ok_or_else(|| {
                            ExprError::Type(format!(
                                "fixed axes need a numeric expression, got a {} column",
                                column.kind()
                            ))
                        })?;
                        Value::Binned(Arc::new(binning.apply(values)))
                    }
                };
                report.evaluations += 1;
                table.values.insert(name.clone(), value);
            }
            Instruction::Export { name, destinations, .. } => {
                let value = table.get(name)?;
                for d in destinations {
                    let slot = staging
                        .get_mut(d.hist)
                        .and_then(|h| h.get_mut(d.slot))
                        .ok_or_else(|| {
                            Error::UnresolvedGoal(format!("no staging slot ({}, {})", d.hist, d.slot))
                        })?;
                    *slot = Some(value.clone());
                }
            }
            Instruction::Delete { name } => {
                table.values.remove(name);
            }
        }
        report.peak_symbols = report.peak_symbols.max(table.values.len());
    }

    log::trace!(
        "executed {} instructions over {} entries ({} evaluations, peak {} symbols)",
        plan.len(),
        report.entries,
        report.evaluations,
        report.peak_symbols
    );
    Ok((staging, report))
}

//! Plan compiler: turns the goals of one or more histograms into a single
//! ordered instruction sequence.
//!
//! The sequence binds every input column once (`Param`), computes every
//! distinct sub-expression once (`Assign`), hands finished goal values to
//! their consumers (`Export`), and frees each symbol right after its last
//! reader (`Delete`), so a fill never holds more intermediates than it needs.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use hb_expr::Expr;

use crate::axis::{Binning, Grouping};
use crate::error::{Error, Result};
use crate::goal::Goal;

/// Staging location of an exported value: histogram position and slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Destination {
    /// Histogram index within the fill (0 for a lone histogram).
    pub hist: usize,
    /// Slot index in that histogram's staging table.
    pub slot: usize,
}

/// One histogram slot asking for one goal.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Requested value.
    pub goal: Goal,
    /// Where it must be delivered.
    pub destination: Destination,
}

/// Computation bound by an [`Instruction::Assign`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Evaluate an expression whose names are previously bound symbols.
    Eval(Expr),
    /// Group the values of a symbol.
    Group(Grouping, String),
    /// Bin the values of a symbol.
    Bin(Binning, String),
}

impl Step {
    fn reads(&self) -> Vec<&str> {
        match self {
            Step::Eval(e) => e.sources().into_iter().collect(),
            Step::Group(_, s) | Step::Bin(_, s) => vec![s.as_str()],
        }
    }
}

/// One step of a compiled plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Bind `name` to the batch column `column`.
    Param {
        /// Symbol.
        name: String,
        /// Batch column.
        column: String,
    },
    /// Bind `name` to the result of `step`.
    Assign {
        /// Symbol.
        name: String,
        /// Computation.
        step: Step,
    },
    /// Deliver the value of `name` to every destination.
    Export {
        /// Symbol.
        name: String,
        /// The goal the value satisfies.
        goal: Goal,
        /// Consumers.
        destinations: Vec<Destination>,
    },
    /// Free `name`; nothing later reads it.
    Delete {
        /// Symbol.
        name: String,
    },
}

impl Instruction {
    /// Symbol the instruction acts on.
    pub fn name(&self) -> &str {
        match self {
            Instruction::Param { name, .. }
            | Instruction::Assign { name, .. }
            | Instruction::Export { name, .. }
            | Instruction::Delete { name } => name,
        }
    }

    /// Symbols read by this instruction.
    pub fn reads(&self) -> Vec<&str> {
        match self {
            Instruction::Param { .. } | Instruction::Delete { .. } => Vec::new(),
            Instruction::Assign { step, .. } => step.reads(),
            Instruction::Export { name, .. } => vec![name.as_str()],
        }
    }

    /// Symbol bound by this instruction, if any.
    pub fn defines(&self) -> Option<&str> {
        match self {
            Instruction::Param { name, .. } | Instruction::Assign { name, .. } => Some(name),
            Instruction::Export { .. } | Instruction::Delete { .. } => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Param { name, column } => write!(f, "{name} <- {column}"),
            Instruction::Assign { name, step: Step::Eval(e) } => write!(f, "{name} = {e}"),
            Instruction::Assign { name, step: Step::Group(_, arg) } => {
                write!(f, "{name} = group({arg})")
            }
            Instruction::Assign { name, step: Step::Bin(b, arg) } => {
                write!(f, "{name} = bin[{}]({arg})", b.totbins())
            }
            Instruction::Export { name, destinations, .. } => {
                write!(f, "export {name} ->")?;
                for d in destinations {
                    write!(f, " ({}, {})", d.hist, d.slot)?;
                }
                Ok(())
            }
            Instruction::Delete { name } => write!(f, "del {name}"),
        }
    }
}

/// A compiled instruction sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    instructions: Vec<Instruction>,
    fields: Vec<String>,
}

impl Plan {
    /// The instructions, in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Input columns read by the plan, sorted.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of `Assign` instructions (evaluations per fill).
    pub fn assignments(&self) -> usize {
        self.instructions.iter().filter(|i| matches!(i, Instruction::Assign { .. })).count()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ins in &self.instructions {
            writeln!(f, "{ins}")?;
        }
        Ok(())
    }
}

/// Compile `requests` into a plan.
///
/// `accepts(hist, column)` tells whether histogram `hist` may read the batch
/// column `column`; a goal that needs a column some requester may not read
/// fails with [`Error::UnresolvedGoal`].
pub fn compile<F>(requests: &[Request], accepts: F) -> Result<Plan>
where
    F: Fn(usize, &str) -> bool,
{
    let mut goals: Vec<(&Goal, Vec<Destination>)> = Vec::new();
    let mut seen: HashMap<&Goal, usize> = HashMap::new();
    for r in requests {
        match seen.get(&r.goal) {
            Some(&i) => goals[i].1.push(r.destination),
            None => {
                seen.insert(&r.goal, goals.len());
                goals.push((&r.goal, vec![r.destination]));
            }
        }
    }

    let mut lowering = Lowering::default();
    let mut exports: HashMap<String, Vec<Instruction>> = HashMap::new();
    for (goal, destinations) in &goals {
        for column in goal.expr().sources() {
            if let Some(d) = destinations.iter().find(|d| !accepts(d.hist, column)) {
                return Err(Error::UnresolvedGoal(format!(
                    "{goal}: column '{column}' is not among the fields of histogram {}",
                    d.hist
                )));
            }
        }
        let name = lowering.goal(goal);
        exports.entry(name.clone()).or_default().push(Instruction::Export {
            name,
            goal: (*goal).clone(),
            destinations: destinations.clone(),
        });
    }

    let mut ordered = Vec::with_capacity(lowering.instructions.len() + goals.len());
    for ins in lowering.instructions {
        let produced = exports.remove(ins.name());
        ordered.push(ins);
        if let Some(ex) = produced {
            ordered.extend(ex);
        }
    }

    let instructions = free_dead_symbols(ordered);
    let fields: Vec<String> = lowering.fields.into_iter().collect();
    log::debug!(
        "compiled plan: {} requests, {} distinct goals, {} instructions, fields {:?}",
        requests.len(),
        goals.len(),
        instructions.len(),
        fields
    );
    Ok(Plan { instructions, fields })
}

#[derive(Default)]
struct Lowering {
    instructions: Vec<Instruction>,
    bound: HashMap<Expr, String>,
    fields: BTreeSet<String>,
    next: usize,
}

impl Lowering {
    fn fresh(&mut self) -> String {
        let name = format!("#{}", self.next);
        self.next += 1;
        name
    }

    fn goal(&mut self, goal: &Goal) -> String {
        let step = match goal {
            Goal::Value(e) => return self.expr(e),
            Goal::Group(g, e) => Step::Group(g.clone(), self.expr(e)),
            Goal::Bin(b, e) => Step::Bin(b.clone(), self.expr(e)),
        };
        let name = self.fresh();
        self.instructions.push(Instruction::Assign { name: name.clone(), step });
        name
    }

    fn expr(&mut self, e: &Expr) -> String {
        if let Some(name) = self.bound.get(e) {
            return name.clone();
        }
        let name = match e {
            Expr::Name(column) => {
                let name = self.fresh();
                self.fields.insert(column.clone());
                self.instructions.push(Instruction::Param { name: name.clone(), column: column.clone() });
                name
            }
            _ => {
                let args: Vec<Expr> =
                    e.children().into_iter().map(|c| Expr::Name(self.expr(c))).collect();
                let name = self.fresh();
                self.instructions
                    .push(Instruction::Assign { name: name.clone(), step: Step::Eval(e.with_children(args)) });
                name
            }
        };
        self.bound.insert(e.clone(), name.clone());
        name
    }
}

/// Insert a `Delete` for every symbol after its last reader.
///
/// Deletes are held back while exports of the preceding value are still
/// being emitted, so an `Export` always directly follows its producer.
fn free_dead_symbols(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut last_read: HashMap<String, usize> = HashMap::new();
    for (i, ins) in instructions.iter().enumerate() {
        for s in ins.reads() {
            last_read.insert(s.to_owned(), i);
        }
    }

    let mut out = Vec::with_capacity(instructions.len() * 2);
    let mut pending: Vec<String> = Vec::new();
    for (i, ins) in instructions.into_iter().enumerate() {
        let is_export = matches!(ins, Instruction::Export { .. });
        if !is_export {
            out.extend(pending.drain(..).map(|name| Instruction::Delete { name }));
        }
        pending.extend(
            ins.reads().into_iter().filter(|s| last_read.get(*s) == Some(&i)).map(str::to_owned),
        );
        if let Some(defined) = ins.defines()
            && !last_read.contains_key(defined)
        {
            pending.push(defined.to_owned());
        }
        out.push(ins);
    }
    out.extend(pending.into_iter().map(|name| Instruction::Delete { name }));
    out
}

//! Vectorized (column-at-a-time) evaluation of expression trees.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::ast::{BinOp, Expr, Func};
use crate::column::{Column, broadcast_len};
use crate::error::{ExprError, Result};

/// A table of bound symbols that expressions can reference by name.
pub trait Symbols {
    /// Column bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<&Column>;
}

impl<S: BuildHasher> Symbols for HashMap<String, Column, S> {
    fn lookup(&self, name: &str) -> Option<&Column> {
        self.get(name)
    }
}

impl Symbols for BTreeMap<String, Column> {
    fn lookup(&self, name: &str) -> Option<&Column> {
        self.get(name)
    }
}

/// Evaluate `expr` against the bound symbols.
///
/// The result has the broadcast length of all referenced columns; an
/// expression made only of literals yields a length-1 column.
pub fn evaluate<S: Symbols + ?Sized>(expr: &Expr, symbols: &S) -> Result<Column> {
    eval(expr, symbols).map(Cow::into_owned)
}

fn eval<'a, S: Symbols + ?Sized>(e: &Expr, symbols: &'a S) -> Result<Cow<'a, Column>> {
    Ok(match e {
        Expr::Number(x) => Cow::Owned(Column::Num(vec![x.get()])),
        Expr::Str(s) => Cow::Owned(Column::Cat(vec![s.clone()])),
        Expr::Name(n) => {
            Cow::Borrowed(symbols.lookup(n).ok_or_else(|| ExprError::UnboundSymbol(n.clone()))?)
        }
        Expr::Neg(a) => {
            let a = eval(a, symbols)?;
            Cow::Owned(Column::Num(numeric(&a, "-")?.iter().map(|x| -x).collect()))
        }
        Expr::Not(a) => {
            let a = eval(a, symbols)?;
            Cow::Owned(Column::Num(numeric(&a, "!")?.iter().map(|&x| truth(x <= 0.0)).collect()))
        }
        Expr::BinOp(op, a, b) => {
            let a = eval(a, symbols)?;
            let b = eval(b, symbols)?;
            Cow::Owned(binop(*op, &a, &b)?)
        }
        Expr::Call(f, args) => {
            let cols = args.iter().map(|a| eval(a, symbols)).collect::<Result<Vec<_>>>()?;
            Cow::Owned(Column::Num(call(*f, &cols)?))
        }
    })
}

fn binop(op: BinOp, a: &Column, b: &Column) -> Result<Column> {
    if let (Column::Cat(x), Column::Cat(y)) = (a, b) {
        let eq = match op {
            BinOp::Eq => true,
            BinOp::Ne => false,
            _ => {
                return Err(ExprError::Type(format!(
                    "operator {op:?} is not defined for categorical operands"
                )));
            }
        };
        let n = broadcast_len(x.len(), y.len())
            .ok_or(ExprError::Length { left: x.len(), right: y.len() })?;
        return Ok(Column::Num((0..n).map(|i| truth((pick(x, i) == pick(y, i)) == eq)).collect()));
    }

    let what = format!("{op:?}");
    let x = numeric(a, &what)?;
    let y = numeric(b, &what)?;
    let out = match op {
        BinOp::Add => zip(x, y, |l, r| l + r)?,
        BinOp::Sub => zip(x, y, |l, r| l - r)?,
        BinOp::Mul => zip(x, y, |l, r| l * r)?,
        BinOp::Div => zip(x, y, |l, r| l / r)?,
        BinOp::Eq => zip(x, y, |l, r| truth(l == r))?,
        BinOp::Ne => zip(x, y, |l, r| truth(l != r))?,
        BinOp::Lt => zip(x, y, |l, r| truth(l < r))?,
        BinOp::Le => zip(x, y, |l, r| truth(l <= r))?,
        BinOp::Gt => zip(x, y, |l, r| truth(l > r))?,
        BinOp::Ge => zip(x, y, |l, r| truth(l >= r))?,
        BinOp::And => zip(x, y, |l, r| truth(l > 0.0 && r > 0.0))?,
        BinOp::Or => zip(x, y, |l, r| truth(l > 0.0 || r > 0.0))?,
    };
    Ok(Column::Num(out))
}

fn call(f: Func, args: &[Cow<'_, Column>]) -> Result<Vec<f64>> {
    let arg = |i: usize| numeric(&args[i], f.name());
    Ok(match f {
        Func::Abs => arg(0)?.iter().map(|x| x.abs()).collect(),
        Func::Sqrt => arg(0)?.iter().map(|x| x.sqrt()).collect(),
        Func::Log => arg(0)?.iter().map(|x| x.ln()).collect(),
        Func::Exp => arg(0)?.iter().map(|x| x.exp()).collect(),
        Func::Floor => arg(0)?.iter().map(|x| x.floor()).collect(),
        Func::Ceil => arg(0)?.iter().map(|x| x.ceil()).collect(),
        Func::Pow => zip(arg(0)?, arg(1)?, f64::powf)?,
        Func::Min => zip(arg(0)?, arg(1)?, f64::min)?,
        Func::Max => zip(arg(0)?, arg(1)?, f64::max)?,
    })
}

fn numeric<'c>(c: &'c Column, what: &str) -> Result<&'c [f64]> {
    c.as_num().ok_or_else(|| {
        ExprError::Type(format!("{what} expects numeric operands, got a {} column", c.kind()))
    })
}

fn zip(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Result<Vec<f64>> {
    let n = broadcast_len(a.len(), b.len())
        .ok_or(ExprError::Length { left: a.len(), right: b.len() })?;
    Ok((0..n).map(|i| f(*pick(a, i), *pick(b, i))).collect())
}

#[inline]
fn pick<T>(v: &[T], i: usize) -> &T {
    if v.len() == 1 { &v[0] } else { &v[i] }
}

#[inline]
fn truth(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

//! Structurally comparable expression trees.
//!
//! Two expressions that describe the same computation compare equal and hash
//! identically, which is what lets callers deduplicate work across many
//! consumers. Commutative operators are normalized at construction so that
//! `a + b` and `b + a` produce the same tree.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// An `f64` with bitwise equality, bitwise hashing and a total order.
///
/// `Real(0.0) != Real(-0.0)` and every NaN payload is its own value; this is
/// the price of having `Eq + Hash + Ord` agree with each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Real(pub f64);

impl Real {
    /// The wrapped value.
    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Real {
    fn from(x: f64) -> Self {
        Real(x)
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinOp {
    /// Whether swapping the operands leaves the result unchanged.
    pub fn is_commutative(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Mul | BinOp::Eq | BinOp::Ne | BinOp::And | BinOp::Or)
    }

    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 3,
            BinOp::Add | BinOp::Sub => 4,
            BinOp::Mul | BinOp::Div => 5,
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Func {
    /// `abs(x)`
    Abs,
    /// `sqrt(x)`
    Sqrt,
    /// `log(x)` (natural logarithm)
    Log,
    /// `exp(x)`
    Exp,
    /// `floor(x)`
    Floor,
    /// `ceil(x)`
    Ceil,
    /// `pow(x, y)`, also written `x ** y`
    Pow,
    /// `min(x, y)`
    Min,
    /// `max(x, y)`
    Max,
}

impl Func {
    /// Look up a function by its source name.
    pub fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "abs" => Func::Abs,
            "sqrt" => Func::Sqrt,
            "log" => Func::Log,
            "exp" => Func::Exp,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "pow" => Func::Pow,
            "min" => Func::Min,
            "max" => Func::Max,
            _ => return None,
        })
    }

    /// Source name of the function.
    pub fn name(self) -> &'static str {
        match self {
            Func::Abs => "abs",
            Func::Sqrt => "sqrt",
            Func::Log => "log",
            Func::Exp => "exp",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Pow => "pow",
            Func::Min => "min",
            Func::Max => "max",
        }
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Func::Pow | Func::Min | Func::Max => 2,
            _ => 1,
        }
    }

    fn is_commutative(self) -> bool {
        matches!(self, Func::Min | Func::Max)
    }
}

/// Expression tree.
///
/// Build compound nodes through [`Expr::binop`], [`Expr::call`] and friends
/// so that commutative operands end up in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expr {
    /// Numeric literal.
    Number(Real),
    /// String literal (compares against categorical columns).
    ///
    /// The parser has no escapes, so a literal holding both `'` and `"`
    /// can be built by hand but its label does not parse back.
    Str(String),
    /// Reference to a named column or symbol.
    Name(String),
    /// Arithmetic negation.
    Neg(Box<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
    /// Binary operation.
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    /// Function call.
    Call(Func, Vec<Expr>),
}

impl Expr {
    /// Numeric literal.
    pub fn number(x: f64) -> Expr {
        Expr::Number(Real(x))
    }

    /// Name reference.
    pub fn name(name: impl Into<String>) -> Expr {
        Expr::Name(name.into())
    }

    /// Arithmetic negation; negated literals stay literals.
    pub fn neg(e: Expr) -> Expr {
        match e {
            Expr::Number(x) => Expr::number(-x.get()),
            other => Expr::Neg(Box::new(other)),
        }
    }

    /// Logical negation.
    pub fn not(e: Expr) -> Expr {
        Expr::Not(Box::new(e))
    }

    /// Binary operation with commutative operands in canonical order.
    pub fn binop(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        if op.is_commutative() && rhs < lhs {
            Expr::BinOp(op, Box::new(rhs), Box::new(lhs))
        } else {
            Expr::BinOp(op, Box::new(lhs), Box::new(rhs))
        }
    }

    /// Function call with commutative arguments in canonical order.
    pub fn call(func: Func, mut args: Vec<Expr>) -> Expr {
        if func.is_commutative() {
            args.sort();
        }
        Expr::Call(func, args)
    }

    /// `self * self`, the square used for second-moment accumulators.
    pub fn squared(&self) -> Expr {
        Expr::binop(BinOp::Mul, self.clone(), self.clone())
    }

    /// Direct children of this node, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Number(_) | Expr::Str(_) | Expr::Name(_) => Vec::new(),
            Expr::Neg(a) | Expr::Not(a) => vec![a.as_ref()],
            Expr::BinOp(_, a, b) => vec![a.as_ref(), b.as_ref()],
            Expr::Call(_, args) => args.iter().collect(),
        }
    }

    /// Rebuild this node with new children (same arity and order as [`Expr::children`]).
    ///
    /// Operand order is kept as given: children substituted by symbol names
    /// must stay in the position the evaluator expects.
    pub fn with_children(&self, mut children: Vec<Expr>) -> Expr {
        match self {
            Expr::Number(_) | Expr::Str(_) | Expr::Name(_) => self.clone(),
            Expr::Neg(_) => Expr::Neg(Box::new(children.remove(0))),
            Expr::Not(_) => Expr::Not(Box::new(children.remove(0))),
            Expr::BinOp(op, _, _) => {
                let b = children.remove(1);
                let a = children.remove(0);
                Expr::BinOp(*op, Box::new(a), Box::new(b))
            }
            Expr::Call(f, _) => Expr::Call(*f, children),
        }
    }

    /// Whether the node is a literal (no inputs).
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Number(_) | Expr::Str(_))
    }

    /// Names of all columns this expression reads.
    pub fn sources(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_sources(&mut out);
        out
    }

    fn collect_sources<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        if let Expr::Name(n) = self {
            out.insert(n.as_str());
        }
        for c in self.children() {
            c.collect_sources(out);
        }
    }

    /// Human-readable label (the normalized source form).
    pub fn label(&self) -> String {
        self.to_string()
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::BinOp(op, _, _) => op.precedence(),
            Expr::Neg(_) | Expr::Not(_) => 6,
            _ => 7,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        if self.precedence() < min_prec { write!(f, "({self})") } else { write!(f, "{self}") }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(Real(x)) => write!(f, "{x}"),
            // Parsed literals never hold both quote characters.
            Expr::Str(s) if s.contains('"') => write!(f, "'{s}'"),
            Expr::Str(s) => write!(f, "\"{s}\""),
            Expr::Name(n) => f.write_str(n),
            Expr::Neg(a) => {
                f.write_str("-")?;
                a.fmt_operand(f, 6)
            }
            Expr::Not(a) => {
                f.write_str("!")?;
                a.fmt_operand(f, 6)
            }
            Expr::BinOp(op, a, b) => {
                let p = op.precedence();
                // Comparisons do not chain.
                a.fmt_operand(f, if p == 3 { p + 1 } else { p })?;
                write!(f, " {} ", op.symbol())?;
                // Left-associative: an equal-precedence right operand needs parens.
                b.fmt_operand(f, p + 1)
            }
            Expr::Call(func, args) => {
                write!(f, "{}(", func.name())?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{a}")?;
                }
                f.write_str(")")
            }
        }
    }
}

//! Tokenizer and recursive-descent parser.
//!
//! Supports arithmetic (+, -, *, /, **), comparisons (==, !=, <, <=, >, >=),
//! boolean operators (&&, ||, !), string literals, and built-in functions
//! (abs, sqrt, log, exp, floor, ceil, pow, min, max).
//!
//! Identifiers found in the `defs` table are replaced by the parsed
//! definition, recursively, before the tree is returned.

use std::collections::BTreeMap;

use crate::ast::{BinOp, Expr, Func};
use crate::error::{ExprError, Result};

/// Named sub-expressions substituted into parsed expressions.
pub type Defs = BTreeMap<String, String>;

/// Parse an expression, substituting named definitions.
///
/// Trees deeper than [`MAX_DEPTH`], before or after substitution, are
/// rejected with [`ExprError::Parse`].
pub fn parse(input: &str, defs: &Defs) -> Result<Expr> {
    let mut stack = Vec::new();
    parse_with_stack(input, defs, &mut stack).map(|(e, _)| e)
}

fn parse_with_stack(input: &str, defs: &Defs, stack: &mut Vec<String>) -> Result<Parsed> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(&tokens);
    let (ast, _) = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(ExprError::Parse(format!(
            "unexpected token after expression: {:?}",
            parser.tokens[parser.pos]
        )));
    }
    substitute(ast, defs, stack)
}

fn substitute(e: Expr, defs: &Defs, stack: &mut Vec<String>) -> Result<Parsed> {
    match e {
        Expr::Name(name) => match defs.get(&name) {
            None => Ok((Expr::Name(name), 1)),
            Some(source) => {
                if stack.contains(&name) {
                    stack.push(name);
                    return Err(ExprError::Definition(format!(
                        "cyclic definition: {}",
                        stack.join(" -> ")
                    )));
                }
                stack.push(name);
                let out = parse_with_stack(source, defs, stack)?;
                stack.pop();
                Ok(out)
            }
        },
        Expr::Number(_) | Expr::Str(_) => Ok((e, 1)),
        Expr::Neg(a) => {
            let (a, d) = substitute(*a, defs, stack)?;
            let e = Expr::neg(a);
            let d = if matches!(e, Expr::Neg(_)) { d + 1 } else { d };
            node(e, d)
        }
        Expr::Not(a) => {
            let (a, d) = substitute(*a, defs, stack)?;
            node(Expr::not(a), d + 1)
        }
        Expr::BinOp(op, a, b) => {
            let a = substitute(*a, defs, stack)?;
            let b = substitute(*b, defs, stack)?;
            binary(op, a, b)
        }
        Expr::Call(f, args) => {
            let args = args
                .into_iter()
                .map(|a| substitute(a, defs, stack))
                .collect::<Result<Vec<_>>>()?;
            let depth = args.iter().map(|(_, d)| *d).max().unwrap_or(0) + 1;
            node(Expr::call(f, args.into_iter().map(|(e, _)| e).collect()), depth)
        }
    }
}

// ── Tokenizer ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Str(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Two-character operators
        if let Some(&next) = chars.get(i + 1) {
            let tok = match (c, next) {
                ('&', '&') => Some(Token::And),
                ('|', '|') => Some(Token::Or),
                ('=', '=') => Some(Token::Eq),
                ('!', '=') => Some(Token::Ne),
                ('<', '=') => Some(Token::Le),
                ('>', '=') => Some(Token::Ge),
                ('*', '*') => Some(Token::StarStar),
                _ => None,
            };
            if let Some(t) = tok {
                tokens.push(t);
                i += 2;
                continue;
            }
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            '<' => Some(Token::Lt),
            '>' => Some(Token::Gt),
            '!' => Some(Token::Not),
            _ => None,
        };
        if let Some(t) = single {
            tokens.push(t);
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != c {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(ExprError::Parse(format!("unterminated string literal at {i}")));
                }
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_digit()
                        || chars[i] == '.'
                        || chars[i] == 'e'
                        || chars[i] == 'E'
                        || ((chars[i] == '+' || chars[i] == '-')
                            && i > start
                            && (chars[i - 1] == 'e' || chars[i - 1] == 'E')))
                {
                    i += 1;
                }
                let s: String = chars[start..i].iter().collect();
                let n: f64 = s
                    .parse()
                    .ok()
                    .filter(|n: &f64| n.is_finite())
                    .ok_or_else(|| ExprError::Parse(format!("invalid number: '{s}'")))?;
                tokens.push(Token::Num(n));
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => {
                return Err(ExprError::Parse(format!("unexpected character: '{c}'")));
            }
        }
    }

    Ok(tokens)
}

// ── Parser (recursive descent) ─────────────────────────────────

/// Deepest expression tree the parser will build.
pub const MAX_DEPTH: usize = 128;

// Parentheses, unary operators and calls each recurse; a printed label
// needs at most two of them per tree level.
const MAX_NESTING: usize = 3 * MAX_DEPTH;

/// An expression with the depth of its tree.
type Parsed = (Expr, usize);

fn too_deep() -> ExprError {
    ExprError::Parse(format!("expression nested too deeply (limit {MAX_DEPTH})"))
}

fn node(e: Expr, depth: usize) -> Result<Parsed> {
    if depth > MAX_DEPTH { Err(too_deep()) } else { Ok((e, depth)) }
}

fn binary(op: BinOp, (a, da): Parsed, (b, db): Parsed) -> Result<Parsed> {
    node(Expr::binop(op, a, b), da.max(db) + 1)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, nesting: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.advance() {
            Some(t) if t == expected => Ok(()),
            other => Err(ExprError::Parse(format!("expected {expected:?}, got {other:?}"))),
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.nesting >= MAX_NESTING {
            return Err(too_deep());
        }
        self.nesting += 1;
        let out = f(self);
        self.nesting -= 1;
        out
    }

    // ── Grammar rules ──────────────────────────────────────────

    fn parse_or(&mut self) -> Result<Parsed> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(BinOp::Or, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Parsed> {
        let mut lhs = self.parse_cmp()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_cmp()?;
            lhs = binary(BinOp::And, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Parsed> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_add()?;
        binary(op, lhs, rhs)
    }

    fn parse_add(&mut self) -> Result<Parsed> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Parsed> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Parsed> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let (e, d) = self.nested(Self::parse_unary)?;
                let e = Expr::neg(e);
                let d = if matches!(e, Expr::Neg(_)) { d + 1 } else { d };
                node(e, d)
            }
            Some(Token::Not) => {
                self.advance();
                let (e, d) = self.nested(Self::parse_unary)?;
                node(Expr::not(e), d + 1)
            }
            _ => self.parse_power(),
        }
    }

    // `**` binds tighter than unary minus on its left and is right-associative.
    fn parse_power(&mut self) -> Result<Parsed> {
        let (base, db) = self.parse_atom()?;
        if matches!(self.peek(), Some(Token::StarStar)) {
            self.advance();
            let (exponent, de) = self.nested(Self::parse_unary)?;
            return node(Expr::call(Func::Pow, vec![base, exponent]), db.max(de) + 1);
        }
        Ok((base, db))
    }

    fn parse_atom(&mut self) -> Result<Parsed> {
        match self.advance().cloned() {
            Some(Token::Num(n)) => Ok((Expr::number(n), 1)),
            Some(Token::Str(s)) => Ok((Expr::Str(s), 1)),
            Some(Token::LParen) => {
                let e = self.nested(Self::parse_or)?;
                self.expect(&Token::RParen)?;
                Ok(e)
            }
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.advance();
                    let func = Func::from_name(&name)
                        .ok_or_else(|| ExprError::Parse(format!("unknown function: '{name}'")))?;
                    let args = self.nested(|p| {
                        let mut args = vec![p.parse_or()?];
                        while matches!(p.peek(), Some(Token::Comma)) {
                            p.advance();
                            args.push(p.parse_or()?);
                        }
                        Ok(args)
                    })?;
                    self.expect(&Token::RParen)?;
                    if args.len() != func.arity() {
                        return Err(ExprError::Parse(format!(
                            "{}() takes {} argument(s), got {}",
                            func.name(),
                            func.arity(),
                            args.len()
                        )));
                    }
                    let depth = args.iter().map(|(_, d)| *d).max().unwrap_or(0) + 1;
                    node(Expr::call(func, args.into_iter().map(|(e, _)| e).collect()), depth)
                } else {
                    Ok((Expr::Name(name), 1))
                }
            }
            other => Err(ExprError::Parse(format!(
                "expected number, string, identifier, or '(', got {other:?}"
            ))),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Expr {
        parse(s, &Defs::new()).unwrap()
    }

    #[test]
    fn simple_arithmetic() {
        let e = p("2 + 3 * 4");
        assert!(e.sources().is_empty());
        assert_eq!(e.label(), "2 + 3 * 4");
    }

    #[test]
    fn commuted_sources_parse_equal() {
        assert_eq!(p("pt * weight_mc"), p("weight_mc * pt"));
        assert_eq!(p("max(a, b)"), p("max(b, a)"));
        assert_ne!(p("a / b"), p("b / a"));
    }

    #[test]
    fn power_operator_is_pow_call() {
        assert_eq!(p("x ** 2"), p("pow(x, 2)"));
        assert_eq!(p("-x ** 2"), Expr::neg(p("pow(x, 2)")));
    }

    #[test]
    fn string_literals() {
        let e = p("channel == 'ee'");
        assert_eq!(e.sources().into_iter().collect::<Vec<_>>(), vec!["channel"]);
        assert_eq!(p("channel == \"ee\""), e);
    }

    #[test]
    fn defs_are_substituted() {
        let mut defs = Defs::new();
        defs.insert("r".into(), "sqrt(x**2 + y**2)".into());
        defs.insert("r2".into(), "r * r".into());
        let e = parse("r2 + 1", &defs).unwrap();
        assert_eq!(e.sources().into_iter().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(parse("r", &defs).unwrap(), p("sqrt(y**2 + x**2)"));
    }

    #[test]
    fn cyclic_defs_are_rejected() {
        let mut defs = Defs::new();
        defs.insert("a".into(), "b + 1".into());
        defs.insert("b".into(), "a * 2".into());
        let err = parse("a", &defs).unwrap_err();
        assert!(matches!(err, ExprError::Definition(_)));
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn wrong_arity_is_an_error() {
        assert!(matches!(parse("pow(x)", &Defs::new()), Err(ExprError::Parse(_))));
        assert!(matches!(parse("sqrt(x, y)", &Defs::new()), Err(ExprError::Parse(_))));
    }

    #[test]
    fn malformed_inputs() {
        for bad in ["", "1 +", "(x", "x $ y", "foo(x)", "'open", "x y", "1e999"] {
            assert!(parse(bad, &Defs::new()).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let n = 200_000;
        let parens = format!("{}x{}", "(".repeat(n), ")".repeat(n));
        let unary = format!("{}x", "-".repeat(n));
        let chain = vec!["x"; n].join(" + ");
        let calls = format!("{}x{}", "abs(".repeat(n), ")".repeat(n));
        for src in [parens, unary, chain, calls] {
            let err = parse(&src, &Defs::new()).unwrap_err();
            assert!(err.to_string().contains("nested too deeply"), "{err}");
        }

        let mut defs = Defs::new();
        defs.insert("a".into(), vec!["x"; 100].join(" + "));
        defs.insert("b".into(), "a * a".into());
        assert!(parse("b", &defs).is_ok());
        defs.insert("c".into(), format!("{}b{}", "sqrt(".repeat(40), ")".repeat(40)));
        assert!(matches!(parse("c", &defs), Err(ExprError::Parse(_))));
    }

    #[test]
    fn nesting_within_limit_parses() {
        let n = MAX_DEPTH - 1;
        let src = format!("{}x{}", "sqrt(".repeat(n), ")".repeat(n));
        let e = p(&src);
        assert_eq!(parse(&e.label(), &Defs::new()).unwrap(), e);
        assert_eq!(p(&format!("{}x{}", "(".repeat(300), ")".repeat(300))), p("x"));
    }

    #[test]
    fn negative_literal_folds() {
        assert_eq!(p("-1.5"), Expr::number(-1.5));
        assert_eq!(p("1.5e2 + 3.0E-1").label(), "0.3 + 150");
    }
}

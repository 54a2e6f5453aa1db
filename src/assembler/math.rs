//! Inline math expression parser.
//!
//! Source programs can embed numeric expressions in `%{ ... }` blocks and in
//! compiler-variable values. The grammar is deliberately small:
//!
//! ```text
//! scope := term (binaryOp term)*
//! term  := sign? (number | variable | '(' scope ')' | unaryOp term)
//! ```
//!
//! Binary operators fold strictly left-to-right; there is **no precedence**
//! beyond explicit parentheses. `2 + 3 * 4` is `(2 + 3) * 4 = 20`. This is
//! an intentional property of the language, not a defect.
//!
//! Parsing produces an [`MathExpr`] tree that is re-evaluated on every call
//! (variables may change between evaluations); results are never memoized.
//! Variable names are resolved through a caller-supplied [`VariableResolver`],
//! with the cycle-detection stack passed explicitly.

use crate::error::{CompileError, Location};

/// Unary operators: sign, `abs`, `sqrt`, `%` (percent), `~`, `log`, `log2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Abs,
    Sqrt,
    Percent,
    BitNot,
    Log,
    Log2,
}

impl UnaryOp {
    fn keyword(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Percent => "%",
            UnaryOp::BitNot => "~",
            UnaryOp::Log => "log",
            UnaryOp::Log2 => "log2",
        }
    }
}

/// Binary operators, folded left-to-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Shl,
    Shr,
    Or,
    And,
    Xor,
}

impl BinaryOp {
    fn keyword(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "pow",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Or => "|",
            BinaryOp::And => "&",
            BinaryOp::Xor => "^",
        }
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Resolves variable names inside math expressions.
///
/// `Ok(None)` means the name is unknown and the evaluator raises a
/// [`CompileError::Reference`]. The cycle-detection stack is threaded
/// through explicitly so one compilation's resolution state never leaks
/// into another.
pub trait VariableResolver {
    fn resolve(&self, name: &str, stack: &mut Vec<String>) -> Result<Option<f64>, CompileError>;
}

/// A resolver for contexts without variables (every name is unknown).
pub struct NoVariables;

impl VariableResolver for NoVariables {
    fn resolve(&self, _name: &str, _stack: &mut Vec<String>) -> Result<Option<f64>, CompileError> {
        Ok(None)
    }
}

/// A parsed, lazily re-evaluated math expression.
#[derive(Debug, Clone)]
pub struct MathExpr {
    root: Expr,
    location: Location,
}

impl MathExpr {
    /// Parses the text of a math scope (the inside of `%{ ... }`).
    pub fn parse(text: &str, location: Location) -> Result<Self, CompileError> {
        let mut parser = ExprParser {
            chars: text.chars().collect(),
            position: 0,
            location: location.clone(),
        };
        let root = parser.scope()?;
        parser.skip_whitespace();
        if parser.position < parser.chars.len() {
            return Err(parser.syntax("end of expression"));
        }
        Ok(Self { root, location })
    }

    /// Evaluates the expression. Re-invoked per resolution, never cached.
    pub fn eval(
        &self,
        resolver: &dyn VariableResolver,
        stack: &mut Vec<String>,
    ) -> Result<f64, CompileError> {
        self.eval_expr(&self.root, resolver, stack)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    fn eval_expr(
        &self,
        expr: &Expr,
        resolver: &dyn VariableResolver,
        stack: &mut Vec<String>,
    ) -> Result<f64, CompileError> {
        match expr {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(name) => match resolver.resolve(name, stack)? {
                Some(value) => Ok(value),
                None => Err(CompileError::Reference {
                    name: name.clone(),
                    location: self.location.clone(),
                }),
            },
            Expr::Unary(op, operand) => {
                let value = self.eval_expr(operand, resolver, stack)?;
                let result = match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Abs => value.abs(),
                    UnaryOp::Sqrt => value.sqrt(),
                    UnaryOp::Percent => value / 100.0,
                    UnaryOp::BitNot => !(value as i64) as f64,
                    UnaryOp::Log => value.ln(),
                    UnaryOp::Log2 => value.log2(),
                };
                self.check(op.keyword(), value, value, result)
            }
            Expr::Binary(op, left, right) => {
                let a = self.eval_expr(left, resolver, stack)?;
                let b = self.eval_expr(right, resolver, stack)?;
                if matches!(op, BinaryOp::Div) && b == 0.0 {
                    return Err(self.operator_error(op.keyword(), a, b));
                }
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                    BinaryOp::Shl => (((a as i64) << (b as i64 & 63)) as f64),
                    BinaryOp::Shr => (((a as i64) >> (b as i64 & 63)) as f64),
                    BinaryOp::Or => ((a as i64) | (b as i64)) as f64,
                    BinaryOp::And => ((a as i64) & (b as i64)) as f64,
                    BinaryOp::Xor => ((a as i64) ^ (b as i64)) as f64,
                };
                self.check(op.keyword(), a, b, result)
            }
        }
    }

    fn check(&self, op: &str, left: f64, right: f64, result: f64) -> Result<f64, CompileError> {
        if result.is_finite() {
            Ok(result)
        } else {
            Err(self.operator_error(op, left, right))
        }
    }

    fn operator_error(&self, op: &str, left: f64, right: f64) -> CompileError {
        CompileError::Operator {
            operator: op.to_string(),
            left,
            right,
            location: self.location.clone(),
        }
    }
}

struct ExprParser {
    chars: Vec<char>,
    position: usize,
    location: Location,
}

impl ExprParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.position += 1;
        }
    }

    fn syntax(&self, expected: &str) -> CompileError {
        let found = match self.peek() {
            Some(c) => format!("`{}`", c),
            None => "end of input".to_string(),
        };
        CompileError::Syntax {
            expected: expected.to_string(),
            found,
            location: self.location.clone(),
        }
    }

    fn scope(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.term()?;
        loop {
            self.skip_whitespace();
            let Some(op) = self.binary_op() else {
                return Ok(left);
            };
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn binary_op(&mut self) -> Option<BinaryOp> {
        let rest: String = self.chars[self.position..].iter().collect();
        let table: [(&str, BinaryOp); 10] = [
            ("<<", BinaryOp::Shl),
            (">>", BinaryOp::Shr),
            ("pow", BinaryOp::Pow),
            ("+", BinaryOp::Add),
            ("-", BinaryOp::Sub),
            ("*", BinaryOp::Mul),
            ("/", BinaryOp::Div),
            ("|", BinaryOp::Or),
            ("&", BinaryOp::And),
            ("^", BinaryOp::Xor),
        ];
        for (text, op) in table {
            if rest.starts_with(text) {
                self.position += text.len();
                return Some(op);
            }
        }
        None
    }

    fn term(&mut self) -> Result<Expr, CompileError> {
        self.skip_whitespace();
        // Optional sign
        match self.peek() {
            Some('-') => {
                self.position += 1;
                return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.term()?)));
            }
            Some('+') => {
                self.position += 1;
                return self.term();
            }
            _ => {}
        }

        match self.peek() {
            Some('(') => {
                self.position += 1;
                let inner = self.scope()?;
                self.skip_whitespace();
                if self.peek() != Some(')') {
                    return Err(self.syntax("`)`"));
                }
                self.position += 1;
                Ok(inner)
            }
            Some('~') => {
                self.position += 1;
                Ok(Expr::Unary(UnaryOp::BitNot, Box::new(self.term()?)))
            }
            Some('%') => {
                self.position += 1;
                Ok(Expr::Unary(UnaryOp::Percent, Box::new(self.term()?)))
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' || c == '@' => self.word(),
            _ => Err(self.syntax("number, variable, `(`, or unary operator")),
        }
    }

    fn word(&mut self) -> Result<Expr, CompileError> {
        let start = self.position;
        if self.peek() == Some('@') {
            self.position += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.position += 1;
        }
        let word: String = self.chars[start..self.position].iter().collect();

        let unary = match word.as_str() {
            "abs" => Some(UnaryOp::Abs),
            "sqrt" => Some(UnaryOp::Sqrt),
            "log2" => Some(UnaryOp::Log2),
            "log" => Some(UnaryOp::Log),
            _ => None,
        };
        match unary {
            Some(op) => Ok(Expr::Unary(op, Box::new(self.term()?))),
            None => Ok(Expr::Variable(word.trim_start_matches('@').to_string())),
        }
    }

    fn number(&mut self) -> Result<Expr, CompileError> {
        let start = self.position;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            self.position += 1;
        }
        let text: String = self.chars[start..self.position]
            .iter()
            .filter(|c| **c != '_')
            .collect();

        let value = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16).ok().map(|v| v as f64)
        } else if let Some(oct) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
            i64::from_str_radix(oct, 8).ok().map(|v| v as f64)
        } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
            i64::from_str_radix(bin, 2).ok().map(|v| v as f64)
        } else {
            text.parse::<f64>().ok()
        };

        value.map(Expr::Number).ok_or_else(|| CompileError::Syntax {
            expected: "numeric literal".to_string(),
            found: format!("`{}`", text),
            location: self.location.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> Result<f64, CompileError> {
        MathExpr::parse(text, Location::new(1, 0))?.eval(&NoVariables, &mut Vec::new())
    }

    #[test]
    fn test_left_to_right_no_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), 20.0);
        assert_eq!(eval("10 - 2 * 3").unwrap(), 24.0);
    }

    #[test]
    fn test_parentheses_override_order() {
        assert_eq!(eval("2 + (3 * 4)").unwrap(), 14.0);
    }

    #[test]
    fn test_radix_literals() {
        assert_eq!(eval("0x10").unwrap(), 16.0);
        assert_eq!(eval("0o10").unwrap(), 8.0);
        assert_eq!(eval("0b10").unwrap(), 2.0);
        assert_eq!(eval("1_000").unwrap(), 1000.0);
        assert_eq!(eval("2.5").unwrap(), 2.5);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval("abs -5").unwrap(), 5.0);
        assert_eq!(eval("sqrt 16").unwrap(), 4.0);
        assert_eq!(eval("%50").unwrap(), 0.5);
        assert_eq!(eval("~0").unwrap(), -1.0);
        assert_eq!(eval("log2 8").unwrap(), 3.0);
    }

    #[test]
    fn test_bit_operators() {
        assert_eq!(eval("1 << 4").unwrap(), 16.0);
        assert_eq!(eval("12 & 10").unwrap(), 8.0);
        assert_eq!(eval("12 | 3").unwrap(), 15.0);
        assert_eq!(eval("12 ^ 10").unwrap(), 6.0);
        assert_eq!(eval("2 pow 10").unwrap(), 1024.0);
    }

    #[test]
    fn test_division_by_zero_is_operator_error() {
        match eval("1 / 0") {
            Err(CompileError::Operator { operator, left, right, .. }) => {
                assert_eq!(operator, "/");
                assert_eq!(left, 1.0);
                assert_eq!(right, 0.0);
            }
            other => panic!("expected operator error, got {:?}", other),
        }
    }

    #[test]
    fn test_log_of_zero_is_operator_error() {
        assert!(matches!(eval("log 0"), Err(CompileError::Operator { .. })));
    }

    #[test]
    fn test_unknown_variable_is_reference_error() {
        assert!(matches!(
            eval("missing + 1"),
            Err(CompileError::Reference { .. })
        ));
    }

    #[test]
    fn test_resolver_is_consulted_per_eval() {
        use std::sync::atomic::{AtomicU32, Ordering};

        struct Counter(AtomicU32);
        impl VariableResolver for Counter {
            fn resolve(
                &self,
                _name: &str,
                _stack: &mut Vec<String>,
            ) -> Result<Option<f64>, CompileError> {
                Ok(Some(f64::from(self.0.fetch_add(1, Ordering::SeqCst))))
            }
        }

        let expr = MathExpr::parse("x", Location::new(1, 0)).unwrap();
        let resolver = Counter(AtomicU32::new(0));
        assert_eq!(expr.eval(&resolver, &mut Vec::new()).unwrap(), 0.0);
        // Not memoized: the second evaluation sees the new value.
        assert_eq!(expr.eval(&resolver, &mut Vec::new()).unwrap(), 1.0);
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(matches!(eval("1 )"), Err(CompileError::Syntax { .. })));
    }
}
